use crate::{
    constants::{MIN_RING_POSITIONS, TOPOLOGY_TYPE},
    errors::{DatasetError, ExtractError},
};

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

pub(crate) type Point = [f64; 2];

/// A parsed and validated topology document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Topology {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub objects: HashMap<String, TopoGeometry>,
    #[serde(default)]
    pub arcs: Vec<Vec<Vec<f64>>>,
}

/// Quantization transform, mapping integer arc positions back to coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl Transform {
    fn apply(&self, x: f64, y: f64) -> Point {
        [
            x * self.scale[0] + self.translate[0],
            y * self.scale[1] + self.translate[1],
        ]
    }
}

/// A topology object. `shape` is `None` for objects of type `null`, which
/// still carry an id and properties but have nothing to draw.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct TopoGeometry {
    pub shape: Option<TopoShape>,
    pub id: Option<Value>,
    pub properties: Option<Map<String, Value>>,
    pub bbox: Option<Vec<f64>>,
}

impl TryFrom<Map<String, Value>> for TopoGeometry {
    type Error = serde_json::Error;

    fn try_from(mut object: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = object.remove("id").filter(|id| !id.is_null());
        let properties = match object.remove("properties") {
            Some(properties) => serde_json::from_value(properties)?,
            None => None,
        };
        let bbox = match object.remove("bbox") {
            Some(bbox) => serde_json::from_value(bbox)?,
            None => None,
        };

        let shape = match object.get("type") {
            Some(Value::Null) => None,
            _ => Some(serde_json::from_value(Value::Object(object))?),
        };

        Ok(TopoGeometry {
            shape,
            id,
            properties,
            bbox,
        })
    }
}

/// Geometry of a topology object. Line and polygon geometries reference
/// shared arcs by index, a negative index `!i` walking arc `i` backwards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum TopoShape {
    Point { coordinates: Vec<f64> },
    MultiPoint { coordinates: Vec<Vec<f64>> },
    LineString { arcs: Vec<i64> },
    MultiLineString { arcs: Vec<Vec<i64>> },
    Polygon { arcs: Vec<Vec<i64>> },
    MultiPolygon { arcs: Vec<Vec<Vec<i64>>> },
    GeometryCollection { geometries: Vec<TopoGeometry> },
}

impl Topology {
    /// Parses `bytes` as a topology, rejecting documents of any other type.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DatasetError> {
        let topology: Topology = serde_json::from_slice(bytes)?;

        if topology.kind != TOPOLOGY_TYPE {
            return Err(DatasetError::NotATopology(topology.kind));
        }

        Ok(topology)
    }

    pub fn object(&self, name: &str) -> Result<&TopoGeometry, ExtractError> {
        self.objects
            .get(name)
            .ok_or_else(|| ExtractError::MissingObject(name.to_owned()))
    }

    pub fn object_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.objects.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Decodes every arc into absolute coordinates, undoing the delta
    /// encoding of quantized topologies.
    pub(crate) fn decode_arcs(&self) -> Result<DecodedArcs, ExtractError> {
        let arcs = self
            .arcs
            .iter()
            .map(|arc| {
                let (mut x, mut y) = (0.0, 0.0);

                arc.iter()
                    .map(|position| -> Result<Point, ExtractError> {
                        let [px, py] = first_two(position)?;

                        Ok(match self.transform {
                            Some(transform) => {
                                x += px;
                                y += py;
                                transform.apply(x, y)
                            }
                            None => [px, py],
                        })
                    })
                    .collect::<Result<Vec<Point>, ExtractError>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DecodedArcs { arcs })
    }

    /// Decodes a standalone position. Unlike arc positions these are never
    /// delta encoded.
    pub(crate) fn decode_point(&self, position: &[f64]) -> Result<Point, ExtractError> {
        let [x, y] = first_two(position)?;

        Ok(match self.transform {
            Some(transform) => transform.apply(x, y),
            None => [x, y],
        })
    }
}

fn first_two(position: &[f64]) -> Result<Point, ExtractError> {
    match position {
        [x, y, ..] => Ok([*x, *y]),
        _ => Err(ExtractError::InvalidPosition(position.len())),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DecodedArcs {
    arcs: Vec<Vec<Point>>,
}

impl DecodedArcs {
    fn arc(&self, index: i64) -> Result<Vec<Point>, ExtractError> {
        let (arc_index, reversed) = if index < 0 {
            (!index, true)
        } else {
            (index, false)
        };

        let mut points = usize::try_from(arc_index)
            .ok()
            .and_then(|i| self.arcs.get(i))
            .cloned()
            .ok_or(ExtractError::ArcOutOfRange {
                index,
                len: self.arcs.len(),
            })?;

        if reversed {
            points.reverse();
        }

        Ok(points)
    }

    /// Stitches the referenced arcs into a single line. Consecutive arcs
    /// share their joint position, so it is only kept once.
    pub(crate) fn line(&self, indices: &[i64]) -> Result<Vec<Point>, ExtractError> {
        let mut points: Vec<Point> = Vec::new();

        for &index in indices {
            let arc = self.arc(index)?;

            points.pop();
            points.extend(arc);
        }

        if points.len() == 1 {
            points.push(points[0]);
        }

        Ok(points)
    }

    /// Same as `Self::line`, padded so the ring always has enough positions
    /// to be closed.
    pub(crate) fn ring(&self, indices: &[i64]) -> Result<Vec<Point>, ExtractError> {
        let mut points = self.line(indices)?;

        if let Some(&first) = points.first() {
            while points.len() < MIN_RING_POSITIONS {
                points.push(first);
            }
        }

        Ok(points)
    }

    pub(crate) fn len(&self) -> usize {
        self.arcs.len()
    }
}

#[cfg(test)]
impl Topology {
    pub(crate) fn new_test_topology() -> Topology {
        /*
           Two unit squares sharing arc 0, quantized with
           scale [2, 3] and translate [10, 20]:

           (0,0)--------(1,0)--------(2,0)
             |            |            |
             |    "01"    0    "02"    |
             |            |            |
           (0,1)--------(1,1)--------(2,1)

           * Arc 0 is the shared edge (1,0) -> (1,1)
           * Arc 1 walks the rest of "01" from (1,1)
           * Arc 2 walks the rest of "02" from (1,0)
        */

        Topology::from_slice(TEST_TOPOLOGY.as_bytes()).unwrap()
    }
}

#[cfg(test)]
pub(crate) const TEST_TOPOLOGY: &str = r#"{
    "type": "Topology",
    "bbox": [10, 20, 14, 23],
    "transform": { "scale": [2, 3], "translate": [10, 20] },
    "objects": {
        "states": {
            "type": "GeometryCollection",
            "geometries": [
                { "type": "Polygon", "arcs": [[0, 1]], "id": "01", "properties": { "name": "Alpha" } },
                { "type": "Polygon", "arcs": [[2, -1]], "id": "02", "properties": { "name": "Beta" } }
            ]
        },
        "nation": {
            "type": "GeometryCollection",
            "geometries": [
                { "type": "MultiPolygon", "arcs": [[[0, 1]], [[2, -1]]] }
            ]
        },
        "border": { "type": "LineString", "arcs": [0] },
        "capitals": { "type": "MultiPoint", "coordinates": [[0, 0], [2, 1]] }
    },
    "arcs": [
        [[1, 0], [0, 1]],
        [[1, 1], [-1, 0], [0, -1], [1, 0]],
        [[1, 0], [1, 0], [0, 1], [-1, 0]]
    ]
}"#;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_slice_parses_objects_and_transform() {
        let topology = Topology::new_test_topology();

        assert_eq!(topology.kind, "Topology");
        assert_eq!(topology.arcs.len(), 3);
        assert_eq!(
            topology.object_names(),
            vec!["border", "capitals", "nation", "states"]
        );
        assert_eq!(
            topology.transform,
            Some(Transform {
                scale: [2.0, 3.0],
                translate: [10.0, 20.0],
            })
        );

        let states = topology.object("states").unwrap();
        match &states.shape {
            Some(TopoShape::GeometryCollection { geometries }) => {
                assert_eq!(geometries.len(), 2);
                assert_eq!(geometries[0].id, Some(Value::from("01")));
                assert_eq!(
                    geometries[1].shape,
                    Some(TopoShape::Polygon {
                        arcs: vec![vec![2, -1]]
                    })
                );
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn from_slice_rejects_other_documents() {
        let result = Topology::from_slice(br#"{ "type": "FeatureCollection", "features": [] }"#);
        assert!(matches!(
            result,
            Err(DatasetError::NotATopology(ref kind)) if kind == "FeatureCollection"
        ));

        let result = Topology::from_slice(b"<html>not json</html>");
        assert!(matches!(result, Err(DatasetError::Json(_))));
    }

    #[test]
    fn null_typed_member_keeps_id_without_shape() {
        let topology = Topology::from_slice(
            br#"{
                "type": "Topology",
                "objects": {
                    "states": {
                        "type": "GeometryCollection",
                        "geometries": [
                            { "type": "Polygon", "arcs": [[0]], "id": "01" },
                            { "type": null, "id": "72", "properties": { "name": "Puerto Rico" } }
                        ]
                    }
                },
                "arcs": [[[0, 0], [1, 0], [1, 1], [0, 0]]]
            }"#,
        )
        .unwrap();

        let Some(TopoShape::GeometryCollection { geometries }) =
            &topology.object("states").unwrap().shape
        else {
            panic!("states should be a geometry collection");
        };

        assert_eq!(geometries.len(), 2);
        assert!(geometries[0].shape.is_some());
        assert_eq!(geometries[1].shape, None);
        assert_eq!(geometries[1].id, Some(Value::from("72")));
        assert_eq!(
            geometries[1].properties.as_ref().and_then(|p| p.get("name")),
            Some(&Value::from("Puerto Rico"))
        );
    }

    #[test]
    fn malformed_member_is_still_rejected() {
        let result = Topology::from_slice(
            br#"{
                "type": "Topology",
                "objects": { "states": { "type": "Polygon", "arcs": "nope" } },
                "arcs": []
            }"#,
        );

        assert!(matches!(result, Err(DatasetError::Json(_))));

        let result = Topology::from_slice(
            br#"{ "type": "Topology", "objects": { "states": { "arcs": [[0]] } } }"#,
        );

        assert!(matches!(result, Err(DatasetError::Json(_))));
    }

    #[test]
    fn object_reports_missing_name() {
        let topology = Topology::new_test_topology();

        assert_eq!(
            topology.object("counties"),
            Err(ExtractError::MissingObject("counties".to_owned()))
        );
    }

    #[test]
    fn decode_arcs_undoes_delta_encoding() {
        let topology = Topology::new_test_topology();
        let arcs = topology.decode_arcs().unwrap();

        assert_eq!(arcs.len(), 3);
        // (1,0) -> (1,1)
        assert_eq!(arcs.arc(0).unwrap(), vec![[12.0, 20.0], [12.0, 23.0]]);
        // (1,1) -> (0,1) -> (0,0) -> (1,0)
        assert_eq!(
            arcs.arc(1).unwrap(),
            vec![[12.0, 23.0], [10.0, 23.0], [10.0, 20.0], [12.0, 20.0]]
        );
    }

    #[test]
    fn negative_index_reverses_arc() {
        let topology = Topology::new_test_topology();
        let arcs = topology.decode_arcs().unwrap();

        assert_eq!(arcs.arc(-1).unwrap(), vec![[12.0, 23.0], [12.0, 20.0]]);
        assert_eq!(
            arcs.arc(7),
            Err(ExtractError::ArcOutOfRange { index: 7, len: 3 })
        );
        assert_eq!(
            arcs.arc(-4),
            Err(ExtractError::ArcOutOfRange { index: -4, len: 3 })
        );
    }

    #[test]
    fn ring_stitches_shared_positions_once() {
        let topology = Topology::new_test_topology();
        let arcs = topology.decode_arcs().unwrap();

        let ring = arcs.ring(&[2, -1]).unwrap();

        assert_eq!(
            ring,
            vec![
                [12.0, 20.0],
                [14.0, 20.0],
                [14.0, 23.0],
                [12.0, 23.0],
                [12.0, 20.0],
            ]
        );
    }

    #[test]
    fn ring_is_padded_to_minimum_length() {
        let topology = Topology::new_test_topology();
        let arcs = topology.decode_arcs().unwrap();

        let ring = arcs.ring(&[0]).unwrap();

        assert_eq!(ring.len(), 4);
        assert_eq!(ring[2], [12.0, 20.0]);
        assert_eq!(ring[3], [12.0, 20.0]);
    }

    #[test]
    fn untransformed_topology_keeps_raw_positions() {
        let topology = Topology::from_slice(
            br#"{
                "type": "Topology",
                "objects": { "line": { "type": "LineString", "arcs": [0] } },
                "arcs": [[[0.5, 1.5], [2.5, 3.5]]]
            }"#,
        )
        .unwrap();

        let arcs = topology.decode_arcs().unwrap();
        assert_eq!(arcs.line(&[0]).unwrap(), vec![[0.5, 1.5], [2.5, 3.5]]);
        assert_eq!(topology.decode_point(&[4.0, 5.0, 6.0]).unwrap(), [4.0, 5.0]);
    }

    #[test]
    fn short_positions_are_rejected() {
        let topology = Topology::new_test_topology();

        assert_eq!(
            topology.decode_point(&[1.0]),
            Err(ExtractError::InvalidPosition(1))
        );
    }
}
