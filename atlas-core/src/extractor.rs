use crate::{
    errors::ExtractError,
    topology::{DecodedArcs, Point, TopoGeometry, TopoShape, Topology},
};

use geojson::{Feature, Geometry, Value, feature::Id};
use tracing::{Level, event};

/// Converts a named topology object into standalone features.
pub trait FeatureExtractor {
    fn extract_features(
        &self,
        topology: &Topology,
        object_name: &str,
    ) -> Result<Vec<Feature>, ExtractError>;
}

/// Extracts features the way topojson's `feature` does: a geometry
/// collection yields one feature per member, any other object yields a
/// single feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopoJsonExtractor;

impl FeatureExtractor for TopoJsonExtractor {
    fn extract_features(
        &self,
        topology: &Topology,
        object_name: &str,
    ) -> Result<Vec<Feature>, ExtractError> {
        let object = topology.object(object_name)?;
        let arcs = topology.decode_arcs()?;

        event!(
            Level::DEBUG,
            "Decoded {} arcs for object '{}'",
            arcs.len(),
            object_name
        );

        let decoder = GeometryDecoder { topology, arcs };

        match &object.shape {
            Some(TopoShape::GeometryCollection { geometries }) => geometries
                .iter()
                .map(|geometry| decoder.feature(geometry))
                .collect(),
            _ => Ok(vec![decoder.feature(object)?]),
        }
    }
}

struct GeometryDecoder<'a> {
    topology: &'a Topology,
    arcs: DecodedArcs,
}

impl GeometryDecoder<'_> {
    fn feature(&self, object: &TopoGeometry) -> Result<Feature, ExtractError> {
        Ok(Feature {
            bbox: object.bbox.clone(),
            geometry: object
                .shape
                .as_ref()
                .map(|shape| self.geometry(shape))
                .transpose()?,
            id: object.id.as_ref().and_then(feature_id),
            properties: Some(object.properties.clone().unwrap_or_default()),
            foreign_members: None,
        })
    }

    fn geometry(&self, shape: &TopoShape) -> Result<Geometry, ExtractError> {
        let value = match shape {
            TopoShape::Point { coordinates } => {
                Value::Point(position(self.topology.decode_point(coordinates)?))
            }
            TopoShape::MultiPoint { coordinates } => Value::MultiPoint(
                coordinates
                    .iter()
                    .map(|point| self.topology.decode_point(point).map(position))
                    .collect::<Result<_, _>>()?,
            ),
            TopoShape::LineString { arcs } => Value::LineString(positions(self.arcs.line(arcs)?)),
            TopoShape::MultiLineString { arcs } => Value::MultiLineString(
                arcs.iter()
                    .map(|line| self.arcs.line(line).map(positions))
                    .collect::<Result<_, _>>()?,
            ),
            TopoShape::Polygon { arcs } => Value::Polygon(self.polygon(arcs)?),
            TopoShape::MultiPolygon { arcs } => Value::MultiPolygon(
                arcs.iter()
                    .map(|polygon| self.polygon(polygon))
                    .collect::<Result<_, _>>()?,
            ),
            // Null members of a nested collection have nothing to contribute.
            TopoShape::GeometryCollection { geometries } => Value::GeometryCollection(
                geometries
                    .iter()
                    .filter_map(|geometry| geometry.shape.as_ref())
                    .map(|shape| self.geometry(shape))
                    .collect::<Result<_, _>>()?,
            ),
        };

        Ok(Geometry::new(value))
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Result<Vec<Vec<Vec<f64>>>, ExtractError> {
        rings
            .iter()
            .map(|ring| self.arcs.ring(ring).map(positions))
            .collect()
    }
}

fn position(point: Point) -> Vec<f64> {
    point.to_vec()
}

fn positions(points: Vec<Point>) -> Vec<Vec<f64>> {
    points.into_iter().map(position).collect()
}

fn feature_id(id: &serde_json::Value) -> Option<Id> {
    match id {
        serde_json::Value::String(id) => Some(Id::String(id.clone())),
        serde_json::Value::Number(id) => Some(Id::Number(id.clone())),
        _ => None,
    }
}
