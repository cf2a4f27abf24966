use crate::{
    constants::POINT_RADIUS,
    errors::RenderError,
    projection::{Affine, Identity, Projection, bounds_of},
    types::ContainerSize,
};

use geo_types::{Coord, coord};
use geojson::{Feature, Value};
use svg::node::element::path::Data;

/// Produces the outline of a feature as SVG path data.
pub trait PathGenerator {
    /// Returns `None` when the feature has nothing to draw.
    fn path_for(&self, feature: &Feature) -> Result<Option<Data>, RenderError>;

    /// Scales later output so `features` fill a surface of `size`.
    /// Generators with no notion of fitting keep their output as is.
    fn fit_size(&mut self, _size: ContainerSize, _features: &[Feature], _reflect_y: bool) {}
}

/// Path generator matching the output of d3's `geoPath`: rings become closed
/// subpaths, lines open ones and points small circles.
#[derive(Debug, Clone, Copy)]
pub struct GeoPath<P = Identity> {
    projection: P,
    // Applied after `projection` once fitted to a surface.
    fit: Option<Affine>,
}

impl Default for GeoPath<Identity> {
    fn default() -> Self {
        GeoPath::new(Identity)
    }
}

impl<P: Projection> GeoPath<P> {
    pub fn new(projection: P) -> Self {
        GeoPath {
            projection,
            fit: None,
        }
    }

    fn project(&self, position: &[f64]) -> Result<Coord<f64>, RenderError> {
        let projected = match position {
            [x, y, ..] => self.projection.project(coord! { x: *x, y: *y }),
            _ => return Err(RenderError::InvalidPosition(position.len())),
        };

        Ok(match &self.fit {
            Some(fit) => fit.project(projected),
            None => projected,
        })
    }

    fn add_value(&self, data: Data, value: &Value) -> Result<Data, RenderError> {
        match value {
            Value::Point(position) => self.add_point(data, position),
            Value::MultiPoint(positions) => positions
                .iter()
                .try_fold(data, |data, position| self.add_point(data, position)),
            Value::LineString(positions) => self.add_line(data, positions),
            Value::MultiLineString(lines) => lines
                .iter()
                .try_fold(data, |data, line| self.add_line(data, line)),
            Value::Polygon(rings) => rings
                .iter()
                .try_fold(data, |data, ring| self.add_ring(data, ring)),
            Value::MultiPolygon(polygons) => polygons
                .iter()
                .flatten()
                .try_fold(data, |data, ring| self.add_ring(data, ring)),
            Value::GeometryCollection(geometries) => geometries
                .iter()
                .try_fold(data, |data, geometry| self.add_value(data, &geometry.value)),
        }
    }

    fn add_point(&self, data: Data, position: &[f64]) -> Result<Data, RenderError> {
        let center = self.project(position)?;
        let r = POINT_RADIUS;

        Ok(data
            .move_to((center.x, center.y))
            .move_by((0.0, r))
            .elliptical_arc_by((r, r, 0.0, 1.0, 1.0, 0.0, -2.0 * r))
            .elliptical_arc_by((r, r, 0.0, 1.0, 1.0, 0.0, 2.0 * r))
            .close())
    }

    fn add_line(&self, data: Data, positions: &[Vec<f64>]) -> Result<Data, RenderError> {
        let mut points = positions.iter().map(|p| self.project(p));

        let Some(first) = points.next().transpose()? else {
            return Ok(data);
        };

        let mut data = data.move_to((first.x, first.y));
        for point in points {
            let point = point?;
            data = data.line_to((point.x, point.y));
        }

        Ok(data)
    }

    fn add_ring(&self, data: Data, ring: &[Vec<f64>]) -> Result<Data, RenderError> {
        // The closing position repeats the first one, `close` draws that edge.
        let open = match ring {
            [] => return Err(RenderError::EmptyRing),
            [first, .., last] if first == last => &ring[..ring.len() - 1],
            _ => ring,
        };

        Ok(self.add_line(data, open)?.close())
    }
}

impl<P: Projection> PathGenerator for GeoPath<P> {
    fn path_for(&self, feature: &Feature) -> Result<Option<Data>, RenderError> {
        let Some(geometry) = feature.geometry.as_ref() else {
            return Ok(None);
        };

        let data = self.add_value(Data::new(), &geometry.value)?;

        Ok((!data.is_empty()).then_some(data))
    }

    fn fit_size(&mut self, size: ContainerSize, features: &[Feature], reflect_y: bool) {
        self.fit = bounds_of(features, |c| self.projection.project(c))
            .and_then(|bounds| Affine::fit_bounds(size, bounds, reflect_y));
    }
}
