use crate::types::ContainerSize;

use geo_types::{Coord, Rect, coord};
use geojson::{Feature, Value};

/// Maps dataset coordinates onto the drawing surface.
pub trait Projection {
    fn project(&self, point: Coord<f64>) -> Coord<f64>;
}

/// Leaves coordinates untouched. Used for pre-projected datasets such as
/// the Albers USA flavour of us-atlas.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Identity;

impl Projection for Identity {
    fn project(&self, point: Coord<f64>) -> Coord<f64> {
        point
    }
}

/// Uniform scale followed by a translation, optionally flipping the y axis
/// first for datasets whose y grows northwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub scale: f64,
    pub translate: Coord<f64>,
    pub reflect_y: bool,
}

impl Affine {
    pub fn new(scale: f64, translate: Coord<f64>) -> Self {
        Affine {
            scale,
            translate,
            reflect_y: false,
        }
    }

    pub fn with_reflect_y(mut self, reflect_y: bool) -> Self {
        self.reflect_y = reflect_y;
        self
    }

    /// Builds the transform that centers `features` in a surface of `size`,
    /// scaled as large as fits. Returns `None` when the features have no
    /// extent to fit.
    pub fn fit_size(size: ContainerSize, features: &[Feature], reflect_y: bool) -> Option<Self> {
        Self::fit_bounds(size, bounds_of(features, |c| c)?, reflect_y)
    }

    /// Same as `Self::fit_size`, for an already known bounding box.
    pub fn fit_bounds(size: ContainerSize, bounds: Rect<f64>, reflect_y: bool) -> Option<Self> {
        let (min_y, max_y) = if reflect_y {
            (-bounds.max().y, -bounds.min().y)
        } else {
            (bounds.min().y, bounds.max().y)
        };

        let scale_for = |available: u32, extent: f64| {
            if extent > 0.0 {
                f64::from(available) / extent
            } else {
                f64::INFINITY
            }
        };
        let scale = scale_for(size.width, bounds.width()).min(scale_for(size.height, bounds.height()));

        if !scale.is_finite() {
            return None;
        }

        Some(Affine {
            scale,
            translate: coord! {
                x: (f64::from(size.width) - scale * (bounds.min().x + bounds.max().x)) / 2.0,
                y: (f64::from(size.height) - scale * (min_y + max_y)) / 2.0,
            },
            reflect_y,
        })
    }
}

impl Projection for Affine {
    fn project(&self, point: Coord<f64>) -> Coord<f64> {
        let y = if self.reflect_y { -point.y } else { point.y };

        coord! {
            x: point.x * self.scale + self.translate.x,
            y: y * self.scale + self.translate.y,
        }
    }
}

/// Bounding box of every position in `features`, after applying `map`.
pub fn bounds_of<F>(features: &[Feature], map: F) -> Option<Rect<f64>>
where
    F: Fn(Coord<f64>) -> Coord<f64>,
{
    let mut bounds: Option<(Coord<f64>, Coord<f64>)> = None;

    let mut visit = |position: &[f64]| {
        if let [x, y, ..] = position {
            let c = map(coord! { x: *x, y: *y });
            bounds = Some(match bounds {
                None => (c, c),
                Some((min, max)) => (
                    coord! { x: min.x.min(c.x), y: min.y.min(c.y) },
                    coord! { x: max.x.max(c.x), y: max.y.max(c.y) },
                ),
            });
        }
    };

    for geometry in features.iter().filter_map(|f| f.geometry.as_ref()) {
        visit_positions(&geometry.value, &mut visit);
    }

    bounds.map(|(min, max)| Rect::new(min, max))
}

fn visit_positions<F>(value: &Value, visit: &mut F)
where
    F: FnMut(&[f64]),
{
    match value {
        Value::Point(position) => visit(position.as_slice()),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            positions.iter().for_each(|p| visit(p.as_slice()))
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => lines
            .iter()
            .flatten()
            .for_each(|p| visit(p.as_slice())),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .flatten()
            .for_each(|p| visit(p.as_slice())),
        Value::GeometryCollection(geometries) => geometries
            .iter()
            .for_each(|g| visit_positions(&g.value, visit)),
    }
}
