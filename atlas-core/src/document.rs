/*!
   Module `document` models the host document the map is drawn into: a set
   of sized containers addressed by id, each owning the drawing surfaces
   appended to it.
*/

use crate::{constants::SHAPE_CLASS, errors::RenderError, types::ContainerSize};

use geojson::Feature;
use svg::{
    Document,
    node::element::{Group, Path},
};

const PAGE_STYLE: &str = concat!(
    "body { margin: 0; }\n",
    ".state { fill: #d0d0d0; stroke: #ffffff; stroke-width: 1; stroke-linejoin: round; }\n",
);

/// A sized `<svg>` element holding one group of shapes.
#[derive(Debug, Clone)]
pub struct Surface {
    size: ContainerSize,
    shape_count: usize,
    document: Document,
}

impl Surface {
    pub fn size(&self) -> ContainerSize {
        self.size
    }

    pub fn shape_count(&self) -> usize {
        self.shape_count
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

#[derive(Debug, Clone)]
pub struct Container {
    id: String,
    client_width: u32,
    client_height: u32,
    surfaces: Vec<Surface>,
}

impl Container {
    pub fn new(id: impl Into<String>, client_width: u32, client_height: u32) -> Self {
        Container {
            id: id.into(),
            client_width,
            client_height,
            surfaces: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn client_size(&self) -> ContainerSize {
        ContainerSize::new(self.client_width, self.client_height)
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn shape_count(&self) -> usize {
        self.surfaces.iter().map(Surface::shape_count).sum()
    }

    fn append(&mut self, surface: Surface) {
        self.surfaces.push(surface);
    }

    fn to_html(&self) -> String {
        let surfaces: String = self
            .surfaces
            .iter()
            .map(|surface| surface.document.to_string())
            .collect();

        format!(
            "<div id=\"{}\" style=\"width: {}px; height: {}px;\">\n{}\n</div>",
            escape_attribute(&self.id),
            self.client_width,
            self.client_height,
            surfaces
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct HostDocument {
    containers: Vec<Container>,
}

impl HostDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(mut self, id: impl Into<String>, width: u32, height: u32) -> Self {
        self.containers.push(Container::new(id, width, height));
        self
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.iter().find(|container| container.id == id)
    }

    pub fn container_mut(&mut self, id: &str) -> Option<&mut Container> {
        self.containers.iter_mut().find(|container| container.id == id)
    }

    /// Every surface in the document, in container then append order.
    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.containers
            .iter()
            .flat_map(|container| container.surfaces.iter())
    }

    /// Serializes the most recently appended surface of container `id` as a
    /// standalone SVG document.
    pub fn to_svg_string(&self, id: &str) -> Option<String> {
        self.container(id)
            .and_then(|container| container.surfaces.last())
            .map(|surface| surface.document.to_string())
    }

    /// Serializes the document as a standalone HTML page.
    pub fn to_html(&self) -> String {
        let body: Vec<String> = self.containers.iter().map(Container::to_html).collect();

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
            PAGE_STYLE,
            body.join("\n")
        )
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }

    escaped
}

/// Binds features to shapes inside a new drawing surface appended to a
/// container. Each call appends a new surface, existing ones are kept.
pub trait SurfaceBinder {
    fn bind<F>(
        &self,
        container: &mut Container,
        size: ContainerSize,
        features: &[Feature],
        shape_for: F,
    ) -> Result<usize, RenderError>
    where
        F: Fn(&Feature) -> Result<Path, RenderError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SvgBinder;

impl SurfaceBinder for SvgBinder {
    fn bind<F>(
        &self,
        container: &mut Container,
        size: ContainerSize,
        features: &[Feature],
        shape_for: F,
    ) -> Result<usize, RenderError>
    where
        F: Fn(&Feature) -> Result<Path, RenderError>,
    {
        // Shapes are built before touching the container so a failing
        // feature leaves it as it was.
        let shapes = features
            .iter()
            .map(shape_for)
            .collect::<Result<Vec<_>, _>>()?;
        let shape_count = shapes.len();

        let group = shapes
            .into_iter()
            .fold(Group::new(), |group, shape| group.add(shape));

        let document = Document::new()
            .set("width", size.width)
            .set("height", size.height)
            .add(group);

        container.append(Surface {
            size,
            shape_count,
            document,
        });

        Ok(shape_count)
    }
}

/// Element factory producing a `state` classed path.
pub(crate) fn state_shape(data: Option<svg::node::element::path::Data>) -> Path {
    let path = Path::new().set("class", SHAPE_CLASS);

    match data {
        Some(data) => path.set("d", data),
        None => path,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use svg::node::element::path::Data;

    fn features(count: usize) -> Vec<Feature> {
        (0..count)
            .map(|_| Feature {
                bbox: None,
                geometry: None,
                id: None,
                properties: None,
                foreign_members: None,
            })
            .collect()
    }

    fn square_shape(_: &Feature) -> Result<Path, RenderError> {
        let data = Data::new()
            .move_to((0, 0))
            .line_to((1, 0))
            .line_to((1, 1))
            .close();

        Ok(state_shape(Some(data)))
    }

    #[test]
    fn document_finds_containers_by_id() {
        let mut document = HostDocument::new()
            .with_container("map", 800, 600)
            .with_container("legend", 200, 40);

        assert_eq!(
            document.container("map").map(Container::client_size),
            Some(ContainerSize::new(800, 600))
        );
        assert!(document.container("missing").is_none());
        assert_eq!(document.container_mut("legend").unwrap().id(), "legend");
    }

    #[test]
    fn bind_appends_one_shape_per_feature() {
        let mut container = Container::new("map", 800, 600);
        let size = container.client_size();

        let count = SvgBinder
            .bind(&mut container, size, &features(50), square_shape)
            .unwrap();

        assert_eq!(count, 50);
        assert_eq!(container.surfaces().len(), 1);

        let markup = container.surfaces()[0].document().to_string();
        assert_eq!(markup.matches("<path").count(), 50);
        assert_eq!(markup.matches("class=\"state\"").count(), 50);
        assert_eq!(markup.matches("<g").count(), 1);
        assert!(markup.contains("width=\"800\""));
        assert!(markup.contains("height=\"600\""));
    }

    #[test]
    fn bind_twice_keeps_both_surfaces() {
        let mut container = Container::new("map", 300, 200);
        let size = container.client_size();

        SvgBinder
            .bind(&mut container, size, &features(3), square_shape)
            .unwrap();
        SvgBinder
            .bind(&mut container, size, &features(3), square_shape)
            .unwrap();

        assert_eq!(container.surfaces().len(), 2);
        assert_eq!(container.shape_count(), 6);
    }

    #[test]
    fn failing_shape_leaves_container_untouched() {
        let mut container = Container::new("map", 300, 200);
        let size = container.client_size();

        let result = SvgBinder.bind(&mut container, size, &features(3), |_| {
            Err(RenderError::EmptyRing)
        });

        assert_eq!(result, Err(RenderError::EmptyRing));
        assert!(container.surfaces().is_empty());
    }

    #[test]
    fn shape_without_data_has_no_geometry_attribute() {
        let markup = state_shape(None).to_string();

        assert!(markup.contains("class=\"state\""));
        assert!(!markup.contains(" d="));
    }

    #[test]
    fn svg_string_uses_latest_surface() {
        let mut document = HostDocument::new()
            .with_container("map", 400, 300)
            .with_container("inset", 100, 100);
        assert_eq!(document.to_svg_string("map"), None);

        let container = document.container_mut("map").unwrap();
        let size = container.client_size();
        SvgBinder
            .bind(container, size, &features(1), square_shape)
            .unwrap();
        SvgBinder
            .bind(container, size, &features(3), square_shape)
            .unwrap();

        let inset = document.container_mut("inset").unwrap();
        let size = inset.client_size();
        SvgBinder.bind(inset, size, &features(2), square_shape).unwrap();

        let svg = document.to_svg_string("map").unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<path").count(), 3);
        assert_eq!(document.to_svg_string("missing"), None);

        let shapes: Vec<usize> = document.surfaces().map(Surface::shape_count).collect();
        assert_eq!(shapes, vec![1, 3, 2]);
    }

    #[test]
    fn html_page_escapes_container_id() {
        let document = HostDocument::new().with_container("map\" onload=\"x()", 10, 10);

        let html = document.to_html();

        assert!(html.contains("<div id=\"map&quot; onload=&quot;x()\""));
        assert!(!html.contains("onload=\"x()"));
    }

    #[test]
    fn html_page_wraps_container_surfaces() {
        let mut document = HostDocument::new().with_container("map", 400, 300);
        let container = document.container_mut("map").unwrap();
        let size = container.client_size();
        SvgBinder
            .bind(container, size, &features(2), square_shape)
            .unwrap();

        let html = document.to_html();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<div id=\"map\" style=\"width: 400px; height: 300px;\">"));
        assert!(html.contains(".state {"));
        assert_eq!(html.matches("<svg").count(), 1);
        assert_eq!(html.matches("<path").count(), 2);
    }
}
