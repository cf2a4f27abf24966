mod constants;
mod document;
mod errors;
mod extractor;
mod path;
mod projection;
mod renderer;
mod source;
mod topology;
mod types;

pub use document::{Container, HostDocument, Surface, SurfaceBinder, SvgBinder};
pub use errors::{DatasetError, ExtractError, FetchError, MapError, RenderError};
pub use extractor::{FeatureExtractor, TopoJsonExtractor};
pub use path::{GeoPath, PathGenerator};
pub use projection::{Affine, Identity, Projection, bounds_of};
pub use renderer::MapRenderer;
pub use source::{DatasetSource, FileDatasetSource, HttpDatasetSource};
pub use topology::{TopoGeometry, TopoShape, Topology, Transform};
pub use types::{
    ContainerSize, OutputFormat, ProjectionMode, RenderConfig, RenderReport, RenderState,
};

pub use constants::DEFAULT_DATASET_URL;
pub use geojson::Feature;

/// Fetches the dataset from `source` and draws it into a fresh document
/// holding a single container of `size`.
pub async fn render_map<S: DatasetSource>(
    source: &S,
    size: ContainerSize,
    config: RenderConfig,
) -> Result<(HostDocument, RenderReport), MapError> {
    let mut document =
        HostDocument::new().with_container(config.container_id.clone(), size.width, size.height);

    let mut renderer = MapRenderer::with_config(config);
    let report = renderer.run(&mut document, source).await?;

    Ok((document, report))
}
