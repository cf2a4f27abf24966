use crate::{
    document::{Container, HostDocument, SurfaceBinder, SvgBinder, state_shape},
    errors::{FetchError, MapError},
    extractor::{FeatureExtractor, TopoJsonExtractor},
    path::{GeoPath, PathGenerator},
    source::DatasetSource,
    topology::Topology,
    types::{ContainerSize, ProjectionMode, RenderConfig, RenderReport, RenderState},
};

use std::time::Instant;

use geojson::Feature;
use tracing::{Instrument, Level, event, span};

/// Draws one topology object into a container of a host document.
///
/// The feature extractor, path generator and surface binder are injected so
/// each step of the sequence can be swapped or observed independently.
#[derive(Debug, Clone)]
pub struct MapRenderer<E = TopoJsonExtractor, P = GeoPath, B = SvgBinder> {
    extractor: E,
    path: P,
    binder: B,
    config: RenderConfig,
    state: RenderState,
}

impl Default for MapRenderer {
    fn default() -> Self {
        MapRenderer::new(
            TopoJsonExtractor,
            GeoPath::default(),
            SvgBinder,
            RenderConfig::default(),
        )
    }
}

impl MapRenderer {
    pub fn with_config(config: RenderConfig) -> Self {
        MapRenderer::new(TopoJsonExtractor, GeoPath::default(), SvgBinder, config)
    }
}

impl<E, P, B> MapRenderer<E, P, B>
where
    E: FeatureExtractor,
    P: PathGenerator,
    B: SurfaceBinder,
{
    pub fn new(extractor: E, path: P, binder: B, config: RenderConfig) -> Self {
        MapRenderer {
            extractor,
            path,
            binder,
            config,
            state: RenderState::AwaitingData,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Reads the size of the configured container.
    pub fn measure(&self, document: &HostDocument) -> Result<ContainerSize, MapError> {
        document
            .container(&self.config.container_id)
            .map(Container::client_size)
            .ok_or_else(|| MapError::MissingContainer(self.config.container_id.clone()))
    }

    /// Waits for `source` to produce the topology, bounded by the configured
    /// fetch timeout if there is one.
    pub async fn fetch_dataset<S: DatasetSource>(&self, source: &S) -> Result<Topology, MapError> {
        let topology = match self.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, source.fetch())
                .await
                .map_err(|_| FetchError::Timeout(limit))??,
            None => source.fetch().await?,
        };

        Ok(topology)
    }

    pub fn extract_features(
        &self,
        topology: &Topology,
        object_name: &str,
    ) -> Result<Vec<Feature>, MapError> {
        Ok(self.extractor.extract_features(topology, object_name)?)
    }

    /// Appends a surface of `size` to `container` with one `state` shape per
    /// feature. Calling it again appends another surface.
    pub fn render(
        &self,
        container: &mut Container,
        size: ContainerSize,
        features: &[Feature],
    ) -> Result<usize, MapError> {
        let shape_count = self.binder.bind(container, size, features, |feature| {
            Ok(state_shape(self.path.path_for(feature)?))
        })?;

        Ok(shape_count)
    }

    /// Runs the whole sequence: measure, fetch, extract and render. Fitting
    /// projections are resolved once the features are known.
    pub async fn run<S: DatasetSource>(
        &mut self,
        document: &mut HostDocument,
        source: &S,
    ) -> Result<RenderReport, MapError> {
        let span = span!(
            Level::DEBUG,
            "render_map",
            container = %self.config.container_id,
            object = %self.config.object_name
        );

        self.run_steps(document, source).instrument(span).await
    }

    async fn run_steps<S: DatasetSource>(
        &mut self,
        document: &mut HostDocument,
        source: &S,
    ) -> Result<RenderReport, MapError> {
        let run_start = Instant::now();

        let size = self.measure(document)?;
        event!(Level::DEBUG, "Measured container at {}", size);

        let topology = self.fetch_dataset(source).await?;

        let fetched_time = Instant::now();
        event!(
            Level::INFO,
            "Fetched dataset in {}ms",
            fetched_time.duration_since(run_start).as_millis()
        );

        let features = self.extract_features(&topology, &self.config.object_name)?;

        let extracted_time = Instant::now();
        event!(
            Level::DEBUG,
            "Extracted {} features in {}ms",
            features.len(),
            extracted_time.duration_since(fetched_time).as_millis()
        );

        match self.config.projection {
            ProjectionMode::Identity => {}
            ProjectionMode::Fit => self.path.fit_size(size, &features, false),
            ProjectionMode::FitReflectY => self.path.fit_size(size, &features, true),
        }

        let container = document
            .container_mut(&self.config.container_id)
            .ok_or_else(|| MapError::MissingContainer(self.config.container_id.clone()))?;
        let shape_count = self.render(container, size, &features)?;

        self.state = RenderState::Rendered;

        event!(
            Level::INFO,
            "Rendered {} shapes into {} surface in {}ms",
            shape_count,
            size,
            Instant::now().duration_since(extracted_time).as_millis()
        );

        Ok(RenderReport {
            size,
            feature_count: features.len(),
            shape_count,
        })
    }
}
