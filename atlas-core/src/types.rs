use crate::constants::{DEFAULT_CONTAINER_ID, DEFAULT_OBJECT_NAME};

use std::{
    fmt::{Display, Formatter},
    time::Duration,
};

use derive_more::From;
use serde::Serialize;

/// Pixel dimensions of a container, as laid out by the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Serialize)]
pub struct ContainerSize {
    pub width: u32,
    pub height: u32,
}

impl ContainerSize {
    pub const fn new(width: u32, height: u32) -> Self {
        ContainerSize { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Display for ContainerSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    // Id of the container the drawing surface is appended to.
    pub container_id: String,
    // Name of the topology object whose features are drawn.
    pub object_name: String,
    // Upper bound for the dataset fetch. `None` waits forever.
    pub fetch_timeout: Option<Duration>,
    // How dataset coordinates are placed on the surface.
    pub projection: ProjectionMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            container_id: DEFAULT_CONTAINER_ID.to_owned(),
            object_name: DEFAULT_OBJECT_NAME.to_owned(),
            fetch_timeout: None,
            projection: ProjectionMode::default(),
        }
    }
}

/// `Identity` draws coordinates as they are, which suits pre-projected
/// datasets. The `Fit` modes scale the extracted features to the measured
/// container, `FitReflectY` also flipping datasets whose y grows northwards.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub enum ProjectionMode {
    #[default]
    Identity,
    Fit,
    FitReflectY,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    AwaitingData,
    Rendered,
}

/// Summary of a completed render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    pub size: ContainerSize,
    pub feature_count: usize,
    pub shape_count: usize,
}

#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub enum OutputFormat {
    #[default]
    Svg,
    Html,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Html => "html",
        }
    }
}
