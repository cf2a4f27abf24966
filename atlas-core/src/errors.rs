use std::{io, time::Duration};

use thiserror::Error;

/// Failure while retrieving the dataset from its source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read dataset file: {0}")]
    Io(#[from] io::Error),
    #[error("dataset fetch did not complete within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// The fetched payload is not a usable topology.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset is not valid topology JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset has type '{0}', expected 'Topology'")]
    NotATopology(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("object '{0}' is not present in the topology")]
    MissingObject(String),
    #[error("arc index {index} is out of range, topology has {len} arcs")]
    ArcOutOfRange { index: i64, len: usize },
    #[error("position has {0} coordinates, expected at least 2")]
    InvalidPosition(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("position has {0} coordinates, expected at least 2")]
    InvalidPosition(usize),
    #[error("ring has no positions")]
    EmptyRing,
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("container '{0}' is not present in the document")]
    MissingContainer(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
