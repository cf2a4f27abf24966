/*!
   Module `source` specifies where the topology is retrieved from.

   A fetch is a single request with no retry. Any time limit is applied by
   the caller, so sources themselves may wait indefinitely.
*/

use crate::{constants::DEFAULT_DATASET_URL, errors::FetchError, topology::Topology};

use std::{future::Future, path::PathBuf};

use tracing::{Level, event};

/// `DatasetSource` yields the parsed topology the map is drawn from.
pub trait DatasetSource {
    fn fetch(&self) -> impl Future<Output = Result<Topology, FetchError>> + Send;
}

/// Retrieves the topology with a single GET request.
#[derive(Debug, Clone)]
pub struct HttpDatasetSource {
    client: reqwest::Client,
    url: String,
}

impl Default for HttpDatasetSource {
    fn default() -> Self {
        HttpDatasetSource::new(DEFAULT_DATASET_URL)
    }
}

impl HttpDatasetSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        HttpDatasetSource {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn http_error(&self, source: reqwest::Error) -> FetchError {
        FetchError::Http {
            url: self.url.clone(),
            source,
        }
    }
}

impl DatasetSource for HttpDatasetSource {
    async fn fetch(&self) -> Result<Topology, FetchError> {
        event!(Level::INFO, "Fetching dataset from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.http_error(e))?;
        event!(Level::DEBUG, "Received {} bytes", body.len());

        Ok(Topology::from_slice(&body)?)
    }
}

/// Reads the topology from a local copy of the dataset.
#[derive(Debug, Clone)]
pub struct FileDatasetSource {
    path: PathBuf,
}

impl FileDatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileDatasetSource { path: path.into() }
    }
}

impl DatasetSource for FileDatasetSource {
    async fn fetch(&self) -> Result<Topology, FetchError> {
        event!(Level::INFO, "Reading dataset from {}", self.path.display());

        let body = tokio::fs::read(&self.path).await?;

        Ok(Topology::from_slice(&body)?)
    }
}
