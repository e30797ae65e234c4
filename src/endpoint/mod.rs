use std::{fmt, time::Duration};

use error::FetchError;

pub mod error;

/// One instrumentation endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Asks the endpoint for everything since the last poll and to clear
    /// its buffer
    pub fn url(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("http://[{}]:{}/?reset=true", self.host, self.port)
        } else {
            format!("http://{}:{}/?reset=true", self.host, self.port)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Something that hands back the raw sample payload of a target
pub trait Endpoint {
    fn fetch(&self, target: &Target) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

pub struct HttpEndpoint {
    client: reqwest::Client,
}

impl HttpEndpoint {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl Endpoint for HttpEndpoint {
    /// Single GET, no retries. Non-2xx is an error.
    async fn fetch(&self, target: &Target) -> Result<Vec<u8>, FetchError> {
        let res = self.client.get(target.url()).send().await?;
        let res = res.error_for_status()?;
        Ok(res.bytes().await?.to_vec())
    }
}
