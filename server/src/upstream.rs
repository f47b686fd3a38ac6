use axum::{body::Bytes, http::StatusCode};

/// A response as it came from the network.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// The "network" side of the cache. An `Err` means the request never got a
/// response at all; HTTP error statuses are `Ok`.
#[async_trait::async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, path_and_query: &str) -> anyhow::Result<UpstreamResponse>;
}

pub struct HttpUpstream {
    client: reqwest::Client,
    origin: String,
}

impl HttpUpstream {
    pub fn new(origin: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            origin: origin.into(),
        })
    }
}

#[async_trait::async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, path_and_query: &str) -> anyhow::Result<UpstreamResponse> {
        let response = self.client.get(format!("{}{}", self.origin, path_and_query)).send().await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
