use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::{config::ClientConfig, error::ClientError};

/// Carries one simulation request body to the backend and returns its JSON answer.
#[async_trait]
pub trait SimulationTransport: Send + Sync {
    /// Sends `body` and returns the decoded JSON of a 2xx response.
    async fn submit(&self, body: Value) -> Result<Value, ClientError>;
}

/// `reqwest`-backed transport posting JSON to the simulation endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Creates a transport for the given endpoint with transport-default timeouts.
    pub fn new(endpoint: Url, user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            endpoint,
            timeout: None,
        })
    }

    /// Creates a transport from client configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut transport = Self::new(config.simulate_url()?, &config.user_agent)?;
        transport.timeout = config.timeout();
        Ok(transport)
    }

    /// Endpoint this transport posts to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SimulationTransport for HttpTransport {
    async fn submit(&self, body: Value) -> Result<Value, ClientError> {
        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
