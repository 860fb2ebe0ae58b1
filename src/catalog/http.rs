use std::time::Duration;

use reqwest::blocking::Client;

use super::{CatalogError, CatalogRequest, CatalogResponse, Method, Transport};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Blocking reqwest transport used against a real catalog.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: CatalogRequest) -> Result<CatalogResponse, CatalogError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        Ok(CatalogResponse { status, body })
    }
}
