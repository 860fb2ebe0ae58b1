pub mod http;
pub mod models;
pub mod scroll;

use reqwest::Url;
use serde::Deserialize;
use serde_json::value::RawValue;
use thiserror::Error;
use tracing::{debug, info};

use self::http::HttpTransport;
use self::models::{Dataset, GlossaryTerm};
pub use self::scroll::DatasetPages;

pub const DEFAULT_CATALOG_URL: &str = "http://localhost:8080";

/// Aspects side-loaded when listing datasets.
pub const DATASET_ASPECTS: [&str; 3] = ["schemaMetadata", "glossaryTerms", "editableSchemaMetadata"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Transport Error: {0}")]
    Transport(String),
    #[error("request failed with status code: {status}")]
    Remote { status: u16, body: String },
    #[error("Decode Error: {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Configuration Error: {0}")]
    Config(String),
    #[error("Malformed Payload: {0}")]
    MalformedPayload(String),
    #[error("error posting entity {} ({posted} posted before the failure): {source}", .index + 1)]
    Batch {
        index: usize,
        posted: usize,
        #[source]
        source: Box<CatalogError>,
    },
}

impl CatalogError {
    /// HTTP status of the failed request, looking through batch failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Remote { status, .. } => Some(*status),
            CatalogError::Batch { source, .. } => source.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<String>,
}

impl CatalogRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CatalogResponse {
    pub status: u16,
    pub body: String,
}

/// Moves requests over the wire. Only network failures are errors here;
/// status handling belongs to the client.
pub trait Transport {
    fn execute(&self, request: CatalogRequest) -> Result<CatalogResponse, CatalogError>;
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScrollPage {
    #[serde(default)]
    pub entities: Vec<Dataset>,
    #[serde(rename = "scrollId")]
    pub scroll_id: Option<String>,
    pub metadata: Option<ScrollMetadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScrollMetadata {
    pub total: Option<u64>,
}

pub struct CatalogClient<T = HttpTransport> {
    base_url: String,
    token: Option<String>,
    transport: T,
}

impl CatalogClient<HttpTransport> {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, CatalogError> {
        Ok(Self::with_transport(base_url, token, HttpTransport::new()?))
    }
}

impl<T: Transport> CatalogClient<T> {
    pub fn with_transport(base_url: &str, token: Option<String>, transport: T) -> Self {
        let base_url = match base_url.trim_end_matches('/') {
            "" => DEFAULT_CATALOG_URL.to_string(),
            url => url.to_string(),
        };

        Self {
            base_url,
            token: token.filter(|t| !t.is_empty()),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Posts every element of a JSON array as its own single-element request.
    ///
    /// Stops at the first failure; elements before it stay posted since the
    /// catalog has no multi-entity transaction. The error reports how many
    /// made it.
    pub fn post_entities(&self, resource_type: &str, payload: &str) -> Result<usize, CatalogError> {
        let trimmed = payload.trim();
        if !trimmed.starts_with('[') {
            return Err(CatalogError::MalformedPayload(format!(
                "expected a JSON array of {} entities",
                resource_type
            )));
        }

        let entities: Vec<Box<RawValue>> =
            serde_json::from_str(trimmed).map_err(|source| CatalogError::Decode {
                context: format!("parsing {} array", resource_type),
                source,
            })?;

        for (index, entity) in entities.iter().enumerate() {
            debug!("Posting {} {}/{}", resource_type, index + 1, entities.len());
            self.post_single_entity(resource_type, entity)
                .map_err(|source| CatalogError::Batch {
                    index,
                    posted: index,
                    source: Box::new(source),
                })?;
        }

        info!("Posted {} {} entities to {}", entities.len(), resource_type, self.base_url);
        Ok(entities.len())
    }

    pub fn post_datasets(&self, datasets: &[Dataset]) -> Result<usize, CatalogError> {
        let payload = serde_json::to_string(datasets).map_err(|source| CatalogError::Decode {
            context: "encoding datasets".to_string(),
            source,
        })?;
        self.post_entities("dataset", &payload)
    }

    pub fn post_glossary_terms(&self, terms: &[GlossaryTerm]) -> Result<usize, CatalogError> {
        let payload = serde_json::to_string(terms).map_err(|source| CatalogError::Decode {
            context: "encoding glossary terms".to_string(),
            source,
        })?;
        self.post_entities("glossaryTerm", &payload)
    }

    /// Walks every dataset in the catalog, handing each page to `on_page`.
    /// A failing callback stops the walk and its error is returned.
    pub fn list_datasets<F, E>(&self, page_size: usize, mut on_page: F) -> Result<(), E>
    where
        F: FnMut(Vec<Dataset>) -> Result<(), E>,
        E: From<CatalogError>,
    {
        for page in self.dataset_pages(page_size) {
            on_page(page?)?;
        }
        Ok(())
    }

    /// Lazy page sequence. Each call starts again from the first page.
    pub fn dataset_pages(&self, page_size: usize) -> DatasetPages<'_, T> {
        DatasetPages::new(self, page_size)
    }

    fn post_single_entity(&self, resource_type: &str, entity: &RawValue) -> Result<(), CatalogError> {
        let url = format!(
            "{}/openapi/v3/entity/{}?async=false&systemMetadata=false",
            self.base_url, resource_type
        );

        let mut headers = self.common_headers();
        headers.push(("Content-Type", "application/json".to_string()));

        let response = self.transport.execute(CatalogRequest {
            method: Method::Post,
            url,
            headers,
            body: Some(format!("[{}]", entity.get())),
        })?;

        check_status(response).map(|_| ())
    }

    pub(crate) fn fetch_dataset_page(
        &self,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<ScrollPage, CatalogError> {
        let count = page_size.to_string();
        let mut params: Vec<(&str, &str)> = vec![("systemMetadata", "false")];
        params.extend(DATASET_ASPECTS.iter().map(|aspect| ("aspects", *aspect)));
        params.push(("count", count.as_str()));
        match cursor {
            Some(cursor) => params.push(("scrollId", cursor)),
            None => params.extend([("sort", "urn"), ("sortOrder", "ASCENDING"), ("query", "*")]),
        }

        let endpoint = format!("{}/openapi/v3/entity/dataset", self.base_url);
        let url = Url::parse_with_params(&endpoint, &params)
            .map_err(|e| CatalogError::Config(format!("invalid catalog URL {}: {}", endpoint, e)))?;

        let response = self.transport.execute(CatalogRequest {
            method: Method::Get,
            url: url.to_string(),
            headers: self.common_headers(),
            body: None,
        })?;

        let body = check_status(response)?;
        let page: ScrollPage = serde_json::from_str(&body).map_err(|source| CatalogError::Decode {
            context: "decoding dataset page".to_string(),
            source,
        })?;

        if let Some(total) = page.metadata.as_ref().and_then(|m| m.total) {
            debug!("Catalog reports {} datasets in total", total);
        }
        Ok(page)
    }

    fn common_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![("Accept", "application/json".to_string())];
        if let Some(token) = &self.token {
            headers.push(("Authorization", format!("Bearer {}", token)));
        }
        headers
    }
}

fn check_status(response: CatalogResponse) -> Result<String, CatalogError> {
    if !(200..300).contains(&response.status) {
        return Err(CatalogError::Remote {
            status: response.status,
            body: response.body,
        });
    }
    Ok(response.body)
}
