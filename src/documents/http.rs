use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{DocumentRef, DocumentSource};
use crate::errors::DocumentError;

/// Path of the document list on the dashboard origin.
const DOCUMENTS_PATH: &str = "/api/documents";

#[derive(Debug, Deserialize)]
struct DocumentListResponse {
    #[serde(default)]
    documents: Option<Vec<DocumentRef>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentContentResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Fetches documents from the dashboard backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDocumentSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpDocumentSource {
    /// `page` is the dashboard page URL; only its origin is used.
    pub fn new(page: &Url) -> Result<Self, DocumentError> {
        let mut base = page.clone();
        match base.scheme() {
            "http" | "https" => {}
            "ws" => base
                .set_scheme("http")
                .map_err(|_| DocumentError::InvalidUrl(page.to_string()))?,
            "wss" => base
                .set_scheme("https")
                .map_err(|_| DocumentError::InvalidUrl(page.to_string()))?,
            _ => return Err(DocumentError::InvalidUrl(page.to_string())),
        }
        base.set_path(DOCUMENTS_PATH);
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }

    pub fn list_url(&self) -> &Url {
        &self.base
    }

    pub fn document_url(&self, id: &str) -> Result<Url, DocumentError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DocumentError::InvalidUrl(self.base.to_string()))?
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn list(&self) -> Result<Vec<DocumentRef>, DocumentError> {
        let resp: DocumentListResponse = self
            .client
            .get(self.base.clone())
            .send()
            .await?
            .json()
            .await?;
        if let Some(error) = resp.error {
            return Err(DocumentError::Backend(error));
        }
        Ok(resp.documents.unwrap_or_default())
    }

    async fn fetch(&self, id: &str) -> Result<String, DocumentError> {
        // Error responses still carry a JSON body with an `error` field, so
        // the status code is not checked first.
        let resp: DocumentContentResponse = self
            .client
            .get(self.document_url(id)?)
            .send()
            .await?
            .json()
            .await?;
        match (resp.content, resp.error) {
            (_, Some(error)) => Err(DocumentError::Backend(error)),
            (Some(content), None) => Ok(content),
            (None, None) => Err(DocumentError::EmptyResponse { id: id.to_string() }),
        }
    }
}
