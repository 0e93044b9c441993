//! Watson Discovery v1.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::auth::Authenticator;
use crate::config::ServiceSettings;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::request::{FilePart, MultipartForm, RequestBuilder};
use crate::response::{Json, ServiceResponse};
use crate::service::BaseService;
use crate::validation::require_non_empty;

const LIST_COLLECTIONS: Endpoint = Endpoint::get(
    "list_collections",
    "/v1/environments/{environment_id}/collections",
);
const GET_COLLECTION: Endpoint = Endpoint::get(
    "get_collection",
    "/v1/environments/{environment_id}/collections/{collection_id}",
);
const DELETE_COLLECTION: Endpoint = Endpoint::delete(
    "delete_collection",
    "/v1/environments/{environment_id}/collections/{collection_id}",
);
const ADD_DOCUMENT: Endpoint = Endpoint::post(
    "add_document",
    "/v1/environments/{environment_id}/collections/{collection_id}/documents",
);

/// Watson Discovery v1 client.
#[derive(Debug, Clone)]
pub struct DiscoveryV1 {
    base: BaseService,
    version: String,
}

impl DiscoveryV1 {
    pub const SERVICE_NAME: &'static str = "discovery";
    pub const SERVICE_VERSION: &'static str = "V1";

    pub fn new(
        version: impl Into<String>,
        service_url: impl Into<String>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        let base = BaseService::builder(Self::SERVICE_NAME, Self::SERVICE_VERSION)
            .service_url(service_url)
            .authenticator(authenticator)
            .build()?;
        Self::with_base(version, base)
    }

    pub fn with_base(version: impl Into<String>, base: BaseService) -> Result<Self> {
        let version = version.into();
        require_non_empty("version", &version)?;
        Ok(Self { base, version })
    }

    pub fn from_settings(settings: &ServiceSettings) -> Result<Self> {
        let (base, version) =
            super::from_settings(Self::SERVICE_NAME, Self::SERVICE_VERSION, settings)?;
        Ok(Self { base, version })
    }

    pub fn base(&self) -> &BaseService {
        &self.base
    }

    /// List collections, optionally filtered by exact `name`.
    pub async fn list_collections(
        &self,
        environment_id: &str,
        name: Option<&str>,
    ) -> Result<ServiceResponse<ListCollectionsResponse>> {
        self.base
            .invoke::<Json<ListCollectionsResponse>, _>(&LIST_COLLECTIONS, |req| {
                require_non_empty("environment_id", environment_id)?;
                Ok(req
                    .with_path_param("environment_id", environment_id)
                    .with_argument("version", self.version.as_str())
                    .with_optional_argument("name", name))
            })
            .await
    }

    pub async fn get_collection(
        &self,
        environment_id: &str,
        collection_id: &str,
    ) -> Result<ServiceResponse<Collection>> {
        self.base
            .invoke::<Json<Collection>, _>(&GET_COLLECTION, |req| {
                self.collection_request(req, environment_id, collection_id)
            })
            .await
    }

    pub async fn delete_collection(
        &self,
        environment_id: &str,
        collection_id: &str,
    ) -> Result<ServiceResponse<DeleteCollectionResponse>> {
        self.base
            .invoke::<Json<DeleteCollectionResponse>, _>(&DELETE_COLLECTION, |req| {
                self.collection_request(req, environment_id, collection_id)
            })
            .await
    }

    /// Upload a document for ingestion. At least one of `file` or `metadata`
    /// must be supplied; the file part is always sent as `file`.
    pub async fn add_document(
        &self,
        environment_id: &str,
        collection_id: &str,
        document: AddDocument,
    ) -> Result<ServiceResponse<DocumentAccepted>> {
        self.base
            .invoke::<Json<DocumentAccepted>, _>(&ADD_DOCUMENT, |req| {
                let req = self.collection_request(req, environment_id, collection_id)?;
                if document.file.is_none() && document.metadata.is_none() {
                    return Err(Error::missing("file"));
                }
                let mut form = MultipartForm::new();
                if let Some(file) = document.file {
                    form = form.file(file.named("file"));
                }
                if let Some(metadata) = &document.metadata {
                    form = form.text("metadata", metadata.to_string());
                }
                req.with_multipart_form(form)
            })
            .await
    }

    fn collection_request(
        &self,
        req: RequestBuilder,
        environment_id: &str,
        collection_id: &str,
    ) -> Result<RequestBuilder> {
        require_non_empty("environment_id", environment_id)?;
        require_non_empty("collection_id", collection_id)?;
        Ok(req
            .with_path_param("environment_id", environment_id)
            .with_path_param("collection_id", collection_id)
            .with_argument("version", self.version.as_str()))
    }
}

// ── Models ───────────────────────────────────────────────────────────

/// Document upload for [`DiscoveryV1::add_document`].
#[derive(Debug, Clone, Default)]
pub struct AddDocument {
    pub file: Option<FilePart>,
    /// Arbitrary JSON metadata stored with the document.
    pub metadata: Option<Value>,
}

impl AddDocument {
    pub fn file(file: FilePart) -> Self {
        Self {
            file: Some(file),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListCollectionsResponse {
    #[serde(default)]
    pub collections: Vec<Collection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    pub collection_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub configuration_id: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteCollectionResponse {
    pub collection_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentAccepted {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Notice {
    #[serde(default)]
    pub notice_id: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_deserialization() {
        let list: ListCollectionsResponse = serde_json::from_value(serde_json::json!({
            "collections": [
                {"collection_id": "c1", "name": "news", "status": "active", "language": "en"},
                {"collection_id": "c2"}
            ]
        }))
        .unwrap();
        assert_eq!(list.collections.len(), 2);
        assert_eq!(list.collections[0].name.as_deref(), Some("news"));
        assert!(list.collections[1].name.is_none());
    }

    #[test]
    fn test_document_accepted_without_notices() {
        let accepted: DocumentAccepted =
            serde_json::from_str(r#"{"document_id":"d1","status":"processing"}"#).unwrap();
        assert_eq!(accepted.document_id.as_deref(), Some("d1"));
        assert!(accepted.notices.is_empty());
    }
}
