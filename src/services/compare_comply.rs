//! Watson Compare and Comply v1.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::auth::Authenticator;
use crate::config::ServiceSettings;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::request::{FilePart, MultipartForm};
use crate::response::{Json, ServiceResponse};
use crate::service::BaseService;
use crate::validation::require_non_empty;

const CONVERT_TO_HTML: Endpoint = Endpoint::post("convert_to_html", "/v1/html_conversion");
const COMPARE_DOCUMENTS: Endpoint = Endpoint::post("compare_documents", "/v1/comparison");

/// Watson Compare and Comply v1 client.
#[derive(Debug, Clone)]
pub struct CompareComplyV1 {
    base: BaseService,
    version: String,
}

impl CompareComplyV1 {
    pub const SERVICE_NAME: &'static str = "compare-comply";
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

    /// Convert a PDF, Word or image document to HTML.
    pub async fn convert_to_html(
        &self,
        file: FilePart,
        model: Option<&str>,
    ) -> Result<ServiceResponse<HtmlReturn>> {
        self.base
            .invoke::<Json<HtmlReturn>, _>(&CONVERT_TO_HTML, |req| {
                require_non_empty("file", &file.filename)?;
                req.with_argument("version", self.version.as_str())
                    .with_optional_argument("model", model)
                    .with_multipart_form(MultipartForm::new().file(file.named("file")))
            })
            .await
    }

    /// Compare two contract documents.
    pub async fn compare_documents(
        &self,
        file_1: FilePart,
        file_2: FilePart,
        options: &CompareOptions,
    ) -> Result<ServiceResponse<CompareReturn>> {
        self.base
            .invoke::<Json<CompareReturn>, _>(&COMPARE_DOCUMENTS, |req| {
                require_non_empty("file_1", &file_1.filename)?;
                require_non_empty("file_2", &file_2.filename)?;
                let form = MultipartForm::new()
                    .file(file_1.named("file_1"))
                    .file(file_2.named("file_2"));
                req.with_argument("version", self.version.as_str())
                    .with_optional_argument("file_1_label", options.file_1_label.as_deref())
                    .with_optional_argument("file_2_label", options.file_2_label.as_deref())
                    .with_optional_argument("model", options.model.as_deref())
                    .with_multipart_form(form)
            })
            .await
    }
}

// ── Models ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    pub file_1_label: Option<String>,
    pub file_2_label: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HtmlReturn {
    #[serde(default)]
    pub num_pages: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareReturn {
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub model_version: Option<String>,
    #[serde(default)]
    pub documents: Vec<Document>,
    /// Element alignment details; their shape varies by model.
    #[serde(default)]
    pub aligned_elements: Vec<Value>,
    #[serde(default)]
    pub unaligned_elements: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}
