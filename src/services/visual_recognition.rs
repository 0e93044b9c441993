//! Watson Visual Recognition v3.

use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;

use crate::auth::Authenticator;
use crate::config::ServiceSettings;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::request::{FilePart, MultipartForm, OCTET_STREAM};
use crate::response::{Binary, Json, NoContent, ServiceResponse};
use crate::service::BaseService;
use crate::validation::{require_non_empty, require_non_empty_collection};

const CLASSIFY: Endpoint = Endpoint::post("classify", "/v3/classify");
const CREATE_CLASSIFIER: Endpoint = Endpoint::post("create_classifier", "/v3/classifiers");
const DELETE_CLASSIFIER: Endpoint =
    Endpoint::delete("delete_classifier", "/v3/classifiers/{classifier_id}");
const GET_CORE_ML_MODEL: Endpoint = Endpoint::get(
    "get_core_ml_model",
    "/v3/classifiers/{classifier_id}/core_ml_model",
);

/// Watson Visual Recognition v3 client.
#[derive(Debug, Clone)]
pub struct VisualRecognitionV3 {
    base: BaseService,
    version: String,
}

impl VisualRecognitionV3 {
    pub const SERVICE_NAME: &'static str = "watson_vision_combined";
    pub const SERVICE_VERSION: &'static str = "V3";

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

    /// Classify an uploaded image (or zip of images) and/or an image URL.
    pub async fn classify(
        &self,
        options: ClassifyOptions,
    ) -> Result<ServiceResponse<ClassifiedImages>> {
        self.base
            .invoke::<Json<ClassifiedImages>, _>(&CLASSIFY, |req| {
                if options.images_file.is_none() && options.url.is_none() {
                    return Err(Error::missing("images_file"));
                }

                let mut form = MultipartForm::new();
                if let Some(file) = options.images_file {
                    form = form.file(file.named("images_file"));
                }
                form = form
                    .text_opt("url", options.url.as_deref())
                    .text_opt("threshold", options.threshold);
                if !options.owners.is_empty() {
                    form = form.text("owners", options.owners.as_slice());
                }
                if !options.classifier_ids.is_empty() {
                    form = form.text("classifier_ids", options.classifier_ids.as_slice());
                }

                let mut req = req.with_argument("version", self.version.as_str());
                if let Some(language) = &options.accept_language {
                    req = req.with_header("Accept-Language", language);
                }
                req.with_multipart_form(form)
            })
            .await
    }

    /// Train a custom classifier from zipped example sets.
    pub async fn create_classifier(
        &self,
        options: CreateClassifierOptions,
    ) -> Result<ServiceResponse<Classifier>> {
        self.base
            .invoke::<Json<Classifier>, _>(&CREATE_CLASSIFIER, |req| {
                require_non_empty("name", &options.name)?;
                require_non_empty_collection("positive_examples", &options.positive_examples)?;

                let mut form = MultipartForm::new().text("name", options.name.as_str());
                for examples in options.positive_examples {
                    require_non_empty("positive_examples", &examples.class)?;
                    let field = format!("{}_positive_examples", examples.class);
                    let filename = format!("{}.zip", examples.class);
                    form = form.file(FilePart::zip(field, filename, examples.data));
                }
                if let Some(negative) = options.negative_examples {
                    form = form.file(FilePart::zip(
                        "negative_examples",
                        "negative_examples.zip",
                        negative,
                    ));
                }
                req.with_argument("version", self.version.as_str())
                    .with_multipart_form(form)
            })
            .await
    }

    pub async fn delete_classifier(&self, classifier_id: &str) -> Result<ServiceResponse<()>> {
        self.base
            .invoke::<NoContent, _>(&DELETE_CLASSIFIER, |req| {
                require_non_empty("classifier_id", classifier_id)?;
                Ok(req
                    .with_path_param("classifier_id", classifier_id)
                    .with_argument("version", self.version.as_str()))
            })
            .await
    }

    /// Download a Core ML model of a classifier.
    pub async fn get_core_ml_model(&self, classifier_id: &str) -> Result<ServiceResponse<Bytes>> {
        self.base
            .invoke::<Binary, _>(&GET_CORE_ML_MODEL, |req| {
                require_non_empty("classifier_id", classifier_id)?;
                Ok(req
                    .with_path_param("classifier_id", classifier_id)
                    .with_argument("version", self.version.as_str())
                    .with_header("Accept", OCTET_STREAM))
            })
            .await
    }
}

// ── Models ───────────────────────────────────────────────────────────

/// Arguments for [`VisualRecognitionV3::classify`].
#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    /// Image or zip of images; sent as the `images_file` part.
    pub images_file: Option<FilePart>,
    pub url: Option<String>,
    pub threshold: Option<f32>,
    pub owners: Vec<String>,
    pub classifier_ids: Vec<String>,
    pub accept_language: Option<String>,
}

impl ClassifyOptions {
    pub fn file(images_file: FilePart) -> Self {
        Self {
            images_file: Some(images_file),
            ..Default::default()
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_classifier_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classifier_ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Zipped positive examples for one class.
#[derive(Debug, Clone)]
pub struct ExampleSet {
    pub class: String,
    pub data: Bytes,
}

impl ExampleSet {
    pub fn new(class: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            class: class.into(),
            data: data.into(),
        }
    }
}

/// Arguments for [`VisualRecognitionV3::create_classifier`].
#[derive(Debug, Clone, Default)]
pub struct CreateClassifierOptions {
    pub name: String,
    pub positive_examples: Vec<ExampleSet>,
    pub negative_examples: Option<Bytes>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifiedImages {
    #[serde(default)]
    pub images: Vec<ClassifiedImage>,
    #[serde(default)]
    pub images_processed: Option<u32>,
    #[serde(default)]
    pub custom_classes: Option<u32>,
    #[serde(default)]
    pub warnings: Vec<WarningInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifiedImage {
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub resolved_url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub classifiers: Vec<ClassifierResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierResult {
    pub name: String,
    pub classifier_id: String,
    #[serde(default)]
    pub classes: Vec<ClassResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassResult {
    #[serde(rename = "class")]
    pub class_name: String,
    pub score: f64,
    #[serde(default)]
    pub type_hierarchy: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarningInfo {
    pub warning_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Classifier {
    pub classifier_id: String,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub core_ml_enabled: Option<bool>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub classes: Vec<ClassifierClass>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierClass {
    #[serde(rename = "class")]
    pub class_name: String,
}
