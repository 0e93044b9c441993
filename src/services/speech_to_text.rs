//! Watson Speech to Text v1.
//!
//! Speech to Text is not versioned by date, so this facade sends no
//! `version` argument.

use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;

use crate::auth::Authenticator;
use crate::config::ServiceSettings;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::response::{Json, ServiceResponse};
use crate::service::BaseService;
use crate::validation::{require_non_empty, require_present};

const LIST_MODELS: Endpoint = Endpoint::get("list_models", "/v1/models");
const GET_MODEL: Endpoint = Endpoint::get("get_model", "/v1/models/{model_id}");
const RECOGNIZE: Endpoint = Endpoint::post("recognize", "/v1/recognize");

/// Watson Speech to Text v1 client.
#[derive(Debug, Clone)]
pub struct SpeechToTextV1 {
    base: BaseService,
}

impl SpeechToTextV1 {
    pub const SERVICE_NAME: &'static str = "speech_to_text";
    pub const SERVICE_VERSION: &'static str = "V1";

    pub fn new(service_url: impl Into<String>, authenticator: Arc<dyn Authenticator>) -> Result<Self> {
        let base = BaseService::builder(Self::SERVICE_NAME, Self::SERVICE_VERSION)
            .service_url(service_url)
            .authenticator(authenticator)
            .build()?;
        Ok(Self::with_base(base))
    }

    pub fn with_base(base: BaseService) -> Self {
        Self { base }
    }

    /// Any `version` in the settings is ignored.
    pub fn from_settings(settings: &ServiceSettings) -> Result<Self> {
        let base = BaseService::builder(Self::SERVICE_NAME, Self::SERVICE_VERSION)
            .settings(settings)?
            .build()?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &BaseService {
        &self.base
    }

    pub async fn list_models(&self) -> Result<ServiceResponse<SpeechModels>> {
        self.base
            .invoke::<Json<SpeechModels>, _>(&LIST_MODELS, Ok)
            .await
    }

    pub async fn get_model(&self, model_id: &str) -> Result<ServiceResponse<SpeechModel>> {
        self.base
            .invoke::<Json<SpeechModel>, _>(&GET_MODEL, |req| {
                require_non_empty("model_id", model_id)?;
                Ok(req.with_path_param("model_id", model_id))
            })
            .await
    }

    /// Transcribe `audio` sent as the raw request body.
    ///
    /// `content_type` is the audio format, e.g. `audio/flac` or
    /// `audio/l16;rate=16000`.
    pub async fn recognize(
        &self,
        audio: Bytes,
        content_type: &str,
        options: &RecognizeOptions,
    ) -> Result<ServiceResponse<SpeechRecognitionResults>> {
        self.base
            .invoke::<Json<SpeechRecognitionResults>, _>(&RECOGNIZE, |req| {
                if audio.is_empty() {
                    return Err(Error::missing("audio"));
                }
                require_non_empty("content_type", content_type)?;
                let mut req = req
                    .with_optional_argument("model", options.model.as_deref())
                    .with_optional_argument(
                        "language_customization_id",
                        options.language_customization_id.as_deref(),
                    )
                    .with_optional_argument("timestamps", options.timestamps)
                    .with_optional_argument("word_confidence", options.word_confidence)
                    .with_optional_argument("max_alternatives", options.max_alternatives)
                    .with_optional_argument("smart_formatting", options.smart_formatting)
                    .with_optional_argument("speaker_labels", options.speaker_labels)
                    .with_optional_argument("profanity_filter", options.profanity_filter);
                if !options.keywords.is_empty() {
                    let threshold =
                        require_present("keywords_threshold", options.keywords_threshold.as_ref())?;
                    req = req
                        .with_argument("keywords", options.keywords.as_slice())
                        .with_argument("keywords_threshold", *threshold);
                }
                req.with_body_content(audio, content_type)
            })
            .await
    }
}

// ── Models ───────────────────────────────────────────────────────────

/// Optional arguments for [`SpeechToTextV1::recognize`].
#[derive(Debug, Clone, Default)]
pub struct RecognizeOptions {
    pub model: Option<String>,
    pub language_customization_id: Option<String>,
    pub timestamps: Option<bool>,
    pub word_confidence: Option<bool>,
    pub max_alternatives: Option<u32>,
    pub smart_formatting: Option<bool>,
    pub speaker_labels: Option<bool>,
    pub profanity_filter: Option<bool>,
    /// Requires `keywords_threshold` when non-empty.
    pub keywords: Vec<String>,
    pub keywords_threshold: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechModels {
    #[serde(default)]
    pub models: Vec<SpeechModel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechModel {
    pub name: String,
    pub language: String,
    pub rate: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub supported_features: Option<SupportedFeatures>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupportedFeatures {
    pub custom_language_model: bool,
    #[serde(default)]
    pub speaker_labels: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRecognitionResults {
    #[serde(default)]
    pub results: Vec<SpeechRecognitionResult>,
    #[serde(default)]
    pub result_index: Option<u32>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl SpeechRecognitionResults {
    /// Best transcript of each final result, joined by spaces.
    pub fn transcript(&self) -> String {
        self.results
            .iter()
            .filter(|r| r.is_final)
            .filter_map(|r| r.alternatives.first())
            .map(|a| a.transcript.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRecognitionResult {
    #[serde(rename = "final")]
    pub is_final: bool,
    #[serde(default)]
    pub alternatives: Vec<SpeechRecognitionAlternative>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRecognitionAlternative {
    pub transcript: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}
