//! Watson Assistant v2.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::Authenticator;
use crate::config::ServiceSettings;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::response::{Json, NoContent, ServiceResponse};
use crate::service::BaseService;
use crate::validation::require_non_empty;

const CREATE_SESSION: Endpoint =
    Endpoint::post("create_session", "/v2/assistants/{assistant_id}/sessions");
const DELETE_SESSION: Endpoint = Endpoint::delete(
    "delete_session",
    "/v2/assistants/{assistant_id}/sessions/{session_id}",
);
const MESSAGE: Endpoint = Endpoint::post(
    "message",
    "/v2/assistants/{assistant_id}/sessions/{session_id}/message",
);

/// Watson Assistant v2 client.
#[derive(Debug, Clone)]
pub struct AssistantV2 {
    base: BaseService,
    version: String,
}

impl AssistantV2 {
    pub const SERVICE_NAME: &'static str = "conversation";
    pub const SERVICE_VERSION: &'static str = "V2";

    /// Client for `service_url` using the default transport.
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

    /// Create a session for a conversation with an assistant.
    pub async fn create_session(
        &self,
        assistant_id: &str,
    ) -> Result<ServiceResponse<SessionResponse>> {
        self.base
            .invoke::<Json<SessionResponse>, _>(&CREATE_SESSION, |req| {
                require_non_empty("assistant_id", assistant_id)?;
                Ok(req
                    .with_path_param("assistant_id", assistant_id)
                    .with_argument("version", self.version.as_str()))
            })
            .await
    }

    /// Delete a session before it times out.
    pub async fn delete_session(
        &self,
        assistant_id: &str,
        session_id: &str,
    ) -> Result<ServiceResponse<()>> {
        self.base
            .invoke::<NoContent, _>(&DELETE_SESSION, |req| {
                require_non_empty("assistant_id", assistant_id)?;
                require_non_empty("session_id", session_id)?;
                Ok(req
                    .with_path_param("assistant_id", assistant_id)
                    .with_path_param("session_id", session_id)
                    .with_argument("version", self.version.as_str()))
            })
            .await
    }

    /// Send user input to an assistant and receive its response.
    pub async fn message(
        &self,
        assistant_id: &str,
        session_id: &str,
        request: &MessageRequest,
    ) -> Result<ServiceResponse<MessageResponse>> {
        self.base
            .invoke::<Json<MessageResponse>, _>(&MESSAGE, |req| {
                require_non_empty("assistant_id", assistant_id)?;
                require_non_empty("session_id", session_id)?;
                req.with_path_param("assistant_id", assistant_id)
                    .with_path_param("session_id", session_id)
                    .with_argument("version", self.version.as_str())
                    .with_json_body(request)
            })
            .await
    }
}

// ── Models ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
}

/// Body of a `message` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<MessageInput>,
    /// Conversation state returned by a previous call; opaque to the SDK.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl MessageRequest {
    /// A plain-text user utterance.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            input: Some(MessageInput {
                message_type: Some("text".into()),
                text: Some(text.into()),
                options: None,
            }),
            context: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<MessageInputOptions>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageInputOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_context: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub output: MessageOutput,
    #[serde(default)]
    pub context: Option<Value>,
}

impl MessageResponse {
    /// Text of all `text` responses, one per line.
    pub fn text(&self) -> String {
        self.output
            .generic
            .iter()
            .filter_map(|g| g.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageOutput {
    #[serde(default)]
    pub generic: Vec<RuntimeResponseGeneric>,
    #[serde(default)]
    pub intents: Vec<RuntimeIntent>,
    #[serde(default)]
    pub entities: Vec<RuntimeEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeResponseGeneric {
    pub response_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeIntent {
    pub intent: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeEntity {
    pub entity: String,
    pub value: String,
    #[serde(default)]
    pub location: Vec<u32>,
    #[serde(default)]
    pub confidence: Option<f64>,
}
