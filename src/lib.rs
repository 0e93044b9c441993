//! # watson-sdk
//!
//! Async Rust client for IBM Watson services.
//!
//! Every operation goes through one pipeline: a [`RequestBuilder`] assembles
//! the call, an [`Authenticator`] attaches credentials (fetching and caching
//! IAM or Cloud Pak tokens as needed), a [`Transport`] sends it, and the
//! response mapper turns the outcome into a [`ServiceResponse`] or an
//! [`Error`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use watson_sdk::auth::IamAuthenticator;
//! use watson_sdk::services::AssistantV2;
//! use watson_sdk::services::assistant::MessageRequest;
//!
//! #[tokio::main]
//! async fn main() -> watson_sdk::Result<()> {
//!     let auth = Arc::new(IamAuthenticator::iam("my-apikey")?);
//!     let assistant = AssistantV2::new(
//!         "2020-04-01",
//!         "https://api.us-south.assistant.watson.cloud.ibm.com",
//!         auth,
//!     )?;
//!
//!     let session = assistant.create_session("my-assistant-id").await?.into_result();
//!     let reply = assistant
//!         .message("my-assistant-id", &session.session_id, &MessageRequest::text("Hello"))
//!         .await?;
//!
//!     println!("{}", reply.result.text());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod request;
pub mod response;
pub mod retry;
pub mod service;
pub mod services;
pub mod transport;
pub mod validation;

// Re-exports for ergonomic usage
pub use auth::{Authenticator, Credential};
pub use config::{AuthSettings, SdkConfig, ServiceSettings};
pub use endpoint::Endpoint;
pub use error::{Error, ErrorKind, Result, ServiceError};
pub use request::{FilePart, FormPart, HttpMethod, MultipartForm, PendingRequest, RequestBuilder};
pub use response::{Binary, Json, NoContent, RawResponse, ServiceResponse};
pub use retry::{RetryPolicy, with_retry};
pub use service::{BaseService, CallPhase};
pub use transport::{ReqwestTransport, Transport};
