//! Typed facades over individual Watson services.
//!
//! Each facade wraps a [`BaseService`] and declares its operations as
//! `const` [`Endpoint`](crate::endpoint::Endpoint)s. Required identifiers
//! are checked before any authentication or network I/O.

pub mod assistant;
pub mod compare_comply;
pub mod discovery;
pub mod speech_to_text;
pub mod visual_recognition;

pub use assistant::AssistantV2;
pub use compare_comply::CompareComplyV1;
pub use discovery::DiscoveryV1;
pub use speech_to_text::SpeechToTextV1;
pub use visual_recognition::VisualRecognitionV3;

use crate::config::ServiceSettings;
use crate::error::{Error, Result};
use crate::service::BaseService;
use crate::validation::require_non_empty;

/// Build a [`BaseService`] and API version for a facade from file settings.
pub(crate) fn from_settings(
    service_name: &str,
    service_version: &str,
    settings: &ServiceSettings,
) -> Result<(BaseService, String)> {
    let version = settings
        .version
        .clone()
        .ok_or_else(|| Error::missing("version"))?;
    require_non_empty("version", &version)?;
    let base = BaseService::builder(service_name, service_version)
        .settings(settings)?
        .build()?;
    Ok((base, version))
}
