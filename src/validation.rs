//! Required-argument and credential checks used by service facades.
//!
//! Facades call these before touching the request builder, authenticator or
//! transport, so a bad argument never costs a network round trip.

use crate::error::{Error, Result};

/// Fails with [`Error::MissingArgument`] if `value` is empty or whitespace.
pub fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::missing(name));
    }
    Ok(())
}

/// Unwraps an optional argument, failing with [`Error::MissingArgument`].
pub fn require_present<'a, T>(name: &str, value: Option<&'a T>) -> Result<&'a T> {
    value.ok_or_else(|| Error::missing(name))
}

/// Fails if a collection argument has no elements.
pub fn require_non_empty_collection<T>(name: &str, items: &[T]) -> Result<()> {
    if items.is_empty() {
        return Err(Error::missing(name));
    }
    Ok(())
}

/// Validate a service URL: must be absolute http(s) and parseable.
pub fn validate_service_url(name: &str, value: &str) -> Result<url::Url> {
    require_non_empty(name, value)?;
    if has_bad_first_or_last_char(value) {
        return Err(Error::invalid(
            name,
            "value must not start or end with '{', '}' or '\"'",
        ));
    }
    let parsed =
        url::Url::parse(value).map_err(|e| Error::invalid(name, format!("not a valid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(Error::invalid(
            name,
            format!("unsupported scheme '{other}' (expected http or https)"),
        )),
    }
}

/// Validate a credential value (API key, password, token).
///
/// Rejects empty values and values still wrapped in braces or quotes, which
/// usually means a placeholder such as `{apikey}` was pasted verbatim.
pub fn validate_credential(name: &str, value: &str) -> Result<()> {
    require_non_empty(name, value)?;
    if has_bad_first_or_last_char(value) {
        return Err(Error::invalid(
            name,
            "credential must not start or end with '{', '}' or '\"'; remove the placeholder braces or quotes",
        ));
    }
    Ok(())
}

fn has_bad_first_or_last_char(value: &str) -> bool {
    const BAD: [char; 3] = ['{', '}', '"'];
    value.starts_with(BAD) || value.ends_with(BAD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("collection_id", "abc").is_ok());

        let err = require_non_empty("collection_id", "").unwrap_err();
        assert!(matches!(&err, Error::MissingArgument { name } if name == "collection_id"));
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(require_non_empty("collection_id", "   ").is_err());
    }

    #[test]
    fn test_require_present() {
        let value = Some(3u32);
        assert_eq!(*require_present("threshold", value.as_ref()).unwrap(), 3);
        let none: Option<u32> = None;
        assert!(require_present("threshold", none.as_ref()).is_err());
    }

    #[test]
    fn test_require_non_empty_collection() {
        assert!(require_non_empty_collection("examples", &[1]).is_ok());
        let empty: [u8; 0] = [];
        assert!(require_non_empty_collection("examples", &empty).is_err());
    }

    #[test]
    fn test_validate_service_url() {
        assert!(validate_service_url("url", "https://api.us-south.assistant.watson.cloud.ibm.com").is_ok());
        assert!(validate_service_url("url", "http://localhost:8080/api").is_ok());
        assert!(validate_service_url("url", "ftp://example.com").is_err());
        assert!(validate_service_url("url", "not a url").is_err());
        assert!(validate_service_url("url", "{url}").is_err());
        assert!(validate_service_url("url", "").is_err());
    }

    #[test]
    fn test_validate_credential() {
        assert!(validate_credential("apikey", "abc123").is_ok());
        assert!(validate_credential("apikey", "{apikey}").is_err());
        assert!(validate_credential("apikey", "\"abc\"").is_err());
        assert!(validate_credential("apikey", "").is_err());
    }
}
