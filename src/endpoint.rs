//! Declarative operation descriptors.
//!
//! Each facade operation is a `const Endpoint`; [`BaseService::invoke`]
//! turns it into a request.
//!
//! [`BaseService::invoke`]: crate::service::BaseService::invoke

use crate::request::HttpMethod;

/// Static description of one REST operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Operation id reported in the SDK analytics header and in errors.
    pub operation_id: &'static str,
    pub method: HttpMethod,
    /// Path template relative to the service URL, e.g. `/v2/assistants/{assistant_id}/sessions`.
    pub path: &'static str,
}

impl Endpoint {
    pub const fn new(operation_id: &'static str, method: HttpMethod, path: &'static str) -> Self {
        Self {
            operation_id,
            method,
            path,
        }
    }

    pub const fn get(operation_id: &'static str, path: &'static str) -> Self {
        Self::new(operation_id, HttpMethod::Get, path)
    }

    pub const fn post(operation_id: &'static str, path: &'static str) -> Self {
        Self::new(operation_id, HttpMethod::Post, path)
    }

    pub const fn delete(operation_id: &'static str, path: &'static str) -> Self {
        Self::new(operation_id, HttpMethod::Delete, path)
    }

    /// Names of the `{placeholders}` in the path template, in order.
    pub fn path_params(&self) -> impl Iterator<Item = &'static str> {
        let path: &'static str = self.path;
        path.split('{')
            .skip(1)
            .filter_map(|segment| segment.split_once('}').map(|(name, _)| name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GET_COLLECTION: Endpoint = Endpoint::get(
        "get_collection",
        "/v1/environments/{environment_id}/collections/{collection_id}",
    );

    #[test]
    fn test_path_params() {
        let params: Vec<_> = GET_COLLECTION.path_params().collect();
        assert_eq!(params, vec!["environment_id", "collection_id"]);
        assert_eq!(GET_COLLECTION.method, HttpMethod::Get);
    }

    #[test]
    fn test_no_path_params() {
        let list = Endpoint::get("list_models", "/v1/models");
        assert_eq!(list.path_params().count(), 0);
    }
}
