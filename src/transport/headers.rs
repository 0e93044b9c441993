//! SDK header construction.

use crate::config::SDK_NAME;

/// Header IBM Cloud uses to attribute traffic to an SDK and operation.
pub const SDK_ANALYTICS_HEADER: &str = "x-ibmcloud-sdk-analytics";

/// `User-Agent` sent by the default transport.
pub fn user_agent() -> String {
    format!(
        "{}/{} ({};{})",
        SDK_NAME,
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Value of the analytics header for one operation.
pub fn sdk_analytics(service_name: &str, service_version: &str, operation_id: &str) -> String {
    format!(
        "service_name={};service_version={};operation_id={}",
        service_name, service_version, operation_id
    )
}
