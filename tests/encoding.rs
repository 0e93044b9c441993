//! Encoding properties of the request builder.

use std::time::Duration;

use proptest::prelude::*;
use watson_sdk::{HttpMethod, RequestBuilder, RetryPolicy};

const BASE: &str = "https://api.example.com/instances/abc";

fn path_value() -> impl Strategy<Value = String> {
    any::<String>().prop_filter("dot segments and empty values are rejected", |v| {
        !v.is_empty() && v != "." && v != ".."
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A path parameter occupies exactly one segment and decodes back to the input.
    #[test]
    fn prop_path_param_decodes_to_input(value in path_value()) {
        let req = RequestBuilder::new(HttpMethod::Get, BASE, "/v1/models/{model_id}/words")
            .with_path_param("model_id", &value)
            .build()
            .unwrap();

        let segments: Vec<&str> = req.url().path_segments().unwrap().collect();
        prop_assert_eq!(segments.len(), 6);
        prop_assert_eq!(segments[5], "words");
        let decoded = urlencoding::decode(segments[4]).unwrap();
        prop_assert_eq!(decoded.as_ref(), value.as_str());
    }

    /// Query values survive form encoding in the final URL.
    #[test]
    fn prop_query_value_round_trips(value in any::<String>(), count in any::<u32>()) {
        let req = RequestBuilder::new(HttpMethod::Get, BASE, "/v1/collections")
            .with_argument("name", value.as_str())
            .with_argument("count", count)
            .build()
            .unwrap();

        let url = req.full_url();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        prop_assert!(pairs.contains(&("name".to_string(), value.clone())));
        prop_assert!(pairs.contains(&("count".to_string(), count.to_string())));
    }

    /// Backoff never shrinks between attempts and never exceeds the cap.
    #[test]
    fn prop_backoff_is_monotonic_and_capped(
        initial_ms in 1u64..5_000,
        max_ms in 5_000u64..60_000,
        attempt in 0u32..20,
    ) {
        let policy = RetryPolicy::new()
            .with_initial_backoff(Duration::from_millis(initial_ms))
            .with_max_backoff(Duration::from_millis(max_ms));

        let current = policy.calculate_backoff(attempt);
        let next = policy.calculate_backoff(attempt + 1);
        prop_assert!(next >= current);
        prop_assert!(next <= Duration::from_millis(max_ms));
    }
}
