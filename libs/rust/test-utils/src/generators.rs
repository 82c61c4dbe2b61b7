//! Shared proptest generators.

use proptest::prelude::*;

/// Generate OAuth client identifiers, both opaque and GUID shaped.
pub fn client_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9-]{2,40}",
        "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
        // Characters that need JSON or form escaping
        "[a-zA-Z0-9_.:/@+\"\\\\][a-zA-Z0-9 _.:/@+\"\\\\]{0,31}",
    ]
}

/// Generate token endpoint URLs.
pub fn token_endpoint_strategy() -> impl Strategy<Value = String> {
    (
        "[a-z][a-z0-9-]{1,20}",
        prop_oneof![Just("example.com"), Just("idp.example"), Just("login.example.org")],
        prop::collection::vec("[a-z0-9][a-z0-9_-]{0,12}", 0..4),
    )
        .prop_map(|(host, domain, segments)| {
            if segments.is_empty() {
                format!("https://{host}.{domain}/token")
            } else {
                format!("https://{host}.{domain}/{}/token", segments.join("/"))
            }
        })
}

/// Generate requested subjects for token exchange.
pub fn subject_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9._%+-]{0,20}@[a-z0-9-]{1,15}\\.[a-z]{2,4}",
        "[a-zA-Z0-9|:_-]{1,40}",
    ]
}

/// Generate SHA-256 certificate fingerprints as upper-case hex.
pub fn thumbprint_strategy() -> impl Strategy<Value = String> {
    "[0-9A-F]{64}"
}

/// Generate arbitrary payloads to sign.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..512)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn test_token_endpoint_is_https() {
        let mut runner = TestRunner::default();
        for _ in 0..50 {
            let endpoint = token_endpoint_strategy()
                .new_tree(&mut runner)
                .unwrap()
                .current();
            assert!(endpoint.starts_with("https://"));
            assert!(endpoint.ends_with("/token"));
        }
    }

    #[test]
    fn test_thumbprint_length() {
        let mut runner = TestRunner::default();
        let thumbprint = thumbprint_strategy().new_tree(&mut runner).unwrap().current();
        assert_eq!(thumbprint.len(), 64);
    }

    #[test]
    fn test_client_id_never_empty() {
        let mut runner = TestRunner::default();
        for _ in 0..50 {
            let id = client_id_strategy().new_tree(&mut runner).unwrap().current();
            assert!(!id.is_empty());
        }
    }
}
