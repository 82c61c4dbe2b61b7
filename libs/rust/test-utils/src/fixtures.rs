//! PEM fixtures.
//!
//! Keys and self-signed certificates were generated once with `openssl` and
//! are checked in under `fixtures/`. They exist only for tests.

use std::path::PathBuf;

/// PKCS#8 private key of the signing certificate.
pub const SIGNING_KEY_PEM: &str = include_str!("../fixtures/signing.key");

/// SPKI public key matching [`SIGNING_KEY_PEM`].
pub const SIGNING_PUBLIC_KEY_PEM: &str = include_str!("../fixtures/signing.pub.pem");

/// A PKCS#8 RSA key unrelated to any certificate in the store.
pub const UNRELATED_KEY_PEM: &str = include_str!("../fixtures/unrelated.key");

/// Certificate plus PKCS#8 key, key usage `digitalSignature`.
pub const SIGNING_CERT_BUNDLE_PEM: &str = include_str!("../fixtures/store/signing.pem");

/// Certificate without a private key.
pub const PUBLIC_ONLY_CERT_PEM: &str = include_str!("../fixtures/store/public-only.pem");

/// Certificate plus PKCS#1 key, key usage `keyEncipherment` only.
pub const ENCIPHER_ONLY_CERT_BUNDLE_PEM: &str =
    include_str!("../fixtures/store/encipher-only.pem");

/// SHA-256 fingerprint of the signing certificate, as printed by `openssl x509 -fingerprint`.
pub const SIGNING_CERT_FINGERPRINT: &str =
    "8C:75:5C:E9:CC:D8:89:8D:49:87:F0:95:EE:2F:C9:93:18:2C:29:69:5B:E2:0F:EB:EF:DC:3B:A6:C1:37:AE:69";

/// SHA-1 fingerprint of the signing certificate, the form Windows tooling shows.
pub const SIGNING_CERT_SHA1_FINGERPRINT: &str =
    "89:D4:D0:9D:12:5C:78:28:33:00:C6:09:C5:E0:1A:9C:9D:54:CD:EF";

/// SHA-256 fingerprint of the public-only certificate.
pub const PUBLIC_ONLY_CERT_FINGERPRINT: &str =
    "7F:F2:E9:D0:7F:FC:A5:17:31:FA:84:1B:A0:0A:73:90:B0:FD:A9:D3:1B:54:A8:DE:70:39:51:41:E6:32:B8:A9";

/// SHA-256 fingerprint of the encipher-only certificate.
pub const ENCIPHER_ONLY_CERT_FINGERPRINT: &str =
    "77:CD:62:06:65:46:D1:21:66:94:F3:99:77:2A:76:2D:9C:30:5F:56:96:07:50:AA:9F:57:28:4B:8F:1F:CB:99";

/// Directory holding the three certificate bundles above.
#[must_use]
pub fn certificate_store_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures").join("store")
}

/// Extract the first PEM block with the given label.
///
/// Returns the whole `-----BEGIN ...-----` to `-----END ...-----` block.
#[must_use]
pub fn pem_block(bundle: &str, label: &str) -> Option<String> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");
    let start = bundle.find(&begin)?;
    let stop = bundle[start..].find(&end)? + start + end.len();
    Some(format!("{}\n", &bundle[start..stop]))
}
