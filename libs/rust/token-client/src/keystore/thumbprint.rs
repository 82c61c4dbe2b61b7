//! Certificate thumbprints.

use crate::error::{TokenClientError, TokenClientResult};
use ring::digest::{SHA1_FOR_LEGACY_USE_ONLY, digest};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Digest a thumbprint was computed with, told apart by length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbprintAlgorithm {
    /// 40 hex digits, as shown by Windows and Azure certificate tooling
    Sha1,
    /// 64 hex digits
    Sha256,
}

/// Fingerprint of a certificate's DER encoding.
///
/// Held as upper-case hex. Parsing accepts either case and ignores `:`,
/// spaces and other whitespace, so values copied from `openssl x509
/// -fingerprint` or a certificate manager UI work unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Thumbprint(String);

impl Thumbprint {
    /// SHA-256 thumbprint of `der`.
    pub fn of_der(der: &[u8]) -> Self {
        Self(hex::encode_upper(Sha256::digest(der)))
    }

    /// SHA-1 thumbprint of `der`.
    pub fn sha1_of_der(der: &[u8]) -> Self {
        Self(hex::encode_upper(digest(&SHA1_FOR_LEGACY_USE_ONLY, der)))
    }

    /// # Errors
    ///
    /// Returns [`TokenClientError::InvalidArgument`] unless the input holds
    /// exactly 40 (SHA-1) or 64 (SHA-256) hex digits.
    pub fn parse(value: &str) -> TokenClientResult<Self> {
        let normalized: String = value
            .chars()
            .filter(|c| *c != ':' && !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if !matches!(normalized.len(), 40 | 64)
            || !normalized.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(TokenClientError::invalid_argument(format!(
                "thumbprint must be 40 (SHA-1) or 64 (SHA-256) hex digits, got {} characters",
                normalized.len()
            )));
        }

        Ok(Self(normalized))
    }

    /// Digest this thumbprint was computed with.
    pub fn algorithm(&self) -> ThumbprintAlgorithm {
        if self.0.len() == 40 {
            ThumbprintAlgorithm::Sha1
        } else {
            ThumbprintAlgorithm::Sha256
        }
    }

    /// Upper-case hex without separators.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Thumbprint {
    type Err = TokenClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        let colon = Thumbprint::parse(
            "8c:75:5c:e9:cc:d8:89:8d:49:87:f0:95:ee:2f:c9:93:18:2c:29:69:5b:e2:0f:eb:ef:dc:3b:a6:c1:37:ae:69",
        )
        .unwrap();
        let plain = Thumbprint::parse(
            "8C755CE9CCD8898D4987F095EE2FC993182C29695BE20FEBEFDC3BA6C137AE69",
        )
        .unwrap();
        let spaced = Thumbprint::parse(
            " 8C755CE9 CCD8898D 4987F095 EE2FC993 182C2969 5BE20FEB EFDC3BA6 C137AE69\n",
        )
        .unwrap();

        assert_eq!(colon, plain);
        assert_eq!(spaced, plain);
        assert_eq!(plain.algorithm(), ThumbprintAlgorithm::Sha256);
    }

    #[test]
    fn test_parse_sha1() {
        let thumbprint =
            Thumbprint::parse("89:d4:d0:9d:12:5c:78:28:33:00:c6:09:c5:e0:1a:9c:9d:54:cd:ef")
                .unwrap();
        assert_eq!(thumbprint.as_str(), "89D4D09D125C78283300C609C5E01A9C9D54CDEF");
        assert_eq!(thumbprint.algorithm(), ThumbprintAlgorithm::Sha1);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Thumbprint::parse("").is_err());
        assert!(Thumbprint::parse("ABCD").is_err());
        assert!(Thumbprint::parse(&"A".repeat(41)).is_err());
        assert!(Thumbprint::parse(&"A".repeat(63)).is_err());
        assert!(Thumbprint::parse(&"Z".repeat(64)).is_err());
    }

    #[test]
    fn test_of_der() {
        assert_eq!(
            Thumbprint::of_der(b"").as_str(),
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
        );
        assert_eq!(
            Thumbprint::sha1_of_der(b"").as_str(),
            "DA39A3EE5E6B4B0D3255BFEF95601890AFD80709"
        );
    }
}
