//! Checksum utilities for generated artifact integrity

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA256 checksum of an artifact's bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Checksum {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One `<digest>  <file>` line of a `checksums.sha256` manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumLine {
    pub checksum: Checksum,
    pub file: String,
}

/// Render manifest lines in the `sha256sum` text layout
pub fn render_manifest(lines: &[ChecksumLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&format!("{}  {}\n", line.checksum, line.file));
    }
    out
}

/// Parse a `sha256sum`-style manifest. Blank and malformed lines are ignored.
pub fn parse_manifest(content: &str) -> Vec<ChecksumLine> {
    content
        .lines()
        .filter_map(|line| {
            let (digest, file) = line.split_once("  ")?;
            let file = file.trim();
            if digest.is_empty() || file.is_empty() {
                return None;
            }
            Some(ChecksumLine {
                checksum: Checksum::from(digest),
                file: file.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let content = br#"[{"cca2": "US"}]"#;
        assert_eq!(Checksum::from_bytes(content), Checksum::from_bytes(content));
    }

    #[test]
    fn test_checksum_different_content() {
        assert_ne!(Checksum::from_bytes(b"[]"), Checksum::from_bytes(b"[{}]"));
    }

    #[test]
    fn test_checksum_is_sha256_hex() {
        assert_eq!(
            Checksum::from_bytes(b"abc").to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_manifest_parse_render() {
        let lines = vec![
            ChecksumLine { checksum: Checksum::from_bytes(b"a"), file: "dial-codes.json".into() },
            ChecksumLine { checksum: Checksum::from_bytes(b"b"), file: "currencies.json".into() },
        ];
        let text = render_manifest(&lines);
        assert_eq!(parse_manifest(&text), lines);
        assert!(parse_manifest("garbage\n\n").is_empty());
    }
}
