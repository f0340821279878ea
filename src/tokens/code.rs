use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use serde::Serialize;

/// Random bytes per code; hex encoding doubles this to 32 characters.
pub const CODE_BYTES: usize = 16;

/// A well-formed reset code: 32 hexadecimal characters, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResetCode(String);

impl ResetCode {
    pub fn is_valid(candidate: &str) -> bool {
        lazy_static! {
            static ref CODE_RE: Regex = Regex::new(r"^[0-9a-fA-F]{32}$").unwrap();
        }
        CODE_RE.is_match(candidate)
    }

    pub fn parse(candidate: &str) -> Option<Self> {
        Self::is_valid(candidate).then(|| Self(candidate.to_ascii_lowercase()))
    }

    pub fn random() -> Self {
        let mut bytes = [0u8; CODE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResetCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_codes_are_lowercase_hex_of_expected_length() {
        for _ in 0..64 {
            let code = ResetCode::random();
            assert_eq!(code.as_str().len(), 32);
            assert!(ResetCode::is_valid(code.as_str()));
            assert_eq!(code.as_str(), code.as_str().to_ascii_lowercase());
        }
    }

    #[test]
    fn random_codes_differ() {
        assert_ne!(ResetCode::random(), ResetCode::random());
    }

    #[test]
    fn format_check_is_anchored() {
        assert!(ResetCode::is_valid("deadbeefdeadbeefdeadbeefdeadbeef"));
        assert!(ResetCode::is_valid("DEADBEEFdeadbeefDEADBEEFdeadbeef"));
        assert!(!ResetCode::is_valid("deadbeefdeadbeefdeadbeefdeadbee"));
        assert!(!ResetCode::is_valid("deadbeefdeadbeefdeadbeefdeadbeef0"));
        assert!(!ResetCode::is_valid("xdeadbeefdeadbeefdeadbeefdeadbeef"));
        assert!(!ResetCode::is_valid("deadbeefdeadbeefdeadbeefdeadbeeg"));
        assert!(!ResetCode::is_valid(""));
    }

    #[test]
    fn parse_normalizes_case() {
        let code = ResetCode::parse("DEADBEEFDEADBEEFDEADBEEFDEADBEEF").unwrap();
        assert_eq!(code.as_str(), "deadbeefdeadbeefdeadbeefdeadbeef");
        assert!(ResetCode::parse("not-a-token").is_none());
    }
}
