//! Share codes for chute.
//!
//! A share code is the short handle a recipient types to fetch an uploaded
//! group: 4 characters from `A-Z0-9`, always stored and compared in
//! uppercase. Codes are random and carry no structure; uniqueness among live
//! groups is enforced by the registry, not here.

use std::fmt;

use rand::Rng;

use crate::{ChuteError, Result};

/// Length of a share code.
pub const CODE_LEN: usize = 4;

/// Alphabet a share code is drawn from.
const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A canonical-form share code.
///
/// The inner string is always `CODE_LEN` uppercase alphanumeric characters;
/// the only way to construct one is [`ShareCode::generate`] or
/// [`ShareCode::parse`], both of which uphold that.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShareCode(String);

impl ShareCode {
    /// Generate a random share code.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code: String = (0..CODE_LEN)
            .map(|_| {
                let idx = rng.random_range(0..CODE_CHARS.len());
                CODE_CHARS[idx] as char
            })
            .collect();
        Self(code)
    }

    /// Parse client input into a canonical share code.
    ///
    /// Codes are matched case-insensitively, so lowercase input is folded to
    /// uppercase here at the type boundary.
    pub fn parse(input: &str) -> Result<Self> {
        if input.len() != CODE_LEN {
            return Err(ChuteError::Validation(format!(
                "share code must be {CODE_LEN} characters"
            )));
        }

        let canonical = input.to_ascii_uppercase();
        if !canonical.bytes().all(|b| CODE_CHARS.contains(&b)) {
            return Err(ChuteError::Validation(
                "share code must be alphanumeric".to_string(),
            ));
        }

        Ok(Self(canonical))
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_length_and_alphabet() {
        for _ in 0..100 {
            let code = ShareCode::generate();
            assert_eq!(code.as_str().len(), CODE_LEN);
            assert!(code.as_str().bytes().all(|b| CODE_CHARS.contains(&b)));
        }
    }

    #[test]
    fn test_generate_spread() {
        let codes: HashSet<String> = (0..1000)
            .map(|_| ShareCode::generate().as_str().to_string())
            .collect();

        // 1000 draws from a 36^4 space collide rarely; a heavily repeating
        // generator would show up here immediately
        assert!(codes.len() > 990);
    }

    #[test]
    fn test_parse_canonicalizes_case() {
        let code = ShareCode::parse("ab3k").unwrap();
        assert_eq!(code.as_str(), "AB3K");

        let code = ShareCode::parse("Ab3K").unwrap();
        assert_eq!(code.as_str(), "AB3K");

        let code = ShareCode::parse("AB3K").unwrap();
        assert_eq!(code.as_str(), "AB3K");
    }

    #[test]
    fn test_parse_case_variants_are_equal() {
        let lower = ShareCode::parse("xy9z").unwrap();
        let upper = ShareCode::parse("XY9Z").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(ShareCode::parse("").is_err());
        assert!(ShareCode::parse("ABC").is_err());
        assert!(ShareCode::parse("ABCDE").is_err());
    }

    #[test]
    fn test_parse_rejects_non_alphanumeric() {
        assert!(ShareCode::parse("AB-3").is_err());
        assert!(ShareCode::parse("AB 3").is_err());
        assert!(ShareCode::parse("AB3é").is_err());
    }

    #[test]
    fn test_parse_roundtrips_generated() {
        let code = ShareCode::generate();
        let parsed = ShareCode::parse(code.as_str()).unwrap();
        assert_eq!(code, parsed);
    }

    #[test]
    fn test_display_matches_as_str() {
        let code = ShareCode::parse("w0rd").unwrap();
        assert_eq!(code.to_string(), "W0RD");
        assert_eq!(code.to_string(), code.as_str());
    }
}
