//! Requester identity matching
//!
//! An entry's requester pattern constrains which caller identities may use
//! it. The semantics are deliberately narrow:
//!
//! - the sentinel values `*` and `.*` (case-insensitive) match any identity;
//! - any other pattern is compiled as an anchored regular expression with
//!   every `*` escaped, so `specificuser` matches only itself and a `*`
//!   inside a longer pattern matches a literal asterisk. There is no glob
//!   expansion.
//!
//! Surprising but intentional: the sentinel check also runs *after* a
//! failed regex match, so a pattern of `.*` accepts identities its compiled
//! form (any character followed by a literal asterisk) would reject.
//! Legacy-format entries carry exactly that pattern and rely on the
//! fallback.

use regex::Regex;
use thiserror::Error;

/// Sentinel patterns that match any requester identity
const MATCH_ANY_SENTINELS: [&str; 2] = ["*", ".*"];

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("invalid requester pattern '{pattern}': {reason}")]
    Compile { pattern: String, reason: String },
}

/// Decide whether `requester` may use an entry guarded by `pattern`.
///
/// Full-string semantics: the entire identity must match, never a
/// substring.
pub(crate) fn requester_matches(pattern: &str, requester: &str) -> Result<bool, PatternError> {
    let escaped = pattern.replace('*', "\\*");
    let anchored = format!("^(?:{escaped})$");
    let regex = Regex::new(&anchored).map_err(|err| PatternError::Compile {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })?;

    if regex.is_match(requester) {
        return Ok(true);
    }

    Ok(is_match_any(pattern))
}

/// True when the pattern is one of the match-any sentinels
fn is_match_any(pattern: &str) -> bool {
    MATCH_ANY_SENTINELS
        .iter()
        .any(|sentinel| pattern.eq_ignore_ascii_case(sentinel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_matches_itself_only() {
        assert!(requester_matches("specificuser", "specificuser").unwrap());
        assert!(!requester_matches("specificuser", "otheruser").unwrap());
    }

    #[test]
    fn matching_is_full_string() {
        assert!(!requester_matches("user", "username").unwrap());
        assert!(!requester_matches("username", "user").unwrap());
    }

    #[test]
    fn star_sentinel_matches_anything() {
        assert!(requester_matches("*", "mquserid").unwrap());
        assert!(requester_matches("*", "").unwrap());
    }

    #[test]
    fn dot_star_sentinel_matches_via_fallback() {
        // Compiled, ".*" becomes "any char then a literal asterisk", which
        // rejects ordinary identities; the sentinel fallback accepts them.
        assert!(requester_matches(".*", "shashikantht").unwrap());
        // The compiled form still matches identities it happens to cover.
        assert!(requester_matches(".*", "a*").unwrap());
    }

    #[test]
    fn embedded_star_is_a_literal() {
        assert!(requester_matches("svc*batch", "svc*batch").unwrap());
        assert!(!requester_matches("svc*batch", "svc1batch").unwrap());
        assert!(!requester_matches("svc*batch", "svcANYTHINGbatch").unwrap());
    }

    #[test]
    fn other_regex_syntax_is_preserved() {
        assert!(requester_matches("user[0-9]", "user5").unwrap());
        assert!(!requester_matches("user[0-9]", "userX").unwrap());
    }

    #[test]
    fn unbalanced_pattern_fails_to_compile() {
        let err = requester_matches("[", "anyone").unwrap_err();
        assert!(matches!(err, PatternError::Compile { .. }));
    }
}
