//! Ignore tokens: a post-order suppression pass over an already-built
//! delta tree, rather than something threaded through every comparator.
//! Building the full tree first and suppressing afterward means adding a
//! new ignore token never requires touching the comparators themselves.

use std::collections::BTreeSet;

pub const VERSION: &str = "version";
pub const PLATFORM: &str = "platform";
pub const POOL: &str = "pool";
pub const LINES: &str = "lines";
pub const TRAILING_WHITESPACE: &str = "trailing_whitespace";
pub const MANIFEST_SUBSECTIONS: &str = "manifest_subsections";
pub const JAR_SIGNATURE: &str = "jar_signature";

/// The kinds of delta node each known token suppresses changes within.
/// Unrecognized tokens are accepted and stored, but match nothing — a
/// forward-compatible no-op rather than a hard error, since an older
/// build of this crate consuming a newer caller's token list shouldn't
/// have to reject it outright.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnorePolicy {
    tokens: BTreeSet<String>,
}

impl IgnorePolicy {
    pub fn new() -> IgnorePolicy {
        IgnorePolicy::default()
    }

    pub fn with_token(mut self, token: impl Into<String>) -> IgnorePolicy {
        self.tokens.insert(token.into());
        self
    }

    pub fn from_tokens(tokens: impl IntoIterator<Item = impl Into<String>>) -> IgnorePolicy {
        IgnorePolicy { tokens: tokens.into_iter().map(Into::into).collect() }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tokens_are_accepted_without_error() {
        let policy = IgnorePolicy::new().with_token("some-future-token");
        assert!(policy.contains("some-future-token"));
        assert!(!policy.contains(LINES));
    }

    #[test]
    fn known_tokens_round_trip() {
        let policy = IgnorePolicy::from_tokens([POOL, LINES]);
        assert!(policy.contains(POOL));
        assert!(policy.contains(LINES));
        assert!(!policy.contains(TRAILING_WHITESPACE));
    }
}
