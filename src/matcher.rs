//! Topic matchers.
//!
//! A matcher is a stateless predicate over topic strings. The broker only
//! ever sees it through the [`Matcher`] trait object; it has no notion of
//! "exact" or "regex" built in.

use regex::Regex;

/// A predicate over topics, used by the broker to decide which subscribers
/// a published message should fan out to.
pub trait Matcher: Send + Sync {
    /// Returns true if `topic` should be delivered to the subscription this
    /// matcher is attached to.
    fn matches(&self, topic: &str) -> bool;
}

impl<F> Matcher for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, topic: &str) -> bool {
        self(topic)
    }
}

/// Matches a topic only if it is equal to the string the matcher was built
/// from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Exact(String);

impl Exact {
    /// Creates a new exact-match matcher for `topic`.
    pub fn new(topic: impl Into<String>) -> Self {
        Self(topic.into())
    }
}

impl Matcher for Exact {
    fn matches(&self, topic: &str) -> bool {
        self.0 == topic
    }
}

impl Matcher for Regex {
    fn matches(&self, topic: &str) -> bool {
        self.is_match(topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_matches_only_identical_topic() {
        let m = Exact::new("users");
        assert!(m.matches("users"));
        assert!(!m.matches("users.india"));
        assert!(!m.matches(""));
    }

    #[test]
    fn regex_matches_anywhere_unless_anchored() {
        let m = Regex::new(r"users\..*").unwrap();
        assert!(m.matches("users.india"));
        assert!(!m.matches("users"));

        let anchored = Regex::new(r"^all-\d+$").unwrap();
        assert!(anchored.matches("all-1"));
        assert!(!anchored.matches("xall-1"));
    }

    #[test]
    fn closures_are_matchers() {
        let m = |topic: &str| topic.starts_with("log.");
        assert!(m.matches("log.user"));
        assert!(!m.matches("users"));
    }
}
