//! Source document selection.

use rand::Rng;
use std::fmt;

/// README-style tool lists shipped with the binary.
///
/// The first entry is the document the pipeline was built around.
pub const BUILTIN_SOURCES: &[&str] = &[
    "https://raw.githubusercontent.com/trimstray/the-book-of-secret-knowledge/refs/heads/master/README.md",
    "https://raw.githubusercontent.com/jlevy/the-art-of-command-line/master/README.md",
    "https://raw.githubusercontent.com/alebcay/awesome-shell/master/README.md",
    "https://raw.githubusercontent.com/awesome-foss/awesome-sysadmin/master/README.md",
];

/// URL of a remote document to pull tidbits from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceUrl(String);

impl SourceUrl {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceUrl {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// Picks one source document per run, uniformly at random.
#[derive(Debug, Clone)]
pub struct SourceSelector {
    candidates: Vec<SourceUrl>,
}

impl SourceSelector {
    /// Create a selector over a fixed candidate set.
    ///
    /// # Panics
    ///
    /// Panics if `candidates` is empty. The candidate set is part of the
    /// program (or validated config), so an empty one is a bug.
    #[must_use]
    pub fn new(candidates: Vec<SourceUrl>) -> Self {
        assert!(
            !candidates.is_empty(),
            "source selector needs at least one candidate"
        );
        Self { candidates }
    }

    /// Selector over [`BUILTIN_SOURCES`].
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(BUILTIN_SOURCES.iter().copied().map(SourceUrl::from).collect())
    }

    /// Candidate documents.
    #[must_use]
    pub fn candidates(&self) -> &[SourceUrl] {
        &self.candidates
    }

    /// Choose one candidate with uniform probability.
    pub fn choose<R: Rng>(&self, rng: &mut R) -> &SourceUrl {
        let index = rng.gen_range(0..self.candidates.len());
        &self.candidates[index]
    }
}

impl Default for SourceSelector {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_choose_returns_member() {
        let selector = SourceSelector::new(vec!["a".into(), "b".into(), "c".into()]);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let chosen = selector.choose(&mut rng);
            assert!(selector.candidates().contains(chosen));
        }
    }

    #[test]
    fn test_single_candidate_always_chosen() {
        let selector = SourceSelector::new(vec!["URL_A".into()]);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..20 {
            assert_eq!(selector.choose(&mut rng).as_str(), "URL_A");
        }
    }

    #[test]
    fn test_every_candidate_reachable() {
        let selector = SourceSelector::builtin();
        let mut rng = StdRng::seed_from_u64(1);

        let seen: HashSet<_> = (0..500).map(|_| selector.choose(&mut rng).clone()).collect();
        assert_eq!(seen.len(), BUILTIN_SOURCES.len());
    }

    #[test]
    #[should_panic(expected = "at least one candidate")]
    fn test_empty_candidates_panics() {
        let _ = SourceSelector::new(vec![]);
    }

    #[test]
    fn test_builtin_starts_with_secret_knowledge() {
        let selector = SourceSelector::default();
        assert!(selector.candidates()[0]
            .as_str()
            .contains("the-book-of-secret-knowledge"));
    }
}
