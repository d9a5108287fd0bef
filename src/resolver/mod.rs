//! Name resolution - maps a change record's card name to one pool entry

use crate::locator::{Candidate, CandidatePool};

/// Which matching tier produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Display name equals the requested name
    Exact,
    /// Equal ignoring case
    CaseInsensitive,
    /// Display name contains the requested name, ignoring case
    Substring,
}

impl MatchTier {
    pub fn name(self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::CaseInsensitive => "case-insensitive",
            MatchTier::Substring => "substring",
        }
    }
}

/// A resolved card together with the tier that matched it
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub candidate: &'a Candidate,
    pub tier: MatchTier,
}

/// Resolves card names against a candidate pool
pub struct CardResolver<'a> {
    pool: &'a CandidatePool,
}

impl<'a> CardResolver<'a> {
    pub fn new(pool: &'a CandidatePool) -> Self {
        Self { pool }
    }

    /// First candidate matching `name`. Tiers are tried in order and the
    /// first tier with any match wins; within a tier, pool order decides.
    pub fn resolve(&self, name: &str) -> Option<Resolution<'a>> {
        let name_lower = name.to_lowercase();

        self.find(MatchTier::Exact, |dn| dn == name)
            .or_else(|| self.find(MatchTier::CaseInsensitive, |dn| dn.to_lowercase() == name_lower))
            .or_else(|| {
                self.find(MatchTier::Substring, |dn| {
                    !dn.is_empty() && dn.to_lowercase().contains(&name_lower)
                })
            })
    }

    fn find(&self, tier: MatchTier, matches: impl Fn(&str) -> bool) -> Option<Resolution<'a>> {
        self.pool
            .iter()
            .find(|c| c.display_name.as_deref().is_some_and(&matches))
            .map(|candidate| Resolution { candidate, tier })
    }
}

/// Case-insensitive containment
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
