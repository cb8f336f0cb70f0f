use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::availability::Planner;
use crate::core::effects::{Effect, HapticPulse};
use crate::core::filters::CandidateFilter;
use crate::models::Profile;

/// Chance cut-off above which a like becomes an instant match
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.85;

pub const SESH_REQUEST_NOTICE: &str =
    "Sesh request fired! ⚡️ Check your Sesh Center for the vibe check.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryTab {
    Explore,
    Sparks,
}

/// Result of a right swipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub profile_id: String,
    pub matched: bool,
    pub effects: Vec<Effect>,
}

/// Serializable view of the discovery hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySnapshot {
    pub tab: DiscoveryTab,
    pub current: Option<Profile>,
    pub liked: Vec<String>,
    pub sparks_badge: bool,
    pub deck_size: usize,
}

/// Swipe deck over everyone but the signed-in user.
///
/// The deck never runs out: the index wraps modulo the deck length.
#[derive(Debug, Clone)]
pub struct DiscoveryDeck {
    user_id: String,
    catalog: Vec<Profile>,
    deck: Vec<Profile>,
    index: usize,
    liked: Vec<String>,
    tab: DiscoveryTab,
    filter: CandidateFilter,
    match_threshold: f64,
}

impl DiscoveryDeck {
    pub fn new(user_id: impl Into<String>, profiles: Vec<Profile>, match_threshold: f64) -> Self {
        let user_id = user_id.into();
        let catalog: Vec<Profile> = profiles.into_iter().filter(|p| p.id != user_id).collect();
        Self {
            user_id,
            deck: catalog.clone(),
            catalog,
            index: 0,
            liked: Vec::new(),
            tab: DiscoveryTab::Explore,
            filter: CandidateFilter::default(),
            match_threshold,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn current(&self) -> Option<&Profile> {
        if self.deck.is_empty() {
            return None;
        }
        self.deck.get(self.index % self.deck.len())
    }

    pub fn liked(&self) -> &[String] {
        &self.liked
    }

    pub fn tab(&self) -> DiscoveryTab {
        self.tab
    }

    pub fn filter(&self) -> &CandidateFilter {
        &self.filter
    }

    /// Badge on the Sparks tab: there are likes and the tab isn't open
    pub fn sparks_badge(&self) -> bool {
        !self.liked.is_empty() && self.tab != DiscoveryTab::Sparks
    }

    /// Profiles listed on the Sparks tab
    pub fn sparks(&self) -> &[Profile] {
        &self.catalog
    }

    pub fn snapshot(&self) -> DiscoverySnapshot {
        DiscoverySnapshot {
            tab: self.tab,
            current: self.current().cloned(),
            liked: self.liked.clone(),
            sparks_badge: self.sparks_badge(),
            deck_size: self.deck.len(),
        }
    }

    pub fn switch_tab(&mut self, tab: DiscoveryTab) -> Vec<Effect> {
        if tab == self.tab {
            return Vec::new();
        }
        self.tab = tab;
        vec![Effect::Haptic(HapticPulse::LIGHT)]
    }

    /// Narrow the deck and restart it from the top
    pub fn set_filter(&mut self, filter: CandidateFilter, planner: &Planner) {
        self.deck = filter.apply(self.catalog.clone(), planner);
        self.filter = filter;
        self.index = 0;
        tracing::debug!("Deck filtered to {} profiles", self.deck.len());
    }

    /// Remember a like without swiping; duplicates are ignored
    pub fn record_like(&mut self, profile_id: &str) {
        if !self.liked.iter().any(|id| id == profile_id) {
            self.liked.push(profile_id.to_string());
        }
    }

    /// Like the current card, rolling for an instant match
    pub fn like<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<LikeOutcome> {
        let roll: f64 = rng.gen();
        self.like_with_roll(roll)
    }

    /// Like the current card with a given roll in `[0, 1)`
    pub fn like_with_roll(&mut self, roll: f64) -> Option<LikeOutcome> {
        let profile_id = self.current()?.id.clone();
        self.record_like(&profile_id);
        self.advance();

        let matched = roll > self.match_threshold;
        let pulse = if matched { HapticPulse::SUCCESS } else { HapticPulse::MEDIUM };
        tracing::debug!("Liked {} (roll {:.3}, matched: {})", profile_id, roll, matched);

        Some(LikeOutcome {
            profile_id,
            matched,
            effects: vec![Effect::Haptic(pulse)],
        })
    }

    /// Left swipe
    pub fn pass(&mut self) -> Vec<Effect> {
        if self.current().is_none() {
            return Vec::new();
        }
        self.advance();
        vec![Effect::Haptic(HapticPulse::LIGHT)]
    }

    fn advance(&mut self) {
        self.index = self.index.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::Catalog;

    fn deck() -> DiscoveryDeck {
        DiscoveryDeck::new("u1", Catalog::seeded().unwrap().profiles, DEFAULT_MATCH_THRESHOLD)
    }

    #[test]
    fn test_deck_excludes_signed_in_user_and_wraps() {
        let mut deck = deck();
        assert_eq!(deck.current().unwrap().id, "u2");
        deck.pass();
        assert_eq!(deck.current().unwrap().id, "u3");
        deck.pass();
        assert_eq!(deck.current().unwrap().id, "u2");
    }

    #[test]
    fn test_like_without_match() {
        let mut deck = deck();
        let outcome = deck.like_with_roll(0.5).unwrap();

        assert_eq!(outcome.profile_id, "u2");
        assert!(!outcome.matched);
        assert_eq!(outcome.effects, vec![Effect::Haptic(HapticPulse::MEDIUM)]);
        assert_eq!(deck.current().unwrap().id, "u3");
    }

    #[test]
    fn test_like_with_match() {
        let mut deck = deck();
        let outcome = deck.like_with_roll(0.9).unwrap();

        assert!(outcome.matched);
        assert_eq!(outcome.effects, vec![Effect::Haptic(HapticPulse::SUCCESS)]);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut deck = deck();
        assert!(!deck.like_with_roll(DEFAULT_MATCH_THRESHOLD).unwrap().matched);
    }

    #[test]
    fn test_likes_are_not_duplicated() {
        let mut deck = deck();
        deck.like_with_roll(0.1);
        deck.like_with_roll(0.1);
        deck.like_with_roll(0.1);

        assert_eq!(deck.liked(), ["u2".to_string(), "u3".to_string()]);
    }

    #[test]
    fn test_empty_deck_has_no_card() {
        let solo = Catalog::seeded().unwrap().profiles.into_iter().take(1).collect();
        let mut deck = DiscoveryDeck::new("u1", solo, DEFAULT_MATCH_THRESHOLD);

        assert!(deck.current().is_none());
        assert!(deck.like_with_roll(0.99).is_none());
        assert!(deck.pass().is_empty());
    }

    #[test]
    fn test_tabs_and_badge() {
        let mut deck = deck();
        assert!(deck.switch_tab(DiscoveryTab::Explore).is_empty());
        assert!(!deck.sparks_badge());

        deck.record_like("u3");
        assert!(deck.sparks_badge());

        assert_eq!(deck.switch_tab(DiscoveryTab::Sparks), vec![Effect::Haptic(HapticPulse::LIGHT)]);
        assert!(!deck.sparks_badge());
    }

    #[test]
    fn test_filter_restarts_deck() {
        let mut deck = deck();
        deck.pass();
        deck.set_filter(
            CandidateFilter {
                intention: Some("Creative collaboration".into()),
                overlapping_only: false,
            },
            &Planner::seeded(),
        );

        assert_eq!(deck.snapshot().deck_size, 1);
        assert_eq!(deck.current().unwrap().id, "u3");
        assert_eq!(deck.sparks().len(), 2);
    }
}
