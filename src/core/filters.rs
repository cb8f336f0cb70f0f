use serde::{Deserialize, Serialize};

use crate::core::availability::{overlap, Planner};
use crate::models::Profile;

/// Check if a profile lists the given intention tag (case-insensitive)
#[inline]
pub fn matches_intention(profile: &Profile, intention: &str) -> bool {
    profile
        .intentions
        .iter()
        .any(|i| i.eq_ignore_ascii_case(intention.trim()))
}

/// Check if a profile shares at least one open window with the planner
#[inline]
pub fn shares_window(profile: &Profile, planner: &Planner) -> bool {
    !overlap(planner, &Planner::from_profile(profile)).is_empty()
}

/// Optional narrowing of the discovery deck
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFilter {
    #[serde(default)]
    pub intention: Option<String>,
    #[serde(default)]
    pub overlapping_only: bool,
}

impl CandidateFilter {
    pub fn is_empty(&self) -> bool {
        self.intention.is_none() && !self.overlapping_only
    }

    /// Whether a profile passes every active criterion
    pub fn matches(&self, profile: &Profile, planner: &Planner) -> bool {
        if let Some(intention) = &self.intention {
            if !matches_intention(profile, intention) {
                return false;
            }
        }

        if self.overlapping_only && !shares_window(profile, planner) {
            return false;
        }

        true
    }

    /// Keep the matching profiles, preserving order
    pub fn apply(&self, profiles: Vec<Profile>, planner: &Planner) -> Vec<Profile> {
        if self.is_empty() {
            return profiles;
        }
        profiles
            .into_iter()
            .filter(|p| self.matches(p, planner))
            .collect()
    }
}
