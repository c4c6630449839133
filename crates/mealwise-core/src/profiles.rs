//! Named budget snapshots and profile-store lookups
//!
//! The identity/profile store answers a signed-in user with a
//! `selected_profile` key and optional preferences. This module resolves
//! that answer into the [`BudgetState`] the engines consume.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::BudgetState;

/// Profile used when the store has no (known) selection
pub const DEFAULT_PROFILE: &str = "swipe_ignorer";

/// A named budget snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub key: &'static str,
    pub description: &'static str,
    pub state: BudgetState,
}

/// What the profile store returns for a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileLookup {
    #[serde(default)]
    pub selected_profile: Option<String>,
    #[serde(default)]
    pub preferences: Option<Value>,
}

impl ProfileLookup {
    pub fn new(selected_profile: &str) -> Self {
        Self {
            selected_profile: Some(selected_profile.to_string()),
            preferences: None,
        }
    }

    /// Resolve to a budget snapshot
    ///
    /// Unknown or missing keys fall back to the default profile. Preferences
    /// from the lookup replace the profile's own.
    pub fn resolve(&self) -> BudgetState {
        let profile = match self.selected_profile.as_deref() {
            Some(key) => find_profile(key).unwrap_or_else(|| {
                tracing::warn!(key, "Unknown profile, using default");
                default_profile()
            }),
            None => default_profile(),
        };

        let mut state = profile.state;
        if let Some(preferences) = &self.preferences {
            state.preferences = Some(preferences.clone());
        }
        state
    }
}

/// All demo profiles, default first
pub fn all_profiles() -> Vec<Profile> {
    vec![
        default_profile(),
        Profile {
            key: "flex_abuser",
            description: "Burns through flex dollars at campus cafes",
            state: snapshot(
                "Nafis",
                (3175.0, 3980.0),
                (161, 145),
                (800.0, 1600.0),
                json!({
                    "dietary": ["pescatarian"],
                    "favorite_cuisines": ["Asian", "Mediterranean"],
                    "priorities": ["convenience", "quality"]
                }),
            ),
        },
        Profile {
            key: "balanced_saver",
            description: "Smart spender who stays on budget",
            state: snapshot(
                "Hyacinth",
                (3175.0, 2100.0),
                (161, 140),
                (800.0, 450.0),
                json!({
                    "dietary": ["vegetarian"],
                    "favorite_cuisines": ["Indian", "Mediterranean"],
                    "priorities": ["healthy", "budget"]
                }),
            ),
        },
        Profile {
            key: "social_spender",
            description: "Always eating out with friends",
            state: snapshot(
                "THE BEAR",
                (3175.0, 4850.0),
                (161, 90),
                (800.0, 800.0),
                json!({
                    "dietary": [],
                    "favorite_cuisines": ["American", "Asian", "Mexican"],
                    "priorities": ["social", "variety"]
                }),
            ),
        },
    ]
}

/// Look up a profile by key (case-insensitive)
pub fn find_profile(key: &str) -> Option<Profile> {
    let key = key.trim();
    all_profiles()
        .into_iter()
        .find(|p| p.key.eq_ignore_ascii_case(key))
}

pub fn default_profile() -> Profile {
    Profile {
        key: DEFAULT_PROFILE,
        description: "Constantly buying food off-campus while meal credits expire",
        state: snapshot(
            "Quinn",
            (3175.0, 4288.62),
            (161, 105),
            (800.0, 680.0),
            json!({
                "dietary": ["vegetarian"],
                "favorite_cuisines": ["American", "Mexican"],
                "priorities": ["healthy", "social"]
            }),
        ),
    }
}

fn snapshot(
    name: &str,
    (budget_total, budget_spent): (f64, f64),
    (meal_credits_total, meal_credits_used): (u32, u32),
    (flex_total, flex_spent): (f64, f64),
    preferences: Value,
) -> BudgetState {
    BudgetState {
        name: name.to_string(),
        budget_total,
        budget_spent,
        meal_credits_total,
        meal_credits_used,
        flex_total,
        flex_spent,
        weeks_remaining: 8,
        preferences: Some(preferences),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::{InsightEngine, InsightKind};

    #[test]
    fn test_profiles_are_valid() {
        for profile in all_profiles() {
            assert!(profile.state.validate(16).is_ok(), "{}", profile.key);
        }
    }

    #[test]
    fn test_each_profile_triggers_its_rule() {
        let engine = InsightEngine::new();
        let rule = |key: &str| {
            let state = find_profile(key).unwrap().state;
            engine.derive_insights(&state, &[]).rule
        };

        assert_eq!(rule("swipe_ignorer"), Some(InsightKind::SwipeWaste));
        assert_eq!(rule("flex_abuser"), Some(InsightKind::FlexOverspend));
        assert_eq!(rule("balanced_saver"), Some(InsightKind::OnTrack));
        assert_eq!(rule("social_spender"), Some(InsightKind::SwipeWaste));
    }

    #[test]
    fn test_lookup_resolution() {
        let nafis = ProfileLookup::new("FLEX_ABUSER").resolve();
        assert_eq!(nafis.name, "Nafis");

        let unknown = ProfileLookup::new("nobody").resolve();
        assert_eq!(unknown.name, "Quinn");

        let missing = ProfileLookup::default().resolve();
        assert_eq!(missing.name, "Quinn");
    }

    #[test]
    fn test_lookup_preferences_replace_profile_preferences() {
        let lookup: ProfileLookup = serde_json::from_value(json!({
            "selected_profile": "balanced_saver",
            "preferences": {"dietary": ["vegan"]}
        }))
        .unwrap();
        let state = lookup.resolve();
        assert_eq!(state.preferences.unwrap()["dietary"][0], "vegan");
    }
}
