//! The cached recipe entity.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A recipe as cached locally.
///
/// The natural key is [`id`](Self::id), assigned by the remote API.
/// `ingredients` and `last_refreshed_at` are enrichment fields: the
/// search endpoint does not carry them, only a detail lookup does, so
/// cache writes must be careful not to clobber them (see
/// [`crate::RecipeStore::update_summary`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Natural key assigned by the remote API.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Publisher name.
    pub publisher: String,
    /// URL of the preview image.
    pub image_url: String,
    /// Popularity rank reported by the remote API.
    pub social_rank: f32,
    /// Ingredient lines. Empty until a detail lookup has run.
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Seconds since epoch of the last detail refresh. `0` means the
    /// row has never been refreshed and is always considered stale.
    #[serde(default)]
    pub last_refreshed_at: i64,
}

impl Recipe {
    /// Returns the age of the last refresh in whole seconds, or `None`
    /// if the row has never been refreshed.
    pub fn refreshed_age_secs(&self, now: i64) -> Option<i64> {
        if self.last_refreshed_at == 0 {
            None
        } else {
            Some(now - self.last_refreshed_at)
        }
    }
}

/// Current wall-clock time in seconds since the Unix epoch.
///
/// Clamps to zero if the system clock is before the epoch.
pub fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Recipe {
        Recipe {
            id: "41470".into(),
            title: "Spicy chicken wings".into(),
            publisher: "101cookbooks".into(),
            image_url: "http://img.example.com/41470.jpg".into(),
            social_rank: 99.4,
            ingredients: vec!["chicken wings".into(), "cayenne".into()],
            last_refreshed_at: 1_700_000_000,
        }
    }

    #[test]
    fn refreshed_age() {
        let recipe = sample();
        assert_eq!(
            recipe.refreshed_age_secs(1_700_000_060),
            Some(60)
        );

        let never = Recipe {
            last_refreshed_at: 0,
            ..sample()
        };
        assert_eq!(never.refreshed_age_secs(1_700_000_060), None);
    }

    #[test]
    fn serde_round_trip_defaults() {
        // Summary rows arrive without enrichment fields.
        let json = r#"{
            "id": "41470",
            "title": "Spicy chicken wings",
            "publisher": "101cookbooks",
            "image_url": "http://img.example.com/41470.jpg",
            "social_rank": 99.4
        }"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert!(recipe.ingredients.is_empty());
        assert_eq!(recipe.last_refreshed_at, 0);
    }
}
