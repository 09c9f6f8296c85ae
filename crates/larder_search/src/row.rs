//! Presented list items.

use larder_core::Recipe;

/// One item of the presented result list.
///
/// Sentinel rows are variants of this type, not reserved field values
/// on the entity, so they can never be written to the cache store.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// An actual result.
    Recipe(Recipe),
    /// Marker shown while a page request is outstanding.
    Loading,
    /// Marker shown once the query has no further results.
    Exhausted,
    /// Placeholder shown while browsing categories.
    Category {
        /// Display label.
        label: String,
        /// Key the presentation layer resolves to an image asset.
        image_key: String,
    },
}

impl Row {
    /// Returns true for the loading marker.
    pub fn is_loading(&self) -> bool {
        matches!(self, Row::Loading)
    }

    /// Returns true for any non-data row.
    pub fn is_marker(&self) -> bool {
        !matches!(self, Row::Recipe(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_classification() {
        assert!(Row::Loading.is_loading());
        assert!(Row::Loading.is_marker());
        assert!(Row::Exhausted.is_marker());
        assert!(Row::Category {
            label: "Beef".into(),
            image_key: "beef".into()
        }
        .is_marker());
    }
}
