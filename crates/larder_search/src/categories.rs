//! Default browse categories.

/// A browseable category shown before any search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Display label, also usable as the search query.
    pub label: String,
    /// Key the presentation layer resolves to an image asset.
    pub image_key: String,
}

/// The default category list, in display order.
pub const DEFAULT_CATEGORIES: [(&str, &str); 8] = [
    ("Barbeque", "barbeque"),
    ("Breakfast", "breakfast"),
    ("Chicken", "chicken"),
    ("Beef", "beef"),
    ("Brunch", "brunch"),
    ("Dinner", "dinner"),
    ("Wine", "wine"),
    ("Italian", "italian"),
];

/// Materializes [`DEFAULT_CATEGORIES`].
pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(label, image_key)| Category {
            label: (*label).to_string(),
            image_key: (*image_key).to_string(),
        })
        .collect()
}
