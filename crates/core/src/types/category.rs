//! Product categories and the shop's category selector.

use serde::{Deserialize, Serialize};

/// A product category.
///
/// "All" is deliberately not a category: it only exists as a filter, see
/// [`CategoryFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Toys,
    Grooming,
}

impl Category {
    /// Every category, in the order the shop lists them.
    pub const ALL: [Self; 3] = [Self::Grooming, Self::Food, Self::Toys];

    /// The value used in `?cat=` query strings and in the catalog fixture.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Toys => "Toys",
            Self::Grooming => "Grooming",
        }
    }

    /// Parse the exact query-string spelling.
    #[must_use]
    pub fn from_query(value: &str) -> Option<Self> {
        match value {
            "Food" => Some(Self::Food),
            "Toys" => Some(Self::Toys),
            "Grooming" => Some(Self::Grooming),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The shop's category selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Derive the selector from the `cat` query parameter.
    ///
    /// Missing, `"All"` and unrecognized values all select everything.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        value
            .and_then(Category::from_query)
            .map_or(Self::All, Self::Only)
    }

    /// Whether a product in `category` passes this selector.
    #[must_use]
    pub fn matches(&self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => *selected == category,
        }
    }

    /// The query-string value for this selector.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(category) => category.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_recognizes_categories() {
        assert_eq!(
            CategoryFilter::from_query(Some("Toys")),
            CategoryFilter::Only(Category::Toys)
        );
        assert_eq!(
            CategoryFilter::from_query(Some("Grooming")),
            CategoryFilter::Only(Category::Grooming)
        );
    }

    #[test]
    fn test_from_query_falls_back_to_all() {
        assert_eq!(CategoryFilter::from_query(None), CategoryFilter::All);
        assert_eq!(CategoryFilter::from_query(Some("All")), CategoryFilter::All);
        assert_eq!(CategoryFilter::from_query(Some("toys")), CategoryFilter::All);
        assert_eq!(CategoryFilter::from_query(Some("")), CategoryFilter::All);
    }

    #[test]
    fn test_matches() {
        assert!(CategoryFilter::All.matches(Category::Food));
        assert!(CategoryFilter::Only(Category::Food).matches(Category::Food));
        assert!(!CategoryFilter::Only(Category::Food).matches(Category::Toys));
    }
}
