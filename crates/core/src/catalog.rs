//! Product records and the static catalog.
//!
//! The catalog is fixture data: it is parsed once, validated, and never
//! mutated afterwards. Filtering is a pure function of the selector and
//! preserves catalog order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Category, CategoryFilter, Money, ProductId};

/// Highest rating a product can carry.
pub const MAX_RATING: f32 = 5.0;

/// A product as sold in the shop.
///
/// Field names follow the fixture and order-store JSON (`oldPrice`), which is
/// also how cart snapshots are embedded in orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: Category,
    pub description: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_price: Option<Money>,
    pub image: String,
    pub rating: f32,
    pub reviews: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Product {
    /// Whether the product is shown with a struck-through prior price.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.old_price.is_some_and(|old| old > self.price)
    }
}

/// Errors raised while loading catalog fixture data.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The fixture is not valid JSON for a product list.
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two products share an id.
    #[error("duplicate product id: {0}")]
    DuplicateId(ProductId),

    /// A product has a negative price or prior price.
    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),

    /// A product's rating is outside 0-5.
    #[error("product {id} has rating {rating}, expected 0-5")]
    RatingOutOfRange {
        /// Offending product.
        id: ProductId,
        /// Rating found in the fixture.
        rating: f32,
    },
}

/// The immutable product catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog from already-constructed products.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if any product violates the catalog rules.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(product.id.clone()) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
            if product.price.is_negative() || product.old_price.is_some_and(|p| p.is_negative()) {
                return Err(CatalogError::NegativePrice(product.id.clone()));
            }
            if !(0.0..=MAX_RATING).contains(&product.rating) {
                return Err(CatalogError::RatingOutOfRange {
                    id: product.id.clone(),
                    rating: product.rating,
                });
            }
        }
        Ok(Self { products })
    }

    /// Parse and validate a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON and the validation
    /// errors of [`Catalog::new`] otherwise.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::new(products)
    }

    /// Every product, in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Products passing the selector, in catalog order.
    #[must_use]
    pub fn filter(&self, filter: CategoryFilter) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|product| filter.matches(product.category))
            .collect()
    }

    /// The first `count` products, shown on the home page.
    #[must_use]
    pub fn featured(&self, count: usize) -> &[Product] {
        self.products.get(..count).unwrap_or(self.products.as_slice())
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == id)
    }

    /// Number of products in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {"id": "1", "name": "Premium Dog Wash", "category": "Grooming",
         "description": "Full body wash.", "price": "45.00", "oldPrice": "55.00",
         "image": "https://img.test/1", "rating": 4.9, "reviews": 120, "tags": ["Best Seller"]},
        {"id": "2", "name": "Salmon Cat Food", "category": "Food",
         "description": "Grain-free.", "price": "24.99",
         "image": "https://img.test/2", "rating": 4.8, "reviews": 85},
        {"id": "3", "name": "Squeaky Bone", "category": "Toys",
         "description": "Indestructible.", "price": "8.99",
         "image": "https://img.test/3", "rating": 4.5, "reviews": 210, "tags": ["New"]},
        {"id": "4", "name": "Rope Tug", "category": "Toys",
         "description": "Cotton rope.", "price": "11.00",
         "image": "https://img.test/4", "rating": 4.1, "reviews": 12}
    ]"#;

    fn catalog() -> Catalog {
        Catalog::from_json(FIXTURE).unwrap()
    }

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn test_filter_single_category() {
        let catalog = catalog();
        let toys = catalog.filter(CategoryFilter::Only(Category::Toys));
        assert_eq!(ids(&toys), vec!["3", "4"]);
        assert!(toys.iter().all(|p| p.category == Category::Toys));
    }

    #[test]
    fn test_filter_all_and_unknown_return_everything_in_order() {
        let catalog = catalog();
        let all = catalog.filter(CategoryFilter::All);
        assert_eq!(ids(&all), vec!["1", "2", "3", "4"]);

        let unknown = catalog.filter(CategoryFilter::from_query(Some("Aquariums")));
        assert_eq!(ids(&unknown), ids(&all));
    }

    #[test]
    fn test_featured_is_prefix() {
        let catalog = catalog();
        assert_eq!(catalog.featured(2).len(), 2);
        assert_eq!(catalog.featured(2)[0].id.as_str(), "1");
        assert_eq!(catalog.featured(10).len(), 4);
        assert!(catalog.featured(0).is_empty());
    }

    #[test]
    fn test_optional_fields() {
        let catalog = catalog();
        let wash = catalog.get(&ProductId::new("1")).unwrap();
        assert!(wash.is_discounted());
        assert_eq!(wash.tags, vec!["Best Seller".to_string()]);

        let food = catalog.get(&ProductId::new("2")).unwrap();
        assert!(food.old_price.is_none());
        assert!(food.tags.is_empty());
        assert!(catalog.get(&ProductId::new("99")).is_none());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut products = catalog().products().to_vec();
        products.push(products[0].clone());
        assert!(matches!(
            Catalog::new(products),
            Err(CatalogError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_rejects_bad_rating_and_price() {
        let mut products = catalog().products().to_vec();
        products[1].rating = 5.5;
        assert!(matches!(
            Catalog::new(products),
            Err(CatalogError::RatingOutOfRange { .. })
        ));

        let mut products = catalog().products().to_vec();
        products[2].price = Money::from_cents(-100);
        assert!(matches!(
            Catalog::new(products),
            Err(CatalogError::NegativePrice(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            Catalog::from_json("{\"not\": \"a list\"}"),
            Err(CatalogError::Parse(_))
        ));
    }
}
