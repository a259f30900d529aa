//! The shop's product catalog, compiled into the binary.

use paws_claws_core::{Catalog, CatalogError};

/// Number of products featured on the home page.
pub const FEATURED_COUNT: usize = 4;

const CATALOG_JSON: &str = include_str!("../content/catalog.json");

/// Parse and validate the bundled catalog.
///
/// # Errors
///
/// Returns an error if the bundled fixture is malformed.
pub fn load() -> Result<Catalog, CatalogError> {
    Catalog::from_json(CATALOG_JSON)
}
