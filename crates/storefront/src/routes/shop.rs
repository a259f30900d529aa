//! Catalog browser.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use paws_claws_core::{Category, CategoryFilter, Product};

use crate::filters;
use crate::routes::NavView;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone, Debug)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: String,
    pub old_price: Option<String>,
    pub image: String,
    pub rating: String,
    pub reviews: u32,
    pub tags: Vec<String>,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: product.category.to_string(),
            description: product.description.clone(),
            price: product.price.display(),
            old_price: product
                .is_discounted()
                .then(|| product.old_price.map(|p| p.display()))
                .flatten(),
            image: product.image.clone(),
            rating: format!("{:.1}", product.rating),
            reviews: product.reviews,
            tags: product.tags.clone(),
        }
    }
}

/// A category tab in the shop header.
#[derive(Clone, Debug)]
pub struct CategoryTab {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

fn category_tabs(selected: CategoryFilter) -> Vec<CategoryTab> {
    std::iter::once(CategoryFilter::All)
        .chain(Category::ALL.into_iter().map(CategoryFilter::Only))
        .map(|filter| CategoryTab {
            label: filter.as_str(),
            href: format!("/shop?cat={}", filter.as_str()),
            active: filter == selected,
        })
        .collect()
}

/// Shop query parameters.
#[derive(Debug, Deserialize)]
pub struct ShopQuery {
    pub cat: Option<String>,
}

/// Shop page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ShopTemplate {
    pub nav: NavView,
    pub heading: String,
    pub tabs: Vec<CategoryTab>,
    pub products: Vec<ProductCardView>,
    pub return_to: String,
}

/// Display the catalog, filtered by `?cat=`.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ShopQuery>,
) -> ShopTemplate {
    let filter = CategoryFilter::from_query(query.cat.as_deref());
    let products: Vec<ProductCardView> = state
        .catalog()
        .filter(filter)
        .into_iter()
        .map(ProductCardView::from)
        .collect();

    let heading = match filter {
        CategoryFilter::All => "All Products".to_string(),
        CategoryFilter::Only(category) => category.to_string(),
    };

    ShopTemplate {
        nav: NavView::load(&session).await,
        heading,
        tabs: category_tabs(filter),
        products,
        return_to: format!("/shop?cat={}", filter.as_str()),
    }
}
