//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use paws_claws_core::Category;

use crate::catalog::FEATURED_COUNT;
use crate::filters;
use crate::routes::shop::ProductCardView;
use crate::routes::{NavView, take_flash};
use crate::state::AppState;

/// A category tile under the hero.
#[derive(Clone, Debug)]
pub struct CategoryTile {
    pub label: &'static str,
    pub blurb: &'static str,
    pub href: String,
}

fn category_tiles() -> Vec<CategoryTile> {
    Category::ALL
        .into_iter()
        .map(|category| CategoryTile {
            label: category.as_str(),
            blurb: match category {
                Category::Grooming => "Spa days, shampoos and brushes",
                Category::Food => "Wholesome meals and treats",
                Category::Toys => "Chews, squeakers and fetch",
            },
            href: format!("/shop?cat={category}"),
        })
        .collect()
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: NavView,
    pub flash: Option<String>,
    pub tiles: Vec<CategoryTile>,
    pub featured: Vec<ProductCardView>,
}

/// Display the home page.
#[instrument(skip(state, session))]
pub async fn home(State(state): State<AppState>, session: Session) -> HomeTemplate {
    HomeTemplate {
        flash: take_flash(&session).await,
        nav: NavView::load(&session).await,
        tiles: category_tiles(),
        featured: state
            .catalog()
            .featured(FEATURED_COUNT)
            .iter()
            .map(ProductCardView::from)
            .collect(),
    }
}
