//! Catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use geekshop_core::{CategoryId, ProductId};

use super::PageContext;
use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::Product;
use crate::services::catalog::{self, Featured};
use crate::state::AppState;

/// Featured product page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/featured.html")]
pub struct FeaturedTemplate {
    pub page: PageContext,
    pub featured: Option<Featured>,
}

/// Category listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/list.html")]
pub struct CategoryTemplate {
    pub page: PageContext,
    pub category_id: CategoryId,
    pub category_name: String,
    pub products: Vec<Product>,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/detail.html")]
pub struct DetailTemplate {
    pub page: PageContext,
    pub product: Product,
}

/// Show a random featured product with related products.
///
/// An empty catalog renders without the featured section.
#[instrument(skip(state, user))]
pub async fn featured(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    let page = PageContext::load(&state, "Products", user).await?;
    let featured = catalog::featured(state.pool()).await?;

    Ok(FeaturedTemplate { page, featured })
}

/// List visible products in one category, or all with id 0, by price.
#[instrument(skip(state, user))]
pub async fn category(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(category_id): Path<CategoryId>,
) -> Result<impl IntoResponse> {
    let category_name = if category_id.is_all() {
        "All".to_string()
    } else {
        CategoryRepository::new(state.pool())
            .get_active(category_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("category {category_id}")))?
            .name
    };

    let products = ProductRepository::new(state.pool())
        .list_visible_by_price(category_id)
        .await?;
    let page = PageContext::load(&state, "Products", user).await?;

    Ok(CategoryTemplate {
        page,
        category_id,
        category_name,
        products,
    })
}

/// Show one visible product.
#[instrument(skip(state, user))]
pub async fn detail(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = ProductRepository::new(state.pool())
        .get_visible(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;
    let page = PageContext::load(&state, "Products", user).await?;

    Ok(DetailTemplate { page, product })
}
