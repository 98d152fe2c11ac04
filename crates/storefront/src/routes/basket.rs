//! Basket route handlers.
//!
//! Every mutation is scoped to the logged-in user. Add and remove redirect
//! back to the page they were clicked on; quantity edits answer with a
//! re-rendered lines fragment for the basket script.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, header::REFERER},
    response::{IntoResponse, Redirect},
};
use serde_json::json;
use tracing::instrument;
use url::Url;

use geekshop_core::{BasketLineId, ProductId, QuantityUpdate};

use super::PageContext;
use crate::db::{BasketRepository, CategoryRepository};
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAsync, RequireAuth};
use crate::models::{BasketLine, BasketSummary};
use crate::state::AppState;

/// Basket page path, the fallback redirect target.
pub const BASKET_PATH: &str = "/basket/";

/// Basket page template.
#[derive(Template, WebTemplate)]
#[template(path = "basket/show.html")]
pub struct BasketTemplate {
    pub page: PageContext,
    pub lines: Vec<BasketLine>,
    pub summary: BasketSummary,
}

/// Basket lines fragment, returned inside the edit JSON.
#[derive(Template)]
#[template(path = "basket/lines.html")]
pub struct BasketLinesTemplate {
    pub lines: Vec<BasketLine>,
    pub summary: BasketSummary,
}

/// Show the basket. Anonymous visitors see an empty basket.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    let menu = CategoryRepository::new(state.pool()).list_active().await?;
    let lines = match &user {
        Some(u) => BasketRepository::new(state.pool()).lines(u.id).await?,
        None => Vec::new(),
    };
    let summary = BasketSummary::from_lines(&lines);

    let page = PageContext {
        title: "Basket",
        user,
        menu,
        basket: summary,
    };

    Ok(BasketTemplate {
        page,
        lines,
        summary,
    })
}

/// Add one unit of a product and redirect back.
#[instrument(skip(state, user, headers), fields(user_id = %user.id))]
pub async fn add(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let quantity = BasketRepository::new(state.pool())
        .add_one(user.id, product_id)
        .await?;
    tracing::info!(%product_id, %quantity, "Added to basket");

    Ok(redirect_back(&headers, &state.config().base_url))
}

/// Remove one of the user's lines and redirect back.
#[instrument(skip(state, user, headers), fields(user_id = %user.id))]
pub async fn remove(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(line_id): Path<BasketLineId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    BasketRepository::new(state.pool())
        .remove(user.id, line_id)
        .await?;
    tracing::info!(%line_id, "Removed basket line");

    Ok(redirect_back(&headers, &state.config().base_url))
}

/// Set a line's quantity, deleting it at zero or below.
///
/// Responds with `{"result": "<lines fragment>"}`.
#[instrument(skip(_async, state, user), fields(user_id = %user.id))]
pub async fn edit(
    _async: RequireAsync,
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path((line_id, quantity)): Path<(BasketLineId, i64)>,
) -> Result<impl IntoResponse> {
    let update = QuantityUpdate::from_requested(quantity)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let basket = BasketRepository::new(state.pool());
    basket.apply(user.id, line_id, update).await?;

    let lines = basket.lines(user.id).await?;
    let summary = BasketSummary::from_lines(&lines);
    let result = BasketLinesTemplate { lines, summary }.render()?;

    Ok(Json(json!({ "result": result })))
}

/// Redirect to the referring page when it is on this site, else the basket.
fn redirect_back(headers: &HeaderMap, base_url: &Url) -> Redirect {
    same_site_referer(headers, base_url)
        .map_or_else(|| Redirect::to(BASKET_PATH), |target| Redirect::to(&target))
}

/// Path and query of a `Referer` with the same origin as `base_url`.
fn same_site_referer(headers: &HeaderMap, base_url: &Url) -> Option<String> {
    let referer = headers.get(REFERER)?.to_str().ok()?;
    let referer = Url::parse(referer).ok()?;

    if referer.origin() != base_url.origin() {
        return None;
    }

    Some(match referer.query() {
        Some(query) => format!("{}?{query}", referer.path()),
        None => referer.path().to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:8000").unwrap()
    }

    fn with_referer(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_same_site_referer_kept() {
        let headers = with_referer("http://localhost:8000/products/2/?sort=price");
        assert_eq!(
            same_site_referer(&headers, &base()).as_deref(),
            Some("/products/2/?sort=price")
        );
    }

    #[test]
    fn test_foreign_referer_dropped() {
        let headers = with_referer("https://evil.example.com/products/2/");
        assert_eq!(same_site_referer(&headers, &base()), None);

        let headers = with_referer("http://localhost:9000/products/2/");
        assert_eq!(same_site_referer(&headers, &base()), None);
    }

    #[test]
    fn test_missing_or_garbage_referer() {
        assert_eq!(same_site_referer(&HeaderMap::new(), &base()), None);
        assert_eq!(same_site_referer(&with_referer("not a url"), &base()), None);
    }

    #[test]
    fn test_lines_fragment_renders_totals() {
        let lines = vec![BasketLine {
            id: BasketLineId::new(7),
            product_id: ProductId::new(3),
            product_name: "Mechanical keyboard".to_string(),
            category_name: "Peripherals".to_string(),
            price: "49.90".parse().unwrap(),
            quantity: 2,
        }];
        let summary = BasketSummary::from_lines(&lines);
        let html = BasketLinesTemplate { lines, summary }.render().unwrap();

        assert!(html.contains("Mechanical keyboard"));
        assert!(html.contains("99.80"));
        assert!(html.contains("data-line=\"7\""));
    }

    #[test]
    fn test_empty_lines_fragment() {
        let html = BasketLinesTemplate {
            lines: Vec::new(),
            summary: BasketSummary::default(),
        }
        .render()
        .unwrap();
        assert!(html.contains("Your basket is empty"));
    }
}
