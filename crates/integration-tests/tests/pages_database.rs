//! Rendered pages through the full router against a real `PostgreSQL` database.
//!
//! Run with: cargo test -p geekshop-integration-tests -- --ignored

use axum::http::StatusCode;
use sqlx::PgPool;

use geekshop_integration_tests::{body_text, get_request, send, test_app_with_pool};
use geekshop_storefront::db::CategoryRepository;
use geekshop_storefront::models::catalog::CategoryInput;

async fn category(pool: &PgPool, name: &str, is_active: bool) {
    CategoryRepository::new(pool)
        .create(&CategoryInput {
            name: name.to_string(),
            description: String::new(),
            is_active,
        })
        .await
        .expect("Failed to create category");
}

// ============================================================================
// Basket
// ============================================================================

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_anonymous_basket_shows_menu(pool: PgPool) {
    category(&pool, "Board games", true).await;
    category(&pool, "Retired", false).await;
    let app = test_app_with_pool(pool);

    let resp = send(&app, get_request("/basket/", None)).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("Your basket is empty"));
    assert!(body.contains("/auth/login/"));
    assert!(body.contains("Board games"));
    assert!(!body.contains("Retired"));
}
