//! HTTP tests through the full storefront router.
//!
//! Sessions live in memory and the database pool never connects, so every
//! request here is answered before a query would run.

use axum::http::StatusCode;

use geekshop_integration_tests::{
    TestUser, as_async, body_text, get_request, location, login, post_form, send, test_app,
};

// ============================================================================
// Health & Middleware
// ============================================================================

#[tokio::test]
async fn test_health_ok_with_security_headers() {
    let app = test_app();

    let resp = send(&app, get_request("/health", None)).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert!(resp.headers().contains_key("x-request-id"));
    assert_eq!(body_text(resp).await, "ok");
}

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let app = test_app();
    let mut req = get_request("/health", None);
    req.headers_mut()
        .insert("x-request-id", "trace-abc".parse().expect("valid header"));

    let resp = send(&app, req).await;

    assert_eq!(resp.headers()["x-request-id"], "trace-abc");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = test_app();
    let resp = send(&app, get_request("/no-such-page/", None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Basket
// ============================================================================

#[tokio::test]
async fn test_anonymous_add_redirects_to_login() {
    let app = test_app();

    let resp = send(&app, post_form("/basket/add/1/", "", None)).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/auth/login/"));
}

#[tokio::test]
async fn test_anonymous_remove_redirects_to_login() {
    let app = test_app();

    let resp = send(&app, get_request("/basket/remove/4/", None)).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/auth/login/"));
}

#[tokio::test]
async fn test_edit_requires_async_request() {
    let app = test_app();
    let cookie = login(&app, TestUser::Shopper).await;

    let resp = send(&app, get_request("/basket/edit/4/2/", Some(&cookie))).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_anonymous_async_edit_is_unauthorized() {
    let app = test_app();

    let resp = send(&app, as_async(get_request("/basket/edit/4/2/", None))).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_edit_rejects_non_numeric_path() {
    let app = test_app();
    let cookie = login(&app, TestUser::Shopper).await;

    let resp = send(
        &app,
        as_async(get_request("/basket/edit/four/2/", Some(&cookie))),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_login_page_renders() {
    let app = test_app();

    let resp = send(&app, get_request("/auth/login/", None)).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains(r#"name="username""#));
    assert!(body.contains(r#"name="password""#));
}

#[tokio::test]
async fn test_login_with_invalid_username_is_unauthorized() {
    let app = test_app();

    let resp = send(
        &app,
        post_form("/auth/login/", "username=&password=whatever", None),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(
        body_text(resp)
            .await
            .contains("Please enter a correct username and password")
    );
}

#[tokio::test]
async fn test_register_mismatched_passwords_rerenders_form() {
    let app = test_app();

    let resp = send(
        &app,
        post_form(
            "/auth/register/",
            "username=ada&password=correct-horse&password_confirm=battery-staple",
            None,
        ),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_text(resp).await;
    assert!(body.contains("passwords do not match"));
    assert!(body.contains(r#"value="ada""#));
    assert!(!body.contains("correct-horse"));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = test_app();
    let cookie = login(&app, TestUser::Shopper).await;

    let resp = send(&app, post_form("/auth/logout/", "", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/"));

    // The old cookie no longer identifies anyone
    let resp = send(&app, get_request("/basket/remove/4/", Some(&cookie))).await;
    assert_eq!(location(&resp), Some("/auth/login/"));
}

// ============================================================================
// Admin Access
// ============================================================================

#[tokio::test]
async fn test_anonymous_admin_redirects_to_login() {
    let app = test_app();

    for path in ["/admin/users/", "/admin/categories/create/", "/admin/products/3/update/"] {
        let resp = send(&app, get_request(path, None)).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), Some("/auth/login/"), "{path}");
    }
}

#[tokio::test]
async fn test_non_superuser_admin_get_is_forbidden() {
    let app = test_app();

    for user in [TestUser::Shopper, TestUser::Staff] {
        let cookie = login(&app, user).await;
        for path in [
            "/admin/users/",
            "/admin/categories/",
            "/admin/products/?category=2",
            "/admin/users/1/delete/",
        ] {
            let resp = send(&app, get_request(path, Some(&cookie))).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{user:?} {path}");
        }
    }
}

#[tokio::test]
async fn test_non_superuser_admin_post_is_forbidden() {
    let app = test_app();
    let cookie = login(&app, TestUser::Staff).await;

    let create = send(
        &app,
        post_form(
            "/admin/categories/create/",
            "name=Board+games",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(create.status(), StatusCode::FORBIDDEN);

    let update = send(
        &app,
        post_form(
            "/admin/users/1/update/",
            "username=mallory&is_superuser=on",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(update.status(), StatusCode::FORBIDDEN);

    let delete = send(&app, post_form("/admin/products/1/delete/", "", Some(&cookie))).await;
    assert_eq!(delete.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_root_redirects_to_users() {
    let app = test_app();
    let cookie = login(&app, TestUser::Superuser).await;

    for path in ["/admin", "/admin/"] {
        let resp = send(&app, get_request(path, Some(&cookie))).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), Some("/admin/users/"), "{path}");
    }
}

#[tokio::test]
async fn test_superuser_sees_create_form() {
    let app = test_app();
    let cookie = login(&app, TestUser::Superuser).await;

    let resp = send(&app, get_request("/admin/categories/create/", Some(&cookie))).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains(r#"name="name""#));
    assert!(body.contains(r#"name="is_active""#));
}

#[tokio::test]
async fn test_superuser_invalid_create_is_unprocessable() {
    let app = test_app();
    let cookie = login(&app, TestUser::Superuser).await;

    let resp = send(
        &app,
        post_form("/admin/categories/create/", "description=Dice", Some(&cookie)),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_text(resp).await;
    assert!(body.contains("This field is required."));
    assert!(body.contains("Dice"));
}

#[tokio::test]
async fn test_superuser_overlong_name_is_unprocessable() {
    let app = test_app();
    let cookie = login(&app, TestUser::Superuser).await;
    let form = format!("name={}&is_active=on", "x".repeat(65));

    let resp = send(&app, post_form("/admin/categories/create/", &form, Some(&cookie))).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        body_text(resp)
            .await
            .contains("Ensure this value has at most 64 characters.")
    );
}
