//! Repository tests against a real `PostgreSQL` database.
//!
//! `sqlx::test` creates and migrates a fresh database per test from
//! `DATABASE_URL`.
//!
//! Run with: cargo test -p geekshop-integration-tests -- --ignored

use sqlx::PgPool;

use geekshop_core::{
    BasketLineId, CategoryId, Price, ProductId, Quantity, QuantityUpdate, UserId, Username,
};
use geekshop_storefront::db::{
    BasketRepository, CategoryRepository, ProductRepository, RepositoryError, UserRepository,
};
use geekshop_storefront::models::catalog::{CategoryInput, ProductInput};
use geekshop_storefront::models::user::NewUser;
use geekshop_storefront::services::catalog::featured;

// ============================================================================
// Fixtures
// ============================================================================

async fn user(pool: &PgPool, name: &str) -> UserId {
    UserRepository::new(pool)
        .create(&NewUser {
            username: Username::parse(name).expect("valid username"),
            email: None,
            first_name: None,
            age: None,
            password_hash: "$argon2id$placeholder".to_string(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
        })
        .await
        .expect("Failed to create user")
        .id
}

async fn category(pool: &PgPool, name: &str, is_active: bool) -> CategoryId {
    CategoryRepository::new(pool)
        .create(&CategoryInput {
            name: name.to_string(),
            description: String::new(),
            is_active,
        })
        .await
        .expect("Failed to create category")
        .id
}

async fn product(pool: &PgPool, category_id: CategoryId, name: &str, price: &str) -> ProductId {
    ProductRepository::new(pool)
        .create(&ProductInput {
            category_id,
            name: name.to_string(),
            short_desc: String::new(),
            description: String::new(),
            price: price.parse::<Price>().expect("valid price"),
            quantity: 10,
            is_active: true,
        })
        .await
        .expect("Failed to create product")
}

// ============================================================================
// Basket
// ============================================================================

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_adding_twice_increments_one_line(pool: PgPool) {
    let shopper = user(&pool, "shopper").await;
    let games = category(&pool, "Games", true).await;
    let chess = product(&pool, games, "Chess", "25.00").await;
    let basket = BasketRepository::new(&pool);

    assert_eq!(basket.add_one(shopper, chess).await.expect("add").get(), 1);
    assert_eq!(basket.add_one(shopper, chess).await.expect("add").get(), 2);

    let lines = basket.lines(shopper).await.expect("lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 2);
    assert_eq!(lines[0].cost_display(), "50.00");
}

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_adding_to_full_line_saturates(pool: PgPool) {
    let shopper = user(&pool, "shopper").await;
    let games = category(&pool, "Games", true).await;
    let chess = product(&pool, games, "Chess", "25.00").await;
    let basket = BasketRepository::new(&pool);
    basket.add_one(shopper, chess).await.expect("add");
    let line = basket.lines(shopper).await.expect("lines")[0].id;

    basket
        .apply(shopper, line, QuantityUpdate::Set(Quantity::MAX))
        .await
        .expect("set");

    assert_eq!(
        basket.add_one(shopper, chess).await.expect("add"),
        Quantity::MAX
    );
    assert_eq!(
        basket.lines(shopper).await.expect("lines")[0].quantity,
        i32::MAX
    );
}

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_hidden_product_cannot_be_added(pool: PgPool) {
    let shopper = user(&pool, "shopper").await;
    let retired = category(&pool, "Retired", false).await;
    let relic = product(&pool, retired, "Relic", "5.00").await;
    let games = category(&pool, "Games", true).await;
    let chess = product(&pool, games, "Chess", "25.00").await;
    ProductRepository::new(&pool)
        .deactivate(chess)
        .await
        .expect("deactivate");

    let basket = BasketRepository::new(&pool);
    for id in [relic, chess, ProductId::new(9999)] {
        assert!(matches!(
            basket.add_one(shopper, id).await,
            Err(RepositoryError::NotFound)
        ));
    }
    assert!(basket.lines(shopper).await.expect("lines").is_empty());
}

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_edit_to_zero_or_below_deletes_line(pool: PgPool) {
    let shopper = user(&pool, "shopper").await;
    let games = category(&pool, "Games", true).await;
    let chess = product(&pool, games, "Chess", "25.00").await;
    let go = product(&pool, games, "Go", "40.00").await;
    let basket = BasketRepository::new(&pool);
    basket.add_one(shopper, chess).await.expect("add");
    basket.add_one(shopper, go).await.expect("add");

    let lines = basket.lines(shopper).await.expect("lines");
    let update = |n| QuantityUpdate::from_requested(n).expect("in range");

    basket.apply(shopper, lines[0].id, update(5)).await.expect("set");
    basket.apply(shopper, lines[1].id, update(0)).await.expect("remove");

    let after = basket.lines(shopper).await.expect("lines");
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].quantity, 5);

    basket.apply(shopper, after[0].id, update(-3)).await.expect("remove");
    assert!(basket.lines(shopper).await.expect("lines").is_empty());
}

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_foreign_or_missing_line_is_not_found(pool: PgPool) {
    let owner = user(&pool, "owner").await;
    let intruder = user(&pool, "intruder").await;
    let games = category(&pool, "Games", true).await;
    let chess = product(&pool, games, "Chess", "25.00").await;
    let basket = BasketRepository::new(&pool);
    basket.add_one(owner, chess).await.expect("add");
    let line = basket.lines(owner).await.expect("lines")[0].id;

    assert!(matches!(
        basket.remove(intruder, line).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        basket
            .apply(intruder, line, QuantityUpdate::from_requested(9).expect("in range"))
            .await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        basket.remove(owner, BasketLineId::new(9999)).await,
        Err(RepositoryError::NotFound)
    ));

    let lines = basket.lines(owner).await.expect("lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 1);
}

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_lines_ordered_by_category_name(pool: PgPool) {
    let shopper = user(&pool, "shopper").await;
    let toys = category(&pool, "Toys", true).await;
    let books = category(&pool, "Books", true).await;
    let yoyo = product(&pool, toys, "Yo-yo", "3.00").await;
    let dune = product(&pool, books, "Dune", "9.99").await;
    let basket = BasketRepository::new(&pool);
    basket.add_one(shopper, yoyo).await.expect("add");
    basket.add_one(shopper, dune).await.expect("add");

    let names: Vec<_> = basket
        .lines(shopper)
        .await
        .expect("lines")
        .into_iter()
        .map(|l| l.category_name)
        .collect();
    assert_eq!(names, ["Books", "Toys"]);
}

// ============================================================================
// Catalog
// ============================================================================

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_category_listing_ordered_by_price(pool: PgPool) {
    let games = category(&pool, "Games", true).await;
    let books = category(&pool, "Books", true).await;
    product(&pool, games, "Go", "40.00").await;
    product(&pool, books, "Dune", "9.99").await;
    product(&pool, games, "Chess", "25.00").await;
    let products = ProductRepository::new(&pool);

    let all: Vec<_> = products
        .list_visible_by_price(CategoryId::ALL)
        .await
        .expect("list")
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(all, ["Dune", "Chess", "Go"]);

    let only_games: Vec<_> = products
        .list_visible_by_price(games)
        .await
        .expect("list")
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(only_games, ["Chess", "Go"]);
}

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_soft_delete_keeps_row(pool: PgPool) {
    let games = category(&pool, "Games", true).await;
    let chess = product(&pool, games, "Chess", "25.00").await;
    let products = ProductRepository::new(&pool);

    assert!(products.deactivate(chess).await.expect("deactivate"));
    assert!(!products.deactivate(ProductId::new(9999)).await.expect("deactivate"));

    let stored = products.get(chess).await.expect("get").expect("row kept");
    assert!(!stored.is_active);
    assert!(products.get_visible(chess).await.expect("get").is_none());
    assert_eq!(products.list_for_admin(None).await.expect("list").len(), 1);
}

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_inactive_category_hides_its_products(pool: PgPool) {
    let games = category(&pool, "Games", true).await;
    let chess = product(&pool, games, "Chess", "25.00").await;
    CategoryRepository::new(&pool)
        .deactivate(games)
        .await
        .expect("deactivate");

    let products = ProductRepository::new(&pool);
    assert!(products.get_visible(chess).await.expect("get").is_none());
    assert_eq!(products.count_visible().await.expect("count"), 0);
    assert!(
        CategoryRepository::new(&pool)
            .list_active()
            .await
            .expect("list")
            .is_empty()
    );
}

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_featured_on_empty_catalog_is_none(pool: PgPool) {
    assert!(featured(&pool).await.expect("featured").is_none());
}

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_featured_related_share_category(pool: PgPool) {
    let games = category(&pool, "Games", true).await;
    let books = category(&pool, "Books", true).await;
    for name in ["Chess", "Go", "Shogi", "Xiangqi", "Hnefatafl"] {
        product(&pool, games, name, "10.00").await;
    }
    product(&pool, books, "Dune", "9.99").await;

    for _ in 0..10 {
        let shown = featured(&pool).await.expect("featured").expect("non-empty");
        assert!(shown.related.len() <= 3);
        for related in &shown.related {
            assert_eq!(related.category_id, shown.product.category_id);
            assert_ne!(related.id, shown.product.id);
        }
    }
}

// ============================================================================
// Uniqueness
// ============================================================================

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_names_conflict(pool: PgPool) {
    category(&pool, "Games", true).await;
    let duplicate = CategoryRepository::new(&pool)
        .create(&CategoryInput {
            name: "Games".to_string(),
            description: String::new(),
            is_active: true,
        })
        .await;
    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));

    user(&pool, "ada").await;
    let duplicate = UserRepository::new(&pool)
        .create(&NewUser {
            username: Username::parse("ada").expect("valid username"),
            email: None,
            first_name: None,
            age: None,
            password_hash: "$argon2id$placeholder".to_string(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
        })
        .await;
    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));
}

#[sqlx::test(migrator = "geekshop_storefront::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_product_with_unknown_category_conflicts(pool: PgPool) {
    let result = ProductRepository::new(&pool)
        .create(&ProductInput {
            category_id: CategoryId::new(4242),
            name: "Orphan".to_string(),
            short_desc: String::new(),
            description: String::new(),
            price: Price::ZERO,
            quantity: 0,
            is_active: true,
        })
        .await;

    assert!(matches!(result, Err(RepositoryError::Conflict(ref m)) if m == "category does not exist"));
}
