use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use shop_catalog_api::{
    config::JwtConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::auth::{LoginRequest, RefreshRequest, RegisterRequest},
    entity::{
        categories::ActiveModel as CategoryActive,
        detail_images::ActiveModel as DetailImageActive,
        details::ActiveModel as DetailsActive,
        images::{ActiveModel as ImageActive, ImageQuality},
        item_categories::ActiveModel as ItemCategoryActive,
        items::ActiveModel as ItemActive,
        sizes::ActiveModel as SizeActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{ItemQuery, RecentQuery},
    services::{auth_service, catalog_service},
    state::AppState,
};

// Integration flow: seed a small catalog, list/filter it, read one item detail,
// then register -> login -> verify -> refresh.
#[tokio::test]
async fn catalog_and_auth_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run catalog flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let men = create_category(&state, "Men", None).await?;
    let men_top = create_category(&state, "Men Top", Some(men)).await?;
    let eat = create_category(&state, "Eat", None).await?;

    let tee = create_item(&state, "Cotton T-Shirt", "19.99", Some("Basic crew neck tee")).await?;
    let polo = create_item(&state, "Polo Shirt", "29.95", Some("Classic fit pique polo")).await?;
    let bars = create_item(&state, "Granola Bars", "4.99", None).await?;

    link(&state, tee, men_top).await?;
    link(&state, polo, men_top).await?;
    link(&state, bars, eat).await?;

    DetailsActive {
        id: NotSet,
        item_id: Set(tee),
        color: Set("White".into()),
        detail: Set(Some("100% cotton".into())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    for (size, quantity) in [("S", 20), ("M", 30)] {
        SizeActive {
            id: NotSet,
            item_id: Set(tee),
            size: Set(size.into()),
            quantity: Set(quantity),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&state.orm)
        .await?;
    }

    let primary = add_image(&state, tee, ImageQuality::Medium, true).await?;
    let thumb = add_image(&state, tee, ImageQuality::Low, false).await?;

    for (order, label) in [(2, "second"), (1, "first")] {
        DetailImageActive {
            id: NotSet,
            item_id: Set(tee),
            image_url: Set(format!("https://picsum.photos/seed/tee-{label}/1000/1000")),
            display_order: Set(order),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&state.orm)
        .await?;
    }

    // Listing: category filter, ascending price.
    let listed = catalog_service::list_items(
        &state,
        ItemQuery {
            category: Some(men_top.to_string()),
            sort: Some("price".into()),
            order: Some("asc".into()),
            ..Default::default()
        },
    )
    .await?;
    let meta = listed.meta.clone().expect("meta");
    assert_eq!(meta.total, Some(2));
    let items = listed.data.expect("items").items;
    let names: Vec<&str> = items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["Cotton T-Shirt", "Polo Shirt"]);
    assert_eq!(items[0].price, "19.99");
    assert_eq!(items[0].categories, vec!["Men Top".to_string()]);
    assert!(items[0].image.as_deref().unwrap_or_default().contains("low"));
    assert_eq!(items[1].image, None);

    // Search hits description too; price bound excludes the cheap snack.
    let searched = catalog_service::list_items(
        &state,
        ItemQuery {
            search: Some("PIQUE".into()),
            min_price: Some("5".into()),
            ..Default::default()
        },
    )
    .await?;
    let found = searched.data.expect("items").items;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Polo Shirt");

    // Item detail.
    let detail = catalog_service::get_item_detail(&state, tee)
        .await?
        .data
        .expect("detail");
    assert_eq!(detail.price, "19.99");
    assert_eq!(detail.categories.len(), 1);
    assert_eq!(detail.categories[0].name, "Men Top");
    assert_eq!(
        detail.details.as_ref().map(|d| d.color.as_str()),
        Some("White")
    );
    assert_eq!(detail.total_stock(), 50);
    assert_eq!(detail.primary_image().map(|img| img.id), Some(i64::from(primary)));
    assert!(detail.images.iter().any(|img| img.id == i64::from(thumb)));
    let orders: Vec<i64> = detail
        .detail_images
        .iter()
        .map(|img| img.display_order)
        .collect();
    assert_eq!(orders, vec![1, 2]);
    assert!(detail.check_invariants().is_empty());

    let bare = catalog_service::get_item_detail(&state, bars)
        .await?
        .data
        .expect("detail");
    assert_eq!(bare.description, None);
    assert_eq!(bare.details, None);
    assert!(bare.sizes.is_empty() && bare.images.is_empty() && bare.detail_images.is_empty());

    assert!(matches!(
        catalog_service::get_item_detail(&state, bars + 1000).await,
        Err(AppError::NotFound)
    ));

    // Recent items and category tree.
    let recent = catalog_service::list_recent_items(&state, RecentQuery { limit: Some(2) })
        .await?
        .data
        .expect("recent")
        .items;
    assert_eq!(recent.len(), 2);

    let tree = catalog_service::list_categories(&state)
        .await?
        .data
        .expect("tree")
        .categories;
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].name, "Men");
    assert_eq!(tree[0].subcategories[0].name, "Men Top");

    // Accounts.
    auth_service::register_user(
        &state,
        RegisterRequest {
            email: "Shopper@Example.com".into(),
            password: "secret123".into(),
            first_name: Some("Peter".into()),
            ..Default::default()
        },
    )
    .await?;

    let duplicate = auth_service::register_user(
        &state,
        RegisterRequest {
            email: "shopper@example.com".into(),
            password: "other".into(),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let wrong = auth_service::login_user(
        &state,
        LoginRequest {
            email: "shopper@example.com".into(),
            password: "nope".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::Unauthorized(_))));

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: "shopper@example.com".into(),
            password: "secret123".into(),
        },
    )
    .await?
    .data
    .expect("login");
    assert_eq!(login.user.first_name.as_deref(), Some("Peter"));
    assert!(!login.user.is_superuser);

    let verified = auth_service::verify_user(
        &state,
        &AuthUser {
            user_id: login.user.id,
        },
    )
    .await?
    .data
    .expect("verify");
    assert_eq!(verified.user.email, "shopper@example.com");

    let refreshed = auth_service::refresh_tokens(
        &state,
        RefreshRequest {
            refresh: login.tokens.refresh.clone(),
        },
    )
    .await?
    .data
    .expect("tokens");
    assert!(!refreshed.access.is_empty());

    let misuse = auth_service::refresh_tokens(
        &state,
        RefreshRequest {
            refresh: login.tokens.access,
        },
    )
    .await;
    assert!(matches!(misuse, Err(AppError::Unauthorized(_))));

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE detail_images, images, sizes, details, item_categories, items, categories, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let pool = create_pool(database_url).await?;
    Ok(AppState {
        pool,
        orm,
        jwt: Arc::new(JwtConfig::new("catalog-flow-secret")),
    })
}

async fn create_category(state: &AppState, name: &str, parent: Option<i32>) -> anyhow::Result<i32> {
    let category = CategoryActive {
        id: NotSet,
        name: Set(name.into()),
        parent_category_id: Set(parent),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

async fn create_item(
    state: &AppState,
    name: &str,
    price: &str,
    description: Option<&str>,
) -> anyhow::Result<i32> {
    let item = ItemActive {
        id: NotSet,
        name: Set(name.into()),
        price: Set(price.parse::<Decimal>()?),
        description: Set(description.map(str::to_string)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(item.id)
}

async fn link(state: &AppState, item_id: i32, category_id: i32) -> anyhow::Result<()> {
    ItemCategoryActive {
        id: NotSet,
        item_id: Set(item_id),
        category_id: Set(category_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

async fn add_image(
    state: &AppState,
    item_id: i32,
    quality: ImageQuality,
    is_primary: bool,
) -> anyhow::Result<i32> {
    let label = match quality {
        ImageQuality::Low => "low",
        ImageQuality::Medium => "medium",
        ImageQuality::High => "high",
    };
    let image = ImageActive {
        id: NotSet,
        item_id: Set(item_id),
        image_url: Set(format!("https://picsum.photos/seed/item{item_id}-{label}/400/300")),
        quality: Set(quality),
        is_primary: Set(is_primary),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(image.id)
}
