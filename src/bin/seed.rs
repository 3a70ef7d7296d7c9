use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use shop_catalog_api::{
    config,
    db::{create_orm_conn, create_pool, run_migrations},
};
use sqlx::{Postgres, Transaction};

struct SeedItem {
    name: &'static str,
    price: &'static str,
    description: &'static str,
    category: &'static str,
    color: &'static str,
    detail: &'static str,
    sizes: &'static [(&'static str, i32)],
}

const ROOT_CATEGORIES: &[&str] = &["Men", "Women", "Food", "Other"];

const SUBCATEGORIES: &[(&str, &str)] = &[
    ("Men Top", "Men"),
    ("Men Bottom", "Men"),
    ("Men Shoes", "Men"),
    ("Women Top", "Women"),
    ("Women Bottom", "Women"),
    ("Women Shoes", "Women"),
    ("Eat", "Food"),
    ("Drink", "Food"),
    ("furniture", "Other"),
    ("electronics", "Other"),
    ("accessory", "Other"),
];

const ITEMS: &[SeedItem] = &[
    SeedItem {
        name: "Cotton T-Shirt",
        price: "19.99",
        description: "Basic crew neck tee",
        category: "Men Top",
        color: "White",
        detail: "100% cotton",
        sizes: &[("S", 20), ("M", 30), ("L", 25), ("XL", 15)],
    },
    SeedItem {
        name: "Polo Shirt",
        price: "29.95",
        description: "Classic fit pique polo",
        category: "Men Top",
        color: "Blue",
        detail: "Moisture-wicking fabric",
        sizes: &[("S", 18), ("M", 22), ("L", 20)],
    },
    SeedItem {
        name: "Flannel Shirt",
        price: "39.50",
        description: "Warm plaid button-down",
        category: "Men Top",
        color: "Red/Black",
        detail: "Brushed flannel interior",
        sizes: &[("M", 12), ("L", 15), ("XL", 10)],
    },
    SeedItem {
        name: "Denim Jeans",
        price: "59.99",
        description: "Slim fit blue jeans",
        category: "Men Bottom",
        color: "Blue",
        detail: "Stretch denim",
        sizes: &[("30", 8), ("32", 15), ("34", 12), ("36", 10)],
    },
    SeedItem {
        name: "Chino Pants",
        price: "49.95",
        description: "Khaki casual trousers",
        category: "Men Bottom",
        color: "Khaki",
        detail: "Wrinkle-resistant",
        sizes: &[("30", 10), ("32", 18), ("34", 15)],
    },
    SeedItem {
        name: "Shorts",
        price: "34.99",
        description: "Cargo shorts with pockets",
        category: "Men Bottom",
        color: "Olive",
        detail: "Multiple cargo pockets",
        sizes: &[("S", 15), ("M", 20), ("L", 18)],
    },
    SeedItem {
        name: "Running Shoes",
        price: "89.99",
        description: "Lightweight mesh sneakers",
        category: "Men Shoes",
        color: "Black/Red",
        detail: "Cushioned insole",
        sizes: &[("8", 15), ("9", 20), ("10", 18), ("11", 12)],
    },
    SeedItem {
        name: "Leather Boots",
        price: "129.95",
        description: "Waterproof work boots",
        category: "Men Shoes",
        color: "Brown",
        detail: "Steel toe",
        sizes: &[("9", 10), ("10", 15), ("11", 12), ("12", 8)],
    },
    SeedItem {
        name: "Loafers",
        price: "79.50",
        description: "Slip-on dress shoes",
        category: "Men Shoes",
        color: "Black",
        detail: "Tassel detail",
        sizes: &[("8", 10), ("9", 15), ("10", 12)],
    },
    SeedItem {
        name: "Blouse",
        price: "34.99",
        description: "Silky floral top",
        category: "Women Top",
        color: "Floral White",
        detail: "V-neck design",
        sizes: &[("XS", 5), ("S", 15), ("M", 20), ("L", 12)],
    },
    SeedItem {
        name: "Tank Top",
        price: "22.50",
        description: "Sleeveless summer top",
        category: "Women Top",
        color: "Pink",
        detail: "Racerback style",
        sizes: &[("S", 18), ("M", 22), ("L", 15)],
    },
    SeedItem {
        name: "Sweater",
        price: "45.95",
        description: "Knit cashmere sweater",
        category: "Women Top",
        color: "Cream",
        detail: "V-neck cable knit",
        sizes: &[("S", 10), ("M", 15), ("L", 12)],
    },
    SeedItem {
        name: "Skinny Jeans",
        price: "64.99",
        description: "Stretch denim jeans",
        category: "Women Bottom",
        color: "Black",
        detail: "High-waist fit",
        sizes: &[("26", 10), ("28", 15), ("30", 20)],
    },
    SeedItem {
        name: "Summer Skirt",
        price: "39.95",
        description: "Floral print midi skirt",
        category: "Women Bottom",
        color: "Yellow Floral",
        detail: "A-line silhouette",
        sizes: &[("S", 8), ("M", 12), ("L", 10)],
    },
    SeedItem {
        name: "Leggings",
        price: "29.99",
        description: "Yoga pants with pocket",
        category: "Women Bottom",
        color: "Charcoal",
        detail: "Side phone pocket",
        sizes: &[("XS", 15), ("S", 20), ("M", 25)],
    },
    SeedItem {
        name: "High Heels",
        price: "79.99",
        description: "Stiletto pumps",
        category: "Women Shoes",
        color: "Silver",
        detail: "4-inch heel",
        sizes: &[("6", 5), ("7", 8), ("8", 10), ("9", 6)],
    },
    SeedItem {
        name: "Sandals",
        price: "49.95",
        description: "Leather strappy sandals",
        category: "Women Shoes",
        color: "Tan",
        detail: "Adjustable straps",
        sizes: &[("6", 10), ("7", 15), ("8", 12)],
    },
    SeedItem {
        name: "Ankle Boots",
        price: "89.50",
        description: "Suede fashion boots",
        category: "Women Shoes",
        color: "Burgundy",
        detail: "Block heel",
        sizes: &[("7", 8), ("8", 10), ("9", 7)],
    },
    SeedItem {
        name: "Granola Bars",
        price: "4.99",
        description: "Oats & honey snack",
        category: "Eat",
        color: "Oatmeal",
        detail: "Gluten-free",
        sizes: &[("Pack", 50)],
    },
    SeedItem {
        name: "Apple Chips",
        price: "3.49",
        description: "Dehydrated fruit snack",
        category: "Eat",
        color: "Natural",
        detail: "No added sugar",
        sizes: &[("Bag", 75)],
    },
    SeedItem {
        name: "Bottled Water",
        price: "1.99",
        description: "500ml spring water",
        category: "Drink",
        color: "Clear",
        detail: "BPA-free bottle",
        sizes: &[("Bottle", 100)],
    },
    SeedItem {
        name: "Energy Drink",
        price: "2.49",
        description: "Caffeinated beverage",
        category: "Drink",
        color: "Blue",
        detail: "Sugar-free",
        sizes: &[("Can", 120)],
    },
    SeedItem {
        name: "Phone Charger",
        price: "24.99",
        description: "USB-C fast charger",
        category: "Other",
        color: "Black",
        detail: "6ft cable",
        sizes: &[("Each", 40)],
    },
    SeedItem {
        name: "Notebook",
        price: "8.95",
        description: "200-page lined journal",
        category: "Other",
        color: "Red",
        detail: "Hardcover",
        sizes: &[("Each", 30)],
    },
];

/// Image sets per item; set `A` carries the primary image.
const IMAGE_SETS: &[&str] = &["A", "B", "C", "D"];
const IMAGE_QUALITIES: &[(&str, &str)] = &[("medium", "800/600"), ("low", "400/300")];
const DETAIL_IMAGES_PER_ITEM: i32 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shop_catalog_api=debug".into()),
        )
        .init();

    let database_url = config::database_url()?;
    let orm = create_orm_conn(&database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let pool = create_pool(&database_url).await?;
    let (existing,): (i64,) = sqlx::query_as("SELECT count(*) FROM items")
        .fetch_one(&pool)
        .await?;
    if existing > 0 {
        tracing::info!(existing, "catalog already seeded, nothing to do");
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    let categories = seed_categories(&mut tx).await?;
    for item in ITEMS {
        seed_item(&mut tx, &categories, item).await?;
    }
    tx.commit().await?;

    tracing::info!(
        categories = categories.len(),
        items = ITEMS.len(),
        "seed completed"
    );
    Ok(())
}

async fn seed_categories(
    tx: &mut Transaction<'_, Postgres>,
) -> anyhow::Result<HashMap<&'static str, i32>> {
    let mut ids = HashMap::new();

    for name in ROOT_CATEGORIES {
        let (id,): (i32,) =
            sqlx::query_as("INSERT INTO categories (name) VALUES ($1) RETURNING id")
                .bind(*name)
                .fetch_one(&mut **tx)
                .await?;
        ids.insert(*name, id);
    }

    for (name, parent) in SUBCATEGORIES {
        let parent_id = ids
            .get(parent)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unknown parent category {parent}"))?;
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO categories (name, parent_category_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(*name)
        .bind(parent_id)
        .fetch_one(&mut **tx)
        .await?;
        ids.insert(*name, id);
    }

    Ok(ids)
}

async fn seed_item(
    tx: &mut Transaction<'_, Postgres>,
    categories: &HashMap<&'static str, i32>,
    item: &SeedItem,
) -> anyhow::Result<()> {
    let price = Decimal::from_str(item.price)?;
    let (item_id,): (i32,) = sqlx::query_as(
        "INSERT INTO items (name, price, description) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(item.name)
    .bind(price)
    .bind(item.description)
    .fetch_one(&mut **tx)
    .await?;

    let category_id = categories
        .get(item.category)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("unknown category {}", item.category))?;
    sqlx::query("INSERT INTO item_categories (item_id, category_id) VALUES ($1, $2)")
        .bind(item_id)
        .bind(category_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("INSERT INTO details (item_id, color, detail) VALUES ($1, $2, $3)")
        .bind(item_id)
        .bind(item.color)
        .bind(item.detail)
        .execute(&mut **tx)
        .await?;

    for (size, quantity) in item.sizes {
        sqlx::query("INSERT INTO sizes (item_id, size, quantity) VALUES ($1, $2, $3)")
            .bind(item_id)
            .bind(*size)
            .bind(*quantity)
            .execute(&mut **tx)
            .await?;
    }

    for set in IMAGE_SETS {
        for (quality, dimensions) in IMAGE_QUALITIES {
            let url = format!(
                "https://picsum.photos/seed/item{item_id}-img{set}-{quality}/{dimensions}"
            );
            let is_primary = *set == "A" && *quality == "medium";
            sqlx::query(
                "INSERT INTO images (item_id, image_url, quality, is_primary) VALUES ($1, $2, $3, $4)",
            )
            .bind(item_id)
            .bind(url)
            .bind(*quality)
            .bind(is_primary)
            .execute(&mut **tx)
            .await?;
        }
    }

    for order in 1..=DETAIL_IMAGES_PER_ITEM {
        let url = format!("https://picsum.photos/seed/item{item_id}-detail{order}/1000/1000");
        sqlx::query(
            "INSERT INTO detail_images (item_id, image_url, display_order) VALUES ($1, $2, $3)",
        )
        .bind(item_id)
        .bind(url)
        .bind(order)
        .execute(&mut **tx)
        .await?;
    }

    tracing::debug!(item_id, name = item.name, "seeded item");
    Ok(())
}
