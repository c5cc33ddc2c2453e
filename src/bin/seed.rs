use sgd_studio_api::{
    config::AppConfig,
    db::create_pool,
    domain::catalog::Category,
    policy::{ROLE_ADMIN, ROLE_USER},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user_with_role(
        &pool,
        "admin@example.com",
        "Studio Admin",
        "admin1234",
        ROLE_ADMIN,
    )
    .await?;
    let user_id = ensure_user_with_role(
        &pool,
        "user@example.com",
        "Sample Customer",
        "user12345",
        ROLE_USER,
    )
    .await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, name, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    category: Category,
    subcategory: &'static str,
    prices: (i64, Option<i64>, Option<i64>),
    days: (i64, Option<i64>, Option<i64>),
    featured: bool,
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = [
        SeedProduct {
            name: "Minimal Logo Package",
            description: "Clean wordmark or icon logo with source files",
            category: Category::LogoDesign,
            subcategory: "minimal",
            prices: (4_900, Some(9_900), Some(19_900)),
            days: (5, Some(3), Some(2)),
            featured: true,
        },
        SeedProduct {
            name: "Embroidered Cap",
            description: "Structured cap with front embroidery",
            category: Category::Embroidery,
            subcategory: "caps",
            prices: (1_800, Some(2_400), None),
            days: (7, Some(5), None),
            featured: false,
        },
        SeedProduct {
            name: "Premium Business Cards",
            description: "500 double-sided cards on 400gsm stock",
            category: Category::Print,
            subcategory: "business-cards",
            prices: (3_500, Some(5_500), Some(8_900)),
            days: (4, Some(3), Some(2)),
            featured: true,
        },
        SeedProduct {
            name: "Custom Print Hoodie",
            description: "Heavyweight hoodie with front and back print",
            category: Category::Apparel,
            subcategory: "hoodies",
            prices: (4_500, Some(5_900), None),
            days: (6, Some(4), None),
            featured: false,
        },
        SeedProduct {
            name: "Starter Brand Kit",
            description: "Logo, palette, typography and usage guide",
            category: Category::Branding,
            subcategory: "brand-kit",
            prices: (29_900, Some(49_900), Some(89_900)),
            days: (10, Some(8), Some(6)),
            featured: true,
        },
    ];

    for p in products {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, category, subcategory,
                price_base, price_premium, price_enterprise,
                days_base, days_premium, days_enterprise, is_featured
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(p.name)
        .bind(p.description)
        .bind(p.category.as_str())
        .bind(p.subcategory)
        .bind(p.prices.0)
        .bind(p.prices.1)
        .bind(p.prices.2)
        .bind(p.days.0)
        .bind(p.days.1)
        .bind(p.days.2)
        .bind(p.featured)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
