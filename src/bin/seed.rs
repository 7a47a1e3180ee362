use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use autoparts_hub_api::{
    config::AppConfig,
    db::create_pool,
    roles::{Role, RoleSet},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let mut admin_roles = RoleSet::new();
    admin_roles.insert(Role::Buyer);
    admin_roles.insert(Role::Admin);
    let admin_id = ensure_user(
        &pool,
        "Admin",
        "admin@example.com",
        "admin123",
        &admin_roles.to_string(),
    )
    .await?;
    let buyer_id = ensure_user(
        &pool,
        "Buyer",
        "buyer@example.com",
        "buyer123",
        &RoleSet::single(Role::Buyer).to_string(),
    )
    .await?;
    seed_parts(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Buyer ID: {buyer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_parts(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let parts = vec![
        ("Brake Pad Set", "Ceramic front brake pads", 1499, 40),
        ("Oil Filter", "Spin-on oil filter", 349, 120),
        ("Spark Plug (4-pack)", "Iridium spark plugs", 999, 80),
        ("Air Filter", "High-flow panel air filter", 599, 60),
        ("Wiper Blades (pair)", "All-weather wiper blades", 449, 90),
    ];

    for (name, desc, price, stock) in parts {
        sqlx::query(
            r#"
            INSERT INTO parts (id, name, description, price, stock_quantity)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded parts");
    Ok(())
}
