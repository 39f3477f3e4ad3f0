use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let db_file = db_path.unwrap_or("target/db/store.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url).await?;

    bootstrap_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    tracing::info!("Database ready: {}", absolute_path.display());
    Ok(())
}

pub fn get_connection() -> anyhow::Result<&'static DatabaseConnection> {
    DB_CONN
        .get()
        .ok_or_else(|| anyhow::anyhow!("Database connection has not been initialized"))
}

/// Создаёт таблицы магазина, если их ещё нет. Повторный вызов безопасен.
pub async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS a001_store_product (
            id TEXT PRIMARY KEY NOT NULL,
            product_type TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            sku TEXT NOT NULL DEFAULT '',
            regular_price TEXT NOT NULL DEFAULT '',
            stock_quantity INTEGER,
            attributes_json TEXT NOT NULL DEFAULT '[]',
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT,
            updated_at TEXT,
            version INTEGER NOT NULL DEFAULT 0
        );
        "#,
        // SKU lookups ignore soft-deleted rows, so uniqueness must ignore them too
        "DROP INDEX IF EXISTS idx_a001_store_product_sku;",
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_a001_store_product_sku_active
            ON a001_store_product (sku) WHERE sku <> '' AND is_deleted = 0;
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS a001_store_product_meta (
            product_id TEXT NOT NULL,
            meta_key TEXT NOT NULL,
            meta_value TEXT NOT NULL,
            PRIMARY KEY (product_id, meta_key)
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS a002_store_variation (
            id TEXT PRIMARY KEY NOT NULL,
            parent_id TEXT NOT NULL,
            sku TEXT NOT NULL DEFAULT '',
            regular_price TEXT NOT NULL DEFAULT '',
            manage_stock INTEGER NOT NULL DEFAULT 0,
            stock_quantity INTEGER,
            attributes_json TEXT NOT NULL DEFAULT '{}',
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT,
            updated_at TEXT,
            version INTEGER NOT NULL DEFAULT 0
        );
        "#,
        "DROP INDEX IF EXISTS idx_a002_store_variation_sku;",
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_a002_store_variation_sku_active
            ON a002_store_variation (sku) WHERE sku <> '' AND is_deleted = 0;
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_a002_store_variation_parent
            ON a002_store_variation (parent_id);
        "#,
    ];

    for sql in statements {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            sql.to_string(),
        ))
        .await?;
    }
    Ok(())
}
