use crate::entities::{
    cases, files, interventions, invoices, local_files, offers, orders, remote_files, sessions,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm::{ConnectionTrait, Schema};
use std::env;
use std::time::Duration;
use tracing::info;

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    // Parents first: cases -> offers/orders, files -> remote_files/local_files
    let stmts = vec![
        (
            "cases",
            schema
                .create_table_from_entity(cases::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "offers",
            schema
                .create_table_from_entity(offers::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "orders",
            schema
                .create_table_from_entity(orders::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "interventions",
            schema
                .create_table_from_entity(interventions::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "invoices",
            schema
                .create_table_from_entity(invoices::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "files",
            schema
                .create_table_from_entity(files::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "remote_files",
            schema
                .create_table_from_entity(remote_files::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "local_files",
            schema
                .create_table_from_entity(local_files::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "sessions",
            schema
                .create_table_from_entity(sessions::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        db.execute(builder.build(&stmt)).await?;
        info!("   - Table '{}' checked/created", name);
    }

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_remote_files_file_id ON remote_files(file_id)",
        "CREATE INDEX IF NOT EXISTS idx_local_files_file_id ON local_files(file_id)",
        "CREATE INDEX IF NOT EXISTS idx_sessions_account_id ON sessions(account_id)",
    ];
    for query in indexes {
        if let Err(e) = db
            .execute(sea_orm::Statement::from_string(builder, query.to_owned()))
            .await
        {
            tracing::warn!("   - Index creation warning: {} -> {}", query, e);
        }
    }

    info!("✅ Migrations completed");
    Ok(())
}
