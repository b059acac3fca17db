//! Database connection utilities.

use sea_orm::{Database, DatabaseConnection, DbErr};

const SQLITE_PRAGMAS: [&str; 4] = [
    // Readers don't block writers
    "PRAGMA journal_mode=WAL",
    // Wait up to 5 seconds for locks instead of failing immediately
    "PRAGMA busy_timeout=5000",
    // NORMAL synchronous is safe with WAL and faster than FULL
    "PRAGMA synchronous=NORMAL",
    // Parent rows must exist before children are written
    "PRAGMA foreign_keys=ON",
];

/// Configure SQLite-specific pragmas for concurrency and referential integrity.
async fn configure_sqlite(db: &DatabaseConnection) -> Result<(), DbErr> {
    use sea_orm::{ConnectionTrait, Statement};

    for pragma in SQLITE_PRAGMAS {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            pragma.to_string(),
        ))
        .await?;
    }

    Ok(())
}

fn is_sqlite(database_url: &str) -> bool {
    database_url.starts_with("sqlite:")
}

/// Establish a connection to the database.
///
/// SQLite connections get WAL journaling, a 5 second busy timeout,
/// `synchronous=NORMAL` and enforced foreign keys.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    if is_sqlite(database_url) {
        configure_sqlite(&db).await?;
    }

    Ok(db)
}

/// Establish a connection to the database and run all pending migrations.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established or migrations fail.
///
/// # Example
/// ```ignore
/// let db = syncwright::connect_and_migrate("sqlite://syncwright.db?mode=rwc").await?;
/// ```
#[cfg(feature = "migrate")]
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    use sea_orm_migration::MigratorTrait;

    let db = connect(database_url).await?;
    crate::migration::Migrator::up(&db, None).await?;
    Ok(db)
}
