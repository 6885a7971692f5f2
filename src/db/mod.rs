//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for documents, legal units, Q&A entries and the sync watermark.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
///
/// Enumerations are enforced with CHECK constraints so a bad value can never be stored
/// even if it slips past request validation.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            doc_type TEXT NOT NULL
                CHECK (doc_type IN ('law', 'regulation', 'circular', 'guideline')),
            jurisdiction TEXT,
            authority TEXT,
            effective_date TEXT,
            amended_date TEXT,
            source_url TEXT,
            file_s3 TEXT,
            status TEXT NOT NULL DEFAULT 'published'
                CHECK (status IN ('draft', 'in_review', 'approved', 'published')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS legal_units (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            unit_type TEXT NOT NULL
                CHECK (unit_type IN ('part', 'chapter', 'section', 'article', 'paragraph',
                                     'clause', 'item', 'note', 'annex')),
            num_label TEXT,
            heading TEXT,
            text_plain TEXT,
            order_index INTEGER
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS qa_entries (
            id TEXT PRIMARY KEY,
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            topic_tags TEXT NOT NULL DEFAULT '[]',
            source_url TEXT,
            author TEXT,
            org TEXT,
            answered_at TEXT,
            quality_score REAL,
            licensing TEXT NOT NULL DEFAULT 'allowed'
                CHECK (licensing IN ('allowed', 'restricted')),
            pii_status TEXT NOT NULL DEFAULT 'clean'
                CHECK (pii_status IN ('clean', 'contains')),
            moderation_status TEXT NOT NULL DEFAULT 'published',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Singleton row, same shape as a fixed-key meta table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sync_watermark (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            last_imported_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status);
        CREATE INDEX IF NOT EXISTS idx_documents_doc_type ON documents(doc_type);
        CREATE INDEX IF NOT EXISTS idx_documents_title ON documents(title);
        CREATE INDEX IF NOT EXISTS idx_legal_units_document ON legal_units(document_id, order_index);
        CREATE INDEX IF NOT EXISTS idx_qa_entries_moderation_status ON qa_entries(moderation_status);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
