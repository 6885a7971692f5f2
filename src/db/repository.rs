//! Database repository for the import reconciler and read queries.
//!
//! Every import batch runs inside a single transaction: either all upserts, unit
//! replacements and the watermark advance commit together, or none of them do.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    DocStatus, DocType, Document, DocumentInput, DocumentStats, ImportBatch, ImportResult,
    ImportedCounts, LegalUnit, Licensing, PiiStatus, QaEntry, QaInput, QaStats, Stats,
    SyncWatermark, UnitType,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Cheap reachability probe for the health endpoint.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ==================== IMPORT ====================

    /// Reconcile a bridge batch against stored rows.
    ///
    /// Documents and Q&A entries are upserted by id in the order received. A document's
    /// legal units are replaced wholesale when the input carries a unit list and left
    /// untouched when it does not. The watermark advances once, after all items.
    pub async fn import_batch(&self, batch: &ImportBatch) -> Result<ImportResult, AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        match apply_batch(&mut tx, batch, &now).await {
            Ok(imported) => {
                tx.commit().await?;
                tracing::info!(
                    batch_ts = %batch.batch_ts,
                    documents = imported.documents,
                    qa_entries = imported.qa_entries,
                    "Sync import completed"
                );
                Ok(ImportResult::success(imported, batch.batch_ts.clone()))
            }
            Err(e) => {
                tracing::error!(batch_ts = %batch.batch_ts, "Sync import failed, rolling back: {}", e);
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Get the sync watermark, if any import has committed yet.
    pub async fn get_watermark(&self) -> Result<Option<SyncWatermark>, AppError> {
        let row = sqlx::query("SELECT last_imported_at FROM sync_watermark WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| SyncWatermark {
            last_imported_at: row.get("last_imported_at"),
        }))
    }

    // ==================== READS ====================

    /// Get a document with its legal units.
    pub async fn get_document(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        let row = sqlx::query(
            r#"SELECT id, title, doc_type, jurisdiction, authority, effective_date, amended_date,
                      source_url, file_s3, status, created_at, updated_at
               FROM documents WHERE id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let legal_units = self.list_legal_units(id).await?;
        document_from_row(&row, legal_units).map(Some)
    }

    /// List a document's legal units in stored order.
    pub async fn list_legal_units(&self, document_id: Uuid) -> Result<Vec<LegalUnit>, AppError> {
        // Units without an order_index sort last, ties keep insertion order
        let rows = sqlx::query(
            r#"SELECT unit_type, num_label, heading, text_plain, order_index
               FROM legal_units WHERE document_id = ?
               ORDER BY order_index IS NULL, order_index, id"#,
        )
        .bind(document_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(legal_unit_from_row).collect()
    }

    /// Get a Q&A entry by ID.
    pub async fn get_qa_entry(&self, id: Uuid) -> Result<Option<QaEntry>, AppError> {
        let row = sqlx::query(
            r#"SELECT id, question, answer, topic_tags, source_url, author, org, answered_at,
                      quality_score, licensing, pii_status, moderation_status, created_at, updated_at
               FROM qa_entries WHERE id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(qa_entry_from_row).transpose()
    }

    /// Aggregate document and Q&A counts.
    pub async fn stats(&self) -> Result<Stats, AppError> {
        let documents_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;

        let by_status = count_grouped(&self.pool, "status").await?;
        let by_type = count_grouped(&self.pool, "doc_type").await?;

        let qa_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM qa_entries")
            .fetch_one(&self.pool)
            .await?;

        Ok(Stats {
            documents: DocumentStats {
                total: documents_total,
                by_status,
                by_type,
            },
            qa_entries: QaStats { total: qa_total },
        })
    }
}

/// Count documents grouped by one of the enumerated columns.
async fn count_grouped(
    pool: &SqlitePool,
    column: &'static str,
) -> Result<BTreeMap<String, i64>, AppError> {
    let sql = format!(
        "SELECT {col} AS label, COUNT(*) AS n FROM documents GROUP BY {col}",
        col = column
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    Ok(rows
        .iter()
        .map(|row| (row.get::<String, _>("label"), row.get::<i64, _>("n")))
        .collect())
}

// ==================== IMPORT STEPS ====================

async fn apply_batch(
    conn: &mut SqliteConnection,
    batch: &ImportBatch,
    now: &str,
) -> Result<ImportedCounts, AppError> {
    let mut imported = ImportedCounts {
        documents: 0,
        qa_entries: 0,
    };

    for doc in &batch.documents {
        upsert_document(conn, doc, now).await?;
        if let Some(units) = &doc.legal_units {
            replace_legal_units(conn, doc.id, units).await?;
        }
        imported.documents += 1;
    }

    for qa in &batch.qa_entries {
        upsert_qa_entry(conn, qa, now).await?;
        imported.qa_entries += 1;
    }

    advance_watermark(conn, now).await?;

    Ok(imported)
}

/// Insert or overwrite a document. `created_at` survives updates.
async fn upsert_document(
    conn: &mut SqliteConnection,
    doc: &DocumentInput,
    now: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO documents (
                id, title, doc_type, jurisdiction, authority, effective_date, amended_date,
                source_url, file_s3, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                doc_type = excluded.doc_type,
                jurisdiction = excluded.jurisdiction,
                authority = excluded.authority,
                effective_date = excluded.effective_date,
                amended_date = excluded.amended_date,
                source_url = excluded.source_url,
                file_s3 = excluded.file_s3,
                status = excluded.status,
                updated_at = excluded.updated_at"#,
    )
    .bind(doc.id.to_string())
    .bind(&doc.title)
    .bind(doc.doc_type.as_str())
    .bind(&doc.jurisdiction)
    .bind(&doc.authority)
    .bind(doc.effective_date)
    .bind(doc.amended_date)
    .bind(&doc.source_url)
    .bind(&doc.file_s3)
    .bind(DocStatus::Published.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Delete every unit of a document, then insert the new list in the given order.
async fn replace_legal_units(
    conn: &mut SqliteConnection,
    document_id: Uuid,
    units: &[LegalUnit],
) -> Result<(), AppError> {
    let document_id = document_id.to_string();

    sqlx::query("DELETE FROM legal_units WHERE document_id = ?")
        .bind(&document_id)
        .execute(&mut *conn)
        .await?;

    for unit in units {
        sqlx::query(
            r#"INSERT INTO legal_units (
                    document_id, unit_type, num_label, heading, text_plain, order_index
                ) VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&document_id)
        .bind(unit.unit_type.as_str())
        .bind(&unit.num_label)
        .bind(&unit.heading)
        .bind(&unit.text_plain)
        .bind(unit.order_index)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Insert or overwrite a Q&A entry. `created_at` survives updates.
async fn upsert_qa_entry(
    conn: &mut SqliteConnection,
    qa: &QaInput,
    now: &str,
) -> Result<(), AppError> {
    let tags_json = serde_json::to_string(&qa.topic_tags)
        .map_err(|e| AppError::Internal(format!("Failed to encode topic_tags: {}", e)))?;

    sqlx::query(
        r#"INSERT INTO qa_entries (
                id, question, answer, topic_tags, source_url, author, org, answered_at,
                quality_score, licensing, pii_status, moderation_status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                question = excluded.question,
                answer = excluded.answer,
                topic_tags = excluded.topic_tags,
                source_url = excluded.source_url,
                author = excluded.author,
                org = excluded.org,
                answered_at = excluded.answered_at,
                quality_score = excluded.quality_score,
                licensing = excluded.licensing,
                pii_status = excluded.pii_status,
                moderation_status = excluded.moderation_status,
                updated_at = excluded.updated_at"#,
    )
    .bind(qa.id.to_string())
    .bind(&qa.question)
    .bind(&qa.answer)
    .bind(&tags_json)
    .bind(&qa.source_url)
    .bind(&qa.author)
    .bind(&qa.org)
    .bind(qa.answered_at)
    .bind(qa.quality_score)
    .bind(qa.licensing.as_str())
    .bind(qa.pii_status.as_str())
    .bind(&qa.moderation_status)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Create or move the singleton watermark row. The fixed key keeps it to one row.
async fn advance_watermark(conn: &mut SqliteConnection, now: &str) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO sync_watermark (id, last_imported_at) VALUES (1, ?)
           ON CONFLICT(id) DO UPDATE SET last_imported_at = excluded.last_imported_at"#,
    )
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// Helper functions for row conversion

fn document_from_row(row: &SqliteRow, legal_units: Vec<LegalUnit>) -> Result<Document, AppError> {
    let doc_type: String = row.try_get("doc_type")?;
    let status: String = row.try_get("status")?;

    Ok(Document {
        id: parse_id(row.try_get("id")?)?,
        title: row.try_get("title")?,
        doc_type: DocType::from_str(&doc_type).ok_or_else(|| corrupt("doc_type", &doc_type))?,
        jurisdiction: row.try_get("jurisdiction")?,
        authority: row.try_get("authority")?,
        effective_date: row.try_get("effective_date")?,
        amended_date: row.try_get("amended_date")?,
        source_url: row.try_get("source_url")?,
        file_s3: row.try_get("file_s3")?,
        status: DocStatus::from_str(&status).ok_or_else(|| corrupt("status", &status))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        legal_units,
    })
}

fn legal_unit_from_row(row: &SqliteRow) -> Result<LegalUnit, AppError> {
    let unit_type: String = row.try_get("unit_type")?;

    Ok(LegalUnit {
        unit_type: UnitType::from_str(&unit_type)
            .ok_or_else(|| corrupt("unit_type", &unit_type))?,
        num_label: row.try_get("num_label")?,
        heading: row.try_get("heading")?,
        text_plain: row.try_get("text_plain")?,
        order_index: row.try_get("order_index")?,
    })
}

fn qa_entry_from_row(row: &SqliteRow) -> Result<QaEntry, AppError> {
    let licensing: String = row.try_get("licensing")?;
    let pii_status: String = row.try_get("pii_status")?;
    let tags_str: String = row.try_get("topic_tags")?;

    Ok(QaEntry {
        id: parse_id(row.try_get("id")?)?,
        question: row.try_get("question")?,
        answer: row.try_get("answer")?,
        topic_tags: parse_tag_set(&tags_str),
        source_url: row.try_get("source_url")?,
        author: row.try_get("author")?,
        org: row.try_get("org")?,
        answered_at: row.try_get("answered_at")?,
        quality_score: row.try_get("quality_score")?,
        licensing: Licensing::from_str(&licensing)
            .ok_or_else(|| corrupt("licensing", &licensing))?,
        pii_status: PiiStatus::from_str(&pii_status)
            .ok_or_else(|| corrupt("pii_status", &pii_status))?,
        moderation_status: row.try_get("moderation_status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn parse_id(raw: String) -> Result<Uuid, AppError> {
    Uuid::parse_str(&raw).map_err(|_| corrupt("id", &raw))
}

fn parse_tag_set(s: &str) -> BTreeSet<String> {
    serde_json::from_str(s).unwrap_or_default()
}

fn corrupt(column: &str, value: &str) -> AppError {
    AppError::Internal(format!("Unexpected {} value in database: {:?}", column, value))
}
