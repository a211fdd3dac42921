use crate::{IndexError, MetadataIndex};
use async_trait::async_trait;
use intake_core::FileRecord;
use sqlx::PgPool;

/// Postgres-backed metadata index
#[derive(Clone)]
pub struct FileRecordRepository {
    pool: PgPool,
    table: String,
}

impl FileRecordRepository {
    /// `table` must be a plain identifier; `Config::validate` enforces this.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Create the table and its partition/sort index if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<(), IndexError> {
        sqlx::query(&create_table_sql(&self.table))
            .execute(&self.pool)
            .await?;

        tracing::info!(table = %self.table, "Metadata index schema ready");
        Ok(())
    }
}

#[async_trait]
impl MetadataIndex for FileRecordRepository {
    async fn insert(&self, record: &FileRecord) -> Result<(), IndexError> {
        let size = i64::try_from(record.size).map_err(|_| {
            IndexError::InvalidRecord(format!("size {} does not fit in BIGINT", record.size))
        })?;

        // Dynamic query: the table name is configuration, not a compile-time constant.
        let result = sqlx::query(&insert_sql(&self.table))
            .bind(&record.extension)
            .bind(record.upload_date)
            .bind(&record.file_key)
            .bind(size)
            .bind(record.content_type.as_deref())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(file_key = %record.file_key, "File record already indexed");
        }

        Ok(())
    }

    fn table_name(&self) -> &str {
        &self.table
    }
}

fn create_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            file_extension TEXT NOT NULL,
            upload_date TIMESTAMPTZ NOT NULL,
            file_key TEXT NOT NULL UNIQUE,
            file_size BIGINT NOT NULL CHECK (file_size >= 0),
            content_type TEXT,
            PRIMARY KEY (file_extension, upload_date, file_key)
        )
        "#
    )
}

fn insert_sql(table: &str) -> String {
    format!(
        r#"
        INSERT INTO {table} (file_extension, upload_date, file_key, file_size, content_type)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (file_key) DO NOTHING
        "#
    )
}
