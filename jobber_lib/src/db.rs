//! SQLite storage for seen postings.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::types::{PaymentType, Posting};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The URL is already stored. Another run got there first.
    #[error("posting already stored: {url}")]
    Conflict { url: String },
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("date parse error: {0}")]
    Date(#[from] chrono::ParseError),
}

pub struct Db {
    conn: Connection,
}

/// A persisted posting as read back for listing.
#[derive(Debug, Clone, Serialize)]
pub struct PostingRow {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub price: Option<String>,
    pub search_query: String,
    pub payment_type: PaymentType,
    pub created_at_utc: DateTime<Utc>,
}

/// Filters for [`Db::recent_postings`]. Newest postings come first.
#[derive(Debug, Clone, Default)]
pub struct PostingFilter {
    pub search_query: Option<String>,
    pub payment_type: Option<PaymentType>,
    pub limit: Option<i64>,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), StoreError> {
        // Migrations run before the schema so databases created with the
        // four-column layout pick up the title and price columns.
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.migrate_v1()?;
            self.conn.pragma_update(None, "user_version", 1)?;
        }

        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;

        Ok(())
    }

    fn migrate_v1(&self) -> Result<(), StoreError> {
        for sql in &[
            "ALTER TABLE postings ADD COLUMN title TEXT",
            "ALTER TABLE postings ADD COLUMN price TEXT",
        ] {
            match self.conn.execute(sql, []) {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(_, Some(ref msg)))
                    if msg.contains("duplicate column name")
                        || msg.contains("no such table") => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub fn exists_by_url(&self, url: &str) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM postings WHERE url = ?1",
            params![url],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Inserts a posting. A duplicate URL fails with [`StoreError::Conflict`].
    pub fn insert_posting(&self, posting: &Posting) -> Result<(), StoreError> {
        let result = self.conn.execute(
            "INSERT INTO postings (url, search_query, payment_type, created_at_utc, title, price)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                posting.url,
                posting.search_query,
                posting.payment_type.as_str(),
                posting
                    .created_at_utc
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                posting.title,
                posting.price,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Err(StoreError::Conflict {
                    url: posting.url.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn posting_count(&self) -> Result<i64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(1) FROM postings", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn recent_postings(&self, filter: &PostingFilter) -> Result<Vec<PostingRow>, StoreError> {
        let mut sql = String::from(
            "SELECT id, url, title, price, search_query, payment_type, created_at_utc
             FROM postings WHERE 1 = 1",
        );
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref query) = filter.search_query {
            values.push(Box::new(query.clone()));
            sql.push_str(&format!(" AND search_query = ?{}", values.len()));
        }
        if let Some(payment_type) = filter.payment_type {
            values.push(Box::new(payment_type.as_str()));
            sql.push_str(&format!(" AND payment_type = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY created_at_utc DESC, id DESC");
        if let Some(limit) = filter.limit {
            values.push(Box::new(limit));
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let raw_rows = stmt.query_map(
            rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )?;

        let mut rows = Vec::new();
        for raw in raw_rows {
            let (id, url, title, price, search_query, payment_type, created_at) = raw?;
            let payment_type = payment_type.parse::<PaymentType>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    e.into(),
                )
            })?;
            let created_at_utc = DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc);
            rows.push(PostingRow {
                id,
                url,
                title,
                price,
                search_query,
                payment_type,
                created_at_utc,
            });
        }
        Ok(rows)
    }
}
