// ABOUTME: Database operations for the shared technical reference library
// ABOUTME: Provides CRUD plus stopword-filtered keyword search over entry content
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

use super::{parse_timestamp, parse_uuid, storage_error};
use crate::constants::limits::{
    MIN_KEYWORD_LEN, REFERENCE_SEARCH_DEFAULT_LIMIT, REFERENCE_SEARCH_MAX_LIMIT,
};
use crate::constants::REFERENCE_STOPWORDS;
use crate::errors::{AppError, AppResult};
use crate::models::ReferenceEntry;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::fmt::Write as _;
use tracing::{debug, info};
use uuid::Uuid;

const ENTRY_COLUMNS: &str = "id, title, kind, content, created_at";

/// Split a free-text query into search keywords
///
/// Keywords are lowercased, longer than [`MIN_KEYWORD_LEN`] characters, not
/// stopwords, and listed once in order of first appearance.
#[must_use]
pub fn extract_keywords(query: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for token in query.to_lowercase().split_whitespace() {
        if token.chars().count() <= MIN_KEYWORD_LEN || REFERENCE_STOPWORDS.contains(&token) {
            continue;
        }
        if !keywords.iter().any(|k| k == token) {
            keywords.push(token.to_owned());
        }
    }
    keywords
}

/// Reference library database operations manager
pub struct ReferenceLibraryManager {
    pool: SqlitePool,
}

impl ReferenceLibraryManager {
    /// Create a new reference library manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add an entry to the library
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` for a blank title or content
    pub async fn create(
        &self,
        title: &str,
        kind: Option<&str>,
        content: &str,
    ) -> AppResult<ReferenceEntry> {
        let (title, content) = validate_entry(title, content)?;
        let kind = normalize_kind(kind);
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO reference_entries (id, title, kind, content, content_key, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ",
        )
        .bind(id.to_string())
        .bind(title)
        .bind(kind.as_deref())
        .bind(content)
        .bind(content.to_lowercase())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to create reference entry", e))?;

        info!(entry_id = %id, "Reference entry created");

        Ok(ReferenceEntry {
            id,
            title: title.to_owned(),
            kind,
            content: content.to_owned(),
            created_at: now,
        })
    }

    /// List every entry ordered by title
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(&self) -> AppResult<Vec<ReferenceEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM reference_entries ORDER BY title COLLATE NOCASE, created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list reference entries", e))?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Get an entry by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, entry_id: Uuid) -> AppResult<Option<ReferenceEntry>> {
        let row = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM reference_entries WHERE id = $1"
        ))
        .bind(entry_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get reference entry", e))?;

        row.map(|r| row_to_entry(&r)).transpose()
    }

    /// Replace an entry's title, kind and content
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the entry is absent, or
    /// `MissingRequiredField` for a blank title or content
    pub async fn update(
        &self,
        entry_id: Uuid,
        title: &str,
        kind: Option<&str>,
        content: &str,
    ) -> AppResult<ReferenceEntry> {
        let (title, content) = validate_entry(title, content)?;

        let row = sqlx::query(&format!(
            r"
            UPDATE reference_entries
            SET title = $1, kind = $2, content = $3, content_key = $4, updated_at = $5
            WHERE id = $6
            RETURNING {ENTRY_COLUMNS}
            "
        ))
        .bind(title)
        .bind(normalize_kind(kind))
        .bind(content)
        .bind(content.to_lowercase())
        .bind(Utc::now().to_rfc3339())
        .bind(entry_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update reference entry", e))?;

        let Some(row) = row else {
            return Err(AppError::not_found("Reference entry").with_resource_id(entry_id.to_string()));
        };
        row_to_entry(&row)
    }

    /// Delete an entry
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the entry is absent
    pub async fn delete(&self, entry_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM reference_entries WHERE id = $1")
            .bind(entry_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete reference entry", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Reference entry").with_resource_id(entry_id.to_string()));
        }
        info!(entry_id = %entry_id, "Reference entry deleted");
        Ok(())
    }

    /// Entries whose content contains any keyword of `query`, ignoring case
    ///
    /// `limit` defaults to 3 and is clamped to `1..=50`. A query with no
    /// usable keyword returns nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn search(&self, query: &str, limit: Option<i64>) -> AppResult<Vec<ReferenceEntry>> {
        let keywords = extract_keywords(query);
        if keywords.is_empty() {
            debug!("Reference search skipped, no keywords in query");
            return Ok(Vec::new());
        }
        let limit = limit
            .unwrap_or(REFERENCE_SEARCH_DEFAULT_LIMIT)
            .clamp(1, REFERENCE_SEARCH_MAX_LIMIT);

        let mut sql = format!("SELECT {ENTRY_COLUMNS} FROM reference_entries WHERE ");
        for n in 1..=keywords.len() {
            if n > 1 {
                sql.push_str(" OR ");
            }
            let _ = write!(sql, "instr(content_key, ${n}) > 0");
        }
        let _ = write!(sql, " ORDER BY created_at LIMIT ${}", keywords.len() + 1);

        let mut statement = sqlx::query(&sql);
        for keyword in &keywords {
            statement = statement.bind(keyword);
        }
        let rows = statement
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to search reference library", e))?;

        debug!(keywords = ?keywords, matches = rows.len(), "Reference library searched");
        rows.iter().map(row_to_entry).collect()
    }
}

fn validate_entry<'a>(title: &'a str, content: &'a str) -> AppResult<(&'a str, &'a str)> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::missing_field("title"));
    }
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::missing_field("content"));
    }
    Ok((title, content))
}

fn normalize_kind(kind: Option<&str>) -> Option<String> {
    kind.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_owned)
}

fn row_to_entry(row: &SqliteRow) -> AppResult<ReferenceEntry> {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    Ok(ReferenceEntry {
        id: parse_uuid(&id)?,
        title: row.get("title"),
        kind: row.get("kind"),
        content: row.get("content"),
        created_at: parse_timestamp(&created_at)?,
    })
}
