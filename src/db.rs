//! Primary relational store: managed content rows (one JSON blob per section
//! per language) and project records with explicit bilingual columns.
//!
//! All access is ordinary parameterized queries with implicit autocommit; a
//! multi-step save (Indonesian row, then translation, then English variant)
//! has no cross-step transaction, so a failure partway leaves individually
//! consistent rows and surfaces the error to the caller.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::error::{AppError, AppResult};
use crate::language::Language;

/// Sections the admin panel may save or reset.
pub const MANAGED_CONTENT_KEYS: [&str; 7] = [
    "homeProfile",
    "aboutProfile",
    "sidebar",
    "contact",
    "githubWidget",
    "education",
    "jobs",
];

pub const PROJECT_CATEGORIES: [&str; 2] = ["project", "personal-project"];

pub fn is_managed_key(key: &str) -> bool {
    MANAGED_CONTENT_KEYS.contains(&key)
}

/// Shape a missing managed row falls back to on read.
pub fn default_for_key(key: &str) -> Value {
    match key {
        "education" | "jobs" => json!([]),
        _ => json!({}),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedContentRow {
    pub content_key: String,
    pub language: String,
    pub data: Value,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub title_en: Option<String>,
    pub description: String,
    pub description_en: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub title_en: Option<String>,
    pub description: String,
    #[serde(default)]
    pub description_en: Option<String>,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl ProjectInput {
    fn validate(&self) -> AppResult<()> {
        if self.slug.trim().is_empty() {
            return Err(AppError::InvalidPayload("slug must not be empty".into()));
        }
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidPayload("title must not be empty".into()));
        }
        if !PROJECT_CATEGORIES.contains(&self.category.as_str()) {
            return Err(AppError::InvalidPayload(format!(
                "category must be one of: {}",
                PROJECT_CATEGORIES.join(", ")
            )));
        }
        Ok(())
    }
}

pub async fn connect(database_url: &str) -> AppResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS managed_content (
            content_key TEXT NOT NULL,
            language TEXT NOT NULL,
            data TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (content_key, language)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            title_en TEXT,
            description TEXT NOT NULL,
            description_en TEXT,
            category TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            image_url TEXT,
            link TEXT,
            start_date TEXT,
            end_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

// ==================== Managed content ====================

/// Create or overwrite one section blob for one language.
pub async fn upsert_content(
    pool: &SqlitePool,
    language: Language,
    key: &str,
    data: &Value,
) -> AppResult<()> {
    if !is_managed_key(key) {
        return Err(AppError::InvalidPayload(format!(
            "unknown content key: '{key}'"
        )));
    }

    sqlx::query(
        "INSERT INTO managed_content (content_key, language, data, updated_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT (content_key, language)
         DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(language.code())
    .bind(data.to_string())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_content(
    pool: &SqlitePool,
    language: Language,
    key: &str,
) -> AppResult<Option<Value>> {
    let row = sqlx::query(
        "SELECT data FROM managed_content WHERE content_key = ? AND language = ?",
    )
    .bind(key)
    .bind(language.code())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let raw: String = row.try_get("data")?;
            let data = serde_json::from_str(&raw)
                .map_err(|e| AppError::Cms(format!("corrupt content row for '{key}': {e}")))?;
            Ok(Some(data))
        }
        None => Ok(None),
    }
}

pub async fn list_content(
    pool: &SqlitePool,
    language: Language,
) -> AppResult<Vec<ManagedContentRow>> {
    let rows = sqlx::query(
        "SELECT content_key, language, data, updated_at
         FROM managed_content WHERE language = ? ORDER BY content_key",
    )
    .bind(language.code())
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let raw: String = row.try_get("data")?;
        out.push(ManagedContentRow {
            content_key: row.try_get("content_key")?,
            language: row.try_get("language")?,
            data: serde_json::from_str(&raw).unwrap_or(Value::Null),
            updated_at: row.try_get("updated_at")?,
        });
    }
    Ok(out)
}

/// Remove one section row. The next read falls back to the section default.
pub async fn delete_content(pool: &SqlitePool, language: Language, key: &str) -> AppResult<bool> {
    if !is_managed_key(key) {
        return Err(AppError::InvalidPayload(format!(
            "unknown content key: '{key}'"
        )));
    }

    let result = sqlx::query("DELETE FROM managed_content WHERE content_key = ? AND language = ?")
        .bind(key)
        .bind(language.code())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ==================== Projects ====================

fn row_to_project(row: &SqliteRow) -> AppResult<ProjectRecord> {
    let tags_raw: String = row.try_get("tags")?;
    Ok(ProjectRecord {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        title_en: row.try_get("title_en")?,
        description: row.try_get("description")?,
        description_en: row.try_get("description_en")?,
        category: row.try_get("category")?,
        tags: serde_json::from_str(&tags_raw).unwrap_or_default(),
        image_url: row.try_get("image_url")?,
        link: row.try_get("link")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_unique_violation(err: sqlx::Error, slug: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("a project with slug '{slug}' already exists"))
        }
        _ => AppError::Database(err),
    }
}

pub async fn create_project(pool: &SqlitePool, input: &ProjectInput) -> AppResult<ProjectRecord> {
    input.validate()?;
    let now = Utc::now().to_rfc3339();

    let tags = serde_json::to_string(&input.tags).unwrap_or_else(|_| "[]".to_string());
    let result = sqlx::query(
        "INSERT INTO projects
         (slug, title, title_en, description, description_en, category, tags,
          image_url, link, start_date, end_date, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&input.slug)
    .bind(&input.title)
    .bind(&input.title_en)
    .bind(&input.description)
    .bind(&input.description_en)
    .bind(&input.category)
    .bind(&tags)
    .bind(&input.image_url)
    .bind(&input.link)
    .bind(&input.start_date)
    .bind(&input.end_date)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(|e| map_unique_violation(e, &input.slug))?;

    let id = result.last_insert_rowid();
    get_project(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {id} vanished after insert")))
}

pub async fn get_project(pool: &SqlitePool, id: i64) -> AppResult<Option<ProjectRecord>> {
    let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(row_to_project).transpose()
}

pub async fn list_projects(pool: &SqlitePool) -> AppResult<Vec<ProjectRecord>> {
    let rows = sqlx::query("SELECT * FROM projects ORDER BY created_at DESC, id DESC")
        .fetch_all(pool)
        .await?;
    rows.iter().map(row_to_project).collect()
}

/// Overwrite a project in place. No versioning.
pub async fn update_project(
    pool: &SqlitePool,
    id: i64,
    input: &ProjectInput,
) -> AppResult<ProjectRecord> {
    input.validate()?;

    let existing = get_project(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {id} not found")))?;

    let tags = serde_json::to_string(&input.tags).unwrap_or_else(|_| "[]".to_string());
    sqlx::query(
        "UPDATE projects SET
         slug = ?, title = ?, title_en = ?, description = ?, description_en = ?,
         category = ?, tags = ?, image_url = ?, link = ?, start_date = ?,
         end_date = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&input.slug)
    .bind(&input.title)
    .bind(&input.title_en)
    .bind(&input.description)
    .bind(&input.description_en)
    .bind(&input.category)
    .bind(&tags)
    .bind(&input.image_url)
    .bind(&input.link)
    .bind(&input.start_date)
    .bind(&input.end_date)
    .bind(Utc::now().to_rfc3339())
    .bind(existing.id)
    .execute(pool)
    .await
    .map_err(|e| map_unique_violation(e, &input.slug))?;

    get_project(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {id} not found")))
}

/// Hard delete. Returns the removed record so the caller can clean up any
/// locally stored media file it referenced.
pub async fn delete_project(pool: &SqlitePool, id: i64) -> AppResult<Option<ProjectRecord>> {
    let existing = match get_project(pool, id).await? {
        Some(record) => record,
        None => return Ok(None),
    };

    sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(Some(existing))
}
