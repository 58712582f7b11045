use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const PROJECT_COLUMNS: &str = r#"
    id, slug, name, description, long_description, why_it_exists,
    type, status, stack, topics, repo_url, homepage,
    cover_pattern, cover_color, featured, sort_order, stars, last_updated,
    created_at, updated_at
"#;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub why_it_exists: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub status: String,
    pub stack: Vec<String>,
    pub topics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    pub cover_pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_color: Option<String>,
    pub featured: bool,
    pub sort_order: i32,
    pub stars: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub long_description: Option<String>,
    pub why_it_exists: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub stack: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub repo_url: Option<String>,
    pub homepage: Option<String>,
    #[serde(default)]
    pub cover_pattern: String,
    pub cover_color: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectFilter {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl ProjectRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.slug.trim().is_empty() || self.name.trim().is_empty() {
            return Err("slug and name are required");
        }
        Ok(())
    }
}

impl Project {
    pub async fn list(pool: &PgPool, filter: &ProjectFilter) -> Result<Vec<Self>, sqlx::Error> {
        let status = filter.status.as_deref().filter(|s| !s.is_empty());
        let kind = filter.kind.as_deref().filter(|s| !s.is_empty());

        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR type = $2)
            ORDER BY sort_order ASC, name ASC
            "#
        ))
        .bind(status)
        .bind(kind)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, req: ProjectRequest) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (slug, name, description, long_description, why_it_exists,
                type, status, stack, topics, repo_url, homepage,
                cover_pattern, cover_color, featured, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(req.slug)
        .bind(req.name)
        .bind(req.description)
        .bind(req.long_description)
        .bind(req.why_it_exists)
        .bind(req.kind)
        .bind(req.status)
        .bind(req.stack)
        .bind(req.topics)
        .bind(req.repo_url)
        .bind(req.homepage)
        .bind(req.cover_pattern)
        .bind(req.cover_color)
        .bind(req.featured)
        .bind(req.sort_order)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: ProjectRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects SET
                slug = $1, name = $2, description = $3, long_description = $4, why_it_exists = $5,
                type = $6, status = $7, stack = $8, topics = $9, repo_url = $10, homepage = $11,
                cover_pattern = $12, cover_color = $13, featured = $14, sort_order = $15,
                updated_at = NOW()
            WHERE id = $16
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(req.slug)
        .bind(req.name)
        .bind(req.description)
        .bind(req.long_description)
        .bind(req.why_it_exists)
        .bind(req.kind)
        .bind(req.status)
        .bind(req.stack)
        .bind(req.topics)
        .bind(req.repo_url)
        .bind(req.homepage)
        .bind(req.cover_pattern)
        .bind(req.cover_color)
        .bind(req.featured)
        .bind(req.sort_order)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
