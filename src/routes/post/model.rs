use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::common::Pagination;

const POST_COLUMNS: &str =
    "id, slug, title, excerpt, content, tags, author, published, date, created_at, updated_at";

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub published: bool,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub published: bool,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostFilter {
    pub all: Option<String>,
}

impl PostFilter {
    pub fn only_published(&self) -> bool {
        self.all.as_deref() != Some("true")
    }
}

impl PostRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.slug.trim().is_empty() || self.title.trim().is_empty() {
            return Err("slug and title are required");
        }
        Ok(())
    }

    fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

impl Post {
    pub async fn count(pool: &PgPool, only_published: bool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE ($1 = false OR published = true)")
            .bind(only_published)
            .fetch_one(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        only_published: bool,
        pagination: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE ($1 = false OR published = true)
            ORDER BY date DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(only_published)
        .bind(pagination.per_page)
        .bind(pagination.offset())
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &PgPool, req: PostRequest) -> Result<Self, sqlx::Error> {
        let date = req.date_or_today();

        sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (slug, title, excerpt, content, tags, author, published, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(req.slug)
        .bind(req.title)
        .bind(req.excerpt)
        .bind(req.content)
        .bind(req.tags)
        .bind(req.author)
        .bind(req.published)
        .bind(date)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: PostRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        let date = req.date_or_today();

        sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts SET
                slug = $1, title = $2, excerpt = $3, content = $4, tags = $5,
                author = $6, published = $7, date = $8, updated_at = NOW()
            WHERE id = $9
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(req.slug)
        .bind(req.title)
        .bind(req.excerpt)
        .bind(req.content)
        .bind(req.tags)
        .bind(req.author)
        .bind(req.published)
        .bind(date)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
