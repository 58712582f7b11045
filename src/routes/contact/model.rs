use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::common::Pagination;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CreateContactResponse {
    pub message: &'static str,
    pub id: Uuid,
}

impl CreateContactRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if [&self.name, &self.email, &self.message]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err("name, email, and message are required");
        }
        Ok(())
    }
}

impl Contact {
    pub async fn create(pool: &PgPool, req: CreateContactRequest) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (name, email, subject, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, subject, message, read, created_at
            "#,
        )
        .bind(req.name)
        .bind(req.email)
        .bind(req.subject)
        .bind(req.message)
        .fetch_one(pool)
        .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool, pagination: Pagination) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, name, email, subject, message, read, created_at
            FROM contacts
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.per_page)
        .bind(pagination.offset())
        .fetch_all(pool)
        .await
    }

    pub async fn toggle_read(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts SET read = NOT read
            WHERE id = $1
            RETURNING id, name, email, subject, message, read, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
