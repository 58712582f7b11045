use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::common::Pagination;

#[derive(Debug, Serialize, FromRow)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub confirmed: bool,
    pub subscribed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl Subscriber {
    /// Inserts the address, or re-activates it if it unsubscribed earlier.
    pub async fn subscribe(pool: &PgPool, email: &str) -> Result<(), sqlx::Error> {
        let unsubscribe_token = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO subscribers (email, unsubscribe_token, confirmed)
            VALUES ($1, $2, true)
            ON CONFLICT (email) DO UPDATE SET unsubscribed_at = NULL
            "#,
        )
        .bind(email)
        .bind(unsubscribe_token)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Returns false when the token is unknown or already used.
    pub async fn unsubscribe(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE subscribers SET unsubscribed_at = NOW()
            WHERE unsubscribe_token = $1 AND unsubscribed_at IS NULL
            "#,
        )
        .bind(token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM subscribers WHERE unsubscribed_at IS NULL")
            .fetch_one(pool)
            .await
    }

    pub async fn list_active(
        pool: &PgPool,
        pagination: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscriber>(
            r#"
            SELECT id, email, confirmed, subscribed_at, unsubscribed_at
            FROM subscribers
            WHERE unsubscribed_at IS NULL
            ORDER BY subscribed_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.per_page)
        .bind(pagination.offset())
        .fetch_all(pool)
        .await
    }
}
