use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use sqlx::PgPool;

use crate::{AppState, error::AppError};

#[derive(Debug, Default, Serialize)]
pub struct DashboardStats {
    pub total_projects: i64,
    pub total_posts: i64,
    pub total_contacts: i64,
    pub unread_contacts: i64,
    pub total_subscribers: i64,
}

impl DashboardStats {
    pub async fn load(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let (total_projects, total_posts, total_contacts, unread_contacts, total_subscribers) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM projects),
                    (SELECT COUNT(*) FROM posts),
                    (SELECT COUNT(*) FROM contacts),
                    (SELECT COUNT(*) FROM contacts WHERE read = false),
                    (SELECT COUNT(*) FROM subscribers WHERE unsubscribed_at IS NULL)
                "#,
            )
            .fetch_one(pool)
            .await?;

        Ok(Self {
            total_projects,
            total_posts,
            total_contacts,
            unread_contacts,
            total_subscribers,
        })
    }
}

pub async fn dashboard_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = DashboardStats::load(&state.pool).await?;
    Ok(Json(stats))
}
