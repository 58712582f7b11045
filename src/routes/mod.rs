pub mod admin;
pub mod contact;
pub mod newsletter;
pub mod patreon;
pub mod post;
pub mod project;
pub mod user;

use axum::Json;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "subcult-api" }))
}
