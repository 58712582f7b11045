use axum::{Json, extract::State, response::IntoResponse};

use crate::{AppState, error::AppError, patreon::CampaignData};

pub async fn get_campaign(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    // 未配置凭据时当作功能不存在
    if !state.patreon.enabled() {
        return Ok(Json(CampaignData::default()));
    }

    let data = state
        .patreon
        .get_campaign()
        .await
        .map_err(|_| AppError::BadGateway("failed to fetch Patreon data".into()))?;

    Ok(Json(data))
}
