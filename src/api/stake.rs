use crate::api::{parse_account, AppState};
use crate::domain::StakePosition;
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;

pub async fn get_stake_position(
    Path(account): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StakePosition>, AppError> {
    let account = parse_account(&account)?;
    let position = state.service.stake_position(&account).await?;
    Ok(Json(position))
}
