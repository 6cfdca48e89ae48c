use crate::api::{parse_account, AppState};
use crate::domain::{EarnPool, EarnPosition};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;

pub async fn get_earn_pool(
    Path(coll_index): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<EarnPool>, AppError> {
    let coll_index = state.coll_index(coll_index)?;
    let pool = state.service.earn_pool(coll_index).await?;
    Ok(Json(pool))
}

pub async fn get_earn_position(
    Path((coll_index, account)): Path<(i64, String)>,
    State(state): State<AppState>,
) -> Result<Json<EarnPosition>, AppError> {
    let coll_index = state.coll_index(coll_index)?;
    let account = parse_account(&account)?;

    state
        .service
        .earn_position(coll_index, &account)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No stability pool deposit for {} in pool {}",
                account, coll_index
            ))
        })
}
