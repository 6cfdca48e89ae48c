use crate::api::{parse_account, AppState};
use crate::domain::{PrefixedTroveId, TroveId, ValidationError};
use crate::error::AppError;
use crate::orchestration::TroveView;
use axum::extract::{Path, Query, State};
use axum::Json;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TroveIdQuery {
    pub owner: String,
    /// Decimal `uint256`.
    pub owner_index: String,
    pub coll_index: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TroveIdResponse {
    pub trove_id: TroveId,
    pub prefixed_trove_id: PrefixedTroveId,
}

pub async fn get_trove(
    Path(prefixed_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<TroveView>, AppError> {
    let view = state.service.trove(&prefixed_id).await?;
    Ok(Json(view))
}

pub async fn get_trove_id(
    Query(params): Query<TroveIdQuery>,
    State(state): State<AppState>,
) -> Result<Json<TroveIdResponse>, AppError> {
    let owner = parse_account(&params.owner)?;
    let owner_index = BigUint::from_str(&params.owner_index)
        .map_err(|_| ValidationError::InvalidOwnerIndex(params.owner_index.clone()))?;
    let prefixed = state
        .service
        .prefixed_trove_id_for(&owner, &owner_index, params.coll_index)?;

    Ok(Json(TroveIdResponse {
        trove_id: prefixed.trove_id.clone(),
        prefixed_trove_id: prefixed,
    }))
}
