use crate::api::AppState;
use crate::engine::ChartPoint;
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;

pub async fn get_interest_rate_chart(
    Path(coll_index): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ChartPoint>>, AppError> {
    let coll_index = state.coll_index(coll_index)?;
    let chart = state.service.interest_rate_chart(coll_index).await?;
    Ok(Json(chart))
}
