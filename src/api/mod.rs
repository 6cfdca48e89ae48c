pub mod chart;
pub mod earn;
pub mod health;
pub mod stake;
pub mod troves;

use crate::domain::{Address, CollIndex};
use crate::error::AppError;
use crate::orchestration::PositionService;
use axum::{routing::get, Router};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PositionService>,
}

impl AppState {
    pub fn new(service: Arc<PositionService>) -> Self {
        Self { service }
    }

    pub(crate) fn coll_index(&self, raw: i64) -> Result<CollIndex, AppError> {
        Ok(self.service.catalog().coll_index(raw)?)
    }
}

pub(crate) fn parse_account(raw: &str) -> Result<Address, AppError> {
    Address::from_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid account address: {}", raw)))
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/earn/:coll_index", get(earn::get_earn_pool))
        .route("/v1/earn/:coll_index/:account", get(earn::get_earn_position))
        .route("/v1/stake/:account", get(stake::get_stake_position))
        .route(
            "/v1/interest-rate-chart/:coll_index",
            get(chart::get_interest_rate_chart),
        )
        .route("/v1/troves/:prefixed_id", get(troves::get_trove))
        .route("/v1/trove-id", get(troves::get_trove_id))
        .layer(cors)
        .with_state(state)
}
