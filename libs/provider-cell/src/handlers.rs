use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use availability_cell::engine::timezone::today_in;
use availability_cell::SchedulingContext;
use shared_models::error::AppError;

use crate::models::{ProviderSearchQuery, DEFAULT_SEARCH_LIMIT};
use crate::services::ranking::{RankedProviders, RankingEngine};

fn engine(state: &SchedulingContext) -> RankingEngine {
    RankingEngine::new(state.config.clone(), state.store.clone())
}

/// Paginated ranking; availability is only considered when `date` is given.
pub async fn search_providers(
    State(state): State<Arc<SchedulingContext>>,
    Query(query): Query<ProviderSearchQuery>,
) -> Result<Json<RankedProviders>, AppError> {
    let request = query.into_request(DEFAULT_SEARCH_LIMIT, None)?;
    Ok(Json(engine(&state).rank(request).await?))
}

/// Top providers with an opening on `date` (today by default).
pub async fn recommend_providers(
    State(state): State<Arc<SchedulingContext>>,
    Query(query): Query<ProviderSearchQuery>,
) -> Result<Json<RankedProviders>, AppError> {
    let today = today_in(&state.config.default_timezone)?;
    let request = query.into_request(state.config.recommendation_limit, Some(today))?;
    Ok(Json(engine(&state).rank(request).await?))
}
