use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_provider_access;
use shared_utils::validation::{check_time_field, parse_date_field, parse_uuid_field};

use crate::engine::{rank_slots, CandidateSlot, ScoredSlot};
use crate::models::{
    BatchAvailabilityRequest, BlocksResponse, CreateBlockRequest, DeleteBlockQuery, RuleInput, RulesResponse,
    SlotCheckRequest, SlotCheckResponse, SmartSlotsResponse, TimeSlotsQuery, TimeSlotsResponse,
};
use crate::services::blocks::ManualBlock;
use crate::services::{BlockService, DayRequest, RuleService};
use crate::SchedulingContext;

/// Provider acted on by a write: the explicit id, else the caller's own.
fn target_provider(user: &User, explicit: Option<&str>) -> Result<Uuid, AppError> {
    let provider_id = match explicit {
        Some(id) => parse_uuid_field("provider_id", id)?,
        None => parse_uuid_field("provider_id", &user.id)?,
    };
    require_provider_access(user, provider_id)?;
    Ok(provider_id)
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

pub async fn get_time_slots(
    State(state): State<Arc<SchedulingContext>>,
    Path(provider_id): Path<String>,
    Query(query): Query<TimeSlotsQuery>,
) -> Result<Json<TimeSlotsResponse>, AppError> {
    let provider_id = parse_uuid_field("provider_id", &provider_id)?;
    let date = parse_date_field("date", &query.date)?;
    let service_ids = query.requested_services()?;

    let schedule = state
        .slot_engine()
        .compute_day(&DayRequest {
            provider_id,
            date,
            service_ids,
            duration_minutes: query.duration,
            exclude_appointment: None,
        })
        .await?;

    let available = schedule.available_count();
    Ok(Json(TimeSlotsResponse {
        provider_id,
        date: query.date,
        day_of_week: schedule.day_of_week,
        timezone: schedule.timezone,
        service_duration: schedule.duration.total_minutes,
        services: schedule.duration.services,
        total: schedule.slots.len(),
        available,
        slots: schedule.slots,
    }))
}

/// Filters a client-held slot list down to what is still bookable.
pub async fn check_available_slots(
    State(state): State<Arc<SchedulingContext>>,
    Path(provider_id): Path<String>,
    Json(request): Json<SlotCheckRequest>,
) -> Result<Json<SlotCheckResponse>, AppError> {
    let provider_id = parse_uuid_field("provider_id", &provider_id)?;
    let date = parse_date_field("date", &request.date)?;
    for held in &request.slots {
        check_time_field("start_time", &held.start_time)?;
        if let Some(end) = &held.end_time {
            check_time_field("end_time", end)?;
        }
    }
    let service_ids = request.requested_services()?;

    let schedule = state
        .slot_engine()
        .compute_day(&DayRequest {
            provider_id,
            date,
            service_ids,
            ..Default::default()
        })
        .await?;

    let available_slots: Vec<CandidateSlot> = request
        .slots
        .iter()
        .filter_map(|held| schedule.slot_at(&held.start_time))
        .filter(|slot| slot.is_available)
        .cloned()
        .collect();

    let requested_count = request.slots.len();
    let available_count = available_slots.len();
    debug!(
        "Slot check for provider {} on {}: {}/{} still available",
        provider_id, request.date, available_count, requested_count
    );

    Ok(Json(SlotCheckResponse {
        date: request.date,
        available_slots,
        requested_count,
        available_count,
        unavailable_count: requested_count - available_count,
    }))
}

pub async fn get_smart_time_slots(
    State(state): State<Arc<SchedulingContext>>,
    Path(provider_id): Path<String>,
    Query(query): Query<TimeSlotsQuery>,
) -> Result<Json<SmartSlotsResponse>, AppError> {
    let provider_id = parse_uuid_field("provider_id", &provider_id)?;
    let date = parse_date_field("date", &query.date)?;
    let service_ids = query.requested_services()?;

    let schedule = state
        .slot_engine()
        .compute_day(&DayRequest {
            provider_id,
            date,
            service_ids,
            duration_minutes: query.duration,
            exclude_appointment: None,
        })
        .await?;

    let (slots, source) = if state.config.smart_slots_enabled {
        (rank_slots(&schedule.slots, &schedule.free), "scored")
    } else {
        let plain = schedule
            .available_slots()
            .map(|slot| ScoredSlot { slot: slot.clone(), score: 0 })
            .collect();
        (plain, "computed")
    };

    Ok(Json(SmartSlotsResponse {
        provider_id,
        date: query.date,
        service_duration: schedule.duration.total_minutes,
        slots,
        source,
    }))
}

pub async fn get_provider_availability(
    State(state): State<Arc<SchedulingContext>>,
    Path(provider_id): Path<String>,
) -> Result<Json<RulesResponse>, AppError> {
    let provider_id = parse_uuid_field("provider_id", &provider_id)?;
    let rules = RuleService::new(state.store.clone()).list(provider_id).await?;

    Ok(Json(RulesResponse {
        provider_id,
        total: rules.len(),
        rules,
    }))
}

// ==============================================================================
// PROVIDER HANDLERS
// ==============================================================================

pub async fn replace_availability(
    State(state): State<Arc<SchedulingContext>>,
    Extension(user): Extension<User>,
    Json(request): Json<BatchAvailabilityRequest>,
) -> Result<(StatusCode, Json<RulesResponse>), AppError> {
    let provider_id = target_provider(&user, request.provider_id.as_deref())?;
    let rules = request
        .rules
        .into_iter()
        .map(RuleInput::into_new_rule)
        .collect::<Result<Vec<_>, _>>()?;

    let created = RuleService::new(state.store.clone()).replace(provider_id, rules).await?;

    Ok((
        StatusCode::CREATED,
        Json(RulesResponse {
            provider_id,
            total: created.len(),
            rules: created,
        }),
    ))
}

pub async fn create_blocked_slot(
    State(state): State<Arc<SchedulingContext>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateBlockRequest>,
) -> Result<(StatusCode, Json<BlocksResponse>), AppError> {
    let provider_id = target_provider(&user, request.provider_id.as_deref())?;
    let date = parse_date_field("date", &request.date)?;
    check_time_field("start_time", &request.start_time)?;
    check_time_field("end_time", &request.end_time)?;

    let created = BlockService::new(state.store.clone())
        .create_manual(ManualBlock {
            provider_id,
            date,
            start_time: request.start_time,
            end_time: request.end_time,
            reason: request.reason,
            repeat_weeks: request.repeat_weeks,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BlocksResponse {
            recurrent_id: created.first().and_then(|block| block.recurrent_id),
            total: created.len(),
            blocked_slots: created,
        }),
    ))
}

pub async fn delete_blocked_slot(
    State(state): State<Arc<SchedulingContext>>,
    Extension(user): Extension<User>,
    Path(block_id): Path<String>,
    Query(query): Query<DeleteBlockQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let block_id = parse_uuid_field("block_id", &block_id)?;
    let blocks = BlockService::new(state.store.clone());

    let block = blocks.get(block_id).await?;
    require_provider_access(&user, block.provider_id)?;

    let deleted = blocks.delete_manual(&block, query.series).await?;

    Ok(Json(serde_json::json!({
        "id": block_id,
        "deleted": deleted,
    })))
}
