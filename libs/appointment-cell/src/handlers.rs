use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::validation::{check_time_field, parse_date_field, parse_uuid_field};

use crate::models::{
    AppointmentResponse, CreateAppointmentRequest, CreateAppointmentResponse, StatusChangeResponse,
    UpdateStatusRequest,
};
use crate::services::booking::{authorize_booking, BookingRequest};
use crate::AppointmentState;

pub async fn create_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<CreateAppointmentResponse>), AppError> {
    let provider_id = parse_uuid_field("provider_id", &request.provider_id)?;
    let client_id = match &request.client_id {
        Some(id) => parse_uuid_field("client_id", id)?,
        None => parse_uuid_field("client_id", &user.id)?,
    };
    let date = parse_date_field("date", &request.date)?;
    check_time_field("start_time", &request.start_time)?;
    if let Some(end_time) = &request.end_time {
        check_time_field("end_time", end_time)?;
    }

    let mut service_ids: Vec<Uuid> = Vec::with_capacity(request.service_ids.len() + 1);
    for id in request.service_id.iter().chain(request.service_ids.iter()) {
        let id = parse_uuid_field("service_id", id)?;
        if !service_ids.contains(&id) {
            service_ids.push(id);
        }
    }

    let status = authorize_booking(&user, provider_id, client_id, request.status)?;
    let client_email = if user.id == client_id.to_string() {
        user.email.clone()
    } else {
        None
    };

    let outcome = state
        .booking()
        .book(BookingRequest {
            provider_id,
            client_id,
            service_ids,
            date,
            start_time: request.start_time,
            end_time: request.end_time,
            status,
            client_email,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAppointmentResponse {
            appointment: outcome.appointment,
            blocked_slots: outcome.blocked_slots,
            reservation: outcome.reservation,
        }),
    ))
}

pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let appointment_id = parse_uuid_field("appointment_id", &appointment_id)?;
    let appointment = state.lifecycle().get(appointment_id, &user).await?;
    Ok(Json(appointment.into()))
}

pub async fn update_appointment_status(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<StatusChangeResponse>, AppError> {
    let appointment_id = parse_uuid_field("appointment_id", &appointment_id)?;
    let appointment = state
        .lifecycle()
        .update_status(appointment_id, request.status, &user)
        .await?;

    Ok(Json(StatusChangeResponse {
        appointment_id,
        status: appointment.status,
        appointment,
    }))
}
