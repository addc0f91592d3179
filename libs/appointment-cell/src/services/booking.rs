use std::sync::Arc;

use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use availability_cell::engine::{CandidateSlot, Interval};
use availability_cell::{BlockService, DayRequest, SlotEngine};
use notification_cell::{BookingEmail, Mailer, NotificationEvent, NotificationKind, Notifier};
use shared_database::{SchedulingStore, StoreError};
use shared_models::auth::{User, UserRole};
use shared_models::scheduling::{Appointment, AppointmentStatus, BlockedRange, NewAppointment, PaymentStatus};

use super::locks::ProviderLocks;
use super::side_effects;
use crate::error::BookingError;
use crate::AppointmentState;

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub provider_id: Uuid,
    pub client_id: Uuid,
    /// First entry is the primary service.
    pub service_ids: Vec<Uuid>,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: Option<String>,
    pub status: AppointmentStatus,
    /// Where to send the confirmation, when known.
    pub client_email: Option<String>,
}

#[derive(Debug)]
pub struct BookingOutcome {
    pub appointment: Appointment,
    /// Slots that were bookable before this commit and are now taken.
    pub blocked_slots: Vec<CandidateSlot>,
    pub reservation: Option<BlockedRange>,
    pub side_effects: JoinHandle<()>,
}

pub struct BookingService {
    store: Arc<dyn SchedulingStore>,
    slots: SlotEngine,
    blocks: BlockService,
    locks: Arc<ProviderLocks>,
    notifier: Arc<dyn Notifier>,
    mailer: Arc<dyn Mailer>,
}

impl BookingService {
    pub fn new(state: &AppointmentState) -> Self {
        Self {
            store: state.scheduling.store.clone(),
            slots: state.scheduling.slot_engine(),
            blocks: BlockService::new(state.scheduling.store.clone()),
            locks: state.locks.clone(),
            notifier: state.notifier.clone(),
            mailer: state.mailer.clone(),
        }
    }

    /// Validates the requested slot against a fresh computation and commits it.
    ///
    /// Runs under the provider's lock; the store's unique active start key
    /// backs this up across processes.
    #[instrument(skip(self, request), fields(provider_id = %request.provider_id, date = %request.date, start = %request.start_time))]
    pub async fn book(&self, request: BookingRequest) -> Result<BookingOutcome, BookingError> {
        if !matches!(request.status, AppointmentStatus::Pending | AppointmentStatus::Confirmed) {
            return Err(BookingError::InvalidInitialStatus(request.status));
        }

        let (primary_service, additional_service_ids) = match request.service_ids.split_first() {
            Some((primary, rest)) => (*primary, rest.to_vec()),
            None => return Err(BookingError::MissingService),
        };

        let guard = self.locks.acquire(request.provider_id).await;

        let schedule = self
            .slots
            .compute_day(&DayRequest {
                provider_id: request.provider_id,
                date: request.date,
                service_ids: request.service_ids.clone(),
                ..Default::default()
            })
            .await?;

        let slot = schedule
            .slot_at(&request.start_time)
            .ok_or_else(|| BookingError::SlotNotFound {
                date: request.date.to_string(),
                start_time: request.start_time.clone(),
            })?;

        if !slot.is_available {
            return Err(BookingError::SlotNoLongerAvailable {
                start_time: request.start_time.clone(),
            });
        }

        if let Some(requested_end) = &request.end_time {
            if *requested_end != slot.end_time {
                return Err(BookingError::EndTimeMismatch {
                    start_time: slot.start_time.clone(),
                    requested: requested_end.clone(),
                    expected: slot.end_time.clone(),
                });
            }
        }

        let booked = slot.interval()?;
        let appointment = self
            .store
            .insert_appointment(NewAppointment {
                provider_id: request.provider_id,
                client_id: request.client_id,
                service_id: primary_service,
                additional_service_ids,
                date: request.date,
                start_time: slot.start_time.clone(),
                end_time: slot.end_time.clone(),
                status: request.status,
                payment_status: PaymentStatus::Pending,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => BookingError::SlotNoLongerAvailable {
                    start_time: request.start_time.clone(),
                },
                other => BookingError::Store(other),
            })?;

        info!(
            "Booked appointment {} for client {} ({}-{})",
            appointment.id, appointment.client_id, appointment.start_time, appointment.end_time
        );

        let reservation = match self.blocks.reserve(&appointment).await {
            Ok(range) => Some(range),
            Err(e) => {
                warn!("Could not reserve blocked range for appointment {}: {}", appointment.id, e);
                None
            }
        };

        let blocked_slots = newly_blocked(schedule.available_slots(), &booked);
        drop(guard);

        let side_effects = side_effects::dispatch(
            self.notifier.clone(),
            self.mailer.clone(),
            vec![booking_notification(&appointment)],
            request.client_email.map(|recipient| BookingEmail {
                recipient,
                appointment_id: appointment.id,
                provider_name: schedule.provider.name.clone(),
                date: appointment.date,
                start_time: appointment.start_time.clone(),
                end_time: appointment.end_time.clone(),
            }),
        );

        Ok(BookingOutcome {
            appointment,
            blocked_slots,
            reservation,
            side_effects,
        })
    }
}

/// Checks who may book for whom and settles the initial status.
///
/// Clients book for themselves and land in `pending`; providers book their own
/// calendar and admins anyone's, landing in `confirmed` unless told otherwise.
pub fn authorize_booking(
    actor: &User,
    provider_id: Uuid,
    client_id: Uuid,
    requested: Option<AppointmentStatus>,
) -> Result<AppointmentStatus, BookingError> {
    let default_status = match actor.user_role() {
        UserRole::Admin => AppointmentStatus::Confirmed,
        UserRole::Provider => {
            if actor.id != provider_id.to_string() {
                return Err(BookingError::Forbidden(
                    "providers can only book on their own calendar".to_string(),
                ));
            }
            AppointmentStatus::Confirmed
        }
        UserRole::Client => {
            if actor.id != client_id.to_string() {
                return Err(BookingError::Forbidden("clients can only book for themselves".to_string()));
            }
            if matches!(requested, Some(AppointmentStatus::Confirmed)) {
                return Err(BookingError::Forbidden(
                    "only the provider can confirm an appointment".to_string(),
                ));
            }
            AppointmentStatus::Pending
        }
    };

    let status = requested.unwrap_or(default_status);
    match status {
        AppointmentStatus::Pending | AppointmentStatus::Confirmed => Ok(status),
        other => Err(BookingError::InvalidInitialStatus(other)),
    }
}

/// Previously bookable slots that overlap the committed range.
fn newly_blocked<'a>(available: impl Iterator<Item = &'a CandidateSlot>, booked: &Interval) -> Vec<CandidateSlot> {
    available
        .filter(|slot| slot.interval().map(|i| i.overlaps(booked)).unwrap_or(false))
        .map(|slot| CandidateSlot {
            is_available: false,
            ..slot.clone()
        })
        .collect()
}

fn booking_notification(appointment: &Appointment) -> NotificationEvent {
    NotificationEvent::new(
        appointment.provider_id.to_string(),
        NotificationKind::AppointmentBooked,
        "New booking",
        format!(
            "New appointment on {} from {} to {}",
            appointment.date, appointment.start_time, appointment.end_time
        ),
    )
    .for_appointment(appointment.id)
}
