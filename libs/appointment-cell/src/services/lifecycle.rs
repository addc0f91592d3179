use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use availability_cell::engine::occupancy::{busy_intervals, conflicts_with_any};
use availability_cell::engine::time_codec::to_range;
use availability_cell::engine::Interval;
use availability_cell::BlockService;
use notification_cell::{Mailer, NotificationEvent, NotificationKind, Notifier};
use shared_database::{SchedulingStore, StoreError};
use shared_models::auth::{User, UserRole};
use shared_models::scheduling::{Appointment, AppointmentStatus};

use super::locks::ProviderLocks;
use super::side_effects;
use crate::error::BookingError;
use crate::AppointmentState;

/// Statuses reachable from `current`.
pub fn allowed_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
    use AppointmentStatus::*;

    match current {
        Pending => &[Confirmed, Canceled],
        Confirmed => &[Executing, Canceled, NoShow],
        Executing => &[Completed, Canceled, NoShow],
        // Reactivation only.
        Completed | Canceled => &[Pending],
        NoShow => &[],
    }
}

pub fn validate_transition(from: AppointmentStatus, to: AppointmentStatus) -> Result<(), BookingError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(BookingError::InvalidStatusTransition { from, to })
    }
}

fn is_participant(user: &User, appointment: &Appointment) -> bool {
    user.is_admin()
        || user.id == appointment.client_id.to_string()
        || user.id == appointment.provider_id.to_string()
}

pub struct LifecycleService {
    store: Arc<dyn SchedulingStore>,
    blocks: BlockService,
    locks: Arc<ProviderLocks>,
    notifier: Arc<dyn Notifier>,
    mailer: Arc<dyn Mailer>,
}

impl LifecycleService {
    pub fn new(state: &AppointmentState) -> Self {
        Self {
            store: state.scheduling.store.clone(),
            blocks: BlockService::new(state.scheduling.store.clone()),
            locks: state.locks.clone(),
            notifier: state.notifier.clone(),
            mailer: state.mailer.clone(),
        }
    }

    /// Loads an appointment visible to `user`.
    pub async fn get(&self, appointment_id: Uuid, user: &User) -> Result<Appointment, BookingError> {
        let appointment = self
            .store
            .get_appointment(appointment_id)
            .await?
            .ok_or(BookingError::AppointmentNotFound(appointment_id))?;

        if !is_participant(user, &appointment) {
            return Err(BookingError::Forbidden(
                "only the client, the provider or an admin can access this appointment".to_string(),
            ));
        }
        Ok(appointment)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        user: &User,
    ) -> Result<Appointment, BookingError> {
        let current = self.get(appointment_id, user).await?;

        if user.user_role() == UserRole::Client && status != AppointmentStatus::Canceled {
            return Err(BookingError::Forbidden("clients can only cancel appointments".to_string()));
        }
        validate_transition(current.status, status)?;

        let updated = if !current.status.is_active() && status.is_active() {
            self.reactivate(&current, status).await?
        } else {
            let updated = self.store.update_appointment_status(appointment_id, status).await?;
            if !status.is_active() {
                match self.blocks.release(appointment_id).await {
                    Ok(released) => debug!("Released {} blocked range(s)", released),
                    Err(e) => warn!("Could not release blocked ranges for appointment {}: {}", appointment_id, e),
                }
            }
            updated
        };

        info!("Appointment {} moved from {} to {}", appointment_id, current.status, updated.status);

        side_effects::dispatch(
            self.notifier.clone(),
            self.mailer.clone(),
            vec![status_notification(&updated, user)],
            None,
        );

        Ok(updated)
    }

    /// Brings an inactive appointment back, provided its range is still free.
    async fn reactivate(&self, current: &Appointment, status: AppointmentStatus) -> Result<Appointment, BookingError> {
        let _guard = self.locks.acquire(current.provider_id).await;

        let (appointments, blocks) = tokio::try_join!(
            self.store.appointments(current.provider_id, current.date),
            self.store.blocked_ranges(current.provider_id, current.date),
        )?;
        let busy = busy_intervals(&appointments, &blocks, Some(current.id))?;
        let (start, end) = to_range(&current.start_time, &current.end_time)?;

        if conflicts_with_any(&Interval::new(start, end), &busy) {
            return Err(BookingError::SlotNoLongerAvailable {
                start_time: current.start_time.clone(),
            });
        }

        let updated = self
            .store
            .update_appointment_status(current.id, status)
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => BookingError::SlotNoLongerAvailable {
                    start_time: current.start_time.clone(),
                },
                other => BookingError::Store(other),
            })?;

        if let Err(e) = self.blocks.reserve(&updated).await {
            warn!("Could not re-reserve blocked range for appointment {}: {}", updated.id, e);
        }
        Ok(updated)
    }
}

/// Tells the other party about the change.
fn status_notification(appointment: &Appointment, actor: &User) -> NotificationEvent {
    let recipient = if actor.id == appointment.provider_id.to_string() {
        appointment.client_id
    } else {
        appointment.provider_id
    };

    NotificationEvent::new(
        recipient.to_string(),
        NotificationKind::AppointmentStatusChanged,
        "Appointment updated",
        format!(
            "Appointment on {} at {} is now {}",
            appointment.date, appointment.start_time, appointment.status
        ),
    )
    .for_appointment(appointment.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use AppointmentStatus::*;

    #[test]
    fn test_forward_path() {
        assert!(validate_transition(Pending, Confirmed).is_ok());
        assert!(validate_transition(Confirmed, Executing).is_ok());
        assert!(validate_transition(Executing, Completed).is_ok());
    }

    #[test]
    fn test_cancel_from_any_open_state() {
        for from in [Pending, Confirmed, Executing] {
            assert!(validate_transition(from, Canceled).is_ok(), "{} -> canceled", from);
        }
    }

    #[test]
    fn test_no_show_requires_confirmation() {
        assert_matches!(
            validate_transition(Pending, NoShow),
            Err(BookingError::InvalidStatusTransition { from: Pending, to: NoShow })
        );
        assert!(validate_transition(Confirmed, NoShow).is_ok());
        assert!(validate_transition(Executing, NoShow).is_ok());
    }

    #[test]
    fn test_closed_states_only_reopen_to_pending() {
        assert!(validate_transition(Canceled, Pending).is_ok());
        assert!(validate_transition(Completed, Pending).is_ok());
        assert!(validate_transition(Canceled, Confirmed).is_err());
        assert!(validate_transition(Completed, Canceled).is_err());
        assert!(allowed_transitions(NoShow).is_empty());
    }
}
