// libs/scheduling-cell/src/services/resolution.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{
    Booking, BookingStatus, ConflictRecord, ConflictStatus, ResolutionAction,
    ResolveConflictRequest,
};
use crate::store::{BookingStore, ConflictStore};

/// Drives the conflict state machine: detected -> resolved | ignored |
/// escalated, all terminal. Exactly one of the two involved bookings is
/// mutated per resolution, or none for ignore/escalate. Rescheduling does
/// not rerun detection; the operator triggers re-detection explicitly.
pub struct ConflictResolutionService {
    bookings: Arc<dyn BookingStore>,
    conflicts: Arc<dyn ConflictStore>,
}

impl ConflictResolutionService {
    pub fn new(bookings: Arc<dyn BookingStore>, conflicts: Arc<dyn ConflictStore>) -> Self {
        Self { bookings, conflicts }
    }

    pub async fn resolve(
        &self,
        tenant_id: Uuid,
        conflict_id: Uuid,
        request: ResolveConflictRequest,
    ) -> Result<ConflictRecord, SchedulingError> {
        debug!(
            "Resolving conflict {} with action {}",
            conflict_id, request.action
        );

        let mut conflict = self
            .conflicts
            .find_by_id(tenant_id, conflict_id)
            .await?
            .ok_or(SchedulingError::ConflictNotFound(conflict_id))?;

        if conflict.status != ConflictStatus::Detected {
            warn!(
                "Rejected resolution of conflict {} already in status {}",
                conflict_id, conflict.status
            );
            return Err(SchedulingError::InvalidState(format!(
                "conflict is already {}",
                conflict.status
            )));
        }

        let terminal_status = match request.action {
            ResolutionAction::ReschedulePrimary => {
                self.reschedule(tenant_id, conflict.primary_booking_id, &request)
                    .await?;
                ConflictStatus::Resolved
            }
            ResolutionAction::RescheduleConflicting => {
                self.reschedule(tenant_id, conflict.conflicting_booking_id, &request)
                    .await?;
                ConflictStatus::Resolved
            }
            ResolutionAction::CancelPrimary => {
                self.cancel(tenant_id, conflict.primary_booking_id, &request)
                    .await?;
                ConflictStatus::Resolved
            }
            ResolutionAction::CancelConflicting => {
                self.cancel(tenant_id, conflict.conflicting_booking_id, &request)
                    .await?;
                ConflictStatus::Resolved
            }
            ResolutionAction::Ignore => ConflictStatus::Ignored,
            ResolutionAction::Escalate => ConflictStatus::Escalated,
        };

        conflict.status = terminal_status;
        conflict.resolution_notes = request.notes.clone();
        conflict.resolved_by = Some(request.resolved_by);
        conflict.resolved_at = Some(Utc::now());

        let conflict = self.conflicts.save(conflict).await?;

        info!(
            "Conflict {} closed as {} by {}",
            conflict_id, conflict.status, request.resolved_by
        );
        Ok(conflict)
    }

    async fn reschedule(
        &self,
        tenant_id: Uuid,
        booking_id: Uuid,
        request: &ResolveConflictRequest,
    ) -> Result<Booking, SchedulingError> {
        let (new_start, new_end) = validate_target_interval(request)?;

        let mut booking = self
            .bookings
            .find_by_id(tenant_id, booking_id)
            .await?
            .ok_or(SchedulingError::BookingNotFound(booking_id))?;

        if booking.status.is_terminal() {
            return Err(SchedulingError::InvalidState(format!(
                "cannot reschedule a {} booking",
                booking.status
            )));
        }

        booking.start_time = new_start;
        booking.end_time = new_end;
        if let Some(room_id) = request.new_room_id {
            booking.room_id = Some(room_id);
        }
        booking.updated_at = Utc::now();

        self.bookings.save(booking).await
    }

    async fn cancel(
        &self,
        tenant_id: Uuid,
        booking_id: Uuid,
        request: &ResolveConflictRequest,
    ) -> Result<Booking, SchedulingError> {
        let mut booking = self
            .bookings
            .find_by_id(tenant_id, booking_id)
            .await?
            .ok_or(SchedulingError::BookingNotFound(booking_id))?;

        if !booking.status.can_transition_to(&BookingStatus::Cancelled) {
            return Err(SchedulingError::InvalidState(format!(
                "cannot cancel a {} booking",
                booking.status
            )));
        }

        booking.status = BookingStatus::Cancelled;
        booking.cancellation_reason = Some(
            request
                .notes
                .clone()
                .unwrap_or_else(|| "Cancelled while resolving scheduling conflict".to_string()),
        );
        booking.updated_at = Utc::now();

        self.bookings.save(booking).await
    }
}

fn validate_target_interval(
    request: &ResolveConflictRequest,
) -> Result<(DateTime<Utc>, DateTime<Utc>), SchedulingError> {
    let (start, end) = match (request.new_start_time, request.new_end_time) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(SchedulingError::Validation(
                "reschedule requires new_start_time and new_end_time".to_string(),
            ))
        }
    };
    if end <= start {
        return Err(SchedulingError::Validation(
            "new_end_time must be after new_start_time".to_string(),
        ));
    }
    Ok((start, end))
}
