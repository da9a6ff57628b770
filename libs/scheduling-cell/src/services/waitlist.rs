// libs/scheduling-cell/src/services/waitlist.rs
use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{
    Booking, BookingStatus, CreateWaitlistEntryRequest, PromotionOutcome, SchedulingRules,
    SlotRequest, WaitlistEntry, WaitlistStatus,
};
use crate::services::conflict::ConflictDetectionService;
use crate::store::{BookingStore, ConflictStore, WaitlistStore};

/// Maintains the priority-ordered demand queue and converts entries into
/// confirmed bookings. Promotion commits the booking regardless of conflicts
/// found; conflicts surface as records for manual resolution, mirroring the
/// direct-booking path.
pub struct WaitlistService {
    entries: Arc<dyn WaitlistStore>,
    bookings: Arc<dyn BookingStore>,
    conflict_service: ConflictDetectionService,
    rules: SchedulingRules,
}

impl WaitlistService {
    pub fn new(
        entries: Arc<dyn WaitlistStore>,
        bookings: Arc<dyn BookingStore>,
        conflicts: Arc<dyn ConflictStore>,
    ) -> Self {
        let conflict_service =
            ConflictDetectionService::new(Arc::clone(&bookings), conflicts);
        Self {
            entries,
            bookings,
            conflict_service,
            rules: SchedulingRules::default(),
        }
    }

    pub fn with_rules(
        entries: Arc<dyn WaitlistStore>,
        bookings: Arc<dyn BookingStore>,
        conflicts: Arc<dyn ConflictStore>,
        rules: SchedulingRules,
    ) -> Self {
        let conflict_service =
            ConflictDetectionService::new(Arc::clone(&bookings), conflicts);
        Self {
            entries,
            bookings,
            conflict_service,
            rules,
        }
    }

    pub async fn add_entry(
        &self,
        request: CreateWaitlistEntryRequest,
    ) -> Result<WaitlistEntry, SchedulingError> {
        if request.duration_minutes <= 0 {
            return Err(SchedulingError::Validation(
                "duration_minutes must be positive".to_string(),
            ));
        }
        if let (Some(start), Some(end)) =
            (request.preferred_window_start, request.preferred_window_end)
        {
            if end <= start {
                return Err(SchedulingError::Validation(
                    "preferred window end must be after its start".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let entry = WaitlistEntry {
            id: Uuid::new_v4(),
            tenant_id: request.tenant_id,
            clinic_id: request.clinic_id,
            patient_id: request.patient_id,
            requested_by: request.requested_by,
            appointment_type: request.appointment_type,
            duration_minutes: request.duration_minutes,
            preferred_provider_id: request.preferred_provider_id,
            preferred_window_start: request.preferred_window_start,
            preferred_window_end: request.preferred_window_end,
            priority_level: request.priority_level,
            is_urgent: request.is_urgent,
            contact_method: request.contact_method,
            status: WaitlistStatus::Active,
            expires_at: now + ChronoDuration::days(self.rules.waitlist_expiry_days),
            booking_id: None,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };

        let entry = self.entries.create(entry).await?;
        info!(
            "Waitlist entry {} created for patient {} (priority {}, urgent {})",
            entry.id, entry.patient_id, entry.priority_level, entry.is_urgent
        );
        Ok(entry)
    }

    /// Active entries in promotion order: priority_level descending, then
    /// is_urgent descending, then created_at ascending (oldest request wins
    /// ties). A pure sort over a store snapshot; entries past their expiry
    /// are dropped from the listing, never mutated here.
    pub async fn list_active(
        &self,
        tenant_id: Uuid,
        clinic_id: Option<Uuid>,
    ) -> Result<Vec<WaitlistEntry>, SchedulingError> {
        let now = Utc::now();
        let mut active = self.entries.list_active(tenant_id, clinic_id).await?;
        active.retain(|entry| !entry.is_expired(now));
        active.sort_by(|a, b| {
            b.priority_level
                .cmp(&a.priority_level)
                .then(b.is_urgent.cmp(&a.is_urgent))
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(active)
    }

    /// Promote `entry_id` into a booking at the chosen slot. The entry flips
    /// to scheduled exactly once; a second promotion attempt is an
    /// InvalidState error, never a second booking.
    pub async fn promote(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
        slot: SlotRequest,
    ) -> Result<PromotionOutcome, SchedulingError> {
        if slot.end_time <= slot.start_time {
            return Err(SchedulingError::Validation(
                "slot end_time must be after start_time".to_string(),
            ));
        }

        let mut entry = self
            .entries
            .find_by_id(tenant_id, entry_id)
            .await?
            .ok_or(SchedulingError::WaitlistEntryNotFound(entry_id))?;

        if entry.status != WaitlistStatus::Active {
            return Err(SchedulingError::InvalidState(format!(
                "waitlist entry is {}, only active entries can be promoted",
                entry.status
            )));
        }
        if entry.is_expired(Utc::now()) {
            return Err(SchedulingError::InvalidState(
                "waitlist entry has expired".to_string(),
            ));
        }

        debug!(
            "Promoting waitlist entry {} to slot {} - {}",
            entry.id, slot.start_time, slot.end_time
        );

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            tenant_id: entry.tenant_id,
            patient_id: entry.patient_id,
            provider_id: slot.provider_id,
            room_id: slot.room_id,
            appointment_type: entry.appointment_type,
            start_time: slot.start_time,
            end_time: slot.end_time,
            status: BookingStatus::Confirmed,
            master_booking_id: None,
            cancellation_reason: None,
            notes: entry.notes.clone(),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        let booking = self.bookings.create(booking).await?;

        // Conflicts do not block the promotion; they queue for resolution.
        let conflicts = self.conflict_service.detect_conflicts(&booking).await?;
        if !conflicts.is_empty() {
            warn!(
                "Promotion of entry {} committed with {} open conflict(s)",
                entry.id,
                conflicts.len()
            );
        }

        entry.status = WaitlistStatus::Scheduled;
        entry.booking_id = Some(booking.id);
        entry.updated_at = Utc::now();
        let entry = self.entries.save(entry).await?;

        info!(
            "Waitlist entry {} promoted to booking {}",
            entry.id, booking.id
        );
        Ok(PromotionOutcome {
            booking,
            conflicts,
            entry,
        })
    }

    pub async fn mark_contacted(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
    ) -> Result<WaitlistEntry, SchedulingError> {
        let mut entry = self
            .entries
            .find_by_id(tenant_id, entry_id)
            .await?
            .ok_or(SchedulingError::WaitlistEntryNotFound(entry_id))?;

        if entry.status != WaitlistStatus::Active {
            return Err(SchedulingError::InvalidState(format!(
                "cannot contact a {} waitlist entry",
                entry.status
            )));
        }

        entry.status = WaitlistStatus::Contacted;
        entry.updated_at = Utc::now();
        self.entries.save(entry).await
    }

    pub async fn cancel_entry(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
        reason: Option<String>,
    ) -> Result<WaitlistEntry, SchedulingError> {
        let mut entry = self
            .entries
            .find_by_id(tenant_id, entry_id)
            .await?
            .ok_or(SchedulingError::WaitlistEntryNotFound(entry_id))?;

        if !matches!(
            entry.status,
            WaitlistStatus::Active | WaitlistStatus::Contacted
        ) {
            return Err(SchedulingError::InvalidState(format!(
                "cannot cancel a {} waitlist entry",
                entry.status
            )));
        }

        entry.status = WaitlistStatus::Cancelled;
        if let Some(reason) = reason {
            entry.notes = Some(reason);
        }
        entry.updated_at = Utc::now();
        self.entries.save(entry).await
    }
}
