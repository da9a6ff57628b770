// libs/scheduling-cell/src/services/conflict.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{Booking, ConflictDetail, ConflictKind, ConflictRecord, ConflictStatus};
use crate::store::{BookingStore, ConflictStore, OverlapAxis};

/// Scans existing bookings for double-booking on the provider, patient, and
/// room axes. Detection is a point-in-time scan invoked once per newly
/// created or rescheduled booking; a conflict is data, never an error.
pub struct ConflictDetectionService {
    bookings: Arc<dyn BookingStore>,
    conflicts: Arc<dyn ConflictStore>,
}

impl ConflictDetectionService {
    pub fn new(bookings: Arc<dyn BookingStore>, conflicts: Arc<dyn ConflictStore>) -> Self {
        Self { bookings, conflicts }
    }

    /// Run the three axis scans for `booking` and persist one ConflictRecord
    /// per hit. Returned records are ordered by severity descending so the
    /// caller can feed them straight into a resolution queue.
    pub async fn detect_conflicts(
        &self,
        booking: &Booking,
    ) -> Result<Vec<ConflictRecord>, SchedulingError> {
        debug!(
            "Checking conflicts for booking {} ({} to {})",
            booking.id, booking.start_time, booking.end_time
        );

        let mut axes = vec![
            (
                OverlapAxis::Provider(booking.provider_id),
                ConflictKind::ProviderDoubleBooking,
            ),
            (
                OverlapAxis::Patient(booking.patient_id),
                ConflictKind::PatientDoubleBooking,
            ),
        ];
        if let Some(room_id) = booking.room_id {
            axes.push((OverlapAxis::Room(room_id), ConflictKind::RoomDoubleBooking));
        }

        let mut records = Vec::new();
        for (axis, kind) in axes {
            let overlapping = self
                .bookings
                .find_overlapping(
                    booking.tenant_id,
                    axis,
                    booking.start_time,
                    booking.end_time,
                    Some(booking.id),
                )
                .await?;

            for existing in overlapping {
                // Cancelled and no-show bookings have released their slot.
                if !existing.occupies_slot() || !existing.overlaps(booking) {
                    continue;
                }

                let record = self.build_record(booking, &existing, axis, kind);
                let record = self.conflicts.create(record).await?;
                records.push(record);
            }
        }

        if !records.is_empty() {
            warn!(
                "Detected {} conflict(s) for booking {}",
                records.len(),
                booking.id
            );
        }

        records.sort_by(|a, b| b.severity().cmp(&a.severity()));
        Ok(records)
    }

    /// Open conflicts for a tenant, ordered for triage: severity descending,
    /// oldest detection first within a severity.
    pub async fn open_conflicts(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<ConflictRecord>, SchedulingError> {
        let mut open = self
            .conflicts
            .find_by_status(tenant_id, ConflictStatus::Detected)
            .await?;
        open.sort_by(|a, b| {
            b.severity()
                .cmp(&a.severity())
                .then(a.detected_at.cmp(&b.detected_at))
        });
        Ok(open)
    }

    fn build_record(
        &self,
        booking: &Booking,
        existing: &Booking,
        axis: OverlapAxis,
        kind: ConflictKind,
    ) -> ConflictRecord {
        let (overlap_start, overlap_end) = overlap_window(booking, existing);
        let resource_id = axis.resource_id();

        let description = match kind {
            ConflictKind::ProviderDoubleBooking => format!(
                "Provider {} is double-booked from {} to {}",
                resource_id, overlap_start, overlap_end
            ),
            ConflictKind::PatientDoubleBooking => format!(
                "Patient {} has overlapping bookings from {} to {}",
                resource_id, overlap_start, overlap_end
            ),
            ConflictKind::RoomDoubleBooking => format!(
                "Room {} is double-booked from {} to {}",
                resource_id, overlap_start, overlap_end
            ),
        };

        ConflictRecord {
            id: Uuid::new_v4(),
            tenant_id: booking.tenant_id,
            primary_booking_id: booking.id,
            conflicting_booking_id: existing.id,
            kind,
            description,
            detail: ConflictDetail {
                overlap_start,
                overlap_end,
                resource_id,
            },
            status: ConflictStatus::Detected,
            resolution_notes: None,
            resolved_by: None,
            detected_at: Utc::now(),
            resolved_at: None,
        }
    }
}

/// Intersection of two overlapping [start, end) windows.
fn overlap_window(a: &Booking, b: &Booking) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        a.start_time.max(b.start_time),
        a.end_time.min(b.end_time),
    )
}
