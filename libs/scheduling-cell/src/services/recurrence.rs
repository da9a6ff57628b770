// libs/scheduling-cell/src/services/recurrence.rs
use anyhow::Result;
use chrono::{Duration as ChronoDuration, Months, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{
    Booking, BookingStatus, RecurrenceEndMode, RecurrenceFrequency, RecurrencePattern,
    SchedulingRules,
};
use crate::store::BookingStore;

/// Expands a recurrence pattern into concrete bookings. No conflict checking
/// happens here; the caller runs the detector once per generated booking.
pub struct RecurrenceExpansionService {
    bookings: Arc<dyn BookingStore>,
    rules: SchedulingRules,
}

impl RecurrenceExpansionService {
    pub fn new(bookings: Arc<dyn BookingStore>) -> Self {
        Self {
            bookings,
            rules: SchedulingRules::default(),
        }
    }

    pub fn with_rules(bookings: Arc<dyn BookingStore>, rules: SchedulingRules) -> Self {
        Self { bookings, rules }
    }

    /// Expand the series owned by `master`. The master counts as the first
    /// occurrence; new bookings are generated for every later occurrence
    /// date, copying the master except identity and timestamps. All generated
    /// bookings are persisted, then the pattern is stamped with the expansion
    /// time. Configuration errors surface before any booking is created.
    pub async fn expand_series(
        &self,
        master: &Booking,
        pattern: &mut RecurrencePattern,
    ) -> Result<Vec<Booking>, SchedulingError> {
        pattern
            .validate()
            .map_err(SchedulingError::InvalidPattern)?;

        if pattern.booking_id != master.id {
            return Err(SchedulingError::Validation(format!(
                "pattern {} does not belong to booking {}",
                pattern.id, master.id
            )));
        }
        if !pattern.is_active {
            return Err(SchedulingError::InvalidState(
                "recurrence pattern is no longer active".to_string(),
            ));
        }

        debug!(
            "Expanding {:?} series for master booking {} (interval {})",
            pattern.frequency, master.id, pattern.interval_value
        );

        let dates = self.occurrence_dates(pattern, master.start_time.date_naive());
        let start_tod = master.start_time.time();
        let end_tod = master.end_time.time();
        let crosses_midnight = master.end_time.date_naive() > master.start_time.date_naive();

        let mut generated = Vec::new();
        for date in dates {
            if date == master.start_time.date_naive() {
                // The master itself already occupies the first slot.
                continue;
            }

            let end_date = if crosses_midnight {
                date + ChronoDuration::days(1)
            } else {
                date
            };
            let now = Utc::now();
            let occurrence = Booking {
                id: Uuid::new_v4(),
                tenant_id: master.tenant_id,
                patient_id: master.patient_id,
                provider_id: master.provider_id,
                room_id: master.room_id,
                appointment_type: master.appointment_type,
                start_time: date.and_time(start_tod).and_utc(),
                end_time: end_date.and_time(end_tod).and_utc(),
                status: BookingStatus::Scheduled,
                master_booking_id: Some(master.id),
                cancellation_reason: None,
                notes: master.notes.clone(),
                deleted_at: None,
                created_at: now,
                updated_at: now,
            };

            let occurrence = self.bookings.create(occurrence).await?;
            generated.push(occurrence);
        }

        pattern.last_expanded_at = Some(Utc::now());

        info!(
            "Expanded series for booking {}: {} occurrences generated",
            master.id,
            generated.len()
        );
        Ok(generated)
    }

    /// Occurrence dates for a pattern starting at `start_date`, including the
    /// start date itself when it passes the selector sets. Bounded by the
    /// termination mode and by the hard occurrence ceiling. Selector-filtered
    /// dates are skipped without consuming a count slot; a scan ceiling keeps
    /// a never-matching selector set from walking forever.
    pub fn occurrence_dates(
        &self,
        pattern: &RecurrencePattern,
        start_date: NaiveDate,
    ) -> Vec<NaiveDate> {
        let ceiling = self.rules.max_occurrences_per_expansion;
        let target = match pattern.end_mode {
            RecurrenceEndMode::AfterCount => pattern
                .recurrence_count
                .unwrap_or(ceiling)
                .min(ceiling),
            _ => ceiling,
        };
        let max_scans = ceiling.saturating_mul(12);

        let mut dates = Vec::new();
        let mut current = start_date;
        let mut scans = 0u32;

        loop {
            if dates.len() as u32 >= target || scans >= max_scans {
                break;
            }
            if pattern.end_mode == RecurrenceEndMode::OnDate {
                match pattern.end_date {
                    Some(end) if current > end => break,
                    _ => {}
                }
            }

            if pattern.matches_selectors(current) {
                dates.push(current);
            }
            scans += 1;

            current = match next_occurrence_date(current, pattern.frequency, pattern.interval_value)
            {
                Some(next) => next,
                None => break,
            };
        }

        dates
    }
}

/// Step a date forward by `interval` units of the frequency. Month and year
/// steps clamp to the last valid day (Jan 31 + 1 month = Feb 29/28).
fn next_occurrence_date(
    date: NaiveDate,
    frequency: RecurrenceFrequency,
    interval: u32,
) -> Option<NaiveDate> {
    match frequency {
        RecurrenceFrequency::Daily => date.checked_add_signed(ChronoDuration::days(interval as i64)),
        RecurrenceFrequency::Weekly => {
            date.checked_add_signed(ChronoDuration::days(7 * interval as i64))
        }
        RecurrenceFrequency::Monthly => date.checked_add_months(Months::new(interval)),
        RecurrenceFrequency::Yearly => date.checked_add_months(Months::new(12 * interval)),
    }
}
