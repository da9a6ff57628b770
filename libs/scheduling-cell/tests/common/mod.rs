#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use scheduling_cell::models::{
    AppointmentType, Booking, BookingStatus, ContactMethod, CreateWaitlistEntryRequest,
    RecurrenceEndMode, RecurrenceFrequency, RecurrencePattern, WaitlistEntry, WaitlistStatus,
};
use scheduling_cell::store::{MemoryBookingStore, MemoryConflictStore, MemoryWaitlistStore};

pub struct TestStores {
    pub bookings: Arc<MemoryBookingStore>,
    pub waitlist: Arc<MemoryWaitlistStore>,
    pub conflicts: Arc<MemoryConflictStore>,
}

pub fn test_stores() -> TestStores {
    TestStores {
        bookings: Arc::new(MemoryBookingStore::new()),
        waitlist: Arc::new(MemoryWaitlistStore::new()),
        conflicts: Arc::new(MemoryConflictStore::new()),
    }
}

pub fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn booking_at(
    tenant_id: Uuid,
    provider_id: Uuid,
    patient_id: Uuid,
    room_id: Option<Uuid>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Booking {
    let now = Utc::now();
    Booking {
        id: Uuid::new_v4(),
        tenant_id,
        patient_id,
        provider_id,
        room_id,
        appointment_type: AppointmentType::InitialConsultation,
        start_time,
        end_time,
        status: BookingStatus::Confirmed,
        master_booking_id: None,
        cancellation_reason: None,
        notes: None,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn pattern_for(
    booking_id: Uuid,
    frequency: RecurrenceFrequency,
    interval_value: u32,
    end_mode: RecurrenceEndMode,
    recurrence_count: Option<u32>,
    end_date: Option<chrono::NaiveDate>,
) -> RecurrencePattern {
    RecurrencePattern {
        id: Uuid::new_v4(),
        booking_id,
        frequency,
        interval_value,
        end_mode,
        recurrence_count,
        end_date,
        days_of_week: vec![],
        days_of_month: vec![],
        months_of_year: vec![],
        is_active: true,
        last_expanded_at: None,
        created_at: Utc::now(),
    }
}

pub fn waitlist_request(
    tenant_id: Uuid,
    patient_id: Uuid,
    priority_level: i32,
    is_urgent: bool,
) -> CreateWaitlistEntryRequest {
    CreateWaitlistEntryRequest {
        tenant_id,
        clinic_id: None,
        patient_id,
        requested_by: Uuid::new_v4(),
        appointment_type: AppointmentType::FollowUp,
        duration_minutes: 30,
        preferred_provider_id: None,
        preferred_window_start: None,
        preferred_window_end: None,
        priority_level,
        is_urgent,
        contact_method: ContactMethod::Phone,
        notes: None,
    }
}

/// Entry with an explicit created_at, for deterministic ordering tests.
pub fn waitlist_entry_at(
    tenant_id: Uuid,
    priority_level: i32,
    is_urgent: bool,
    created_at: DateTime<Utc>,
) -> WaitlistEntry {
    WaitlistEntry {
        id: Uuid::new_v4(),
        tenant_id,
        clinic_id: None,
        patient_id: Uuid::new_v4(),
        requested_by: Uuid::new_v4(),
        appointment_type: AppointmentType::FollowUp,
        duration_minutes: 30,
        preferred_provider_id: None,
        preferred_window_start: None,
        preferred_window_end: None,
        priority_level,
        is_urgent,
        contact_method: ContactMethod::Email,
        status: WaitlistStatus::Active,
        expires_at: created_at + Duration::days(90),
        booking_id: None,
        notes: None,
        created_at,
        updated_at: created_at,
    }
}
