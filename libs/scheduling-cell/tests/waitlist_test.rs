mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio_test;
use uuid::Uuid;

use common::{booking_at, dt, test_stores, waitlist_entry_at, waitlist_request, TestStores};
use scheduling_cell::error::SchedulingError;
use scheduling_cell::models::{BookingStatus, ConflictKind, SlotRequest, WaitlistStatus};
use scheduling_cell::services::WaitlistService;
use scheduling_cell::store::{BookingStore, ConflictStore, OverlapAxis, WaitlistStore};

fn service(stores: &TestStores) -> WaitlistService {
    WaitlistService::new(
        Arc::clone(&stores.waitlist) as Arc<dyn WaitlistStore>,
        Arc::clone(&stores.bookings) as Arc<dyn BookingStore>,
        Arc::clone(&stores.conflicts) as Arc<dyn ConflictStore>,
    )
}

fn slot(provider_id: Uuid) -> SlotRequest {
    SlotRequest {
        start_time: dt(2024, 6, 3, 9, 0),
        end_time: dt(2024, 6, 3, 9, 30),
        provider_id,
        room_id: None,
    }
}

#[tokio::test]
async fn listing_orders_by_priority_then_urgency_then_age() {
    let stores = test_stores();
    let service = service(&stores);
    let tenant = Uuid::new_v4();
    let base = Utc::now() - Duration::hours(3);

    // Creation order: oldest first, priorities [3, 7, 7], urgent only on the
    // newest entry.
    let low = waitlist_entry_at(tenant, 3, false, base);
    let high_plain = waitlist_entry_at(tenant, 7, false, base + Duration::hours(1));
    let high_urgent = waitlist_entry_at(tenant, 7, true, base + Duration::hours(2));
    for entry in [&low, &high_plain, &high_urgent] {
        stores.waitlist.create(entry.clone()).await.unwrap();
    }

    let listed = service.list_active(tenant, None).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![high_urgent.id, high_plain.id, low.id]);
}

#[tokio::test]
async fn ties_within_a_level_go_to_the_oldest_request() {
    let stores = test_stores();
    let service = service(&stores);
    let tenant = Uuid::new_v4();
    let base = Utc::now() - Duration::hours(2);

    let older = waitlist_entry_at(tenant, 5, false, base);
    let newer = waitlist_entry_at(tenant, 5, false, base + Duration::minutes(10));
    stores.waitlist.create(newer.clone()).await.unwrap();
    stores.waitlist.create(older.clone()).await.unwrap();

    let listed = service.list_active(tenant, None).await.unwrap();
    assert_eq!(listed[0].id, older.id);
    assert_eq!(listed[1].id, newer.id);
}

#[tokio::test]
async fn expired_entries_drop_out_of_the_listing_lazily() {
    let stores = test_stores();
    let service = service(&stores);
    let tenant = Uuid::new_v4();

    let mut expired = waitlist_entry_at(tenant, 9, true, Utc::now() - Duration::days(120));
    expired.expires_at = Utc::now() - Duration::days(30);
    stores.waitlist.create(expired.clone()).await.unwrap();

    let live = waitlist_entry_at(tenant, 1, false, Utc::now());
    stores.waitlist.create(live.clone()).await.unwrap();

    let listed = service.list_active(tenant, None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, live.id);

    // Lazy evaluation: the stored entry keeps its status untouched.
    let stored = stores
        .waitlist
        .find_by_id(tenant, expired.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, WaitlistStatus::Active);
}

#[tokio::test]
async fn listing_can_be_scoped_to_a_clinic() {
    let stores = test_stores();
    let service = service(&stores);
    let tenant = Uuid::new_v4();
    let clinic = Uuid::new_v4();

    let mut in_clinic = waitlist_entry_at(tenant, 5, false, Utc::now());
    in_clinic.clinic_id = Some(clinic);
    let mut other_clinic = waitlist_entry_at(tenant, 5, false, Utc::now());
    other_clinic.clinic_id = Some(Uuid::new_v4());
    stores.waitlist.create(in_clinic.clone()).await.unwrap();
    stores.waitlist.create(other_clinic).await.unwrap();

    let listed = service.list_active(tenant, Some(clinic)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, in_clinic.id);
}

#[tokio::test]
async fn promotion_builds_a_booking_and_flips_the_entry_once() {
    let stores = test_stores();
    let service = service(&stores);
    let tenant = Uuid::new_v4();
    let provider = Uuid::new_v4();

    let entry = service
        .add_entry(waitlist_request(tenant, Uuid::new_v4(), 5, false))
        .await
        .unwrap();
    assert_eq!(entry.status, WaitlistStatus::Active);

    let outcome = service.promote(tenant, entry.id, slot(provider)).await.unwrap();

    assert_eq!(outcome.booking.tenant_id, tenant);
    assert_eq!(outcome.booking.patient_id, entry.patient_id);
    assert_eq!(outcome.booking.provider_id, provider);
    assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
    assert!(outcome.conflicts.is_empty());
    assert_eq!(outcome.entry.status, WaitlistStatus::Scheduled);
    assert_eq!(outcome.entry.booking_id, Some(outcome.booking.id));

    let persisted = stores
        .bookings
        .find_by_id(tenant, outcome.booking.id)
        .await
        .unwrap();
    assert!(persisted.is_some());
}

#[tokio::test]
async fn promotion_commits_even_when_conflicts_are_found() {
    let stores = test_stores();
    let service = service(&stores);
    let tenant = Uuid::new_v4();
    let provider = Uuid::new_v4();

    let existing = booking_at(
        tenant,
        provider,
        Uuid::new_v4(),
        None,
        dt(2024, 6, 3, 9, 0),
        dt(2024, 6, 3, 10, 0),
    );
    stores.bookings.create(existing).await.unwrap();

    let entry = service
        .add_entry(waitlist_request(tenant, Uuid::new_v4(), 8, true))
        .await
        .unwrap();

    let outcome = service.promote(tenant, entry.id, slot(provider)).await.unwrap();

    assert_eq!(outcome.conflicts.len(), 1);
    assert_eq!(
        outcome.conflicts[0].kind,
        ConflictKind::ProviderDoubleBooking
    );
    // The booking and the status flip both still happened.
    assert_eq!(outcome.entry.status, WaitlistStatus::Scheduled);
    let persisted = stores
        .bookings
        .find_by_id(tenant, outcome.booking.id)
        .await
        .unwrap();
    assert!(persisted.is_some());
}

#[tokio::test]
async fn promoting_a_scheduled_entry_fails_and_creates_no_booking() {
    let stores = test_stores();
    let service = service(&stores);
    let tenant = Uuid::new_v4();
    let provider = Uuid::new_v4();

    let entry = service
        .add_entry(waitlist_request(tenant, Uuid::new_v4(), 5, false))
        .await
        .unwrap();
    service.promote(tenant, entry.id, slot(provider)).await.unwrap();

    let second = service.promote(tenant, entry.id, slot(provider)).await;
    assert_matches!(second, Err(SchedulingError::InvalidState(_)));

    // Exactly one booking exists for the provider in the slot window.
    let bookings = stores
        .bookings
        .find_overlapping(
            tenant,
            OverlapAxis::Provider(provider),
            dt(2024, 6, 3, 0, 0),
            dt(2024, 6, 4, 0, 0),
            None,
        )
        .await
        .unwrap();
    assert_eq!(bookings.len(), 1);
}

#[tokio::test]
async fn expired_and_cancelled_entries_cannot_be_promoted() {
    let stores = test_stores();
    let service = service(&stores);
    let tenant = Uuid::new_v4();

    let mut expired = waitlist_entry_at(tenant, 5, false, Utc::now() - Duration::days(120));
    expired.expires_at = Utc::now() - Duration::days(30);
    stores.waitlist.create(expired.clone()).await.unwrap();

    let result = service
        .promote(tenant, expired.id, slot(Uuid::new_v4()))
        .await;
    assert_matches!(result, Err(SchedulingError::InvalidState(_)));

    let entry = service
        .add_entry(waitlist_request(tenant, Uuid::new_v4(), 5, false))
        .await
        .unwrap();
    service
        .cancel_entry(tenant, entry.id, Some("patient moved away".to_string()))
        .await
        .unwrap();

    let result = service.promote(tenant, entry.id, slot(Uuid::new_v4())).await;
    assert_matches!(result, Err(SchedulingError::InvalidState(_)));
}

#[tokio::test]
async fn entry_requests_are_validated() {
    let stores = test_stores();
    let service = service(&stores);
    let tenant = Uuid::new_v4();

    let mut bad_duration = waitlist_request(tenant, Uuid::new_v4(), 5, false);
    bad_duration.duration_minutes = 0;
    let result = service.add_entry(bad_duration).await;
    assert_matches!(result, Err(SchedulingError::Validation(_)));

    let mut bad_window = waitlist_request(tenant, Uuid::new_v4(), 5, false);
    bad_window.preferred_window_start = Some(dt(2024, 6, 3, 12, 0));
    bad_window.preferred_window_end = Some(dt(2024, 6, 3, 11, 0));
    let result = service.add_entry(bad_window).await;
    assert_matches!(result, Err(SchedulingError::Validation(_)));

    let result = service
        .promote(
            tenant,
            Uuid::new_v4(),
            SlotRequest {
                start_time: dt(2024, 6, 3, 10, 0),
                end_time: dt(2024, 6, 3, 10, 0),
                provider_id: Uuid::new_v4(),
                room_id: None,
            },
        )
        .await;
    assert_matches!(result, Err(SchedulingError::Validation(_)));
}

#[tokio::test]
async fn contacted_entries_leave_the_active_queue() {
    let stores = test_stores();
    let service = service(&stores);
    let tenant = Uuid::new_v4();

    let entry = service
        .add_entry(waitlist_request(tenant, Uuid::new_v4(), 5, false))
        .await
        .unwrap();
    let contacted = service.mark_contacted(tenant, entry.id).await.unwrap();
    assert_eq!(contacted.status, WaitlistStatus::Contacted);

    let listed = service.list_active(tenant, None).await.unwrap();
    assert!(listed.is_empty());

    let missing = Uuid::new_v4();
    let result = service.mark_contacted(tenant, missing).await;
    assert_matches!(result, Err(SchedulingError::WaitlistEntryNotFound(id)) if id == missing);
}
