// libs/scheduling-cell/src/store/memory.rs
//
// In-memory reference implementation of the collaborator stores. Used by the
// test suite and by embedding callers that need no external database. One
// RwLock per table; reads work on snapshots.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{Booking, ConflictRecord, ConflictStatus, WaitlistEntry, WaitlistStatus};
use crate::store::{BookingStore, ConflictStore, OverlapAxis, WaitlistStore};

#[derive(Default)]
pub struct MemoryBookingStore {
    rows: RwLock<HashMap<Uuid, Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn create(&self, booking: Booking) -> Result<Booking, SchedulingError> {
        let mut rows = self.rows.write().await;
        rows.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Booking>, SchedulingError> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(&id)
            .filter(|b| b.tenant_id == tenant_id && b.deleted_at.is_none())
            .cloned())
    }

    async fn find_overlapping(
        &self,
        tenant_id: Uuid,
        axis: OverlapAxis,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Booking>, SchedulingError> {
        let rows = self.rows.read().await;
        let mut hits: Vec<Booking> = rows
            .values()
            .filter(|b| b.tenant_id == tenant_id && b.deleted_at.is_none())
            .filter(|b| Some(b.id) != exclude_id)
            .filter(|b| match axis {
                OverlapAxis::Provider(id) => b.provider_id == id,
                OverlapAxis::Patient(id) => b.patient_id == id,
                OverlapAxis::Room(id) => b.room_id == Some(id),
            })
            .filter(|b| b.start_time < end_time && b.end_time > start_time)
            .cloned()
            .collect();
        hits.sort_by_key(|b| b.start_time);
        Ok(hits)
    }

    async fn save(&self, booking: Booking) -> Result<Booking, SchedulingError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&booking.id) {
            return Err(SchedulingError::BookingNotFound(booking.id));
        }
        rows.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn soft_delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), SchedulingError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&id) {
            Some(booking) if booking.tenant_id == tenant_id => {
                booking.deleted_at = Some(Utc::now());
                booking.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(SchedulingError::BookingNotFound(id)),
        }
    }
}

#[derive(Default)]
pub struct MemoryWaitlistStore {
    rows: RwLock<HashMap<Uuid, WaitlistEntry>>,
}

impl MemoryWaitlistStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WaitlistStore for MemoryWaitlistStore {
    async fn create(&self, entry: WaitlistEntry) -> Result<WaitlistEntry, SchedulingError> {
        let mut rows = self.rows.write().await;
        rows.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<WaitlistEntry>, SchedulingError> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(&id)
            .filter(|e| e.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_active(
        &self,
        tenant_id: Uuid,
        clinic_id: Option<Uuid>,
    ) -> Result<Vec<WaitlistEntry>, SchedulingError> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|e| e.tenant_id == tenant_id && e.status == WaitlistStatus::Active)
            .filter(|e| clinic_id.is_none() || e.clinic_id == clinic_id)
            .cloned()
            .collect())
    }

    async fn save(&self, entry: WaitlistEntry) -> Result<WaitlistEntry, SchedulingError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&entry.id) {
            return Err(SchedulingError::WaitlistEntryNotFound(entry.id));
        }
        rows.insert(entry.id, entry.clone());
        Ok(entry)
    }
}

#[derive(Default)]
pub struct MemoryConflictStore {
    rows: RwLock<HashMap<Uuid, ConflictRecord>>,
}

impl MemoryConflictStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConflictStore for MemoryConflictStore {
    async fn create(&self, conflict: ConflictRecord) -> Result<ConflictRecord, SchedulingError> {
        let mut rows = self.rows.write().await;
        rows.insert(conflict.id, conflict.clone());
        Ok(conflict)
    }

    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ConflictRecord>, SchedulingError> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(&id)
            .filter(|c| c.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_by_status(
        &self,
        tenant_id: Uuid,
        status: ConflictStatus,
    ) -> Result<Vec<ConflictRecord>, SchedulingError> {
        let rows = self.rows.read().await;
        let mut hits: Vec<ConflictRecord> = rows
            .values()
            .filter(|c| c.tenant_id == tenant_id && c.status == status)
            .cloned()
            .collect();
        hits.sort_by_key(|c| c.detected_at);
        Ok(hits)
    }

    async fn save(&self, conflict: ConflictRecord) -> Result<ConflictRecord, SchedulingError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&conflict.id) {
            return Err(SchedulingError::ConflictNotFound(conflict.id));
        }
        rows.insert(conflict.id, conflict.clone());
        Ok(conflict)
    }
}
