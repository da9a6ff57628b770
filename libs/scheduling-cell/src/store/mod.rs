// libs/scheduling-cell/src/store/mod.rs
//
// Narrow collaborator interfaces the scheduling core depends on. All durable
// state lives behind these traits; the services themselves are stateless
// between calls.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{Booking, ConflictRecord, ConflictStatus, WaitlistEntry};

pub use memory::{MemoryBookingStore, MemoryConflictStore, MemoryWaitlistStore};

/// Resource axis for an overlap scan. Tagged so the detector's three scans
/// stay uniform and exhaustively matchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapAxis {
    Provider(Uuid),
    Patient(Uuid),
    Room(Uuid),
}

impl OverlapAxis {
    pub fn resource_id(&self) -> Uuid {
        match self {
            OverlapAxis::Provider(id) | OverlapAxis::Patient(id) | OverlapAxis::Room(id) => *id,
        }
    }
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, booking: Booking) -> Result<Booking, SchedulingError>;

    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Booking>, SchedulingError>;

    /// Bookings in the tenant sharing the axis resource whose [start, end)
    /// interval overlaps the given window. Soft-deleted rows are never
    /// returned; status filtering is the caller's concern.
    async fn find_overlapping(
        &self,
        tenant_id: Uuid,
        axis: OverlapAxis,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Booking>, SchedulingError>;

    async fn save(&self, booking: Booking) -> Result<Booking, SchedulingError>;

    /// Soft retirement: the row keeps its history and drops out of scans.
    async fn soft_delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), SchedulingError>;
}

#[async_trait]
pub trait WaitlistStore: Send + Sync {
    async fn create(&self, entry: WaitlistEntry) -> Result<WaitlistEntry, SchedulingError>;

    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<WaitlistEntry>, SchedulingError>;

    /// Unordered snapshot of active entries; the waitlist service applies
    /// the priority sort and lazy expiry filter.
    async fn list_active(
        &self,
        tenant_id: Uuid,
        clinic_id: Option<Uuid>,
    ) -> Result<Vec<WaitlistEntry>, SchedulingError>;

    async fn save(&self, entry: WaitlistEntry) -> Result<WaitlistEntry, SchedulingError>;
}

#[async_trait]
pub trait ConflictStore: Send + Sync {
    async fn create(&self, conflict: ConflictRecord) -> Result<ConflictRecord, SchedulingError>;

    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ConflictRecord>, SchedulingError>;

    async fn find_by_status(
        &self,
        tenant_id: Uuid,
        status: ConflictStatus,
    ) -> Result<Vec<ConflictRecord>, SchedulingError>;

    async fn save(&self, conflict: ConflictRecord) -> Result<ConflictRecord, SchedulingError>;
}
