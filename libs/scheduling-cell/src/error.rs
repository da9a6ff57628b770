use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum SchedulingError {
    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("Waitlist entry not found: {0}")]
    WaitlistEntryNotFound(Uuid),

    #[error("Conflict record not found: {0}")]
    ConflictNotFound(Uuid),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid recurrence pattern: {0}")]
    InvalidPattern(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),
}
