// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE BOOKING MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub room_id: Option<Uuid>,
    pub appointment_type: AppointmentType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub master_booking_id: Option<Uuid>,
    pub cancellation_reason: Option<String>,
    pub notes: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Whether this booking still holds its provider/room/patient slot.
    /// Cancelled and no-show bookings release their resources.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self.status, BookingStatus::Cancelled | BookingStatus::NoShow)
            && self.deleted_at.is_none()
    }

    /// Half-open interval overlap: [start, end) windows touch iff
    /// self.start < other.end AND other.start < self.end.
    pub fn overlaps(&self, other: &Booking) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Scheduled,
    Confirmed,
    CheckedIn,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Scheduled => write!(f, "scheduled"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::CheckedIn => write!(f, "checked_in"),
            BookingStatus::InProgress => write!(f, "in_progress"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
            BookingStatus::NoShow => write!(f, "no_show"),
        }
    }
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }

    /// Valid next statuses for the booking lifecycle.
    pub fn valid_transitions(&self) -> Vec<BookingStatus> {
        match self {
            BookingStatus::Scheduled => vec![
                BookingStatus::Confirmed,
                BookingStatus::Cancelled,
                BookingStatus::NoShow,
            ],
            BookingStatus::Confirmed => vec![
                BookingStatus::CheckedIn,
                BookingStatus::Cancelled,
                BookingStatus::NoShow,
            ],
            BookingStatus::CheckedIn => vec![
                BookingStatus::InProgress,
                BookingStatus::Cancelled,
            ],
            BookingStatus::InProgress => vec![BookingStatus::Completed],
            // Terminal states
            BookingStatus::Completed => vec![],
            BookingStatus::Cancelled => vec![],
            BookingStatus::NoShow => vec![],
        }
    }

    pub fn can_transition_to(&self, target: &BookingStatus) -> bool {
        self.valid_transitions().contains(target)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    InitialConsultation,
    FollowUp,
    Procedure,
    Vaccination,
    HealthScreening,
    Urgent,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::InitialConsultation => write!(f, "initial_consultation"),
            AppointmentType::FollowUp => write!(f, "follow_up"),
            AppointmentType::Procedure => write!(f, "procedure"),
            AppointmentType::Vaccination => write!(f, "vaccination"),
            AppointmentType::HealthScreening => write!(f, "health_screening"),
            AppointmentType::Urgent => write!(f, "urgent"),
        }
    }
}

// ==============================================================================
// RECURRENCE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrencePattern {
    pub id: Uuid,
    /// Master booking owning this pattern (1:1).
    pub booking_id: Uuid,
    pub frequency: RecurrenceFrequency,
    pub interval_value: u32,
    pub end_mode: RecurrenceEndMode,
    pub recurrence_count: Option<u32>,
    pub end_date: Option<NaiveDate>,
    /// Selector sets. Empty set = no restriction on that dimension.
    pub days_of_week: Vec<Weekday>,
    pub days_of_month: Vec<u32>,
    pub months_of_year: Vec<u32>,
    pub is_active: bool,
    pub last_expanded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceEndMode {
    Never,
    AfterCount,
    OnDate,
}

impl RecurrencePattern {
    /// Fail-fast configuration check, run before any expansion side effect.
    pub fn validate(&self) -> Result<(), String> {
        if self.interval_value < 1 {
            return Err("interval_value must be at least 1".to_string());
        }
        match self.end_mode {
            RecurrenceEndMode::AfterCount => match self.recurrence_count {
                Some(count) if count >= 1 => {}
                Some(_) => return Err("recurrence_count must be at least 1".to_string()),
                None => {
                    return Err("end_mode after_count requires recurrence_count".to_string())
                }
            },
            RecurrenceEndMode::OnDate => {
                if self.end_date.is_none() {
                    return Err("end_mode on_date requires end_date".to_string());
                }
            }
            RecurrenceEndMode::Never => {}
        }
        Ok(())
    }

    /// Whether `date` passes the day-of-week / day-of-month / month-of-year
    /// selector sets. An empty set places no restriction.
    pub fn matches_selectors(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;

        if !self.days_of_week.is_empty() && !self.days_of_week.contains(&date.weekday()) {
            return false;
        }
        if !self.days_of_month.is_empty() && !self.days_of_month.contains(&date.day()) {
            return false;
        }
        if !self.months_of_year.is_empty() && !self.months_of_year.contains(&date.month()) {
            return false;
        }
        true
    }
}

// ==============================================================================
// WAITLIST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub clinic_id: Option<Uuid>,
    pub patient_id: Uuid,
    pub requested_by: Uuid,
    pub appointment_type: AppointmentType,
    pub duration_minutes: i32,
    pub preferred_provider_id: Option<Uuid>,
    pub preferred_window_start: Option<DateTime<Utc>>,
    pub preferred_window_end: Option<DateTime<Utc>>,
    /// Ordinal priority, higher = more urgent.
    pub priority_level: i32,
    /// Tie-break above priority_level within the same level.
    pub is_urgent: bool,
    pub contact_method: ContactMethod,
    pub status: WaitlistStatus,
    pub expires_at: DateTime<Utc>,
    /// Set exactly once, when the entry is promoted.
    pub booking_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WaitlistEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WaitlistStatus {
    Active,
    Contacted,
    Scheduled,
    Cancelled,
    Expired,
}

impl fmt::Display for WaitlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitlistStatus::Active => write!(f, "active"),
            WaitlistStatus::Contacted => write!(f, "contacted"),
            WaitlistStatus::Scheduled => write!(f, "scheduled"),
            WaitlistStatus::Cancelled => write!(f, "cancelled"),
            WaitlistStatus::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethod {
    Phone,
    Email,
    Sms,
}

// ==============================================================================
// CONFLICT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub primary_booking_id: Uuid,
    pub conflicting_booking_id: Uuid,
    pub kind: ConflictKind,
    pub description: String,
    pub detail: ConflictDetail,
    pub status: ConflictStatus,
    pub resolution_notes: Option<String>,
    pub resolved_by: Option<Uuid>,
    pub detected_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ConflictRecord {
    pub fn severity(&self) -> u8 {
        self.kind.severity()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    ProviderDoubleBooking,
    PatientDoubleBooking,
    RoomDoubleBooking,
}

impl ConflictKind {
    /// Fixed severity map, 1-5. Double-booking a care-giver costs more
    /// operationally than double-booking a room.
    pub fn severity(&self) -> u8 {
        match self {
            ConflictKind::ProviderDoubleBooking => 4,
            ConflictKind::PatientDoubleBooking => 3,
            ConflictKind::RoomDoubleBooking => 2,
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::ProviderDoubleBooking => write!(f, "provider_double_booking"),
            ConflictKind::PatientDoubleBooking => write!(f, "patient_double_booking"),
            ConflictKind::RoomDoubleBooking => write!(f, "room_double_booking"),
        }
    }
}

/// Structured payload carried by every conflict: the overlapping window and
/// the resource both bookings claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictDetail {
    pub overlap_start: DateTime<Utc>,
    pub overlap_end: DateTime<Utc>,
    pub resource_id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Detected,
    Resolved,
    Ignored,
    Escalated,
}

impl fmt::Display for ConflictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictStatus::Detected => write!(f, "detected"),
            ConflictStatus::Resolved => write!(f, "resolved"),
            ConflictStatus::Ignored => write!(f, "ignored"),
            ConflictStatus::Escalated => write!(f, "escalated"),
        }
    }
}

impl ConflictStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConflictStatus::Detected)
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWaitlistEntryRequest {
    pub tenant_id: Uuid,
    pub clinic_id: Option<Uuid>,
    pub patient_id: Uuid,
    pub requested_by: Uuid,
    pub appointment_type: AppointmentType,
    pub duration_minutes: i32,
    pub preferred_provider_id: Option<Uuid>,
    pub preferred_window_start: Option<DateTime<Utc>>,
    pub preferred_window_end: Option<DateTime<Utc>>,
    pub priority_level: i32,
    pub is_urgent: bool,
    pub contact_method: ContactMethod,
    pub notes: Option<String>,
}

/// A concrete slot chosen for a waitlist promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub provider_id: Uuid,
    pub room_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConflictRequest {
    pub action: ResolutionAction,
    pub new_start_time: Option<DateTime<Utc>>,
    pub new_end_time: Option<DateTime<Utc>>,
    pub new_room_id: Option<Uuid>,
    pub resolved_by: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionAction {
    ReschedulePrimary,
    RescheduleConflicting,
    CancelPrimary,
    CancelConflicting,
    Ignore,
    Escalate,
}

impl fmt::Display for ResolutionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionAction::ReschedulePrimary => write!(f, "reschedule_primary"),
            ResolutionAction::RescheduleConflicting => write!(f, "reschedule_conflicting"),
            ResolutionAction::CancelPrimary => write!(f, "cancel_primary"),
            ResolutionAction::CancelConflicting => write!(f, "cancel_conflicting"),
            ResolutionAction::Ignore => write!(f, "ignore"),
            ResolutionAction::Escalate => write!(f, "escalate"),
        }
    }
}

/// Outcome of a waitlist promotion. The booking commits even when conflicts
/// are found; conflicts surface here as data for manual resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionOutcome {
    pub booking: Booking,
    pub conflicts: Vec<ConflictRecord>,
    pub entry: WaitlistEntry,
}

// ==============================================================================
// SCHEDULING RULES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct SchedulingRules {
    /// Hard ceiling on occurrences generated by a single expansion pass.
    pub max_occurrences_per_expansion: u32,
    /// How long a waitlist entry stays live before lazy expiry.
    pub waitlist_expiry_days: i64,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            max_occurrences_per_expansion: 100,
            waitlist_expiry_days: 90,
        }
    }
}
