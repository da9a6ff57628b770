pub mod conflict;
pub mod recurrence;
pub mod resolution;
pub mod waitlist;

pub use conflict::ConflictDetectionService;
pub use recurrence::RecurrenceExpansionService;
pub use resolution::ConflictResolutionService;
pub use waitlist::WaitlistService;
