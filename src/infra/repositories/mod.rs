pub mod sqlite_event_repo;
pub mod sqlite_feedback_repo;
pub mod sqlite_guest_repo;

pub mod postgres_event_repo;
pub mod postgres_feedback_repo;
pub mod postgres_guest_repo;

/// Rows (or ids) per statement in batch writes; keeps bound parameters well
/// under SQLite's variable limit.
const BATCH_CHUNK_SIZE: usize = 500;
