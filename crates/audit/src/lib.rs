//! `malldir-audit`: audit trail for every directory action.
//!
//! Each action is traced locally first, then appended to the store's log
//! collection on a best-effort basis: a failed append is reported and dropped,
//! never surfaced to the caller whose action triggered it.

pub mod actor;
pub mod entry;
pub mod logger;

pub use actor::{ANONYMOUS, ActorContext, ActorWriter, actor_context};
pub use entry::{LogContext, LogEntry, LogLevel};
pub use logger::{AuditLogger, DEFAULT_LOG_COLLECTION};
