//! Repository modules for captrack storage.
//!
//! Each module holds the SQL and row mapping for one table as free functions
//! over a `libsql::Connection` (shared by read paths and write transactions),
//! and adds read methods to `CapService` via `impl CapService` blocks.

pub mod entries;
pub mod period_locks;
pub mod projects;
pub mod revisions;
