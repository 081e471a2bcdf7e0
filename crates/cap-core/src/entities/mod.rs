//! Entity structs for all captrack domain objects.
//!
//! Each entity maps to a table in the libSQL database (see
//! `cap-db/migrations/001_initial.sql`). All structs derive `Serialize`,
//! `Deserialize`, and `JsonSchema` for JSON roundtrip and schema validation.

mod entry;
mod period_lock;
mod project;
mod revision;

pub use entry::Entry;
pub use period_lock::PeriodLock;
pub use project::Project;
pub use revision::{FieldChange, RevisionRecord};
