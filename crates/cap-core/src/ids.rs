//! ID prefix constants.
//!
//! IDs are `{prefix}-{8 hex chars}`, generated by the database
//! (see `CapDb::generate_id`).

pub const PREFIX_ENTRY: &str = "ent";
pub const PREFIX_PROJECT: &str = "prj";
pub const PREFIX_REVISION: &str = "rev";

pub const ALL_PREFIXES: &[&str] = &[PREFIX_ENTRY, PREFIX_PROJECT, PREFIX_REVISION];
