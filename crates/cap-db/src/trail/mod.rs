//! JSONL revision trail.
//!
//! Every committed revision is mirrored to `{trail_dir}/{YYYY-MM}.jsonl`, one
//! file per accounting period, so a locked period's history can be archived
//! as a single append-only file.

pub mod writer;
