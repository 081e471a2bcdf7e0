//! # cap-core
//!
//! Core types, approval policy, and error types for captrack.
//!
//! This crate provides the foundational types shared across all captrack crates:
//! - Entity structs for entries, projects, revisions, and period locks
//! - Status enums with the entry state machine
//! - Accounting period resolution
//! - Pure approval-routing policy functions
//! - ID prefix constants
//! - The domain error taxonomy
//! - Actor identity and bulk operation response types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod period;
pub mod policy;
pub mod responses;
