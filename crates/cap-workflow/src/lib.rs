//! # cap-workflow
//!
//! Entry lifecycle for captrack: confirmation, manager review, reassignment
//! to enhancement projects, and the period-lock guard every write passes.
//!
//! All mutations go through [`WorkflowEngine`], which owns a [`cap_db::CapService`].

pub mod engine;
pub mod error;
pub mod guard;
pub mod inputs;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::WorkflowEngine;
pub use error::WorkflowError;
