//! # sift-contracts
//!
//! Shared types, events, and error contracts for the sift research pipeline.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and the error type.

pub mod credibility;
pub mod error;
pub mod event;
pub mod generation;
pub mod plan;
pub mod run;
pub mod source;
pub mod stage;
