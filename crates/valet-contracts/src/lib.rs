//! # valet-contracts
//!
//! Shared types, schemas, and contracts for the VALET orchestration engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and error types.

pub mod audit;
pub mod command;
pub mod device;
pub mod error;
pub mod execution;
pub mod llm;
pub mod plan;
pub mod session;
pub mod tool;
