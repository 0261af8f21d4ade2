//! Use-case services for channel owners.
//!
//! # Responsibility
//! - Contribute the add-channel actions to owner capabilities.
//! - Supply purpose choice lists.
//!
//! # Invariants
//! - Services never bypass repository validation/persistence contracts.
//! - All dependencies are passed explicitly; no ambient lookup.

pub mod channel_actions;
pub mod purpose_service;
