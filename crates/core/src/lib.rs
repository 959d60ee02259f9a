//! Culto Portal Core - Domain types and view-routing state machines.
//!
//! This crate holds everything the subscription portal knows about Culto
//! subscriptions that does not need the network:
//! - `types` - DTOs mirrored from the Culto API plus the rules derived from them
//! - `catalog` - Plans, quantities, grinds, pickup stores and address options
//! - `validation` - Customer data validators (email, phone, RUT, codes, cards)
//! - `format` - Spanish date rendering
//! - `flow` - The dashboard navigator, cancellation funnel and wizards
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clock reads. Anything time-dependent takes `today`/`now` as an
//! argument so transitions stay deterministic under test.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod flow;
pub mod format;
pub mod types;
pub mod validation;

pub use types::*;
