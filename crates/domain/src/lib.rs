//! # dobby-domain
//!
//! Pure domain model for the dobby automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, wall-clock helpers
//! - Define **device values** (the closed set of values a device property can hold)
//! - Define **Events** (partial device-state deltas delivered by the device bus)
//! - Define **Automations** (trigger → condition → action rules)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod device;
pub mod event;
