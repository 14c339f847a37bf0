//! UI-facing event delivery.
//!
//! # Responsibility
//! - Provide a lifecycle-aware observable value (`LiveValue`).
//! - Provide single-fire events on top of it (`SingleFireEvent`), used for
//!   one-shot UI signals such as navigation and transient notices.
//!
//! # Invariants
//! - Observer callbacks run on the thread that publishes or dispatches.
//! - A single-fire publication is delivered at most once.

pub mod live_value;
pub mod single_fire;
