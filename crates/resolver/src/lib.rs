//! # Memshard Resolver
//!
//! The anchor-resolution and health-scoring engine behind memshard.
//!
//! Given a previously captured text span and a possibly-changed file body,
//! this crate relocates the span ([`locate`]), quantifies how far the code
//! underneath has drifted ([`similarity`]), and drives the decay/expiry
//! lifecycle from that quantification ([`LifecycleEngine`]). Resolution
//! produces the text that scoring consumes, and the score is the sole
//! driver of lifecycle transitions.

mod function_anchor;
mod lifecycle;
mod locator;
mod similarity;

pub use function_anchor::detect_function_name;
pub use lifecycle::{
    state_for_score, Disposition, HealthState, LifecycleEngine, Observation,
    DEFAULT_MAX_STALE_VIEWS, HEALTHY_THRESHOLD, STALE_THRESHOLD,
};
pub use locator::{locate, LocateError, ResolvedSpan, MIN_ANCHOR_SCORE, WINDOW_TOLERANCE};
pub use similarity::similarity;
