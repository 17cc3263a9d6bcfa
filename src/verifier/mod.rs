//! The `verifier` module suppresses duplicate deliveries from an
//! at-least-once broker by remembering recently seen message ids.

pub mod window;

pub use window::WindowedVerifier;

/// Dedup filter keyed by message id.
pub trait MessageIdempotentVerifier: Send + Sync {
    /// Returns `true` and records `id` the first time it is seen, `false`
    /// for every later call with the same id while it is remembered.
    fn verify(&self, id: &str) -> bool;
}
