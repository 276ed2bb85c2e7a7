//! AccessGate Session - Per-user conversation memory.
//!
//! A session is keyed by the requester's email and holds every turn the
//! pipeline has answered for that user. The transcript and any intents still
//! waiting on clarification are fed back into the next extraction, which is
//! how a follow-up like "the #general one" resolves.
//!
//! Sessions expire after an idle timeout; expiry is checked lazily on access.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod store;

pub use store::{Session, SessionStore, Turn};
