//! Synchronization between the authoritative server and predicting clients.
//!
//! - `ServerValidator`: serializes requests per match, replays, persists,
//!   broadcasts
//! - `ClientPredictor`: optimistic local copy with full-replacement
//!   reconciliation
//! - `MatchStore`, `Broadcaster`, `TimeSource`: seams to persistence,
//!   transport and time

pub mod client;
pub mod error;
pub mod protocol;
pub mod store;
pub mod transport;
pub mod validator;

pub use client::{ClientPredictor, PendingMove, Reconciliation, RejectionOutcome, RetryPolicy};
pub use error::SyncError;
pub use protocol::{ClientRequest, MatchUpdate, MatchView};
pub use store::{InMemoryMatchStore, MatchStore, StoreError};
pub use transport::{
    Broadcaster, ManualTimeSource, RecordingBroadcaster, SystemTimeSource, TimeSource,
};
pub use validator::ServerValidator;
