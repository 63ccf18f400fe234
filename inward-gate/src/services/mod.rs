//! Inward register services
//!
//! Stores, fan-out and the dual-write path. HTTP handlers only translate
//! requests into these calls.

pub mod calculator;
pub mod entry_store;
pub mod fanout;
pub mod master_data;
pub mod mirror_client;
pub mod qc;
pub mod query;
pub mod seeding;
pub mod sessions;
pub mod synchronizer;

pub use entry_store::{EntryStore, QcChange};
pub use fanout::{FanOut, Subscription};
pub use master_data::{MasterData, NewUser};
pub use mirror_client::{HttpMirror, MirrorExportError, MirrorRow, MirrorSink};
pub use qc::QcAction;
pub use query::EntryFilter;
pub use seeding::{seed_on_first_snapshot, SeedReport};
pub use sessions::{Session, SessionRegistry};
pub use synchronizer::{Submission, Synchronizer};
