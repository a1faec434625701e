//! `checkpoint` - Border-checkpoint crossing registry
//!
//! This library records border crossings of persons and vehicles, links
//! passengers to drivers, and screens every recorded or prospective identity
//! against wanted and watch reference lists with tolerant multi-tier name
//! matching.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod screening;
pub mod storage;
pub mod workflow;

pub use config::Config;
pub use error::{Error, Result};
pub use filter::{FilterSink, LogFilter, SearchCoordinator};
pub use logging::init_logging;
pub use model::{Crossing, CrossingDraft, Identity, WantedEntry, WatchEntry};
pub use screening::{evaluate, MatchDecision};
pub use storage::{CrossingStore, Storage};
pub use workflow::{DecisionChannel, EntryWorkflow, SubmitOutcome, WorkflowState};
