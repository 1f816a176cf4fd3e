//! Barrido: resumable hyperparameter grid sweeps
//!
//! Exhaustively sweeps the hyperparameter grid of a sequential event-log
//! classifier, records one validation AUC per combination, and persists
//! results after every single combination so an interrupted sweep resumes
//! where it left off.
//!
//! # Architecture
//!
//! - **`search`**: the fixed axis set and its deterministic Cartesian
//!   enumeration
//! - **`store`**: the durable CSV result store (the resume contract)
//! - **`sweep`**: the controller tying enumeration, resume filtering,
//!   training, evaluation, and flushing together
//! - **`data`** / **`train`** / **`eval`**: the preprocessing, training, and
//!   evaluation collaborators behind narrow interfaces, with working default
//!   implementations
//! - **`model`**: the default trained artifact (reservoir stack + logistic
//!   readout)
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use barrido::data::EncodedLogPreparer;
//! use barrido::sweep::{SweepConfig, SweepIdentity, SweepRunner};
//! use barrido::train::EsnTrainer;
//!
//! # fn main() -> Result<(), barrido::sweep::SweepError> {
//! let identity = SweepIdentity {
//!     dataset: PathBuf::from("datasets/lending_log_high.json"),
//!     log_type: "lending".to_string(),
//!     addendum: "high".to_string(),
//! };
//! let config = SweepConfig::new(identity, 6, PathBuf::from("results"));
//!
//! let mut runner = SweepRunner::new(EsnTrainer::new(42), EncodedLogPreparer, config);
//! let records = runner.run()?;
//! println!("{} combinations recorded", records.len());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod eval;
pub mod model;
pub mod search;
pub mod store;
pub mod sweep;
pub mod train;

pub use eval::Device;
pub use search::{Combination, SweepGrid};
pub use store::{ResultRecord, ResultStore};
pub use sweep::{SweepConfig, SweepError, SweepIdentity, SweepRunner};
