//! # sift-core
//!
//! The deadline-bounded execution core of the sift research pipeline.
//!
//! This crate provides:
//! - The collaborator traits (`TextGenerator`, `SearchProvider`, `EventSink`,
//!   `TextClassifier`)
//! - `StageBudgetScheduler`, which races each stage against its deadline slice
//! - `ResultCache`, the bounded TTL cache shared by retrieval and validation
//! - `BoundedExecutor`, the FIFO bounded-concurrency task runner
//! - `TokenAccountant` and `CancellationToken`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sift_core::{Deadline, StageBudgetScheduler, CancellationToken};
//!
//! let report = StageBudgetScheduler::new()
//!     .run(stage, &deadline, budget, &cancel, |token| primary(token), fallback)
//!     .await?;
//! ```

pub mod cache;
pub mod cancel;
pub mod executor;
pub mod scheduler;
pub mod tokens;
pub mod traits;

pub use cache::{cache_key, ResultCache, SharedCache};
pub use cancel::CancellationToken;
pub use executor::{BoundedExecutor, TaskHandle};
pub use scheduler::{Deadline, StageBudgetScheduler, StageReport};
pub use tokens::TokenAccountant;
