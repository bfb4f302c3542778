//! vigil-health — the periodic probe pipeline.
//!
//! A [`Scheduler`] ticks at a fixed interval, snapshots the [`Registry`],
//! and feeds every target into a fixed-size [`WorkerPool`]. Workers run the
//! [`Prober`] (one HTTP GET with a timeout) and publish results, which the
//! scheduler writes back into the registry.
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   ├── tick loop ──► Registry::list() ──► batch task ──► WorkerPool::submit
//!   ├── WorkerPool
//!   │   ├── shared job queue (bounded mpsc)
//!   │   └── N workers ──► Prober::run(target, timeout) ──► results
//!   └── drain loop ◄── results ──► Registry::upsert()
//! ```
//!
//! Probe failures never propagate: they are recorded on the target as
//! `status = "Error"`, `code = 0`, and an error message. The pipeline only
//! stops through [`Scheduler::stop`].
//!
//! [`Registry`]: vigil_registry::Registry

pub mod error;
pub mod pool;
pub mod prober;
pub mod scheduler;

pub use error::{HealthError, HealthResult};
pub use pool::{PoolConfig, Submitter, WorkerPool};
pub use prober::Prober;
pub use scheduler::{
    DEFAULT_CHECK_INTERVAL, MIN_CHECK_INTERVAL, Scheduler, SchedulerConfig, SchedulerState,
};
