//! Cache lifecycle worker
//!
//! The worker owns the three named stores and drives them through the
//! deployment lifecycle:
//!
//! 1. **install** — stage the shell set into the temp store with
//!    cache-bypassing fetches (`install`)
//! 2. **activate** — reconcile the durable content store against the new
//!    manifest, promote the staged shell, persist the snapshot (`reconcile`)
//! 3. **fetch** — answer intercepted requests cache-first with lazy fill,
//!    network-first for the entry page (`router`)
//! 4. **downloadOffline** — prefetch every tracked resource on demand
//!    (`prefetch`)
//!
//! Any fault during activation collapses all three stores to a clean
//! first-run state; correctness is preferred over a warm cache.

mod install;
mod prefetch;
mod reconcile;
mod router;

pub mod lifecycle;

pub use lifecycle::{CacheWorker, WorkerState};
pub use reconcile::ReconcileSummary;
pub use router::{RouteOutcome, ServeSource};

#[cfg(test)]
pub(crate) mod testing;
