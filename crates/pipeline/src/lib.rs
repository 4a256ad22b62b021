//! Run orchestration and reconciliation.
//!
//! A pass has two phases that may run back to back or on separate
//! schedules:
//!
//! 1. **Collect**: generate a run id, query both providers for every
//!    station concurrently, persist whatever succeeded.
//! 2. **Calculate**: select unprocessed reading pairs, compute each
//!    concurrently, persist the successful results, then flag every
//!    attempted reading processed and every computed one successful.
//!
//! Both phases use [`fanout::fan_out`]: one task per unit, a lock-guarded
//! aggregate, and a wait-for-all barrier. A failing unit never stops its
//! siblings; the phase reports its first error next to the partial
//! results, and the caller carries on with those results.

pub mod calculation;
pub mod collector;
pub mod fanout;
pub mod orchestrator;

pub use calculation::CalculationWorker;
pub use collector::{CollectedReadings, PairingPolicy, RunCollector};
pub use fanout::{fan_out, PhaseOutcome, Sink};
pub use orchestrator::{
    log_calculation, log_run, CalculationReport, PassReport, Pipeline, PipelineConfig, RunReport,
};
