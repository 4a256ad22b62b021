//! Per-pair derived temperature computation.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use calculator::Calculator;
use weather_common::{generate_id, CorrelatedPair, DerivedResult, PipelineResult};

use crate::fanout::{fan_out, PhaseOutcome};

/// Runs the calculator over unprocessed pairs, one task per pair.
#[derive(Clone)]
pub struct CalculationWorker {
    calculator: Arc<dyn Calculator>,
    max_concurrency: Option<usize>,
}

impl CalculationWorker {
    pub fn new(calculator: Arc<dyn Calculator>, max_concurrency: Option<usize>) -> Self {
        Self {
            calculator,
            max_concurrency,
        }
    }

    /// Label the results of this worker carry.
    pub fn method(&self) -> &str {
        self.calculator.method()
    }

    /// Compute every pair and aggregate the successful results.
    #[instrument(skip(self, pairs), fields(pairs = pairs.len(), method = %self.calculator.method()))]
    pub async fn compute(&self, pairs: Vec<CorrelatedPair>) -> PhaseOutcome<Vec<DerivedResult>> {
        let calculator = Arc::clone(&self.calculator);

        let outcome = fan_out(pairs, self.max_concurrency, move |pair, sink| {
            let calculator = Arc::clone(&calculator);
            async move {
                match compute_pair(calculator.as_ref(), &pair).await {
                    Ok(result) => sink.push(|out: &mut Vec<DerivedResult>| out.push(result)).await,
                    Err(err) => {
                        warn!(
                            pair = %pair.label(),
                            station = %pair.station_id,
                            error = %err,
                            "Computation failed"
                        );
                        sink.fail(err).await;
                    }
                }
            }
        })
        .await;

        info!(
            results = outcome.output.len(),
            failures = outcome.failures,
            "Calculation finished"
        );
        outcome
    }
}

async fn compute_pair(
    calculator: &dyn Calculator,
    pair: &CorrelatedPair,
) -> PipelineResult<DerivedResult> {
    let outputs = calculator
        .calculate(pair.inputs())
        .await
        .map_err(|e| e.into_pipeline(pair.label()))?;

    let result_id = generate_id()?;
    Ok(DerivedResult::from_pair(
        result_id,
        pair,
        calculator.method(),
        outputs,
    ))
}
