//! Server-side recompute of many form submissions at once.

use crate::calculator::FormulaCalculator;
use crate::context::FormulaContext;
use crate::error::Error;
use crate::form::{recalculate, CalculatedField, RecalcReport};
use std::sync::{mpsc, Arc};
use threadpool::ThreadPool;

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// The submission's context with calculated fields written back.
    pub context: FormulaContext,
    pub report: RecalcReport,
}

/// Recalculate `fields` for every context in parallel.
///
/// Each job works on its own clone of `calc` (registered functions included), so no
/// state crosses submissions. `workers == 0` uses one worker per CPU. Outcomes are
/// returned in input order.
pub fn recompute_batch(
    calc: &FormulaCalculator,
    fields: &[CalculatedField],
    contexts: Vec<FormulaContext>,
    workers: usize,
) -> Result<Vec<BatchOutcome>, Error> {
    let total = contexts.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    let workers = if workers == 0 { num_cpus::get() } else { workers }.clamp(1, total);
    tracing::info!(submissions = total, workers, "starting batch recompute");

    let pool = ThreadPool::new(workers);
    let fields = Arc::new(fields.to_vec());
    let (tx, rx) = mpsc::channel();

    for (index, context) in contexts.into_iter().enumerate() {
        let tx = tx.clone();
        let fields = Arc::clone(&fields);
        let mut local = calc.clone();
        pool.execute(move || {
            local.set_context(context);
            let report = recalculate(&mut local, &fields);
            let outcome = BatchOutcome { context: local.into_context(), report };
            // Receiver only disappears if the caller is gone
            let _ = tx.send((index, outcome));
        });
    }
    drop(tx);

    let mut slots: Vec<Option<BatchOutcome>> = (0..total).map(|_| None).collect();
    for (index, outcome) in rx.iter() {
        slots[index] = Some(outcome);
    }

    // A job that panicked never sends, so its slot stays empty
    let outcomes: Vec<BatchOutcome> = slots.into_iter().flatten().collect();
    if outcomes.len() != total {
        let missing = total - outcomes.len();
        tracing::warn!(missing, panicked = pool.panic_count(), "batch recompute jobs failed");
        return Err(Error::Batch(format!("{} of {} submissions returned no result", missing, total)));
    }
    tracing::info!(submissions = total, "batch recompute finished");
    Ok(outcomes)
}
