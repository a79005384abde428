use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::http::dispatcher::Dispatcher;
use crate::plan::model::WorkUnit;
use crate::results::Record;

/// Dispatch every unit with at most `max_parallel` requests in flight.
///
/// `None` spawns one task per unit without throttling. The returned records
/// are in the same order as `units`, regardless of completion order.
///
/// A failing or panicking dispatch only affects its own record. Once `cancel`
/// fires no further units are started; requests already in flight run to
/// completion under the client's own timeout, and units never attempted come
/// back with the `canceled` status.
pub async fn run(
    units: Vec<WorkUnit>,
    dispatcher: Arc<dyn Dispatcher>,
    max_parallel: Option<usize>,
    cancel: CancellationToken,
) -> Vec<Record> {
    let semaphore = max_parallel.map(|n| Arc::new(Semaphore::new(n.max(1))));
    let mut records: Vec<Record> = units.iter().map(Record::canceled).collect();
    let mut join_set: JoinSet<(usize, Record)> = JoinSet::new();

    tracing::info!(
        units = units.len(),
        max_parallel = ?max_parallel,
        "Dispatching work units"
    );

    for (idx, unit) in units.into_iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }

        // Acquire before spawning so a waiting unit never counts as in flight.
        let permit = match &semaphore {
            Some(sem) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    permit = Arc::clone(sem).acquire_owned() => match permit {
                        Ok(p) => Some(p),
                        Err(_) => break,
                    },
                }
            }
            None => None,
        };

        let dispatcher = Arc::clone(&dispatcher);
        let cancel = cancel.clone();

        join_set.spawn(async move {
            let outcome = AssertUnwindSafe(dispatcher.dispatch(&unit, &cancel))
                .catch_unwind()
                .await;
            drop(permit);

            let record = match outcome {
                Ok(record) => record,
                Err(panic) => {
                    let mut record = Record::for_unit(&unit);
                    record.status = format!("dispatch panicked: {}", panic_message(&*panic));
                    record
                }
            };
            (idx, record)
        });
    }

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((idx, record)) => records[idx] = record,
            Err(e) => tracing::error!("Dispatch task failed to join: {e}"),
        }
    }

    if cancel.is_cancelled() {
        let skipped = records
            .iter()
            .filter(|r| r.status == crate::results::CANCELED_STATUS)
            .count();
        tracing::info!(skipped, "Benchmark cancelled");
    }

    records
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
