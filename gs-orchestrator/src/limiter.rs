//! Bounded fan-out of independent async operations.

use std::future::Future;

use futures_util::future::join_all;
use tokio::sync::Mutex;

/// Concurrency used for resource creation unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Run `tasks` with at most `limit` in flight.
///
/// `min(limit, tasks.len())` workers pull from a shared cursor on the
/// current task, so nothing is spawned. Every outcome lands at its task's
/// original index and a failing task never stops its siblings. A `limit`
/// of zero is treated as one.
pub async fn run_bounded<T, E, F, Fut>(tasks: Vec<F>, limit: usize) -> Vec<Result<T, E>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let total = tasks.len();
    let workers = limit.max(1).min(total);

    let queue = Mutex::new(tasks.into_iter().enumerate());
    let slots: Mutex<Vec<Option<Result<T, E>>>> =
        Mutex::new(std::iter::repeat_with(|| None).take(total).collect());

    {
        let queue = &queue;
        let slots = &slots;
        join_all((0..workers).map(|_| async move {
            loop {
                let next = queue.lock().await.next();
                let Some((idx, task)) = next else {
                    break;
                };
                let outcome = task().await;
                slots.lock().await[idx] = Some(outcome);
            }
        }))
        .await;
    }

    slots.into_inner().into_iter().flatten().collect()
}
