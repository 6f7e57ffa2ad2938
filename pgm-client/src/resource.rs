//! Fetch-state container for one remote collection.
//!
//! A [`Resource`] tracks `{data, loading, error}` for an async producer and
//! re-runs it whenever its dependency value changes. Every fetch is tagged
//! with a generation number; a result is applied only if no newer fetch was
//! issued in the meantime, so a slow response for an old selection can never
//! overwrite the state of the current one.

use std::future::Future;
use std::sync::Arc;

use common::errors::{AppError, AppResult};
use futures::future::BoxFuture;
use tokio::sync::RwLock;

type Producer<D, T> = Arc<dyn Fn(D) -> BoxFuture<'static, AppResult<T>> + Send + Sync>;

/// Observable state of a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    /// Result of the latest successful fetch.
    pub data: Option<T>,
    /// A fetch is in flight.
    pub loading: bool,
    /// Error of the latest fetch, if it failed.
    pub error: Option<AppError>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// Token identifying one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Fetch whose ticket is issued but whose producer has not run yet.
#[derive(Debug)]
pub struct Staged<D> {
    ticket: Ticket,
    deps: D,
}

impl<D> Staged<D> {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }
}

/// What happened to a fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The result was written to the state.
    Applied,
    /// A newer fetch was issued before this one completed; result dropped.
    Stale,
    /// Dependencies did not change; nothing was fetched.
    Unchanged,
    /// `refetch` was called before any dependencies were set.
    NotStarted,
}

struct Inner<D, T> {
    state: FetchState<T>,
    deps: Option<D>,
    generation: u64,
}

impl<D, T> Inner<D, T> {
    fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.state.loading = true;
        self.state.error = None;
        Ticket {
            generation: self.generation,
        }
    }
}

/// Generic fetch-state container keyed by a dependency value `D`.
pub struct Resource<D, T> {
    name: &'static str,
    producer: Producer<D, T>,
    inner: RwLock<Inner<D, T>>,
}

impl<D, T> Resource<D, T>
where
    D: PartialEq + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Creates an idle resource. Nothing is fetched until dependencies are set.
    pub fn new<F, Fut>(name: &'static str, producer: F) -> Self
    where
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        let producer: Producer<D, T> = Arc::new(move |deps| Box::pin(producer(deps)));
        Self {
            name,
            producer,
            inner: RwLock::new(Inner {
                state: FetchState::default(),
                deps: None,
                generation: 0,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current state.
    pub async fn snapshot(&self) -> FetchState<T> {
        self.inner.read().await.state.clone()
    }

    /// Data of the latest successful fetch.
    pub async fn data(&self) -> Option<T> {
        self.inner.read().await.state.data.clone()
    }

    /// Error of the latest fetch if it failed, its data otherwise.
    pub async fn result(&self) -> AppResult<Option<T>> {
        let inner = self.inner.read().await;
        match &inner.state.error {
            Some(err) => Err(err.clone()),
            None => Ok(inner.state.data.clone()),
        }
    }

    /// Dependencies the resource is currently keyed on.
    pub async fn deps(&self) -> Option<D> {
        self.inner.read().await.deps.clone()
    }

    /// Updates the dependencies, fetching if they changed by value.
    pub async fn set_deps(&self, deps: D) -> Outcome {
        let staged = self.stage(deps).await;
        self.run_staged(staged).await
    }

    /// Records new dependencies and issues their ticket without fetching.
    ///
    /// Returns `None` when the dependencies did not change. Tickets are
    /// ordered by the call to `stage`, not by when the fetch runs.
    pub async fn stage(&self, deps: D) -> Option<Staged<D>> {
        let mut inner = self.inner.write().await;
        if inner.deps.as_ref() == Some(&deps) {
            return None;
        }
        inner.deps = Some(deps.clone());
        Some(Staged {
            ticket: inner.begin(),
            deps,
        })
    }

    /// Runs a fetch prepared by [`Resource::stage`].
    pub async fn run_staged(&self, staged: Option<Staged<D>>) -> Outcome {
        match staged {
            Some(Staged { ticket, deps }) => self.run(ticket, deps).await,
            None => Outcome::Unchanged,
        }
    }

    /// Fetches again with the current dependencies.
    pub async fn refetch(&self) -> Outcome {
        let (ticket, deps) = {
            let mut inner = self.inner.write().await;
            let Some(deps) = inner.deps.clone() else {
                return Outcome::NotStarted;
            };
            (inner.begin(), deps)
        };
        self.run(ticket, deps).await
    }

    /// Marks a fetch as started and returns its ticket.
    ///
    /// For callers that drive their own future; pair with [`Resource::settle`].
    pub async fn issue(&self) -> Ticket {
        self.inner.write().await.begin()
    }

    /// Applies a result if `ticket` is still the latest one issued.
    pub async fn settle(&self, ticket: Ticket, result: AppResult<T>) -> Outcome {
        let mut inner = self.inner.write().await;
        if ticket.generation != inner.generation {
            tracing::warn!(
                resource = self.name,
                ticket = ticket.generation,
                latest = inner.generation,
                "discarding stale result"
            );
            return Outcome::Stale;
        }

        match result {
            Ok(data) => {
                inner.state.data = Some(data);
                inner.state.error = None;
            }
            Err(err) => {
                tracing::debug!(resource = self.name, error = %err, "fetch failed");
                inner.state.error = Some(err);
            }
        }
        inner.state.loading = false;
        Outcome::Applied
    }

    async fn run(&self, ticket: Ticket, deps: D) -> Outcome {
        let result = (self.producer)(deps).await;
        self.settle(ticket, result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn counting_resource() -> (Resource<u32, Vec<u32>>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let resource = Resource::new("numbers", move |n: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok((0..n).collect()) }
        });
        (resource, calls)
    }

    #[tokio::test]
    async fn test_set_deps_fetches_only_on_change() {
        let (resource, calls) = counting_resource();

        assert_eq!(resource.set_deps(3).await, Outcome::Applied);
        assert_eq!(resource.set_deps(3).await, Outcome::Unchanged);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let state = resource.snapshot().await;
        assert_eq!(state.data, Some(vec![0, 1, 2]));
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_refetch_reuses_current_deps() {
        let (resource, calls) = counting_resource();
        assert_eq!(resource.refetch().await, Outcome::NotStarted);

        resource.set_deps(2).await;
        assert_eq!(resource.refetch().await, Outcome::Applied);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resource.data().await, Some(vec![0, 1]));
    }

    #[tokio::test]
    async fn test_error_keeps_previous_data_and_clears_loading() {
        let fail = Arc::new(AtomicUsize::new(0));
        let flag = fail.clone();
        let resource = Resource::new("flaky", move |n: u32| {
            let failing = flag.load(Ordering::SeqCst) == 1;
            async move {
                if failing {
                    Err(AppError::Timeout(Duration::from_millis(30_000)))
                } else {
                    Ok(n)
                }
            }
        });

        resource.set_deps(7).await;
        fail.store(1, Ordering::SeqCst);
        assert_eq!(resource.refetch().await, Outcome::Applied);

        let state = resource.snapshot().await;
        assert_eq!(state.data, Some(7));
        assert!(!state.loading);
        assert_eq!(
            state.error.map(|e| e.user_message()).as_deref(),
            Some("Request timed out after 30000 ms")
        );

        fail.store(0, Ordering::SeqCst);
        resource.refetch().await;
        assert_eq!(resource.snapshot().await.error, None);
    }

    #[tokio::test]
    async fn test_late_result_of_older_ticket_is_discarded() {
        let resource: Resource<(), &'static str> =
            Resource::new("manual", |_| async { Ok("unused") });

        let first = resource.issue().await;
        let second = resource.issue().await;

        assert_eq!(resource.settle(second, Ok("second")).await, Outcome::Applied);
        assert_eq!(resource.settle(first, Ok("first")).await, Outcome::Stale);

        let state = resource.snapshot().await;
        assert_eq!(state.data, Some("second"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_early_result_of_older_ticket_keeps_loading() {
        let resource: Resource<(), u8> = Resource::new("manual", |_| async { Ok(0) });

        let first = resource.issue().await;
        let second = resource.issue().await;

        assert_eq!(resource.settle(first, Ok(1)).await, Outcome::Stale);
        let state = resource.snapshot().await;
        assert!(state.loading);
        assert_eq!(state.data, None);

        resource.settle(second, Ok(2)).await;
        assert_eq!(resource.data().await, Some(2));
    }

    #[tokio::test]
    async fn test_staging_order_decides_the_winner() {
        let resource = Resource::new("staged", |n: u32| async move { Ok(n) });

        let older = resource.stage(1).await;
        let newer = resource.stage(2).await;
        assert!(resource.stage(2).await.is_none());
        assert!(resource.snapshot().await.loading);

        assert_eq!(resource.run_staged(newer).await, Outcome::Applied);
        assert_eq!(resource.run_staged(older).await, Outcome::Stale);
        assert_eq!(resource.data().await, Some(2));
        assert_eq!(resource.deps().await, Some(2));
        assert_eq!(resource.run_staged(None).await, Outcome::Unchanged);
    }

    #[tokio::test]
    async fn test_overlapping_dependency_changes_resolve_to_latest() {
        type Gates = Arc<Mutex<HashMap<u32, oneshot::Receiver<String>>>>;
        let gates: Gates = Arc::new(Mutex::new(HashMap::new()));
        let (tx_old, rx_old) = oneshot::channel();
        let (tx_new, rx_new) = oneshot::channel();
        gates.lock().unwrap().insert(1, rx_old);
        gates.lock().unwrap().insert(2, rx_new);

        let producer_gates = gates.clone();
        let resource = Resource::new("gated", move |server: u32| {
            let gate = producer_gates.lock().unwrap().remove(&server);
            async move {
                match gate {
                    Some(rx) => rx.await.map_err(|e| AppError::Network(e.to_string())),
                    None => Err(AppError::Internal("no gate".into())),
                }
            }
        });

        let driver = async {
            tokio::task::yield_now().await;
            tx_new.send("containers of srv2".to_string()).unwrap();
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            tx_old.send("containers of srv1".to_string()).unwrap();
        };

        let (old, new, _) = tokio::join!(resource.set_deps(1), resource.set_deps(2), driver);

        assert_eq!(old, Outcome::Stale);
        assert_eq!(new, Outcome::Applied);
        let state = resource.snapshot().await;
        assert_eq!(state.data.as_deref(), Some("containers of srv2"));
        assert!(!state.loading);
        assert_eq!(resource.deps().await, Some(2));
    }
}
