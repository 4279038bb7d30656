// src/cache/mod.rs

use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::Result;

type InFlight<T> = Shared<BoxFuture<'static, Result<Arc<T>>>>;

enum GateState<T> {
    Empty,
    Loading { generation: u64, fut: InFlight<T> },
    Ready(Arc<T>),
}

/// Single-flight, load-once cell.
///
/// The first caller starts the load; everyone who arrives while it is in flight
/// awaits the same future. A success is kept for the lifetime of the gate, a
/// failure is handed to every waiter and the gate goes back to empty.
pub struct LoadGate<T> {
    name: String,
    state: Mutex<GateState<T>>,
    generations: AtomicU64,
}

impl<T: Send + Sync + 'static> LoadGate<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(GateState::Empty),
            generations: AtomicU64::new(0),
        }
    }

    /// `Some` once a load has succeeded.
    pub fn peek(&self) -> Option<Arc<T>> {
        match &*self.lock() {
            GateState::Ready(v) => Some(Arc::clone(v)),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(&*self.lock(), GateState::Loading { .. })
    }

    /// Return the cached value, joining or starting the load as needed.
    /// `load` is only invoked when no value is cached and nothing is in flight.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (generation, fut) = {
            let mut state = self.lock();
            match &*state {
                GateState::Ready(v) => return Ok(Arc::clone(v)),
                GateState::Loading { generation, fut } => {
                    debug!(gate = %self.name, "joining in-flight load");
                    (*generation, fut.clone())
                }
                GateState::Empty => {
                    let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
                    info!(gate = %self.name, generation, "starting load");
                    let fut = load().map(|r| r.map(Arc::new)).boxed().shared();
                    *state = GateState::Loading {
                        generation,
                        fut: fut.clone(),
                    };
                    (generation, fut)
                }
            }
        };

        let outcome = fut.await;
        self.settle(generation, &outcome);
        outcome
    }

    // Only the load that is still current may move the gate on, so a waiter
    // from an older failed attempt cannot clobber a newer one.
    fn settle(&self, generation: u64, outcome: &Result<Arc<T>>) {
        let mut state = self.lock();
        let current = matches!(
            &*state,
            GateState::Loading { generation: g, .. } if *g == generation
        );
        if !current {
            return;
        }
        match outcome {
            Ok(v) => {
                debug!(gate = %self.name, generation, "load ready");
                *state = GateState::Ready(Arc::clone(v));
            }
            Err(e) => {
                warn!(gate = %self.name, generation, error = %e, "load failed; gate reset");
                *state = GateState::Empty;
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState<T>> {
        // state is only ever replaced wholesale, so a poisoned guard is still consistent
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T> std::fmt::Debug for LoadGate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadGate").field("name", &self.name).finish()
    }
}
