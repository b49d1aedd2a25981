//! Memoizing construction for singleton implementations.
//!
//! Each implementation type owns one [`SingletonCell`]. The cell moves
//! through `Uninitialized -> Constructing -> Ready`, or back to `Failed`
//! when the constructor returns an error; a failed cell is retried on the
//! next resolution. `Ready` is final.

use std::any::TypeId;
use std::mem;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, trace};

use crate::error::{InjectorError, Result};
use crate::identity::TypeKey;
use crate::implementation::{Arguments, Implementation, Instance};
use crate::interfaces::container::Container;

#[derive(Default)]
enum CellState {
    #[default]
    Uninitialized,
    Constructing(ThreadId),
    Ready(Instance),
    Failed { attempts: usize },
}

#[derive(Default)]
pub(crate) struct SingletonCell {
    state: Mutex<CellState>,
    settled: Condvar,
}

impl SingletonCell {
    fn settle(&self, instance: Instance) {
        *self.state.lock() = CellState::Ready(instance);
        self.settled.notify_all();
    }

    fn is_ready(&self) -> bool {
        matches!(*self.state.lock(), CellState::Ready(_))
    }
}

/// Instances created so far, keyed by implementation type.
#[derive(Default)]
pub struct SingletonCache {
    cells: DashMap<TypeId, Arc<SingletonCell>>,
}

impl SingletonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an implementation so that it is constructed at most once.
    ///
    /// Wrapping the same implementation type twice yields proxies sharing
    /// one instance.
    pub fn wrap(&self, implementation: Implementation) -> SingletonProxy {
        let cell = self
            .cells
            .entry(implementation.type_id())
            .or_default()
            .value()
            .clone();
        SingletonProxy {
            implementation: Arc::new(implementation),
            cell,
        }
    }

    /// Wraps an already built instance. The instance replaces whatever the
    /// cache held for that implementation type, also for proxies wrapped
    /// earlier.
    pub(crate) fn wrap_ready(&self, implementation: Implementation, instance: Instance) -> SingletonProxy {
        let cell = self
            .cells
            .entry(implementation.type_id())
            .or_default()
            .value()
            .clone();
        cell.settle(instance);
        SingletonProxy {
            implementation: Arc::new(implementation),
            cell,
        }
    }

    /// Whether an instance of `I` has been constructed.
    pub fn is_constructed<I: ?Sized + 'static>(&self) -> bool {
        self.cells
            .get(&TypeId::of::<I>())
            .map(|cell| cell.is_ready())
            .unwrap_or(false)
    }

    /// Number of constructed instances.
    pub fn constructed_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_ready()).count()
    }
}

/// Stand-in for an implementation that memoizes its construction.
#[derive(Clone)]
pub struct SingletonProxy {
    implementation: Arc<Implementation>,
    cell: Arc<SingletonCell>,
}

impl SingletonProxy {
    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// Argument keys of the wrapped implementation.
    pub fn arguments(&self) -> &[TypeKey] {
        self.implementation.arguments()
    }

    /// Returns the cached instance, constructing it first if needed.
    ///
    /// Arguments are only resolved through `container` when construction
    /// actually happens. Requesting the same singleton again from inside its
    /// own construction fails with
    /// [`ReentrantConstruction`](InjectorError::ReentrantConstruction), but a
    /// cycle spread over two threads blocks both of them.
    pub fn resolve(&self, container: &dyn Container) -> Result<Instance> {
        let name = self.implementation.name();
        let current = thread::current().id();

        let mut state = self.cell.state.lock();
        let attempts = loop {
            match &*state {
                CellState::Ready(instance) => {
                    trace!(implementation = name, "singleton cache hit");
                    return Ok(instance.clone());
                }
                CellState::Constructing(owner) if *owner == current => {
                    return Err(InjectorError::ReentrantConstruction {
                        implementation: name,
                    });
                }
                CellState::Constructing(_) => self.cell.settled.wait(&mut state),
                CellState::Uninitialized => break 0,
                CellState::Failed { attempts } => break *attempts,
            }
        };
        *state = CellState::Constructing(current);
        drop(state);

        let mut construction = Construction {
            cell: &self.cell,
            next: CellState::Failed {
                attempts: attempts + 1,
            },
        };

        let mut arguments = Arguments::with_capacity(self.arguments().len());
        for key in self.arguments() {
            match container.resolve_key(key) {
                Ok(instance) => arguments.push(key.clone(), instance),
                Err(err) => {
                    construction.next = CellState::Uninitialized;
                    return Err(err);
                }
            }
        }

        match self.implementation.construct(&mut arguments) {
            Ok(instance) => {
                debug!(implementation = name, "created singleton instance");
                construction.next = CellState::Ready(instance.clone());
                Ok(instance)
            }
            Err(source) => {
                error!(
                    implementation = name,
                    arguments = ?arguments,
                    representation = ?self.implementation,
                    attempt = attempts + 1,
                    error = %source,
                    "cannot create instance of '{}'",
                    name
                );
                Err(InjectorError::Construction {
                    implementation: name,
                    source,
                })
            }
        }
    }
}

/// Publishes the outcome of a construction when dropped, including when the
/// constructor panics.
struct Construction<'a> {
    cell: &'a SingletonCell,
    next: CellState,
}

impl Drop for Construction<'_> {
    fn drop(&mut self) {
        let mut state = self.cell.state.lock();
        *state = mem::replace(&mut self.next, CellState::Uninitialized);
        self.cell.settled.notify_all();
    }
}
