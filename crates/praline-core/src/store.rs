//! Reactive state store
//!
//! A [`Store`] owns every state cell of one application (or one test). Each
//! cell holds a value and an ordered set of dependents that are re-run
//! synchronously whenever the cell is written.
//!
//! # Re-entrancy
//!
//! Dependents run with no store borrow held, so they may read, write and
//! (un)subscribe freely. Writing a cell snapshots its dependents first:
//! dependents added during propagation are not run for that write, and
//! dependents removed during propagation still run once.
//!
//! Propagation is plain recursion. Two dependents that keep writing each
//! other's cells never terminate; avoiding such cycles is the caller's job.

use crate::{DependentId, Error, Result, State, StateId};
use indexmap::IndexMap;
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::trace;

/// A zero-argument callback re-run when a watched cell changes
///
/// The callback is `Fn` rather than `FnMut` because propagation can re-enter
/// the same dependent before its previous run has returned.
#[derive(Clone)]
pub struct Dependent {
    id: DependentId,
    callback: Rc<dyn Fn()>,
}

impl Dependent {
    /// Wrap a callback with a fresh identity
    pub fn new(callback: impl Fn() + 'static) -> Self {
        Self {
            id: DependentId::next(),
            callback: Rc::new(callback),
        }
    }

    /// Identity used for idempotent (un)subscription
    pub fn id(&self) -> DependentId {
        self.id
    }

    /// Run the callback
    pub fn run(&self) {
        (self.callback)()
    }
}

impl fmt::Debug for Dependent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependent").field("id", &self.id).finish()
    }
}

struct Cell {
    value: Box<dyn Any>,
    dependents: IndexMap<DependentId, Dependent>,
}

#[derive(Default)]
struct StoreInner {
    cells: IndexMap<StateId, Cell>,
}

impl StoreInner {
    fn cell(&self, id: StateId) -> Result<&Cell> {
        self.cells.get(&id).ok_or(Error::UnknownHandle(id))
    }

    fn cell_mut(&mut self, id: StateId) -> Result<&mut Cell> {
        self.cells.get_mut(&id).ok_or(Error::UnknownHandle(id))
    }
}

/// Shared handle to a set of state cells
///
/// Cloning a `Store` is cheap and yields another handle to the same cells.
#[derive(Clone, Default)]
pub struct Store {
    inner: Rc<RefCell<StoreInner>>,
}

/// Non-owning handle to a [`Store`], held by dependents to avoid `Rc` cycles
#[derive(Clone, Default)]
pub struct WeakStore {
    inner: Weak<RefCell<StoreInner>>,
}

impl fmt::Debug for WeakStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl WeakStore {
    /// Get the store back if it is still alive
    pub fn upgrade(&self) -> Option<Store> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a non-owning handle to this store
    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Allocate a new cell holding `value`, with no dependents
    pub fn create_state<T: 'static>(&self, value: T) -> State<T> {
        let id = StateId::next();
        self.inner.borrow_mut().cells.insert(
            id,
            Cell {
                value: Box::new(value),
                dependents: IndexMap::new(),
            },
        );
        trace!(state = %id, ty = type_name::<T>(), "created state");
        State::from_id(id)
    }

    /// Allocate a new cell holding `T::default()`
    pub fn create_default_state<T: Default + 'static>(&self) -> State<T> {
        self.create_state(T::default())
    }

    /// Check whether a cell exists in this store
    pub fn contains(&self, id: StateId) -> bool {
        self.inner.borrow().cells.contains_key(&id)
    }

    /// Number of cells in the store
    pub fn len(&self) -> usize {
        self.inner.borrow().cells.len()
    }

    /// Check if the store has no cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a clone of the current value
    pub fn get_state<T: Clone + 'static>(&self, state: &State<T>) -> Result<T> {
        self.with_state(state, T::clone)
    }

    /// Borrow the current value for the duration of `f`
    ///
    /// `f` must not write to this store: the cell table is borrowed while it runs.
    pub fn with_state<T: 'static, R>(&self, state: &State<T>, f: impl FnOnce(&T) -> R) -> Result<R> {
        let inner = self.inner.borrow();
        let cell = inner.cell(state.id())?;
        let value = cell
            .value
            .downcast_ref::<T>()
            .ok_or(Error::TypeMismatch {
                id: state.id(),
                expected: type_name::<T>(),
            })?;
        Ok(f(value))
    }

    /// Assign a new value and synchronously run every dependent
    ///
    /// There is no equality short-circuit: dependents run even when the value
    /// is unchanged. Returns the cell's value once propagation has finished,
    /// which reflects any nested writes made by the dependents.
    pub fn set_state<T: Clone + 'static>(&self, state: &State<T>, value: T) -> Result<T> {
        let dependents: Vec<Dependent> = {
            let mut inner = self.inner.borrow_mut();
            let cell = inner.cell_mut(state.id())?;
            if !cell.value.is::<T>() {
                return Err(Error::TypeMismatch {
                    id: state.id(),
                    expected: type_name::<T>(),
                });
            }
            cell.value = Box::new(value);
            cell.dependents.values().cloned().collect()
        };

        trace!(state = %state.id(), dependents = dependents.len(), "propagating state change");
        for dependent in &dependents {
            dependent.run();
        }

        self.get_state(state)
    }

    /// Compute a new value from the current one and assign it
    ///
    /// `f` runs on a clone of the current value with no store borrow held, so
    /// it may read and write other cells.
    pub fn update_state<T: Clone + 'static>(
        &self,
        state: &State<T>,
        f: impl FnOnce(&T) -> T,
    ) -> Result<T> {
        let current = self.get_state(state)?;
        self.set_state(state, f(&current))
    }

    /// Register `dependent` on a cell
    ///
    /// Idempotent: a dependent already registered keeps its position.
    pub fn subscribe(&self, id: StateId, dependent: &Dependent) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let cell = inner.cell_mut(id)?;
        cell.dependents
            .entry(dependent.id())
            .or_insert_with(|| dependent.clone());
        trace!(state = %id, dependent = %dependent.id(), "subscribed");
        Ok(())
    }

    /// Register `dependent` on every cell in `ids`
    ///
    /// All ids are checked first, so an unknown handle leaves no partial subscription.
    pub fn subscribe_all(&self, ids: &[StateId], dependent: &Dependent) -> Result<()> {
        if let Some(missing) = ids.iter().find(|id| !self.contains(**id)) {
            return Err(Error::UnknownHandle(*missing));
        }
        for id in ids {
            self.subscribe(*id, dependent)?;
        }
        Ok(())
    }

    /// Remove `dependent` from every cell in `ids`
    pub fn unsubscribe_all(&self, ids: &[StateId], dependent: DependentId) -> Result<()> {
        for id in ids {
            self.unsubscribe(*id, dependent)?;
        }
        Ok(())
    }

    /// Remove a dependent from a cell. Removing an absent dependent is a no-op.
    pub fn unsubscribe(&self, id: StateId, dependent: DependentId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let cell = inner.cell_mut(id)?;
        if cell.dependents.shift_remove(&dependent).is_some() {
            trace!(state = %id, %dependent, "unsubscribed");
        }
        Ok(())
    }

    /// Number of dependents currently registered on a cell
    pub fn dependent_count(&self, id: StateId) -> Result<usize> {
        Ok(self.inner.borrow().cell(id)?.dependents.len())
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f.debug_struct("Store").field("cells", &inner.cells.len()).finish(),
            Err(_) => f.debug_struct("Store").finish_non_exhaustive(),
        }
    }
}
