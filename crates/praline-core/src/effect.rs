//! Effects: callbacks re-run when their dependencies change
//!
//! An effect watches a set of state handles described by a [`Deps`] value and
//! receives their current values every time one of them is written.
//!
//! ```
//! use praline_core::{create_effect, Store};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let store = Store::new();
//! let width = store.create_state(2);
//! let height = store.create_state(3);
//! let area = Rc::new(Cell::new(0));
//!
//! let sink = area.clone();
//! let disposer = create_effect(&store, (width, height), move |(w, h)| sink.set(w * h)).unwrap();
//!
//! // Effects with dependencies only run on change
//! assert_eq!(area.get(), 0);
//! store.set_state(&width, 4).unwrap();
//! assert_eq!(area.get(), 12);
//!
//! disposer.dispose().unwrap();
//! store.set_state(&height, 10).unwrap();
//! assert_eq!(area.get(), 12);
//! ```

use crate::{Dependent, DependentId, Result, State, StateId, Store, WeakStore};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error};

/// A set of state handles whose values an effect receives
pub trait Deps {
    /// The values read from the handles, in handle order
    type Values: Clone + 'static;

    /// The watched cell identities, in handle order
    fn ids(&self) -> Vec<StateId>;

    /// Read the current values from `store`
    fn read(&self, store: &Store) -> Result<Self::Values>;
}

impl Deps for () {
    type Values = ();

    fn ids(&self) -> Vec<StateId> {
        Vec::new()
    }

    fn read(&self, _store: &Store) -> Result<()> {
        Ok(())
    }
}

impl<T: Clone + 'static> Deps for State<T> {
    type Values = T;

    fn ids(&self) -> Vec<StateId> {
        vec![self.id()]
    }

    fn read(&self, store: &Store) -> Result<T> {
        store.get_state(self)
    }
}

impl<T: Clone + 'static> Deps for Vec<State<T>> {
    type Values = Vec<T>;

    fn ids(&self) -> Vec<StateId> {
        self.iter().map(State::id).collect()
    }

    fn read(&self, store: &Store) -> Result<Vec<T>> {
        self.iter().map(|state| store.get_state(state)).collect()
    }
}

macro_rules! impl_deps_for_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Clone + 'static),+> Deps for ($(State<$name>,)+) {
            type Values = ($($name,)+);

            fn ids(&self) -> Vec<StateId> {
                vec![$(self.$idx.id()),+]
            }

            fn read(&self, store: &Store) -> Result<Self::Values> {
                Ok(($(store.get_state(&self.$idx)?,)+))
            }
        }
    };
}

impl_deps_for_tuple!(A: 0);
impl_deps_for_tuple!(A: 0, B: 1);
impl_deps_for_tuple!(A: 0, B: 1, C: 2);
impl_deps_for_tuple!(A: 0, B: 1, C: 2, D: 3);

/// Unsubscribes an effect from every cell it watches
///
/// Dropping a `Disposer` does not dispose the effect.
#[derive(Debug, Clone, Default)]
pub struct Disposer {
    registration: Option<Registration>,
}

#[derive(Debug, Clone)]
struct Registration {
    store: WeakStore,
    ids: Vec<StateId>,
    dependent: DependentId,
}

impl Disposer {
    /// A disposer with nothing to undo
    pub fn noop() -> Self {
        Self::default()
    }

    /// Whether this disposer has nothing to undo
    pub fn is_noop(&self) -> bool {
        self.registration.is_none()
    }

    /// Unsubscribe from all watched cells. Calling it again is a no-op.
    pub fn dispose(&self) -> Result<()> {
        let Some(registration) = &self.registration else {
            return Ok(());
        };
        let Some(store) = registration.store.upgrade() else {
            return Ok(());
        };
        store.unsubscribe_all(&registration.ids, registration.dependent)?;
        debug!(dependent = %registration.dependent, cells = registration.ids.len(), "disposed effect");
        Ok(())
    }
}

/// Register `callback` to run with the values of `deps` whenever one of them changes
///
/// With no dependencies the callback runs once, immediately, and the returned
/// disposer is a no-op. With dependencies the callback is *not* run at
/// creation; only later writes trigger it.
pub fn create_effect<D, F>(store: &Store, deps: D, callback: F) -> Result<Disposer>
where
    D: Deps + 'static,
    F: Fn(D::Values) + 'static,
{
    let ids = deps.ids();
    if ids.is_empty() {
        callback(deps.read(store)?);
        return Ok(Disposer::noop());
    }

    let weak = store.downgrade();
    let dependent = Dependent::new(move || {
        let Some(store) = weak.upgrade() else {
            return;
        };
        match deps.read(&store) {
            Ok(values) => callback(values),
            Err(err) => error!(%err, "effect could not read its dependencies"),
        }
    });

    store.subscribe_all(&ids, &dependent)?;
    debug!(dependent = %dependent.id(), cells = ids.len(), "created effect");

    Ok(Disposer {
        registration: Some(Registration {
            store: store.downgrade(),
            ids,
            dependent: dependent.id(),
        }),
    })
}

/// Like [`create_effect`], but only runs `callback` while `predicate` holds
///
/// On every change the current snapshot of `deps` is read; the callback fires
/// when the predicate is true and the snapshot is not the previous snapshot.
/// Snapshots are compared by identity and every change reads a fresh one, so
/// in practice the callback fires on every change for which the predicate is
/// true. It never fires while the predicate is false.
pub fn create_guarded_effect<D, P, F>(
    store: &Store,
    deps: D,
    predicate: P,
    callback: F,
) -> Result<Disposer>
where
    D: Deps + 'static,
    P: Fn(&D::Values) -> bool + 'static,
    F: Fn(D::Values) + 'static,
{
    let previous: RefCell<Option<Rc<D::Values>>> = RefCell::new(None);
    create_effect(store, deps, move |values| {
        let current = Rc::new(values);
        if predicate(&current) {
            let seen = previous
                .borrow()
                .as_ref()
                .is_some_and(|prev| Rc::ptr_eq(prev, &current));
            if !seen {
                callback((*current).clone());
            }
        }
        *previous.borrow_mut() = Some(current);
    })
}
