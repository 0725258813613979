//! Synchronous publish/subscribe used by the city and the controller.

use city_core::{CityStatistics, GridPos, PlacedBuilding};
use serde::Serialize;
use std::fmt;

/// Notifications emitted by a [`crate::City`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum CityEvent {
    /// A building was placed.
    BuildingAdded(PlacedBuilding),
    /// The building at this cell was demolished.
    BuildingRemoved(GridPos),
    /// A recompute finished; carries the full record.
    StatisticsUpdated(CityStatistics),
}

/// Notifications emitted by a [`crate::SimulationController`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ControlEvent {
    SimulationStarted,
    SimulationStopped,
    /// The current city was discarded and replaced by an empty one.
    CityReplaced { width: u32, height: u32 },
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Box<dyn FnMut(&E)>;

/// Registered callbacks, invoked in registration order.
pub struct EventBus<E> {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener<E>)>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<E> EventBus<E> {
    /// A bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener; it runs after every earlier one.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&E) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if the id was unknown or already removed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to every listener in registration order.
    pub fn emit(&mut self, event: &E) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn delivers_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus: EventBus<u32> = EventBus::new();
        for tag in ["a", "b", "c"] {
            let seen = Rc::clone(&seen);
            bus.subscribe(move |v: &u32| seen.borrow_mut().push(format!("{tag}{v}")));
        }
        bus.emit(&1);
        assert_eq!(*seen.borrow(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut bus: EventBus<()> = EventBus::new();
        let c = Rc::clone(&count);
        let id = bus.subscribe(move |_| *c.borrow_mut() += 1);
        bus.emit(&());
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&());
        assert_eq!(*count.borrow(), 1);
        assert!(bus.is_empty());
    }
}
