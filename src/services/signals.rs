//! Observer registry for "preserve scroll" page signals.
//!
//! A page hook broadcasts [`PreserveScrollSignal`] when it mounts. Nothing in the
//! shell consumes these today; the registry is the extension point for code that
//! wants to react to a page becoming the active preserved page.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

use crate::types::page::PageId;

/// Payload-less broadcast identifying the page that wants its scroll preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreserveScrollSignal {
    pub page: PageId,
}

impl PreserveScrollSignal {
    pub fn name(&self) -> String {
        self.page.signal_name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

pub type SignalHandler = Rc<dyn Fn(&PreserveScrollSignal)>;

#[derive(Default)]
pub struct SignalRegistry {
    subscribers: RefCell<HashMap<PageId, Vec<(SubscriptionId, SignalHandler)>>>,
    emitted: RefCell<HashMap<PageId, u64>>,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, page: PageId, handler: SignalHandler) -> SubscriptionId {
        let id = SubscriptionId(Uuid::new_v4());
        self.subscribers
            .borrow_mut()
            .entry(page)
            .or_default()
            .push((id, handler));
        id
    }

    /// Returns `false` if the subscription was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        for handlers in subscribers.values_mut() {
            if let Some(pos) = handlers.iter().position(|(sid, _)| *sid == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    /// Delivers the page's signal to its subscribers. Returns how many received it.
    ///
    /// Delivery works on a snapshot, so handlers may subscribe or unsubscribe
    /// while it runs; changes apply from the next emit.
    pub fn emit(&self, page: PageId) -> usize {
        *self.emitted.borrow_mut().entry(page).or_insert(0) += 1;

        let handlers: Vec<SignalHandler> = self
            .subscribers
            .borrow()
            .get(&page)
            .map(|hs| hs.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        let signal = PreserveScrollSignal { page };
        trace!(signal = %signal.name(), subscribers = handlers.len(), "emitting signal");
        for handler in &handlers {
            handler(&signal);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, page: PageId) -> usize {
        self.subscribers
            .borrow()
            .get(&page)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn emitted_count(&self, page: PageId) -> u64 {
        self.emitted.borrow().get(&page).copied().unwrap_or(0)
    }
}
