//! Page Extension Hooks.
//!
//! A tool page whose content arrives late runs its own restoration pass on top of
//! the coordinator's. On mount it broadcasts its "preserve scroll" signal and
//! re-applies the stored offset; on unmount it persists the current offset.
//! Running a hook and the coordinator in either order converges on the same
//! stored value and the same viewport offset.

use std::rc::Rc;

use tracing::debug;

use super::restoration::{Activation, RestorationStrategy, ScrollBinding};
use super::signals::SignalRegistry;
use crate::types::page::PageId;
use crate::types::scroll::ScrollPosition;

pub struct PageExtensionHook {
    page: PageId,
    binding: ScrollBinding,
    strategy: Rc<RestorationStrategy>,
    signals: Option<Rc<SignalRegistry>>,
    activation: Option<Activation>,
}

impl PageExtensionHook {
    /// `signals` is `None` when broadcasting is turned off.
    pub fn new(
        page: PageId,
        binding: ScrollBinding,
        strategy: Rc<RestorationStrategy>,
        signals: Option<Rc<SignalRegistry>>,
    ) -> Self {
        Self {
            page,
            binding,
            strategy,
            signals,
            activation: None,
        }
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn is_mounted(&self) -> bool {
        self.activation.is_some()
    }

    pub fn activation(&self) -> Option<&Activation> {
        self.activation.as_ref()
    }

    pub fn mount(&mut self) -> Activation {
        if let Some(signals) = &self.signals {
            let delivered = signals.emit(self.page);
            debug!(page = %self.page, delivered, "preserve-scroll signal emitted");
        }
        let activation = self.strategy.activate(&self.binding, self.page.slug());
        self.activation = Some(activation.clone());
        activation
    }

    /// Persists the current offset. A hook that was never mounted does nothing.
    pub fn unmount(&mut self) -> Option<ScrollPosition> {
        self.activation.take()?;
        self.strategy.deactivate(&self.binding, self.page.slug())
    }
}
