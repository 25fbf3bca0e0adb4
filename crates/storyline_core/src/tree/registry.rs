//! Root registry: one root handle per fixed category.

use crate::model::handle::Handle;
use crate::model::item::ItemType;

/// Maps every `ItemType` to at most one registered root handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootRegistry {
    slots: [Option<Handle>; 4],
}

impl RootRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ItemType) -> Option<&Handle> {
        self.slots[kind.index()].as_ref()
    }

    /// Registers `handle` for `kind` when the slot is free.
    ///
    /// First registration wins; on conflict the already registered handle is
    /// returned as the error value.
    pub fn register(&mut self, kind: ItemType, handle: Handle) -> Result<(), Handle> {
        match &self.slots[kind.index()] {
            Some(existing) if *existing == handle => Ok(()),
            Some(existing) => Err(existing.clone()),
            None => {
                self.slots[kind.index()] = Some(handle);
                Ok(())
            }
        }
    }

    pub fn contains(&self, handle: &Handle) -> bool {
        self.slots.iter().flatten().any(|root| root == handle)
    }

    /// True when every fixed type has a registered root.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Registered roots in `ItemType::FIXED_ORDER`.
    pub fn iter(&self) -> impl Iterator<Item = (ItemType, &Handle)> {
        ItemType::FIXED_ORDER
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|handle| (kind, handle)))
    }

    pub(crate) fn clear(&mut self) {
        self.slots = Default::default();
    }
}
