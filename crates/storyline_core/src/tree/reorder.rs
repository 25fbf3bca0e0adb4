//! Single-step reordering through sort-after hints.
//!
//! A move only records where entries should land; the following `sort()`
//! applies every pending hint in one pass and then clears them.

use super::error::{TreeError, TreeResult};
use super::ProjectTree;
use crate::model::handle::Handle;
use crate::model::item::ItemLevel;
use log::debug;

/// Direction of one sibling move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStep {
    Up,
    Down,
}

impl MoveStep {
    pub fn offset(self) -> isize {
        match self {
            Self::Up => -1,
            Self::Down => 1,
        }
    }
}

impl TryFrom<i32> for MoveStep {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Up),
            1 => Ok(Self::Down),
            other => Err(other),
        }
    }
}

impl ProjectTree {
    /// Moves an item or file one position among its siblings.
    ///
    /// Moving past either end of the sibling list is a no-op.
    ///
    /// # Errors
    /// - `NotFound` when `handle` is unknown.
    /// - `InvalidOperation` for roots and for steps other than -1 and +1.
    pub fn move_step(&mut self, handle: &Handle, step: i32) -> TreeResult<()> {
        let step = MoveStep::try_from(step).map_err(|_| TreeError::InvalidOperation {
            handle: handle.clone(),
            reason: "move step must be -1 or +1",
        })?;
        self.move_entry(handle, step)
    }

    pub fn move_up(&mut self, handle: &Handle) -> TreeResult<()> {
        self.move_entry(handle, MoveStep::Up)
    }

    pub fn move_down(&mut self, handle: &Handle) -> TreeResult<()> {
        self.move_entry(handle, MoveStep::Down)
    }

    fn move_entry(&mut self, handle: &Handle, step: MoveStep) -> TreeResult<()> {
        let index = self.index_of(handle)?;
        if self.entries[index].item.level == ItemLevel::Root {
            return Err(TreeError::InvalidOperation {
                handle: handle.clone(),
                reason: "root entries cannot be reordered",
            });
        }
        if self.stale {
            self.sort();
        }

        let entry = &self.entries[index];
        let Some(parent) = entry.parent.clone() else {
            debug!("event=tree_move module=tree status=skipped handle={handle} reason=no_parent");
            return Ok(());
        };
        let siblings = match entry.item.level {
            ItemLevel::File => self.files_of(&parent),
            _ => self.items_of(&parent),
        };
        let Some(current) = siblings.iter().position(|sibling| sibling == handle) else {
            debug!("event=tree_move module=tree status=skipped handle={handle} reason=not_indexed");
            return Ok(());
        };
        let Some(target) = current
            .checked_add_signed(step.offset())
            .filter(|&target| target < siblings.len())
        else {
            debug!("event=tree_move module=tree status=noop handle={handle} reason=boundary");
            return Ok(());
        };

        let mut reordered = siblings.to_vec();
        let moved = reordered.remove(current);
        reordered.insert(target, moved);

        let anchor = match target {
            0 => parent.clone(),
            _ => reordered[target - 1].clone(),
        };
        let follower = reordered.get(target + 1).cloned();

        self.entries[index].sort_after = Some(anchor);
        if let Some(follower) = follower {
            if let Some(&follower_index) = self.lookup.get(&follower) {
                self.entries[follower_index].sort_after = Some(handle.clone());
            }
        }
        debug!(
            "event=tree_move module=tree status=ok handle={} from={} to={}",
            handle, current, target
        );

        self.stale = true;
        self.sort();
        Ok(())
    }
}
