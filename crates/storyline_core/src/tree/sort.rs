//! Canonical ordering of the project tree.
//!
//! # Responsibility
//! - Turn stored (possibly stale or corrupt) orders into one visiting order:
//!   roots in fixed category order, then items grouped by root, then files
//!   grouped by root-then-item.
//! - Resolve pending reorder hints and commit the result back to `order`.
//!
//! # Invariants
//! - A stored order that is in range and unoccupied always wins placement;
//!   everything else is appended in store order.
//! - Sorting never fails and never removes entries; inconsistencies are
//!   logged and returned as diagnostics.
//! - A second sort without intervening mutation yields the same order.

use super::error::{SortReport, TreeDiagnostic};
use super::{ProjectTree, TreeView};
use crate::model::handle::Handle;
use crate::model::item::ItemLevel;
use log::{debug, trace, warn};
use std::collections::{HashMap, HashSet};

impl ProjectTree {
    /// Recomputes all derived views and writes each entry's position back to
    /// its `order` field.
    pub fn sort(&mut self) -> SortReport {
        let mut diagnostics = Vec::new();
        let legacy = self.legacy_order();
        let hints = self.pending_hints();
        let mut view = TreeView::default();

        // Roots: registered ones in fixed order, then unregistered duplicates.
        for (_, handle) in self.roots.iter() {
            view.root_order.push(handle.clone());
        }
        for handle in &legacy {
            let entry = &self.entries[self.lookup[handle]];
            if entry.item.level == ItemLevel::Root && !self.roots.contains(handle) {
                view.root_order.push(handle.clone());
            }
        }
        for root in &view.root_order {
            view.items_by_parent.insert(root.clone(), Vec::new());
            view.files_by_parent.insert(root.clone(), Vec::new());
        }
        debug!("event=tree_sort_roots module=tree count={}", view.root_order.len());

        for handle in &legacy {
            let entry = &self.entries[self.lookup[handle]];
            if entry.item.level != ItemLevel::Item {
                continue;
            }
            match entry
                .parent
                .as_ref()
                .and_then(|parent| view.items_by_parent.get_mut(parent))
            {
                Some(siblings) => {
                    trace!(
                        "event=tree_sort_item module=tree handle={} parent={}",
                        handle,
                        entry.parent.as_ref().map_or("none", Handle::as_str)
                    );
                    siblings.push(handle.clone());
                    view.files_by_parent.insert(handle.clone(), Vec::new());
                }
                None => diagnostics.push(orphan(handle, entry.parent.as_ref())),
            }
        }
        for root in &view.root_order {
            if let Some(siblings) = view.items_by_parent.get_mut(root) {
                if !hints.is_empty() {
                    *siblings = resolve_hints(std::mem::take(siblings), root, &hints);
                }
                view.item_order.extend(siblings.iter().cloned());
            }
        }
        debug!("event=tree_sort_items module=tree count={}", view.item_order.len());

        for handle in &legacy {
            let entry = &self.entries[self.lookup[handle]];
            if entry.item.level != ItemLevel::File {
                continue;
            }
            match entry
                .parent
                .as_ref()
                .and_then(|parent| view.files_by_parent.get_mut(parent))
            {
                Some(siblings) => siblings.push(handle.clone()),
                None => diagnostics.push(orphan(handle, entry.parent.as_ref())),
            }
        }
        for parent in view.root_order.iter().chain(view.item_order.iter()) {
            if let Some(siblings) = view.files_by_parent.get_mut(parent) {
                if !hints.is_empty() {
                    *siblings = resolve_hints(std::mem::take(siblings), parent, &hints);
                }
                view.file_order.extend(siblings.iter().cloned());
            }
        }
        debug!("event=tree_sort_files module=tree count={}", view.file_order.len());

        view.global_order = view
            .root_order
            .iter()
            .chain(view.item_order.iter())
            .chain(view.file_order.iter())
            .cloned()
            .collect();
        diagnostics.extend(self.check_index(&view.global_order));

        self.commit_order(&view.global_order);
        self.view = view;
        self.stale = false;

        let report = SortReport { diagnostics };
        if report.is_consistent() {
            debug!(
                "event=tree_sort module=tree status=ok entries={} orphans={}",
                self.entries.len(),
                report.orphans()
            );
        } else {
            warn!(
                "event=tree_sort module=tree status=inconsistent entries={} indexed={} findings={}",
                self.entries.len(),
                self.view.global_order.len(),
                report.diagnostics.len()
            );
        }
        report
    }

    /// Builds the legacy sequence from stored orders.
    ///
    /// Slot array sized to the entry count; valid unoccupied orders are
    /// placed, the rest overflow in store order.
    fn legacy_order(&self) -> Vec<Handle> {
        let mut slots: Vec<Option<&Handle>> = vec![None; self.entries.len()];
        let mut overflow = Vec::new();

        for entry in &self.entries {
            let slot = entry
                .order
                .and_then(|order| usize::try_from(order).ok())
                .filter(|&index| index < slots.len() && slots[index].is_none());
            match slot {
                Some(index) => slots[index] = Some(&entry.handle),
                None => {
                    trace!(
                        "event=tree_sort_legacy module=tree handle={} order={:?} status=appended",
                        entry.handle,
                        entry.order
                    );
                    overflow.push(&entry.handle);
                }
            }
        }

        slots
            .into_iter()
            .flatten()
            .chain(overflow)
            .cloned()
            .collect()
    }

    fn pending_hints(&self) -> HashMap<Handle, Handle> {
        self.entries
            .iter()
            .filter_map(|entry| {
                entry
                    .sort_after
                    .as_ref()
                    .map(|anchor| (entry.handle.clone(), anchor.clone()))
            })
            .collect()
    }

    fn check_index(&self, global_order: &[Handle]) -> Vec<TreeDiagnostic> {
        let mut diagnostics = Vec::new();
        let mut seen = HashSet::with_capacity(global_order.len());
        for handle in global_order {
            if !seen.insert(handle) {
                warn!("event=tree_sort_check module=tree status=duplicate handle={handle}");
                diagnostics.push(TreeDiagnostic::DuplicateInIndex(handle.clone()));
            }
        }
        for entry in &self.entries {
            if !seen.contains(&entry.handle) {
                warn!(
                    "event=tree_sort_check module=tree status=missing handle={}",
                    entry.handle
                );
                diagnostics.push(TreeDiagnostic::MissingFromIndex(entry.handle.clone()));
            }
        }
        diagnostics
    }

    fn commit_order(&mut self, global_order: &[Handle]) {
        for (position, handle) in global_order.iter().enumerate() {
            if let Some(&index) = self.lookup.get(handle) {
                self.entries[index].order = i64::try_from(position).ok();
            }
        }
        for entry in &mut self.entries {
            entry.sort_after = None;
        }
    }
}

fn orphan(handle: &Handle, parent: Option<&Handle>) -> TreeDiagnostic {
    warn!(
        "event=tree_sort module=tree status=orphan handle={} parent={}",
        handle,
        parent.map_or("none", Handle::as_str)
    );
    TreeDiagnostic::OrphanEntry {
        handle: handle.clone(),
        parent: parent.cloned(),
    }
}

/// Reorders one sibling list according to sort-after hints.
///
/// Unhinted siblings keep their relative order. A sibling hinted at `parent`
/// goes first; a sibling hinted at another sibling is emitted directly after
/// it. Hints to non-siblings are ignored; members of a hint cycle are
/// appended last, in input order.
fn resolve_hints(
    siblings: Vec<Handle>,
    parent: &Handle,
    hints: &HashMap<Handle, Handle>,
) -> Vec<Handle> {
    let members: HashSet<&Handle> = siblings.iter().collect();
    let mut heads = Vec::new();
    let mut anchored = Vec::new();
    let mut followers: HashMap<&Handle, Vec<&Handle>> = HashMap::new();

    for handle in &siblings {
        match hints.get(handle) {
            Some(anchor) if anchor == parent => heads.push(handle),
            Some(anchor) if anchor != handle && members.contains(anchor) => {
                followers.entry(anchor).or_default().push(handle);
            }
            _ => anchored.push(handle),
        }
    }

    let mut placed: HashSet<&Handle> = HashSet::with_capacity(siblings.len());
    let mut resolved = Vec::with_capacity(siblings.len());
    let starts = heads.into_iter().chain(anchored).chain(siblings.iter());
    for start in starts {
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !placed.insert(current) {
                continue;
            }
            resolved.push(current.clone());
            if let Some(next) = followers.get(current) {
                stack.extend(next.iter().rev().copied());
            }
        }
    }
    resolved
}
