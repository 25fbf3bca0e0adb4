//! Structural validation and self-repair.
//!
//! # Responsibility
//! - Rebuild the root registry from the store.
//! - Create missing category roots and reparent misplaced items and files.
//!
//! # Invariants
//! - Validation never deletes entries and never fails.
//! - Afterwards every item hangs under a root of its own type and every file
//!   under a container.

use super::error::{TreeDiagnostic, ValidationReport};
use super::ProjectTree;
use crate::model::handle::Handle;
use crate::model::item::{ItemClass, ItemLevel, ItemType};
use log::{debug, error, info, trace, warn};
use std::collections::HashSet;

impl ProjectTree {
    /// Repairs the tree and returns the number of repairs made.
    pub fn validate(&mut self) -> usize {
        self.validate_with_report().repair_count()
    }

    /// Repairs the tree and returns every finding.
    pub fn validate_with_report(&mut self) -> ValidationReport {
        let mut diagnostics = Vec::new();

        self.check_roots(&mut diagnostics);
        self.create_missing_roots(&mut diagnostics);
        self.check_items(&mut diagnostics);
        self.check_files(&mut diagnostics);

        if !diagnostics.is_empty() {
            self.stale = true;
        }
        let report = ValidationReport { diagnostics };
        info!(
            "event=tree_validate module=tree status=ok entries={} repairs={} created_roots={}",
            self.entries.len(),
            report.repair_count(),
            report.created_roots().len()
        );
        report
    }

    fn check_roots(&mut self, diagnostics: &mut Vec<TreeDiagnostic>) {
        self.roots.clear();
        for entry in &mut self.entries {
            if entry.item.level != ItemLevel::Root {
                continue;
            }
            trace!("event=tree_validate_root module=tree handle={}", entry.handle);

            if let Some(parent) = entry.parent.take() {
                warn!(
                    "event=tree_validate module=tree status=repair handle={} cleared_root_parent={}",
                    entry.handle, parent
                );
                diagnostics.push(TreeDiagnostic::RootParentCleared {
                    handle: entry.handle.clone(),
                    parent,
                });
            }

            if !entry.item.is_container() {
                let class = std::mem::replace(&mut entry.item.class, ItemClass::Container);
                warn!(
                    "event=tree_validate module=tree status=repair handle={} root_class={} new_class=container",
                    entry.handle,
                    class.as_str()
                );
                diagnostics.push(TreeDiagnostic::RootClassReset {
                    handle: entry.handle.clone(),
                    class,
                });
            }

            let kind = entry.item.kind;
            match self.roots.register(kind, entry.handle.clone()) {
                Ok(()) => debug!(
                    "event=tree_validate_root module=tree kind={} handle={} status=registered",
                    kind.as_str(),
                    entry.handle
                ),
                Err(registered) => {
                    warn!(
                        "event=tree_validate module=tree status=duplicate_root kind={} handle={} registered={}",
                        kind.as_str(),
                        entry.handle,
                        registered
                    );
                    diagnostics.push(TreeDiagnostic::DuplicateRoot {
                        kind,
                        handle: entry.handle.clone(),
                        registered,
                    });
                }
            }
        }
    }

    fn create_missing_roots(&mut self, diagnostics: &mut Vec<TreeDiagnostic>) {
        for kind in ItemType::FIXED_ORDER {
            if self.roots.get(kind).is_some() {
                continue;
            }
            match self.create_root(kind) {
                Ok(handle) => {
                    info!(
                        "event=tree_validate module=tree status=root_created kind={} handle={}",
                        kind.as_str(),
                        handle
                    );
                    diagnostics.push(TreeDiagnostic::RootCreated { kind, handle });
                }
                Err(err) => error!(
                    "event=tree_validate module=tree status=error kind={} error={}",
                    kind.as_str(),
                    err
                ),
            }
        }
    }

    fn check_items(&mut self, diagnostics: &mut Vec<TreeDiagnostic>) {
        for index in 0..self.entries.len() {
            let entry = &self.entries[index];
            if entry.item.level != ItemLevel::Item {
                continue;
            }
            let kind = entry.item.kind;
            let parent_ok = entry
                .parent
                .as_ref()
                .and_then(|parent| self.lookup.get(parent))
                .map(|&parent_index| &self.entries[parent_index].item)
                .is_some_and(|parent| parent.level == ItemLevel::Root && parent.kind == kind);
            if parent_ok {
                continue;
            }
            let Some(root) = self.roots.get(kind).cloned() else {
                continue;
            };

            let entry = &mut self.entries[index];
            let from = entry.parent.replace(root.clone());
            warn!(
                "event=tree_validate module=tree status=repair handle={} item_parent={} new_parent={}",
                entry.handle,
                from.as_ref().map_or("none", Handle::as_str),
                root
            );
            diagnostics.push(TreeDiagnostic::ItemReparented {
                handle: entry.handle.clone(),
                from,
                to: root,
            });
        }
    }

    fn check_files(&mut self, diagnostics: &mut Vec<TreeDiagnostic>) {
        for index in 0..self.entries.len() {
            let entry = &self.entries[index];
            if entry.item.level != ItemLevel::File {
                continue;
            }
            let parent_ok = entry
                .parent
                .as_ref()
                .and_then(|parent| self.lookup.get(parent))
                .is_some_and(|&parent_index| self.entries[parent_index].item.is_container());
            if parent_ok {
                continue;
            }
            let target = self
                .container_ancestor(entry.parent.as_ref())
                .or_else(|| self.roots.get(entry.item.kind).cloned());
            let Some(target) = target.filter(|target| entry.parent.as_ref() != Some(target)) else {
                continue;
            };

            let entry = &mut self.entries[index];
            let from = entry.parent.replace(target.clone());
            warn!(
                "event=tree_validate module=tree status=repair handle={} file_parent={} new_parent={}",
                entry.handle,
                from.as_ref().map_or("none", Handle::as_str),
                target
            );
            diagnostics.push(TreeDiagnostic::FileReparented {
                handle: entry.handle.clone(),
                from,
                to: target,
            });
        }
    }

    /// Nearest container at or above `start`, following parent pointers.
    pub(super) fn container_ancestor(&self, start: Option<&Handle>) -> Option<Handle> {
        let mut visited = HashSet::new();
        let mut cursor = start.cloned();
        while let Some(current) = cursor {
            if !visited.insert(current.clone()) {
                return None;
            }
            let entry = &self.entries[*self.lookup.get(&current)?];
            if entry.item.is_container() {
                return Some(current);
            }
            cursor = entry.parent.clone();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::model::handle::Handle;
    use crate::model::item::{ItemClass, ItemLevel, ItemType, TreeItem};
    use crate::tree::{ProjectTree, TreeDiagnostic};

    fn root(kind: ItemType) -> TreeItem {
        TreeItem::new(ItemClass::Container, ItemLevel::Root, kind, kind.root_name())
    }

    #[test]
    fn empty_tree_gets_four_roots_without_repairs() {
        let mut tree = ProjectTree::new();
        let report = tree.validate_with_report();
        assert_eq!(report.repair_count(), 0);
        assert_eq!(report.created_roots().len(), 4);
        assert!(tree.roots().is_complete());
        assert!(tree.entries().all(|entry| entry.parent.is_none()));
    }

    #[test]
    fn second_validation_is_clean() {
        let mut tree = ProjectTree::new();
        tree.validate();
        let report = tree.validate_with_report();
        assert!(report.diagnostics.is_empty());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn duplicate_root_is_counted_and_kept() {
        let mut tree = ProjectTree::new();
        let first = tree.append(None, None, None, root(ItemType::Book)).unwrap();
        let second = tree.append(None, None, None, root(ItemType::Book)).unwrap();

        let report = tree.validate_with_report();
        assert_eq!(report.repair_count(), 1);
        assert!(report.diagnostics.contains(&TreeDiagnostic::DuplicateRoot {
            kind: ItemType::Book,
            handle: second.clone(),
            registered: first.clone(),
        }));
        assert!(tree.contains(&second));
        assert_eq!(tree.roots().get(ItemType::Book), Some(&first));
    }

    #[test]
    fn item_under_wrong_category_moves_to_own_root() {
        let mut tree = ProjectTree::new();
        tree.validate();
        let plot_root = tree.roots().get(ItemType::Plot).cloned().unwrap();
        let book_root = tree.roots().get(ItemType::Book).cloned().unwrap();
        let chapter = TreeItem::new(ItemClass::Container, ItemLevel::Item, ItemType::Book, "C");
        let handle = tree
            .append(None, Some(plot_root.clone()), None, chapter)
            .unwrap();

        assert_eq!(tree.validate(), 1);
        assert_eq!(tree.get(&handle).unwrap().parent, Some(book_root));
    }

    #[test]
    fn file_under_file_climbs_to_container() {
        let mut tree = ProjectTree::new();
        tree.validate();
        let book_root = tree.roots().get(ItemType::Book).cloned().unwrap();
        let scene = TreeItem::new(ItemClass::Scene, ItemLevel::File, ItemType::Book, "S");
        let first = tree
            .append(None, Some(book_root.clone()), None, scene.clone())
            .unwrap();
        let nested: Handle = tree.append(None, Some(first), None, scene).unwrap();

        assert_eq!(tree.validate(), 1);
        assert_eq!(tree.get(&nested).unwrap().parent, Some(book_root));
    }

    #[test]
    fn non_container_root_is_reset_once() {
        let mut tree = ProjectTree::new();
        let mut item = root(ItemType::Note);
        item.class = ItemClass::Note;
        let notes = tree.append(None, None, None, item).unwrap();

        let report = tree.validate_with_report();
        assert!(report.diagnostics.contains(&TreeDiagnostic::RootClassReset {
            handle: notes.clone(),
            class: ItemClass::Note,
        }));
        assert_eq!(report.repair_count(), 1);
        assert!(tree.get(&notes).unwrap().item.is_container());
        assert_eq!(tree.validate(), 0);
    }
}
