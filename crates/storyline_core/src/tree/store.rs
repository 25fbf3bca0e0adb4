//! Tree store: insertion, lookup, field updates and restore.

use super::error::{TreeDiagnostic, TreeError, TreeResult};
use super::ProjectTree;
use crate::model::entry::{DocumentRef, StoredEntry, TreeEntry};
use crate::model::handle::{Handle, MAX_HANDLE_ATTEMPTS};
use crate::model::item::{ItemClass, ItemField, ItemLevel, ItemType, ItemUpdate, TreeItem};
use log::{debug, trace, warn};
use std::path::{Path, PathBuf};

impl ProjectTree {
    /// Appends one entry and returns its handle.
    ///
    /// A handle is generated when `handle` is `None`. The first root appended
    /// for a type is registered immediately.
    ///
    /// # Errors
    /// - `DuplicateHandle` when the explicit handle is already stored.
    /// - `InvalidItem` when the payload does not validate.
    /// - `InvalidParent` when a root is given a parent.
    /// - `NotFound` when `parent` is not stored yet.
    pub fn append(
        &mut self,
        handle: Option<Handle>,
        parent: Option<Handle>,
        order: Option<i64>,
        item: TreeItem,
    ) -> TreeResult<Handle> {
        item.validate()?;

        if let Some(parent) = &parent {
            if item.level == ItemLevel::Root {
                return Err(TreeError::InvalidParent {
                    parent: parent.clone(),
                    reason: "root entries cannot have a parent",
                });
            }
            if !self.lookup.contains_key(parent) {
                return Err(TreeError::NotFound(parent.clone()));
            }
        }

        let handle = match handle {
            Some(handle) if self.lookup.contains_key(&handle) => {
                return Err(TreeError::DuplicateHandle(handle));
            }
            Some(handle) => handle,
            None => self.generate_handle(&item.name)?,
        };

        trace!(
            "event=tree_append module=tree handle={} parent={} level={}",
            handle,
            parent.as_ref().map_or("none", Handle::as_str),
            item.level.as_str()
        );
        self.insert_entry(handle.clone(), parent, order, item);
        Ok(handle)
    }

    pub fn get(&self, handle: &Handle) -> TreeResult<&TreeEntry> {
        let index = self.index_of(handle)?;
        Ok(&self.entries[index])
    }

    pub fn contains(&self, handle: &Handle) -> bool {
        self.lookup.contains_key(handle)
    }

    /// Entries in store (insertion) order.
    pub fn entries(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }

    /// Sets one mutable field from its textual value.
    ///
    /// # Errors
    /// - `NotFound` when `handle` is unknown.
    /// - `InvalidItem` when the value does not parse or validate.
    pub fn update(&mut self, handle: &Handle, field: ItemField, value: &str) -> TreeResult<()> {
        let index = self.index_of(handle)?;
        let update = ItemUpdate::parse(field, value)?;
        self.entries[index].item.apply(update)?;
        debug!(
            "event=tree_update module=tree status=ok handle={} field={}",
            handle, field
        );
        Ok(())
    }

    /// Applies an already typed field change.
    pub fn apply_update(&mut self, handle: &Handle, update: ItemUpdate) -> TreeResult<()> {
        let index = self.index_of(handle)?;
        let field = update.field();
        self.entries[index].item.apply(update)?;
        debug!(
            "event=tree_update module=tree status=ok handle={} field={}",
            handle, field
        );
        Ok(())
    }

    /// Stores the document folder in every file entry's reference.
    pub fn set_document_location(&mut self, path: impl Into<PathBuf>) {
        let location = path.into();
        for entry in &mut self.entries {
            if let Some(document) = entry.document.as_mut() {
                document.set_location(Some(location.clone()));
            }
        }
        self.document_location = Some(location);
    }

    pub fn document_location(&self) -> Option<&Path> {
        self.document_location.as_deref()
    }

    /// Draws a handle that is not used by any stored entry.
    pub fn generate_handle(&mut self, seed: &str) -> TreeResult<Handle> {
        let lookup = &self.lookup;
        self.handles
            .generate(seed, |candidate| lookup.contains_key(candidate))
            .ok_or(TreeError::HandleExhausted {
                attempts: MAX_HANDLE_ATTEMPTS,
            })
    }

    /// Rebuilds a tree from persisted entries.
    ///
    /// Roots are inserted first, then items, then files. Files are inserted in
    /// passes so a file may name another file stored after it as parent. A
    /// parent reference that never resolves is dropped and reported, leaving
    /// the repair to `validate()`. Payload fields that fail validation are
    /// reset and reported. Stored orders are kept verbatim.
    ///
    /// # Errors
    /// - `DuplicateHandle` when two stored entries share a handle.
    pub fn restore(stored: Vec<StoredEntry>) -> TreeResult<(Self, Vec<TreeDiagnostic>)> {
        let mut tree = Self::new();
        let mut diagnostics = Vec::new();

        let mut roots = Vec::new();
        let mut items = Vec::new();
        let mut files = Vec::new();
        for mut entry in stored {
            for (field, error) in entry.item.repair() {
                warn!(
                    "event=tree_restore module=tree status=repair handle={} field={} error={}",
                    entry.handle, field, error
                );
                diagnostics.push(TreeDiagnostic::FieldReset {
                    handle: entry.handle.clone(),
                    field,
                    error,
                });
            }
            match entry.item.level {
                ItemLevel::Root => roots.push(entry),
                ItemLevel::Item => items.push(entry),
                ItemLevel::File => files.push(entry),
            }
        }

        for entry in roots.into_iter().chain(items) {
            tree.restore_entry(entry, &mut diagnostics)?;
        }

        // A pass that resolves nothing drops one parent reference and retries.
        let mut pending = files;
        while !pending.is_empty() {
            let (ready, waiting): (Vec<_>, Vec<_>) = pending.into_iter().partition(|entry| {
                entry
                    .parent
                    .as_ref()
                    .map_or(true, |parent| tree.contains(parent))
            });
            let mut waiting = waiting.into_iter();
            if ready.is_empty() {
                if let Some(stuck) = waiting.next() {
                    tree.restore_entry(stuck, &mut diagnostics)?;
                }
            }
            for entry in ready {
                tree.restore_entry(entry, &mut diagnostics)?;
            }
            pending = waiting.collect();
        }

        debug!(
            "event=tree_restore module=tree status=ok entries={} findings={}",
            tree.len(),
            diagnostics.len()
        );
        Ok((tree, diagnostics))
    }

    fn restore_entry(
        &mut self,
        entry: StoredEntry,
        diagnostics: &mut Vec<TreeDiagnostic>,
    ) -> TreeResult<()> {
        if self.contains(&entry.handle) {
            return Err(TreeError::DuplicateHandle(entry.handle));
        }
        let parent = match entry.parent {
            Some(parent) if self.contains(&parent) => Some(parent),
            Some(parent) => {
                warn!(
                    "event=tree_restore module=tree status=repair handle={} dropped_parent={}",
                    entry.handle, parent
                );
                diagnostics.push(TreeDiagnostic::DroppedParent {
                    handle: entry.handle.clone(),
                    parent,
                });
                None
            }
            None => None,
        };
        self.insert_entry(entry.handle, parent, entry.order, entry.item);
        Ok(())
    }

    /// Persistable snapshot of every entry in store order.
    pub fn to_stored(&self) -> Vec<StoredEntry> {
        self.entries.iter().map(TreeEntry::to_stored).collect()
    }

    /// Creates and registers the canonical root for `kind`.
    pub(super) fn create_root(&mut self, kind: ItemType) -> TreeResult<Handle> {
        let item = TreeItem::new(ItemClass::Container, ItemLevel::Root, kind, kind.root_name());
        let handle = self.generate_handle(kind.root_name())?;
        self.insert_entry(handle.clone(), None, None, item);
        debug!(
            "event=tree_root_created module=tree kind={} handle={}",
            kind.as_str(),
            handle
        );
        Ok(handle)
    }

    fn insert_entry(
        &mut self,
        handle: Handle,
        parent: Option<Handle>,
        order: Option<i64>,
        item: TreeItem,
    ) {
        let document = (item.level == ItemLevel::File).then(|| {
            DocumentRef::new(handle.clone(), item.class, self.document_location.clone())
        });
        if item.level == ItemLevel::Root && parent.is_none() {
            let _ = self.roots.register(item.kind, handle.clone());
        }

        self.lookup.insert(handle.clone(), self.entries.len());
        self.entries.push(TreeEntry {
            handle,
            parent,
            order,
            item,
            document,
            sort_after: None,
        });
        self.stale = true;
    }
}
