//! Typed append operations for the outline categories.

use super::error::{TreeError, TreeResult};
use super::ProjectTree;
use crate::model::handle::Handle;
use crate::model::item::{
    CompileFlag, ItemClass, ItemLevel, ItemSubType, ItemType, TreeItem,
};
use log::info;

impl ProjectTree {
    /// Appends a new chapter under the book root and resorts.
    pub fn add_chapter(&mut self) -> TreeResult<Handle> {
        let item = TreeItem::new(ItemClass::Container, ItemLevel::Item, ItemType::Book, "New Chapter")
            .with_subtype(ItemSubType::Chapter)
            .with_compile(CompileFlag::Yes);
        self.add_category_item(item)
    }

    /// Appends a new character under the character root and resorts.
    pub fn add_character(&mut self) -> TreeResult<Handle> {
        let item = TreeItem::new(
            ItemClass::Container,
            ItemLevel::Item,
            ItemType::Character,
            "New Character",
        );
        self.add_category_item(item)
    }

    /// Appends a new plot thread under the plot root and resorts.
    pub fn add_plot(&mut self) -> TreeResult<Handle> {
        let item = TreeItem::new(ItemClass::Container, ItemLevel::Item, ItemType::Plot, "New Plot");
        self.add_category_item(item)
    }

    /// Appends a new file under the nearest container at or above `parent`.
    ///
    /// Book containers get a compiled scene; every other category gets a note.
    ///
    /// # Errors
    /// - `NotFound` when `parent` is unknown.
    /// - `InvalidParent` when no container is reachable from `parent`.
    pub fn add_file(&mut self, parent: &Handle) -> TreeResult<Handle> {
        self.index_of(parent)?;
        let container = self
            .container_ancestor(Some(parent))
            .ok_or_else(|| TreeError::InvalidParent {
                parent: parent.clone(),
                reason: "a file must be added below a container",
            })?;

        let kind = self.get(&container)?.item.kind;
        let item = match kind {
            ItemType::Book => {
                TreeItem::new(ItemClass::Scene, ItemLevel::File, kind, "New Scene")
                    .with_compile(CompileFlag::Yes)
            }
            _ => TreeItem::new(ItemClass::Note, ItemLevel::File, kind, "New Note")
                .with_compile(CompileFlag::NotApplicable),
        };

        let handle = self.append(None, Some(container.clone()), None, item)?;
        info!(
            "event=tree_add module=tree status=ok level=file kind={} handle={} parent={}",
            kind.as_str(),
            handle,
            container
        );
        self.sort();
        Ok(handle)
    }

    fn add_category_item(&mut self, item: TreeItem) -> TreeResult<Handle> {
        let kind = item.kind;
        let root = self.ensure_root(kind)?;
        let handle = self.append(None, Some(root), None, item)?;
        info!(
            "event=tree_add module=tree status=ok level=item kind={} handle={}",
            kind.as_str(),
            handle
        );
        self.sort();
        Ok(handle)
    }

    /// Registered root for `kind`, created on demand.
    fn ensure_root(&mut self, kind: ItemType) -> TreeResult<Handle> {
        match self.roots.get(kind) {
            Some(root) => Ok(root.clone()),
            None => self.create_root(kind),
        }
    }
}
