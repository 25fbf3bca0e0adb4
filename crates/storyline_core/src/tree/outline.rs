//! Chapter outline projection of the book category.

use super::ProjectTree;
use crate::model::handle::Handle;
use crate::model::item::{CompileFlag, ItemLevel, ItemSubType, ItemType};
use serde::Serialize;

/// One row of the chapter outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterRow {
    pub handle: Handle,
    pub subtype: Option<ItemSubType>,
    pub number: Option<u32>,
    pub name: String,
    pub compile: CompileFlag,
    pub comment: String,
}

impl ProjectTree {
    /// Book containers at item level, in item order as of the last sort.
    pub fn chapter_rows(&self) -> Vec<ChapterRow> {
        self.view
            .item_order
            .iter()
            .filter_map(|handle| self.lookup.get(handle).map(|&index| &self.entries[index]))
            .filter(|entry| {
                entry.item.level == ItemLevel::Item
                    && entry.item.kind == ItemType::Book
                    && entry.item.is_container()
            })
            .map(|entry| ChapterRow {
                handle: entry.handle.clone(),
                subtype: entry.item.subtype,
                number: entry.item.number,
                name: entry.item.name.clone(),
                compile: entry.item.compile,
                comment: entry.item.comment.clone(),
            })
            .collect()
    }
}
