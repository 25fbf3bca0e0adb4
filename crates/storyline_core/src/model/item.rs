//! Tree item payload model.
//!
//! # Responsibility
//! - Define the classification enums (class, level, type, subtype, compile).
//! - Validate item fields and apply single-field updates.
//!
//! # Invariants
//! - `name` is non-empty after trimming.
//! - `number`, when set, lies in `1..=MAX_ITEM_NUMBER`.
//! - `CompileFlag::NotApplicable` is never used on a `Book` typed item.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Largest accepted item number.
pub const MAX_ITEM_NUMBER: u32 = 999;

/// Structural class of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemClass {
    /// Can own file-level children.
    Container,
    /// Manuscript text under the book root.
    Scene,
    /// Free-form note under any other root.
    Note,
}

impl ItemClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Scene => "scene",
            Self::Note => "note",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "container" => Some(Self::Container),
            "scene" => Some(Self::Scene),
            "note" => Some(Self::Note),
            _ => None,
        }
    }
}

/// Depth of an item in the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemLevel {
    Root,
    Item,
    File,
}

impl ItemLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Item => "item",
            Self::File => "file",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "root" => Some(Self::Root),
            "item" => Some(Self::Item),
            "file" => Some(Self::File),
            _ => None,
        }
    }
}

/// Fixed project category. Every category owns exactly one root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Book,
    Character,
    Plot,
    Note,
}

impl ItemType {
    /// Declared root sequence used by the sorter.
    pub const FIXED_ORDER: [ItemType; 4] = [Self::Book, Self::Character, Self::Plot, Self::Note];

    /// Slot of this type inside `FIXED_ORDER`.
    pub fn index(self) -> usize {
        match self {
            Self::Book => 0,
            Self::Character => 1,
            Self::Plot => 2,
            Self::Note => 3,
        }
    }

    /// Canonical name of the auto-created root.
    pub fn root_name(self) -> &'static str {
        match self {
            Self::Book => "Book",
            Self::Character => "Characters",
            Self::Plot => "Plots",
            Self::Note => "Notes",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Character => "character",
            Self::Plot => "plot",
            Self::Note => "note",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "book" => Some(Self::Book),
            "character" => Some(Self::Character),
            "plot" => Some(Self::Plot),
            "note" => Some(Self::Note),
            _ => None,
        }
    }
}

/// Book section an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSubType {
    Unassigned,
    Prologue,
    Chapter,
    Epilogue,
    Archived,
}

impl ItemSubType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Prologue => "prologue",
            Self::Chapter => "chapter",
            Self::Epilogue => "epilogue",
            Self::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unassigned" => Some(Self::Unassigned),
            "prologue" => Some(Self::Prologue),
            "chapter" => Some(Self::Chapter),
            "epilogue" => Some(Self::Epilogue),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Whether an item takes part in manuscript compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileFlag {
    Yes,
    No,
    /// Only valid for items outside the book category.
    NotApplicable,
}

impl CompileFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::NotApplicable => "not_applicable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yes" | "true" | "1" => Some(Self::Yes),
            "no" | "false" | "0" => Some(Self::No),
            "not_applicable" | "n/a" | "na" | "none" | "" => Some(Self::NotApplicable),
            _ => None,
        }
    }

    /// Default flag for a new item of `kind`.
    pub fn default_for(kind: ItemType) -> Self {
        if kind == ItemType::Book {
            Self::Yes
        } else {
            Self::NotApplicable
        }
    }
}

/// Closed set of item fields that may be changed after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemField {
    Name,
    Number,
    SubType,
    Compile,
    Comment,
}

impl ItemField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Number => "number",
            Self::SubType => "subtype",
            Self::Compile => "compile",
            Self::Comment => "comment",
        }
    }
}

impl FromStr for ItemField {
    type Err = ItemValidationError;

    /// Accepts the symbolic field name, case-insensitive. `section` is an
    /// alias for `subtype`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "number" => Ok(Self::Number),
            "subtype" | "section" => Ok(Self::SubType),
            "compile" => Ok(Self::Compile),
            "comment" => Ok(Self::Comment),
            other => Err(ItemValidationError::UnknownField(other.to_string())),
        }
    }
}

impl Display for ItemField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed field change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemUpdate {
    Name(String),
    Number(Option<u32>),
    SubType(Option<ItemSubType>),
    Compile(CompileFlag),
    Comment(String),
}

impl ItemUpdate {
    /// Builds an update from a raw textual value.
    ///
    /// The value is trimmed first. An empty value (or `none`) clears optional
    /// fields.
    pub fn parse(field: ItemField, raw: &str) -> Result<Self, ItemValidationError> {
        let value = raw.trim();
        let cleared = value.is_empty() || value.eq_ignore_ascii_case("none");
        let invalid = || ItemValidationError::InvalidValue {
            field,
            value: value.to_string(),
        };

        match field {
            ItemField::Name => Ok(Self::Name(value.to_string())),
            ItemField::Comment => Ok(Self::Comment(value.to_string())),
            ItemField::Number if cleared => Ok(Self::Number(None)),
            ItemField::Number => value
                .parse::<u32>()
                .map(|number| Self::Number(Some(number)))
                .map_err(|_| invalid()),
            ItemField::SubType if cleared => Ok(Self::SubType(None)),
            ItemField::SubType => ItemSubType::parse(&value.to_ascii_lowercase())
                .map(|subtype| Self::SubType(Some(subtype)))
                .ok_or_else(invalid),
            ItemField::Compile => CompileFlag::parse(&value.to_ascii_lowercase())
                .map(Self::Compile)
                .ok_or_else(invalid),
        }
    }

    pub fn field(&self) -> ItemField {
        match self {
            Self::Name(_) => ItemField::Name,
            Self::Number(_) => ItemField::Number,
            Self::SubType(_) => ItemField::SubType,
            Self::Compile(_) => ItemField::Compile,
            Self::Comment(_) => ItemField::Comment,
        }
    }
}

/// Validation failures for item payloads and updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    /// Name is blank after trimming.
    EmptyName,
    /// Number is zero or above `MAX_ITEM_NUMBER`.
    NumberOutOfRange(u32),
    /// Book items must compile or explicitly not compile.
    CompileRequiredForBook,
    /// Symbolic field name is not in the mutable field set.
    UnknownField(String),
    /// Raw value cannot be converted for the named field.
    InvalidValue { field: ItemField, value: String },
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "item name must not be blank"),
            Self::NumberOutOfRange(number) => write!(
                f,
                "item number {number} is outside 1..={MAX_ITEM_NUMBER}"
            ),
            Self::CompileRequiredForBook => {
                write!(f, "book items require an explicit compile flag")
            }
            Self::UnknownField(name) => write!(f, "unknown item field `{name}`"),
            Self::InvalidValue { field, value } => {
                write!(f, "invalid value `{value}` for item field `{field}`")
            }
        }
    }
}

impl Error for ItemValidationError {}

/// Payload of one tree entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeItem {
    pub class: ItemClass,
    pub level: ItemLevel,
    /// Serialized as `type` to match the project file vocabulary.
    #[serde(rename = "type")]
    pub kind: ItemType,
    pub subtype: Option<ItemSubType>,
    pub name: String,
    pub number: Option<u32>,
    pub compile: CompileFlag,
    #[serde(default)]
    pub comment: String,
}

impl TreeItem {
    /// Creates an item with the default compile flag for `kind`.
    pub fn new(class: ItemClass, level: ItemLevel, kind: ItemType, name: impl Into<String>) -> Self {
        Self {
            class,
            level,
            kind,
            subtype: None,
            name: name.into().trim().to_string(),
            number: None,
            compile: CompileFlag::default_for(kind),
            comment: String::new(),
        }
    }

    pub fn with_subtype(mut self, subtype: ItemSubType) -> Self {
        self.subtype = Some(subtype);
        self
    }

    pub fn with_compile(mut self, compile: CompileFlag) -> Self {
        self.compile = compile;
        self
    }

    pub fn is_container(&self) -> bool {
        self.class == ItemClass::Container
    }

    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::EmptyName);
        }
        if let Some(number) = self.number {
            if number == 0 || number > MAX_ITEM_NUMBER {
                return Err(ItemValidationError::NumberOutOfRange(number));
            }
        }
        if self.kind == ItemType::Book && self.compile == CompileFlag::NotApplicable {
            return Err(ItemValidationError::CompileRequiredForBook);
        }
        Ok(())
    }

    /// Name given to new entries of this shape.
    pub fn default_name(class: ItemClass, level: ItemLevel, kind: ItemType) -> &'static str {
        match (level, class, kind) {
            (ItemLevel::Root, _, kind) => kind.root_name(),
            (ItemLevel::Item, _, ItemType::Book) => "New Chapter",
            (ItemLevel::Item, _, ItemType::Character) => "New Character",
            (ItemLevel::Item, _, ItemType::Plot) => "New Plot",
            (ItemLevel::File, ItemClass::Scene, _) => "New Scene",
            _ => "New Note",
        }
    }

    /// Resets every field that fails validation to a valid value.
    ///
    /// Returns the reset fields with the error each one had.
    pub fn repair(&mut self) -> Vec<(ItemField, ItemValidationError)> {
        let mut reset = Vec::new();
        if self.name.trim().is_empty() {
            self.name = Self::default_name(self.class, self.level, self.kind).to_string();
            reset.push((ItemField::Name, ItemValidationError::EmptyName));
        }
        if let Some(number) = self.number.filter(|&n| n == 0 || n > MAX_ITEM_NUMBER) {
            self.number = None;
            reset.push((ItemField::Number, ItemValidationError::NumberOutOfRange(number)));
        }
        if self.kind == ItemType::Book && self.compile == CompileFlag::NotApplicable {
            self.compile = CompileFlag::default_for(self.kind);
            reset.push((ItemField::Compile, ItemValidationError::CompileRequiredForBook));
        }
        reset
    }

    /// Applies one field change; the item is left untouched when the result
    /// would not validate.
    pub fn apply(&mut self, update: ItemUpdate) -> Result<(), ItemValidationError> {
        let mut next = self.clone();
        match update {
            ItemUpdate::Name(name) => next.name = name.trim().to_string(),
            ItemUpdate::Number(number) => next.number = number,
            ItemUpdate::SubType(subtype) => next.subtype = subtype,
            ItemUpdate::Compile(compile) => next.compile = compile,
            ItemUpdate::Comment(comment) => next.comment = comment,
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter() -> TreeItem {
        TreeItem::new(ItemClass::Container, ItemLevel::Item, ItemType::Book, "Opening")
            .with_subtype(ItemSubType::Chapter)
    }

    #[test]
    fn new_item_picks_compile_default_by_type() {
        assert_eq!(chapter().compile, CompileFlag::Yes);
        let plot = TreeItem::new(ItemClass::Container, ItemLevel::Item, ItemType::Plot, "Arc");
        assert_eq!(plot.compile, CompileFlag::NotApplicable);
    }

    #[test]
    fn field_names_parse_case_insensitively() {
        assert_eq!("Name".parse::<ItemField>().unwrap(), ItemField::Name);
        assert_eq!(" section ".parse::<ItemField>().unwrap(), ItemField::SubType);
        assert_eq!(
            "colour".parse::<ItemField>().unwrap_err(),
            ItemValidationError::UnknownField("colour".to_string())
        );
    }

    #[test]
    fn apply_rejects_blank_name_and_keeps_previous() {
        let mut item = chapter();
        let err = item.apply(ItemUpdate::Name("   ".to_string())).unwrap_err();
        assert_eq!(err, ItemValidationError::EmptyName);
        assert_eq!(item.name, "Opening");
    }

    #[test]
    fn number_updates_respect_bounds() {
        let mut item = chapter();
        item.apply(ItemUpdate::parse(ItemField::Number, " 12 ").unwrap())
            .unwrap();
        assert_eq!(item.number, Some(12));

        let err = item
            .apply(ItemUpdate::parse(ItemField::Number, "1000").unwrap())
            .unwrap_err();
        assert_eq!(err, ItemValidationError::NumberOutOfRange(1000));

        item.apply(ItemUpdate::parse(ItemField::Number, "").unwrap())
            .unwrap();
        assert_eq!(item.number, None);

        assert!(matches!(
            ItemUpdate::parse(ItemField::Number, "twelve"),
            Err(ItemValidationError::InvalidValue {
                field: ItemField::Number,
                ..
            })
        ));
    }

    #[test]
    fn book_items_cannot_drop_compile_flag() {
        let mut item = chapter();
        let update = ItemUpdate::parse(ItemField::Compile, "n/a").unwrap();
        assert_eq!(
            item.apply(update).unwrap_err(),
            ItemValidationError::CompileRequiredForBook
        );

        let mut plot = TreeItem::new(ItemClass::Container, ItemLevel::Item, ItemType::Plot, "Arc");
        plot.apply(ItemUpdate::parse(ItemField::Compile, "Yes").unwrap())
            .unwrap();
        assert_eq!(plot.compile, CompileFlag::Yes);
    }

    #[test]
    fn subtype_parses_known_sections() {
        assert_eq!(
            ItemUpdate::parse(ItemField::SubType, "Epilogue").unwrap(),
            ItemUpdate::SubType(Some(ItemSubType::Epilogue))
        );
        assert_eq!(
            ItemUpdate::parse(ItemField::SubType, "none").unwrap(),
            ItemUpdate::SubType(None)
        );
        assert!(ItemUpdate::parse(ItemField::SubType, "appendix").is_err());
    }

    #[test]
    fn tags_round_trip_through_text() {
        for kind in ItemType::FIXED_ORDER {
            assert_eq!(ItemType::parse(kind.as_str()), Some(kind));
        }
        for level in [ItemLevel::Root, ItemLevel::Item, ItemLevel::File] {
            assert_eq!(ItemLevel::parse(level.as_str()), Some(level));
        }
        for class in [ItemClass::Container, ItemClass::Scene, ItemClass::Note] {
            assert_eq!(ItemClass::parse(class.as_str()), Some(class));
        }
        assert_eq!(CompileFlag::parse("not_applicable"), Some(CompileFlag::NotApplicable));
    }

    #[test]
    fn repair_resets_only_invalid_fields() {
        let mut item = chapter();
        item.name = "  ".to_string();
        item.number = Some(1000);
        item.compile = CompileFlag::NotApplicable;
        item.comment = "keep".to_string();

        let reset: Vec<ItemField> = item.repair().into_iter().map(|(field, _)| field).collect();
        assert_eq!(reset, vec![ItemField::Name, ItemField::Number, ItemField::Compile]);
        assert_eq!(item.name, "New Chapter");
        assert_eq!(item.number, None);
        assert_eq!(item.compile, CompileFlag::Yes);
        assert_eq!(item.comment, "keep");
        assert!(item.validate().is_ok());
        assert!(item.repair().is_empty());
    }
}
