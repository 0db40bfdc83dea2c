//! # Row Ingestion Variants
//!
//! The four exported tables are handled by a closed set of row kinds. Each kind
//! has a pure parse function turning the positional CSV fields into a typed
//! row, or into a [`SkipReason`] when the row cannot be used. UUIDs are left
//! as strings here; the [`CatalogBuilder`](crate::catalog::CatalogBuilder)
//! resolves them against the registry.
//!
//! Boolean columns use the Postgres export convention: `t` is true, anything
//! else is false.

use serde::Serialize;
use std::fmt;

/// The exported tables the importer understands, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Attribute,
    AttributeOption,
    CategoryAttribute,
    DynamicAttributeOption,
}

impl TableKind {
    pub const LOAD_ORDER: [TableKind; 4] = [
        TableKind::Attribute,
        TableKind::AttributeOption,
        TableKind::CategoryAttribute,
        TableKind::DynamicAttributeOption,
    ];

    /// File name prefix of the table's export files.
    pub fn file_prefix(self) -> &'static str {
        match self {
            TableKind::Attribute => "attribute.csv.gz",
            TableKind::AttributeOption => "attribute_option.csv.gz",
            TableKind::CategoryAttribute => "category_attribute.csv.gz",
            TableKind::DynamicAttributeOption => "dynamic_attribute_option.csv.gz",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TableKind::Attribute => "attribute",
            TableKind::AttributeOption => "attribute_option",
            TableKind::CategoryAttribute => "category_attribute",
            TableKind::DynamicAttributeOption => "dynamic_attribute_option",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a row (or part of one) was left out of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    TooFewFields,
    InvalidNumber,
    MissingCategory,
    MissingAttribute,
    MissingOption,
    DisabledRow,
    OptionWithoutAttribute,
    UnknownAttribute,
    UnknownOption,
    UnknownCategoryRule,
    AttributeNotInCategory,
    MalformedPrecondition,
    PreconditionIsAttribute,
    UnknownPrecondition,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::TooFewFields => "too few fields",
            SkipReason::InvalidNumber => "invalid number",
            SkipReason::MissingCategory => "empty category id",
            SkipReason::MissingAttribute => "empty attribute id",
            SkipReason::MissingOption => "empty option id",
            SkipReason::DisabledRow => "disabled row",
            SkipReason::OptionWithoutAttribute => "option without attribute",
            SkipReason::UnknownAttribute => "unknown attribute",
            SkipReason::UnknownOption => "unknown option",
            SkipReason::UnknownCategoryRule => "category without rule",
            SkipReason::AttributeNotInCategory => "attribute not in category",
            SkipReason::MalformedPrecondition => "malformed precondition uuid",
            SkipReason::PreconditionIsAttribute => "precondition is an attribute",
            SkipReason::UnknownPrecondition => "unknown precondition",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome<T> {
    Parsed(T),
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRow {
    pub uuid: String,
    pub kind: String,
    pub is_multiple_allowed: bool,
    pub is_required: bool,
    pub is_disabled: bool,
    pub title: String,
    pub display_order: i64,
    pub is_searchable: bool,
    pub listing_type: String,
    pub display_page: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRow {
    pub uuid: String,
    pub attribute_uuid: String,
    pub title: String,
    pub is_disabled: bool,
    pub display_order: i64,
    pub color: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAttributeRow {
    pub uuid: String,
    pub category_id: u32,
    pub attribute_uuid: String,
    pub is_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicOptionRow {
    pub uuid: String,
    pub category_id: u32,
    pub option_uuid: String,
    pub precondition: String,
    pub is_disabled: bool,
}

/// A parsed row of any table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRow {
    Attribute(AttributeRow),
    Option(OptionRow),
    CategoryAttribute(CategoryAttributeRow),
    DynamicOption(DynamicOptionRow),
}

/// Parses `fields` as a row of `kind`.
pub fn parse_row<S: AsRef<str>>(kind: TableKind, fields: &[S]) -> RowOutcome<ParsedRow> {
    let outcome = match kind {
        TableKind::Attribute => parse_attribute(fields).map(ParsedRow::Attribute),
        TableKind::AttributeOption => parse_option(fields).map(ParsedRow::Option),
        TableKind::CategoryAttribute => {
            parse_category_attribute(fields).map(ParsedRow::CategoryAttribute)
        }
        TableKind::DynamicAttributeOption => {
            parse_dynamic_option(fields).map(ParsedRow::DynamicOption)
        }
    };
    match outcome {
        Ok(row) => RowOutcome::Parsed(row),
        Err(reason) => RowOutcome::Skip(reason),
    }
}

// attribute_id, attribute_type, is_multiple_allowed, is_required, is_disabled,
// title, display_order, created_at, updated_at, searchable, listing_type, display_page
pub fn parse_attribute<S: AsRef<str>>(fields: &[S]) -> Result<AttributeRow, SkipReason> {
    let f = Fields::new(fields, 12)?;
    Ok(AttributeRow {
        uuid: f.required(0, SkipReason::MissingAttribute)?,
        kind: f.text(1),
        is_multiple_allowed: f.flag(2),
        is_required: f.flag(3),
        is_disabled: f.flag(4),
        title: f.text(5),
        display_order: f.optional_int(6)?,
        is_searchable: f.flag(9),
        listing_type: f.text(10),
        display_page: f.optional_int(11)?,
    })
}

// attribute_option_id, attribute_id, title, is_disabled, display_order,
// created_at, updated_at, color, subtitle
pub fn parse_option<S: AsRef<str>>(fields: &[S]) -> Result<OptionRow, SkipReason> {
    let f = Fields::new(fields, 9)?;
    Ok(OptionRow {
        uuid: f.required(0, SkipReason::MissingOption)?,
        attribute_uuid: f.required(1, SkipReason::MissingAttribute)?,
        title: f.text(2),
        is_disabled: f.flag(3),
        display_order: f.optional_int(4)?,
        color: f.text(7),
        subtitle: f.text(8),
    })
}

// category_attribute_id, category_id, attribute_id, is_disabled, created_at, updated_at
pub fn parse_category_attribute<S: AsRef<str>>(
    fields: &[S],
) -> Result<CategoryAttributeRow, SkipReason> {
    let f = Fields::new(fields, 4)?;
    Ok(CategoryAttributeRow {
        uuid: f.text(0),
        category_id: f.category_id(1)?,
        attribute_uuid: f.required(2, SkipReason::MissingAttribute)?,
        is_disabled: f.flag(3),
    })
}

// dynamic_attribute_option_id, category_id, attribute_option_id, precondition,
// is_disabled, created_at, updated_at
pub fn parse_dynamic_option<S: AsRef<str>>(fields: &[S]) -> Result<DynamicOptionRow, SkipReason> {
    let f = Fields::new(fields, 5)?;
    Ok(DynamicOptionRow {
        uuid: f.text(0),
        category_id: f.category_id(1)?,
        option_uuid: f.required(2, SkipReason::MissingOption)?,
        precondition: f.text(3),
        is_disabled: f.flag(4),
    })
}

struct Fields<'a, S> {
    fields: &'a [S],
}

impl<'a, S: AsRef<str>> Fields<'a, S> {
    fn new(fields: &'a [S], min_len: usize) -> Result<Self, SkipReason> {
        if fields.len() < min_len {
            return Err(SkipReason::TooFewFields);
        }
        Ok(Self { fields })
    }

    fn get(&self, idx: usize) -> &str {
        self.fields[idx].as_ref()
    }

    fn text(&self, idx: usize) -> String {
        self.get(idx).to_string()
    }

    fn flag(&self, idx: usize) -> bool {
        self.get(idx) == "t"
    }

    /// A reference column; empty and `0` both mean "not set".
    fn required(&self, idx: usize, reason: SkipReason) -> Result<String, SkipReason> {
        match self.get(idx) {
            "" | "0" => Err(reason),
            value => Ok(value.to_string()),
        }
    }

    fn optional_int(&self, idx: usize) -> Result<i64, SkipReason> {
        match self.get(idx).trim() {
            "" => Ok(0),
            value => value.parse().map_err(|_| SkipReason::InvalidNumber),
        }
    }

    fn category_id(&self, idx: usize) -> Result<u32, SkipReason> {
        let value = self.required(idx, SkipReason::MissingCategory)?;
        value.trim().parse().map_err(|_| SkipReason::InvalidNumber)
    }
}
