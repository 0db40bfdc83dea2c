//! # Visibility Resolver
//!
//! Answers "which attributes and options should be shown for this category,
//! given what the user already selected?" against a compiled [`Catalog`].
//!
//! The result has two parts:
//!
//! - Always-visible attributes, each with up to `page_size` options (optionally
//!   narrowed by a title prefix), plus the number of pages the longest option
//!   list needs.
//! - Attributes unlocked by selected trigger options, listing exactly the
//!   options their triggers unlock.
//!
//! The caller's selection is echoed back as `corrected`, minus any pair that
//! no longer refers to a visible attribute and option. Callers rely on this to
//! drop stale selections, so it is never reported as an error.
//!
//! Resolution only reads the catalog; any number of queries can share one.

use crate::catalog::Catalog;
use crate::error::{AttrError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const MAX_PAGE_SIZE: usize = 1_000;

/// A selected option of an attribute, written as `"<attribute>-<option>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeCondition {
    pub attribute_id: u32,
    pub option_id: u32,
}

impl AttributeCondition {
    pub fn new(attribute_id: u32, option_id: u32) -> Self {
        Self {
            attribute_id,
            option_id,
        }
    }
}

impl fmt::Display for AttributeCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.attribute_id, self.option_id)
    }
}

impl FromStr for AttributeCondition {
    type Err = AttrError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AttrError::InvalidCondition(format!("expected <attribute>-<option>, got {s:?}"));
        let (attribute, option) = s.split_once('-').ok_or_else(invalid)?;
        Ok(Self {
            attribute_id: attribute.trim().parse().map_err(|_| invalid())?,
            option_id: option.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// Keeps only options of `attribute_id` whose title starts with `prefix`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionFilter {
    pub attribute_id: u32,
    pub prefix: String,
}

impl FromStr for OptionFilter {
    type Err = AttrError;

    /// Parses `"<attribute>:<prefix>"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AttrError::InvalidCondition(format!("expected <attribute>:<prefix>, got {s:?}"));
        let (attribute, prefix) = s.split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            attribute_id: attribute.trim().parse().map_err(|_| invalid())?,
            prefix: prefix.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConditions {
    #[serde(rename = "category_id")]
    pub category_ids: Vec<u32>,
    pub attributes: Vec<AttributeCondition>,
    pub page_size: usize,
    /// Reserved; echoed back but not used for paging yet.
    pub offset: usize,
    pub filters: Vec<OptionFilter>,
}

impl SearchConditions {
    pub fn for_category(category_id: u32) -> Self {
        Self {
            category_ids: vec![category_id],
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_selection(mut self, attribute_id: u32, option_id: u32) -> Self {
        self.attributes
            .push(AttributeCondition::new(attribute_id, option_id));
        self
    }

    pub fn with_filter(mut self, attribute_id: u32, prefix: impl Into<String>) -> Self {
        self.filters.push(OptionFilter {
            attribute_id,
            prefix: prefix.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleOption {
    pub id: u32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleAttribute {
    pub id: u32,
    pub title: String,
    pub options: Vec<VisibleOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleAttributes {
    pub pages: usize,
    pub page_size: usize,
    pub attributes: Vec<VisibleAttribute>,
    pub corrected: SearchConditions,
}

impl VisibleAttributes {
    pub fn get(&self, attribute_id: u32) -> Option<&VisibleAttribute> {
        self.attributes.iter().find(|va| va.id == attribute_id)
    }
}

/// 0 means the default; anything above the maximum is clamped.
pub fn effective_page_size(requested: usize) -> usize {
    match requested {
        0 => DEFAULT_PAGE_SIZE,
        n => n.min(MAX_PAGE_SIZE),
    }
}

pub fn find_visible_attributes(
    conditions: &SearchConditions,
    catalog: &Catalog,
) -> Result<VisibleAttributes> {
    let category_id = match conditions.category_ids.as_slice() {
        [] => return Ok(VisibleAttributes::default()),
        [id] => *id,
        _ => {
            return Err(AttrError::Unimplemented(
                "cannot handle multiple category IDs yet".to_string(),
            ));
        }
    };
    let page_size = effective_page_size(conditions.page_size);
    let rule = catalog.rule(category_id)?;

    // Trigger lookup follows selection order
    let mut seen = HashSet::new();
    let selected_options: Vec<u32> = conditions
        .attributes
        .iter()
        .map(|c| c.option_id)
        .filter(|id| seen.insert(*id))
        .collect();

    // TODO: honour more than one option filter
    let filter = conditions.filters.first().filter(|f| !f.prefix.is_empty());

    let mut result = VisibleAttributes {
        pages: 1,
        page_size,
        ..VisibleAttributes::default()
    };
    let mut visible_options: HashSet<u32> = HashSet::new();

    for &attribute_id in &rule.always_visible_attribute_ids {
        let attribute = catalog.attribute(attribute_id)?;

        let pages = attribute.option_ids.len().div_ceil(page_size);
        result.pages = result.pages.max(pages);

        let prefix = filter
            .filter(|f| f.attribute_id == attribute.id)
            .map(|f| f.prefix.as_str());

        let mut options = Vec::new();
        for &option_id in &attribute.option_ids {
            let option = catalog.option(option_id)?;
            if prefix.is_some_and(|p| !option.title.starts_with(p)) {
                continue;
            }
            options.push(VisibleOption {
                id: option.id,
                title: option.title.clone(),
            });
            if options.len() >= page_size {
                break;
            }
        }

        // An attribute without options has nothing to offer
        if options.is_empty() {
            continue;
        }
        visible_options.extend(options.iter().map(|o| o.id));
        result.attributes.push(VisibleAttribute {
            id: attribute.id,
            title: attribute.title.clone(),
            options,
        });
    }

    // When two selected triggers unlock the same attribute, the smaller
    // option list wins.
    let mut unlocked: IndexMap<u32, &[u32]> = IndexMap::new();
    for option_id in &selected_options {
        let Some(groups) = rule.show_if_option_selected.get(option_id) else {
            continue;
        };
        for group in groups {
            match unlocked.get_mut(&group.attribute_id) {
                Some(current) if group.option_ids.len() < current.len() => {
                    *current = &group.option_ids;
                }
                Some(_) => {}
                None => {
                    unlocked.insert(group.attribute_id, &group.option_ids);
                }
            }
        }
    }

    for (attribute_id, option_ids) in unlocked {
        let attribute = catalog.attribute(attribute_id)?;
        let mut options = Vec::with_capacity(option_ids.len());
        for &option_id in option_ids {
            let option = catalog.option(option_id)?;
            visible_options.insert(option.id);
            options.push(VisibleOption {
                id: option.id,
                title: option.title.clone(),
            });
        }
        result.attributes.push(VisibleAttribute {
            id: attribute.id,
            title: attribute.title.clone(),
            options,
        });
    }

    let visible_attributes: HashSet<u32> = result.attributes.iter().map(|va| va.id).collect();
    result.corrected = SearchConditions {
        category_ids: vec![category_id],
        attributes: conditions
            .attributes
            .iter()
            .filter(|c| {
                visible_attributes.contains(&c.attribute_id)
                    && visible_options.contains(&c.option_id)
            })
            .copied()
            .collect(),
        page_size,
        offset: conditions.offset,
        filters: conditions.filters.clone(),
    };

    Ok(result)
}
