use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_multiple_allowed: bool,
    pub is_required: bool,
    pub is_disabled: bool,
    pub title: String,
    pub display_order: i64,
    pub is_searchable: bool,
    pub listing_type: String,
    pub display_page: i64,
    // Filled during compilation, in option-table order
    pub option_ids: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeOption {
    pub id: u32,
    pub attribute_id: u32,
    pub title: String,
    pub is_disabled: bool,
    pub display_order: i64,
    /// Raw JSON as exported, e.g. `{"red":0,"green":0,"blue":0}`
    pub color: String,
    pub subtitle: String,
}

/// A node of the category tree, e.g. `{"id":1165,"name":"Tents","order":50,"parent_id":1164,"path":[8,1164]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub parent_id: Option<u32>,
    /// Ancestor IDs from the root down to (excluding) this category.
    #[serde(default)]
    pub path: Vec<u32>,
}

/// The whole category tree keyed by category ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree {
    categories: BTreeMap<u32, Category>,
}

impl CategoryTree {
    pub fn new(categories: BTreeMap<u32, Category>) -> Self {
        Self { categories }
    }

    pub fn get(&self, id: u32) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Breadcrumb name such as `"Ladies - Accessories - Wallets"`.
    ///
    /// Unknown categories (or unknown ancestors) are rendered by their ID.
    pub fn full_name(&self, id: u32) -> String {
        let Some(category) = self.categories.get(&id) else {
            return id.to_string();
        };
        let mut names: Vec<String> = category
            .path
            .iter()
            .map(|ancestor| match self.categories.get(ancestor) {
                Some(c) => c.name.clone(),
                None => ancestor.to_string(),
            })
            .collect();
        names.push(category.name.clone());
        names.join(" - ")
    }
}

/// Options of one attribute that become visible once a trigger option is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitedOptions {
    pub attribute_id: u32,
    pub option_ids: Vec<u32>,
}

/// Compiled visibility rules for a single category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category_id: u32,
    /// Every attribute assigned to the category.
    pub attribute_ids: Vec<u32>,
    /// Attributes none of whose options is gated by a precondition.
    pub always_visible_attribute_ids: Vec<u32>,
    /// Options listed without a precondition.
    pub show_option_always: BTreeSet<u32>,
    /// Trigger option ID -> the option groups it unlocks.
    pub show_if_option_selected: BTreeMap<u32, Vec<LimitedOptions>>,
}

impl CategoryRule {
    pub fn new(category_id: u32) -> Self {
        Self {
            category_id,
            ..Self::default()
        }
    }

    /// Registers `option` (of `attribute_id`) as visible when `trigger_id` is selected.
    ///
    /// Groups are keyed by attribute: a second option of the same attribute under
    /// the same trigger joins the existing group.
    pub fn add_limited_option(&mut self, trigger_id: u32, attribute_id: u32, option_id: u32) {
        let groups = self.show_if_option_selected.entry(trigger_id).or_default();
        match groups.iter_mut().find(|g| g.attribute_id == attribute_id) {
            Some(group) => group.option_ids.push(option_id),
            None => groups.push(LimitedOptions {
                attribute_id,
                option_ids: vec![option_id],
            }),
        }
    }

    /// Attributes that have at least one option behind a trigger.
    pub fn gated_attribute_ids(&self) -> BTreeSet<u32> {
        self.show_if_option_selected
            .values()
            .flatten()
            .map(|g| g.attribute_id)
            .collect()
    }
}
