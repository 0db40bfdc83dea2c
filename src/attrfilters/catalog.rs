//! # Catalog
//!
//! [`CatalogBuilder`] collects rows during the load phase; [`CatalogBuilder::finish`]
//! consumes it, runs the rule compiler once and hands back an immutable
//! [`Catalog`]. There is no way to observe a half-compiled catalog: the staging
//! lists only exist inside the builder.
//!
//! A finished catalog is plain data (`Send + Sync`) and is only read by queries.
//! Lookups of IDs that must exist after compilation ([`Catalog::attribute`],
//! [`Catalog::option`], [`Catalog::rule`]) return an error instead of a default,
//! since continuing would produce wrong results.

use crate::compile::{self, CompileInput, StagedAssignment, StagedDynamicOption, Staging};
use crate::error::{AttrError, Result};
use crate::ids::IdRegistry;
use crate::model::{Attribute, AttributeOption, CategoryRule, CategoryTree};
use crate::rows::{
    AttributeRow, CategoryAttributeRow, DynamicOptionRow, OptionRow, ParsedRow, RowOutcome,
    SkipReason, TableKind, parse_row,
};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// Counters collected while importing and compiling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub rows_read: BTreeMap<TableKind, usize>,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl ImportReport {
    pub fn read(&mut self, kind: TableKind) {
        *self.rows_read.entry(kind).or_default() += 1;
    }

    pub fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_default() += 1;
    }

    pub fn rows(&self, kind: TableKind) -> usize {
        self.rows_read.get(&kind).copied().unwrap_or(0)
    }

    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_read(&self) -> usize {
        self.rows_read.values().sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub attributes: usize,
    pub options: usize,
    pub category_rules: usize,
    /// Rough count of stored references, used to compare catalog sizes.
    pub refs: usize,
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    registry: IdRegistry,
    attributes: BTreeMap<u32, Attribute>,
    options: IndexMap<u32, AttributeOption>,
    categories: CategoryTree,
    staging: Staging,
    report: ImportReport,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(mut self, categories: CategoryTree) -> Self {
        self.categories = categories;
        self
    }

    /// Appends `suffix` to every UUID read from now on. Switch only between
    /// complete import passes.
    pub fn set_uuid_suffix(&mut self, suffix: Option<String>) {
        self.registry.set_suffix(suffix);
    }

    pub fn registry(&self) -> &IdRegistry {
        &self.registry
    }

    pub fn report(&self) -> &ImportReport {
        &self.report
    }

    /// Parses and stages one raw row of `kind`.
    ///
    /// Unusable rows are counted and skipped; only contract violations fail.
    pub fn add_fields<S: AsRef<str>>(&mut self, kind: TableKind, fields: &[S]) -> Result<()> {
        self.report.read(kind);
        match parse_row(kind, fields) {
            RowOutcome::Parsed(row) => self.add_row(row),
            RowOutcome::Skip(reason) => {
                tracing::debug!(table = %kind, %reason, "skipping row");
                self.report.skip(reason);
                Ok(())
            }
        }
    }

    pub fn add_row(&mut self, row: ParsedRow) -> Result<()> {
        match row {
            ParsedRow::Attribute(row) => self.add_attribute(row),
            ParsedRow::Option(row) => self.add_option(row),
            ParsedRow::CategoryAttribute(row) => self.add_category_attribute(row),
            ParsedRow::DynamicOption(row) => self.add_dynamic_option(row),
        }
    }

    fn add_attribute(&mut self, row: AttributeRow) -> Result<()> {
        let id = self.registry.resolve(&row.uuid)?;
        self.attributes.insert(
            id,
            Attribute {
                id,
                kind: row.kind,
                is_multiple_allowed: row.is_multiple_allowed,
                is_required: row.is_required,
                is_disabled: row.is_disabled,
                title: row.title,
                display_order: row.display_order,
                is_searchable: row.is_searchable,
                listing_type: row.listing_type,
                display_page: row.display_page,
                option_ids: Vec::new(),
            },
        );
        Ok(())
    }

    fn add_option(&mut self, row: OptionRow) -> Result<()> {
        let id = self.registry.resolve(&row.uuid)?;
        let attribute_id = self.registry.resolve(&row.attribute_uuid)?;
        self.options.insert(
            id,
            AttributeOption {
                id,
                attribute_id,
                title: row.title,
                is_disabled: row.is_disabled,
                display_order: row.display_order,
                color: row.color,
                subtitle: row.subtitle,
            },
        );
        Ok(())
    }

    fn add_category_attribute(&mut self, row: CategoryAttributeRow) -> Result<()> {
        let attribute_id = self.registry.resolve(&row.attribute_uuid)?;
        self.staging.assignments.push(StagedAssignment {
            category_id: row.category_id,
            attribute_id,
            is_disabled: row.is_disabled,
        });
        Ok(())
    }

    fn add_dynamic_option(&mut self, row: DynamicOptionRow) -> Result<()> {
        let option_id = self.registry.resolve(&row.option_uuid)?;
        self.staging.dynamic_options.push(StagedDynamicOption {
            origin_uuid: row.uuid,
            category_id: row.category_id,
            option_id,
            precondition: row.precondition,
            is_disabled: row.is_disabled,
            key_suffix: self.registry.suffix().map(str::to_string),
        });
        Ok(())
    }

    /// Compiles the staged rows into category rules.
    pub fn finish(self) -> (Catalog, ImportReport) {
        let CatalogBuilder {
            mut registry,
            mut attributes,
            options,
            categories,
            staging,
            mut report,
        } = self;

        let rules = compile::compile(
            CompileInput {
                registry: &registry,
                attributes: &mut attributes,
                options: &options,
            },
            staging,
            &mut report,
        );
        registry.set_suffix(None);

        let catalog = Catalog {
            registry,
            attributes,
            options,
            rules,
            categories,
        };
        (catalog, report)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    registry: IdRegistry,
    attributes: BTreeMap<u32, Attribute>,
    options: IndexMap<u32, AttributeOption>,
    rules: BTreeMap<u32, CategoryRule>,
    categories: CategoryTree,
}

impl Catalog {
    pub fn registry(&self) -> &IdRegistry {
        &self.registry
    }

    pub fn categories(&self) -> &CategoryTree {
        &self.categories
    }

    /// Replaces the category tree used for names; rules are untouched.
    pub fn with_categories(mut self, categories: CategoryTree) -> Self {
        self.categories = categories;
        self
    }

    pub fn attribute(&self, id: u32) -> Result<&Attribute> {
        self.attributes
            .get(&id)
            .ok_or_else(|| AttrError::UnknownAttribute {
                id,
                uuid: self.registry.describe(id),
            })
    }

    pub fn option(&self, id: u32) -> Result<&AttributeOption> {
        self.options
            .get(&id)
            .ok_or_else(|| AttrError::UnknownOption {
                id,
                uuid: self.registry.describe(id),
            })
    }

    pub fn rule(&self, category_id: u32) -> Result<&CategoryRule> {
        self.rules
            .get(&category_id)
            .ok_or(AttrError::UnknownCategoryRule(category_id))
    }

    pub fn find_rule(&self, category_id: u32) -> Option<&CategoryRule> {
        self.rules.get(&category_id)
    }

    /// Rules in ascending category order.
    pub fn rules(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.values()
    }

    pub fn full_category_name(&self, category_id: u32) -> String {
        self.categories.full_name(category_id)
    }

    /// `"<attribute title> - <option title>"` for a selected pair.
    pub fn pair_label(&self, attribute_id: u32, option_id: u32) -> Result<String> {
        let attribute = self.attribute(attribute_id)?;
        let option = self.option(option_id)?;
        Ok(format!("{} - {}", attribute.title, option.title))
    }

    /// Orders rule attributes and attribute options by display order.
    ///
    /// Sorts are stable, so calling this repeatedly changes nothing.
    pub fn presort(&mut self) {
        let attributes = &self.attributes;
        let attribute_order = |id: &u32| attributes.get(id).map_or(0, |a| a.display_order);

        for rule in self.rules.values_mut() {
            rule.attribute_ids.sort_by_key(attribute_order);
            rule.always_visible_attribute_ids.sort_by_key(attribute_order);
        }

        let options = &self.options;
        for attribute in self.attributes.values_mut() {
            attribute
                .option_ids
                .sort_by_key(|id| options.get(id).map_or(0, |o| o.display_order));
        }
    }

    pub fn stats(&self) -> CatalogStats {
        let mut refs = 0;
        for attribute in self.attributes.values() {
            refs += 1 + attribute.option_ids.len();
        }
        refs += self.options.len();
        // forward and reverse id tables
        refs += 2 * self.registry.len();
        for rule in self.rules.values() {
            refs += 1 + rule.attribute_ids.len() + rule.always_visible_attribute_ids.len();
            for groups in rule.show_if_option_selected.values() {
                refs += 1;
                for group in groups {
                    refs += 1 + group.option_ids.len();
                }
            }
        }

        CatalogStats {
            attributes: self.attributes.len(),
            options: self.options.len(),
            category_rules: self.rules.len(),
            refs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Fixture;

    #[test]
    fn lookups_of_missing_ids_fail() {
        let (catalog, _) = CatalogBuilder::new().finish();
        assert!(matches!(
            catalog.attribute(7),
            Err(AttrError::UnknownAttribute { id: 7, .. })
        ));
        assert!(matches!(
            catalog.option(7),
            Err(AttrError::UnknownOption { id: 7, .. })
        ));
        assert!(matches!(
            catalog.rule(7),
            Err(AttrError::UnknownCategoryRule(7))
        ));
        assert!(catalog.find_rule(7).is_none());
    }

    #[test]
    fn options_are_linked_in_table_order() {
        let mut fx = Fixture::new();
        let size = fx.attribute("Size", 1);
        let l = fx.option(size, "L", 3);
        let s = fx.option(size, "S", 1);
        fx.assign(10, size);

        let (catalog, _) = fx.compile();
        let attribute = catalog.attribute(fx.id(size)).unwrap();
        assert_eq!(attribute.option_ids, vec![fx.id(l), fx.id(s)]);
    }

    #[test]
    fn presort_orders_by_display_order_and_is_idempotent() {
        let mut fx = Fixture::new();
        let c = fx.attribute("C", 3);
        let a = fx.attribute("A", 1);
        let b1 = fx.attribute("B1", 2);
        let b2 = fx.attribute("B2", 2);
        let l = fx.option(a, "L", 3);
        let s = fx.option(a, "S", 1);
        for attr in [c, a, b1, b2] {
            fx.assign(10, attr);
        }

        let (mut catalog, _) = fx.compile();
        catalog.presort();
        let expected = vec![fx.id(a), fx.id(b1), fx.id(b2), fx.id(c)];
        assert_eq!(catalog.rule(10).unwrap().attribute_ids, expected);
        assert_eq!(catalog.rule(10).unwrap().always_visible_attribute_ids, expected);
        assert_eq!(
            catalog.attribute(fx.id(a)).unwrap().option_ids,
            vec![fx.id(s), fx.id(l)]
        );

        let once = catalog.rule(10).unwrap().clone();
        catalog.presort();
        assert_eq!(catalog.rule(10).unwrap(), &once);
    }

    #[test]
    fn pair_label_uses_titles() {
        let mut fx = Fixture::new();
        let color = fx.attribute("Color", 1);
        let red = fx.option(color, "Red", 1);
        fx.assign(10, color);

        let (catalog, _) = fx.compile();
        assert_eq!(
            catalog.pair_label(fx.id(color), fx.id(red)).unwrap(),
            "Color - Red"
        );
        assert!(catalog.pair_label(fx.id(color), 999).is_err());
    }

    #[test]
    fn report_counts_rows_per_table() {
        let mut builder = CatalogBuilder::new();
        builder
            .add_fields(TableKind::AttributeOption, &["a", ""])
            .unwrap();
        assert_eq!(builder.report().rows(TableKind::AttributeOption), 1);
        assert_eq!(builder.report().skipped(SkipReason::TooFewFields), 1);
        assert_eq!(builder.report().total_read(), 1);
    }

    #[test]
    fn stats_count_entities() {
        let mut fx = Fixture::new();
        let color = fx.attribute("Color", 1);
        fx.option(color, "Red", 1);
        fx.option(color, "Blue", 2);
        fx.assign(10, color);

        let (catalog, _) = fx.compile();
        let stats = catalog.stats();
        assert_eq!(stats.attributes, 1);
        assert_eq!(stats.options, 2);
        assert_eq!(stats.category_rules, 1);
        // attribute (1 + 2 options) + 2 options + 2 * 3 ids + rule (1 + 1 + 1)
        assert_eq!(stats.refs, 3 + 2 + 6 + 3);
    }
}
