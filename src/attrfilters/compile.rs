//! # Rule Compiler
//!
//! Turns the staged category assignments and dynamic option rows into one
//! [`CategoryRule`] per category. This runs exactly once, after every table has
//! been loaded: classifying an attribute as always-visible needs the complete
//! assignment list, and resolving precondition UUIDs needs the complete
//! registry.
//!
//! Bad cross-references never abort the compile. Each one is logged at debug
//! level and counted in the [`ImportReport`] under its [`SkipReason`].

use crate::catalog::ImportReport;
use crate::ids::IdRegistry;
use crate::model::{Attribute, AttributeOption, CategoryRule};
use crate::precondition::{Precondition, parse_precondition};
use crate::rows::SkipReason;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StagedAssignment {
    pub category_id: u32,
    pub attribute_id: u32,
    pub is_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StagedDynamicOption {
    pub origin_uuid: String,
    pub category_id: u32,
    pub option_id: u32,
    pub precondition: String,
    pub is_disabled: bool,
    /// Registry suffix active when the row was read.
    pub key_suffix: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Staging {
    pub assignments: Vec<StagedAssignment>,
    pub dynamic_options: Vec<StagedDynamicOption>,
}

pub(crate) struct CompileInput<'a> {
    pub registry: &'a IdRegistry,
    pub attributes: &'a mut BTreeMap<u32, Attribute>,
    pub options: &'a IndexMap<u32, AttributeOption>,
}

pub(crate) fn compile(
    input: CompileInput<'_>,
    staging: Staging,
    report: &mut ImportReport,
) -> BTreeMap<u32, CategoryRule> {
    let start = Instant::now();
    let CompileInput {
        registry,
        attributes,
        options,
    } = input;

    tracing::debug!(ids = registry.len(), "reverse id table ready");

    link_options(attributes, options, report);

    let mut rules = build_rules(attributes, &staging.assignments, report);

    for row in &staging.dynamic_options {
        apply_dynamic_option(row, registry, attributes, options, &mut rules, report);
    }

    for rule in rules.values_mut() {
        classify_always_visible(rule);
    }

    tracing::info!(
        rules = rules.len(),
        skipped = report.total_skipped(),
        elapsed = ?start.elapsed(),
        "finished compiling category rules"
    );
    rules
}

/// Gives every attribute its option list, in option-table order.
fn link_options(
    attributes: &mut BTreeMap<u32, Attribute>,
    options: &IndexMap<u32, AttributeOption>,
    report: &mut ImportReport,
) {
    for option in options.values() {
        match attributes.get_mut(&option.attribute_id) {
            Some(attribute) => attribute.option_ids.push(option.id),
            None => {
                tracing::debug!(
                    option = option.id,
                    attribute = option.attribute_id,
                    "option references unknown attribute"
                );
                report.skip(SkipReason::OptionWithoutAttribute);
            }
        }
    }
}

fn build_rules(
    attributes: &BTreeMap<u32, Attribute>,
    assignments: &[StagedAssignment],
    report: &mut ImportReport,
) -> BTreeMap<u32, CategoryRule> {
    let mut rules: BTreeMap<u32, CategoryRule> = BTreeMap::new();

    for row in assignments {
        if row.is_disabled {
            report.skip(SkipReason::DisabledRow);
            continue;
        }
        if !attributes.contains_key(&row.attribute_id) {
            tracing::debug!(
                category = row.category_id,
                attribute = row.attribute_id,
                "category assignment references unknown attribute"
            );
            report.skip(SkipReason::UnknownAttribute);
            continue;
        }
        rules
            .entry(row.category_id)
            .or_insert_with(|| CategoryRule::new(row.category_id))
            .attribute_ids
            .push(row.attribute_id);
    }

    rules
}

fn apply_dynamic_option(
    row: &StagedDynamicOption,
    registry: &IdRegistry,
    attributes: &BTreeMap<u32, Attribute>,
    options: &IndexMap<u32, AttributeOption>,
    rules: &mut BTreeMap<u32, CategoryRule>,
    report: &mut ImportReport,
) {
    if row.is_disabled {
        report.skip(SkipReason::DisabledRow);
        return;
    }
    let Some(option) = options.get(&row.option_id) else {
        tracing::debug!(row = %row.origin_uuid, option = row.option_id, "dynamic option references unknown option");
        report.skip(SkipReason::UnknownOption);
        return;
    };
    let Some(rule) = rules.get_mut(&row.category_id) else {
        tracing::debug!(row = %row.origin_uuid, category = row.category_id, "dynamic option for category without rule");
        report.skip(SkipReason::UnknownCategoryRule);
        return;
    };

    match parse_precondition(&row.precondition) {
        Precondition::Always => {
            if !rule.attribute_ids.contains(&option.attribute_id) {
                tracing::debug!(
                    row = %row.origin_uuid,
                    attribute = option.attribute_id,
                    category = row.category_id,
                    "attribute not among category attributes"
                );
                report.skip(SkipReason::AttributeNotInCategory);
                return;
            }
            rule.show_option_always.insert(option.id);
        }
        Precondition::Triggers { uuids, rejected } => {
            if !attributes.contains_key(&option.attribute_id) {
                tracing::debug!(
                    row = %row.origin_uuid,
                    option = option.id,
                    attribute = option.attribute_id,
                    "gated option of unknown attribute"
                );
                report.skip(SkipReason::OptionWithoutAttribute);
                return;
            }
            for fragment in &rejected {
                tracing::debug!(row = %row.origin_uuid, %fragment, "invalid precondition uuid");
                report.skip(SkipReason::MalformedPrecondition);
            }
            for uuid in &uuids {
                match registry.lookup_suffixed(uuid, row.key_suffix.as_deref()) {
                    Some(id) if attributes.contains_key(&id) => {
                        tracing::debug!(
                            attribute = id,
                            option = option.id,
                            option_title = %option.title,
                            "attribute used as precondition"
                        );
                        report.skip(SkipReason::PreconditionIsAttribute);
                    }
                    Some(id) if options.contains_key(&id) => {
                        let trigger_attribute = options[&id].attribute_id;
                        if attributes.contains_key(&trigger_attribute) {
                            rule.add_limited_option(id, option.attribute_id, option.id);
                        } else {
                            tracing::debug!(
                                row = %row.origin_uuid,
                                trigger = id,
                                attribute = trigger_attribute,
                                "trigger option of unknown attribute"
                            );
                            report.skip(SkipReason::OptionWithoutAttribute);
                        }
                    }
                    _ => {
                        tracing::debug!(row = %row.origin_uuid, %uuid, "precondition is neither attribute nor option");
                        report.skip(SkipReason::UnknownPrecondition);
                    }
                }
            }
        }
    }
}

fn classify_always_visible(rule: &mut CategoryRule) {
    let gated = rule.gated_attribute_ids();
    let always: Vec<u32> = rule
        .attribute_ids
        .iter()
        .copied()
        .filter(|id| !gated.contains(id))
        .collect();
    rule.always_visible_attribute_ids.extend(always);
}

#[cfg(test)]
mod tests {
    use crate::catalog::CatalogBuilder;
    use crate::dump::{DumpOptions, dump_catalog};
    use crate::resolve::{SearchConditions, find_visible_attributes};
    use crate::rows::{SkipReason, TableKind};
    use crate::test_utils::{Fixture, uuid_for};

    #[test]
    fn disabled_assignments_are_not_counted() {
        let mut fx = Fixture::new();
        let size = fx.attribute("Size", 1);
        let color = fx.attribute("Color", 2);
        fx.option(size, "S", 1);
        fx.option(color, "Red", 1);
        fx.assign(10, size);
        fx.assign_disabled(10, color);

        let (catalog, report) = fx.compile();
        let rule = catalog.rule(10).unwrap();
        assert_eq!(rule.attribute_ids, vec![fx.id(size)]);
        assert_eq!(report.skipped(SkipReason::DisabledRow), 1);
    }

    #[test]
    fn options_without_precondition_are_always_shown() {
        let mut fx = Fixture::new();
        let size = fx.attribute("Size", 1);
        let s = fx.option(size, "S", 1);
        fx.assign(10, size);
        fx.dynamic(10, s, "");

        let (catalog, _) = fx.compile();
        let rule = catalog.rule(10).unwrap();
        assert!(rule.show_option_always.contains(&fx.id(s)));
        assert_eq!(rule.always_visible_attribute_ids, vec![fx.id(size)]);
    }

    #[test]
    fn always_shown_option_of_unassigned_attribute_is_skipped() {
        let mut fx = Fixture::new();
        let size = fx.attribute("Size", 1);
        let color = fx.attribute("Color", 2);
        fx.option(size, "S", 1);
        let red = fx.option(color, "Red", 1);
        fx.assign(10, size);
        fx.dynamic(10, red, "{}");

        let (catalog, report) = fx.compile();
        assert!(catalog.rule(10).unwrap().show_option_always.is_empty());
        assert_eq!(report.skipped(SkipReason::AttributeNotInCategory), 1);
    }

    #[test]
    fn gated_attributes_leave_the_always_visible_list() {
        let mut fx = Fixture::new();
        let kind = fx.attribute("Kind", 1);
        let size = fx.attribute("Size", 2);
        let shoes = fx.option(kind, "Shoes", 1);
        let s42 = fx.option(size, "42", 1);
        let s43 = fx.option(size, "43", 2);
        fx.assign(10, kind);
        fx.assign(10, size);
        fx.gate(10, s42, &[shoes]);
        fx.gate(10, s43, &[shoes]);

        let (catalog, _) = fx.compile();
        let rule = catalog.rule(10).unwrap();
        assert_eq!(rule.always_visible_attribute_ids, vec![fx.id(kind)]);
        let groups = &rule.show_if_option_selected[&fx.id(shoes)];
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].attribute_id, fx.id(size));
        assert_eq!(groups[0].option_ids, vec![fx.id(s42), fx.id(s43)]);
    }

    #[test]
    fn any_of_several_triggers_unlocks() {
        let mut fx = Fixture::new();
        let kind = fx.attribute("Kind", 1);
        let size = fx.attribute("Size", 2);
        let shoes = fx.option(kind, "Shoes", 1);
        let boots = fx.option(kind, "Boots", 2);
        let s42 = fx.option(size, "42", 1);
        fx.assign(10, kind);
        fx.assign(10, size);
        fx.gate(10, s42, &[shoes, boots]);

        let (catalog, _) = fx.compile();
        let rule = catalog.rule(10).unwrap();
        assert!(rule.show_if_option_selected.contains_key(&fx.id(shoes)));
        assert!(rule.show_if_option_selected.contains_key(&fx.id(boots)));
    }

    #[test]
    fn attribute_and_unknown_preconditions_are_skipped() {
        let mut fx = Fixture::new();
        let kind = fx.attribute("Kind", 1);
        let size = fx.attribute("Size", 2);
        let s42 = fx.option(size, "42", 1);
        fx.assign(10, kind);
        fx.assign(10, size);
        let raw = format!("{{{},{}}}", uuid_for(kind), uuid_for(9_999));
        fx.dynamic(10, s42, &raw);

        let (catalog, report) = fx.compile();
        let rule = catalog.rule(10).unwrap();
        assert!(rule.show_if_option_selected.is_empty());
        assert_eq!(rule.always_visible_attribute_ids.len(), 2);
        assert_eq!(report.skipped(SkipReason::PreconditionIsAttribute), 1);
        assert_eq!(report.skipped(SkipReason::UnknownPrecondition), 1);
    }

    #[test]
    fn unknown_precondition_does_not_mint_ids() {
        let mut fx = Fixture::new();
        let size = fx.attribute("Size", 1);
        let s = fx.option(size, "S", 1);
        fx.assign(10, size);
        let raw = format!("{{{}}}", uuid_for(9_999));
        fx.dynamic(10, s, &raw);

        let before = fx.builder_registry_len();
        let (catalog, _) = fx.compile();
        assert_eq!(catalog.registry().len(), before);
    }

    #[test]
    fn dangling_rows_are_skipped_not_fatal() {
        let (orphan, missing_attr, missing_assignment) = (uuid_for(1), uuid_for(2), uuid_for(3));
        let mut builder = CatalogBuilder::new();
        builder
            .add_fields(
                TableKind::AttributeOption,
                &[orphan.as_str(), missing_attr.as_str(), "Orphan", "f", "1", "", "", "", ""],
            )
            .unwrap();
        builder
            .add_fields(
                TableKind::CategoryAttribute,
                &["x", "10", missing_assignment.as_str(), "f"],
            )
            .unwrap();
        builder
            .add_fields(
                TableKind::DynamicAttributeOption,
                &["y", "11", orphan.as_str(), "", "f"],
            )
            .unwrap();

        let (catalog, report) = builder.finish();
        assert!(catalog.rules().next().is_none());
        assert_eq!(report.skipped(SkipReason::OptionWithoutAttribute), 1);
        assert_eq!(report.skipped(SkipReason::UnknownAttribute), 1);
        assert_eq!(report.skipped(SkipReason::UnknownCategoryRule), 1);
    }

    #[test]
    fn malformed_precondition_fragments_are_counted() {
        let mut fx = Fixture::new();
        let kind = fx.attribute("Kind", 1);
        let size = fx.attribute("Size", 2);
        let shoes = fx.option(kind, "Shoes", 1);
        let s42 = fx.option(size, "42", 1);
        fx.assign(10, kind);
        fx.assign(10, size);
        let raw = format!("{{{}¥,garbage}}", uuid_for(shoes));
        fx.dynamic(10, s42, &raw);

        let (catalog, report) = fx.compile();
        let rule = catalog.rule(10).unwrap();
        assert!(rule.show_if_option_selected.contains_key(&fx.id(shoes)));
        assert_eq!(report.skipped(SkipReason::MalformedPrecondition), 1);
    }

    #[test]
    fn gated_option_of_unknown_attribute_is_skipped() {
        let mut fx = Fixture::new();
        let kind = fx.attribute("Kind", 1);
        let shoes = fx.option(kind, "Shoes", 1);
        let missing_attribute = 999;
        let ghost = fx.option(missing_attribute, "Ghost", 1);
        fx.assign(10, kind);
        fx.gate(10, ghost, &[shoes]);

        let (catalog, report) = fx.compile();
        let rule = catalog.rule(10).unwrap();
        assert!(rule.show_if_option_selected.is_empty());
        assert_eq!(rule.always_visible_attribute_ids, vec![fx.id(kind)]);
        // once while linking, once for the dynamic row
        assert_eq!(report.skipped(SkipReason::OptionWithoutAttribute), 2);

        let conditions = SearchConditions::for_category(10).with_selection(fx.id(kind), fx.id(shoes));
        let visible = find_visible_attributes(&conditions, &catalog).unwrap();
        assert_eq!(visible.attributes.len(), 1);
        assert!(dump_catalog(&catalog, &DumpOptions::category(10)).is_ok());
    }

    #[test]
    fn trigger_option_of_unknown_attribute_is_skipped() {
        let mut fx = Fixture::new();
        let size = fx.attribute("Size", 1);
        let s42 = fx.option(size, "42", 1);
        let missing_attribute = 999;
        let ghost = fx.option(missing_attribute, "Ghost", 1);
        fx.assign(10, size);
        fx.gate(10, s42, &[ghost]);

        let (catalog, report) = fx.compile();
        let rule = catalog.rule(10).unwrap();
        assert!(rule.show_if_option_selected.is_empty());
        assert_eq!(report.skipped(SkipReason::OptionWithoutAttribute), 2);
        assert!(dump_catalog(&catalog, &DumpOptions::category(10)).is_ok());
    }

    #[test]
    fn concatenated_precondition_registers_both_triggers() {
        let mut fx = Fixture::new();
        let kind = fx.attribute("Kind", 1);
        let size = fx.attribute("Size", 2);
        let shoes = fx.option(kind, "Shoes", 1);
        let boots = fx.option(kind, "Boots", 2);
        let s42 = fx.option(size, "42", 1);
        fx.assign(10, kind);
        fx.assign(10, size);
        let raw = format!("{{{}{}}}", uuid_for(shoes), uuid_for(boots));
        fx.dynamic(10, s42, &raw);

        let (catalog, _) = fx.compile();
        let rule = catalog.rule(10).unwrap();
        assert_eq!(rule.show_if_option_selected.len(), 2);
    }
}
