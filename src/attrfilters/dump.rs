//! Human-readable rendering of compiled category rules, for inspecting an
//! import.

use crate::catalog::{Catalog, CatalogStats};
use crate::error::Result;
use crate::model::CategoryRule;

pub const DEFAULT_MAX_LINES: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// Render a single category instead of all of them.
    pub only_category: Option<u32>,
    /// Options listed per always-visible attribute; 0 means the default.
    pub max_lines: usize,
}

impl DumpOptions {
    pub fn category(category_id: u32) -> Self {
        Self {
            only_category: Some(category_id),
            ..Self::default()
        }
    }

    fn effective_max_lines(&self) -> usize {
        match self.max_lines {
            0 => DEFAULT_MAX_LINES,
            n => n,
        }
    }
}

/// Renders the selected rules followed by catalog statistics.
///
/// Asking for a category without a rule is an error.
pub fn dump_catalog(catalog: &Catalog, options: &DumpOptions) -> Result<String> {
    let max_lines = options.effective_max_lines();
    let mut out = String::new();

    match options.only_category {
        Some(category_id) => {
            let rule = catalog.rule(category_id)?;
            dump_rule(&mut out, catalog, rule, max_lines)?;
        }
        None => {
            for rule in catalog.rules() {
                dump_rule(&mut out, catalog, rule, max_lines)?;
            }
        }
    }

    out.push('\n');
    dump_stats(&mut out, &catalog.stats());
    Ok(out)
}

fn dump_rule(out: &mut String, catalog: &Catalog, rule: &CategoryRule, max_lines: usize) -> Result<()> {
    out.push_str(&format!(
        "category [{:6}] - {} ({} / {} attributes, {} conditions)\n",
        rule.category_id,
        catalog.full_category_name(rule.category_id),
        rule.always_visible_attribute_ids.len(),
        rule.attribute_ids.len(),
        rule.show_if_option_selected.len(),
    ));

    for &attribute_id in &rule.always_visible_attribute_ids {
        let attribute = catalog.attribute(attribute_id)?;
        out.push_str(&format!(
            " - attribute [{:6}] - {} ({})\n",
            attribute.id, attribute.title, attribute.display_order
        ));
        for &option_id in attribute.option_ids.iter().take(max_lines) {
            let option = catalog.option(option_id)?;
            out.push_str(&format!(
                "    - option [{:6}] - {} ({})\n",
                option.id, option.title, option.display_order
            ));
        }
        if attribute.option_ids.len() > max_lines {
            out.push_str(&format!(
                "      <skipped {} more>\n",
                attribute.option_ids.len() - max_lines
            ));
        }
    }

    for (&trigger_id, groups) in &rule.show_if_option_selected {
        let trigger = catalog.option(trigger_id)?;
        let trigger_attribute = catalog.attribute(trigger.attribute_id)?;
        out.push_str(&format!(
            " - precondition: attribute [{:6}] - {} - option [{:6}] - {}\n",
            trigger_attribute.id, trigger_attribute.title, trigger.id, trigger.title
        ));
        for group in groups {
            let attribute = catalog.attribute(group.attribute_id)?;
            out.push_str(&format!(
                "    - attribute [{:6}] - {} ({})\n",
                attribute.id, attribute.title, attribute.display_order
            ));
            for &option_id in &group.option_ids {
                let option = catalog.option(option_id)?;
                out.push_str(&format!(
                    "       - option [{:6}] - {} ({})\n",
                    option.id, option.title, option.display_order
                ));
            }
        }
    }
    Ok(())
}

fn dump_stats(out: &mut String, stats: &CatalogStats) {
    out.push_str("=== Stats ===\n");
    out.push_str(&format!("Attributes        : {}\n", stats.attributes));
    out.push_str(&format!("Options           : {}\n", stats.options));
    out.push_str(&format!("Category Rules    : {}\n", stats.category_rules));
    out.push_str(&format!("Refs              : {}\n", stats.refs));
}
