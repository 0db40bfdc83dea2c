use crate::catalog::Catalog;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::resolve::{SearchConditions, find_visible_attributes};

/// Resolves visible attributes and reports selections that were dropped.
pub fn run(catalog: &Catalog, conditions: &SearchConditions) -> Result<CmdResult> {
    let visible = find_visible_attributes(conditions, catalog)?;
    let mut result = CmdResult::default();

    for condition in &conditions.attributes {
        if visible.corrected.attributes.contains(condition) {
            continue;
        }
        let label = catalog
            .pair_label(condition.attribute_id, condition.option_id)
            .unwrap_or_else(|_| condition.to_string());
        result.add_message(CmdMessage::warning(format!(
            "Dropped selection {} ({}): no longer visible",
            condition, label
        )));
    }

    if visible.attributes.is_empty() {
        result.add_message(CmdMessage::info("No visible attributes"));
    }

    Ok(result.with_visible(visible))
}
