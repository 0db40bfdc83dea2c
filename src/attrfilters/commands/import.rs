use crate::catalog::{Catalog, ImportReport};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::ingest::{self, LoadOptions};

/// Imports and compiles a catalog, reporting what was loaded and skipped.
pub fn run(options: &LoadOptions) -> Result<(Catalog, CmdResult)> {
    let (catalog, report) = ingest::import_catalog(options)?;
    let result = summarize(&catalog, &report);
    Ok((catalog, result))
}

pub(crate) fn summarize(catalog: &Catalog, report: &ImportReport) -> CmdResult {
    let stats = catalog.stats();
    let mut result = CmdResult::default().with_stats(stats);

    if !catalog.categories().is_empty() {
        result.add_message(CmdMessage::info(format!(
            "Loaded {} categories",
            catalog.categories().len()
        )));
    }
    for (kind, count) in &report.rows_read {
        result.add_message(CmdMessage::info(format!("Read {} {} rows", count, kind)));
    }
    for (reason, count) in &report.skipped {
        result.add_message(CmdMessage::warning(format!(
            "Skipped {} rows: {}",
            count, reason
        )));
    }

    if stats.category_rules == 0 {
        result.add_message(CmdMessage::warning("No category rules were compiled"));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Compiled {} category rules ({} attributes, {} options)",
            stats.category_rules, stats.attributes, stats.options
        )));
    }
    result
}
