use crate::catalog::Catalog;
use crate::commands::CmdResult;
use crate::dump::{DumpOptions, dump_catalog};
use crate::error::Result;

pub fn run(catalog: &Catalog, options: &DumpOptions) -> Result<CmdResult> {
    let text = dump_catalog(catalog, options)?;
    Ok(CmdResult::default()
        .with_dump(text)
        .with_stats(catalog.stats()))
}
