//! # Table Loader
//!
//! Reads the gzipped CSV exports of the attribute database from a directory
//! and feeds them to a [`CatalogBuilder`].
//!
//! Each table may be split over several files; every file whose name starts
//! with the table's prefix (e.g. `attribute_option.csv.gz`,
//! `attribute_option.csv.gz.1`) is read, in file name order. Tables are loaded
//! in dependency order: attributes, options, category assignments, dynamic
//! options. The first record of every file is its header and is not fed to
//! the builder.
//!
//! The category tree is a separate JSON file (optionally gzipped), keyed by
//! category ID.

use crate::catalog::{Catalog, CatalogBuilder, ImportReport};
use crate::error::{AttrError, Result};
use crate::model::CategoryTree;
use crate::rows::TableKind;
use flate2::read::MultiGzDecoder;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub data_dir: PathBuf,
    pub categories_file: Option<PathBuf>,
    /// Import the data this many times, each pass with its own UUID suffix.
    /// 0 imports once without a suffix.
    pub expand: usize,
    /// Maximum records read per table; 0 reads everything.
    pub max_records: usize,
}

impl LoadOptions {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_categories(mut self, path: impl Into<PathBuf>) -> Self {
        self.categories_file = Some(path.into());
        self
    }
}

/// Suffix used for the `pass`-th expanded import.
pub fn expand_suffix(pass: usize) -> String {
    format!("-expanded-{:03}", pass)
}

/// Loads every table found in `dir` into `builder`.
pub fn load_tables(dir: &Path, builder: &mut CatalogBuilder, options: &LoadOptions) -> Result<()> {
    let files = list_files(dir)?;
    for kind in TableKind::LOAD_ORDER {
        let started = Instant::now();
        let mut total = 0;
        for name in files.iter().filter(|n| n.starts_with(kind.file_prefix())) {
            tracing::info!(table = %kind, file = %name, "reading CSV records");
            let remaining = match options.max_records {
                0 => usize::MAX,
                max => max - total,
            };
            total += load_file(&dir.join(name), kind, builder, remaining)?;
            if options.max_records > 0 && total >= options.max_records {
                tracing::debug!(table = %kind, total, "record limit reached");
                break;
            }
        }
        tracing::info!(
            table = %kind,
            records = total,
            elapsed = ?started.elapsed(),
            "table loaded"
        );
    }
    Ok(())
}

fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(AttrError::Io)? {
        let entry = entry.map_err(AttrError::Io)?;
        if entry.file_type().map_err(AttrError::Io)?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Feeds at most `limit` records of one gzipped CSV file to the builder.
fn load_file(path: &Path, kind: TableKind, builder: &mut CatalogBuilder, limit: usize) -> Result<usize> {
    let file = File::open(path).map_err(AttrError::Io)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(MultiGzDecoder::new(BufReader::new(file)));

    let mut count = 0;
    for record in reader.records() {
        if count >= limit {
            break;
        }
        let record = record?;
        let fields: Vec<&str> = record.iter().collect();
        builder.add_fields(kind, &fields)?;
        count += 1;
    }
    Ok(count)
}

/// Reads the category tree JSON; paths ending in `.gz` are gunzipped first.
pub fn load_category_tree(path: &Path) -> Result<CategoryTree> {
    let file = File::open(path).map_err(AttrError::Io)?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(MultiGzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    let tree: CategoryTree = serde_json::from_reader(reader)?;
    tracing::info!(categories = tree.len(), "loaded category tree");
    Ok(tree)
}

/// Loads, compiles and pre-sorts a catalog from disk.
pub fn import_catalog(options: &LoadOptions) -> Result<(Catalog, ImportReport)> {
    let started = Instant::now();
    let categories = match &options.categories_file {
        Some(path) => load_category_tree(path)?,
        None => CategoryTree::default(),
    };
    let mut builder = CatalogBuilder::new().with_categories(categories);

    if options.expand == 0 {
        load_tables(&options.data_dir, &mut builder, options)?;
    } else {
        for pass in 0..options.expand {
            let suffix = expand_suffix(pass);
            tracing::info!(pass, %suffix, "expanded import pass");
            builder.set_uuid_suffix(Some(suffix));
            load_tables(&options.data_dir, &mut builder, options)?;
        }
    }

    let (mut catalog, report) = builder.finish();
    catalog.presort();

    let stats = catalog.stats();
    tracing::info!(
        attributes = stats.attributes,
        options = stats.options,
        category_rules = stats.category_rules,
        elapsed = ?started.elapsed(),
        "import finished"
    );
    if report.total_skipped() > 0 {
        tracing::warn!(
            skipped = report.total_skipped(),
            read = report.total_read(),
            "some rows were skipped"
        );
    }
    Ok((catalog, report))
}
