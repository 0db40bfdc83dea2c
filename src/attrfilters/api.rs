//! # API Facade
//!
//! [`AttrFiltersApi`] is the single entry point for UIs. It owns the current
//! compiled [`Catalog`] and dispatches to the command layer.
//!
//! The catalog sits behind an [`ArcSwap`]: queries take a snapshot and never
//! block, while [`AttrFiltersApi::replace`] (or a fresh
//! [`AttrFiltersApi::import`]) swaps in a newly compiled catalog atomically.
//! Queries already running keep the snapshot they started with.
//!
//! Like the commands, the API does no printing.

use crate::catalog::{Catalog, CatalogStats};
use crate::commands::{self, CmdResult};
use crate::dump::DumpOptions;
use crate::error::Result;
use crate::ingest::LoadOptions;
use crate::resolve::SearchConditions;
use arc_swap::ArcSwap;
use std::sync::Arc;

pub struct AttrFiltersApi {
    catalog: ArcSwap<Catalog>,
}

impl Default for AttrFiltersApi {
    fn default() -> Self {
        Self::new(Catalog::default())
    }
}

impl AttrFiltersApi {
    /// Serves `catalog` after sorting it into display order.
    pub fn new(mut catalog: Catalog) -> Self {
        catalog.presort();
        Self {
            catalog: ArcSwap::from_pointee(catalog),
        }
    }

    /// Imports a catalog from disk and makes it current.
    pub fn import(&self, options: &LoadOptions) -> Result<CmdResult> {
        let (catalog, result) = commands::import::run(options)?;
        self.replace(catalog);
        Ok(result)
    }

    pub fn find_visible(&self, conditions: &SearchConditions) -> Result<CmdResult> {
        commands::find::run(&self.catalog.load(), conditions)
    }

    pub fn dump(&self, options: &DumpOptions) -> Result<CmdResult> {
        commands::dump::run(&self.catalog.load(), options)
    }

    pub fn stats(&self) -> CatalogStats {
        self.catalog.load().stats()
    }

    /// Sorts `catalog` into display order, swaps it in and returns the
    /// previous one.
    pub fn replace(&self, mut catalog: Catalog) -> Arc<Catalog> {
        catalog.presort();
        let previous = self.catalog.swap(Arc::new(catalog));
        tracing::debug!(
            rules = previous.stats().category_rules,
            "replaced compiled catalog"
        );
        previous
    }

    /// Snapshot of the current catalog.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.load_full()
    }
}
