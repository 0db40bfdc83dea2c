//! # attrfilters Architecture
//!
//! attrfilters decides which product attributes (Color, Size, Brand, ...) and
//! which of their options a shop should offer as search filters for a
//! category, given the options the shopper already picked. Some options only
//! make sense once another option is selected: picking "Kind: Shoes" reveals
//! shoe sizes, picking "Kind: Boots" reveals a narrower set of sizes.
//!
//! The rules come from four exported database tables. They are compiled once
//! into an immutable [`catalog::Catalog`] and then queried many times.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs)                                     │
//! │  - Parses arguments, prints results, owns exit codes        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs)                                               │
//! │  - Holds the current catalog, swaps it atomically           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/*.rs)                                   │
//! │  - import, find, dump; structured CmdResult, no printing    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Core                                                       │
//! │  ingest → rows → catalog/compile (+ ids, precondition)      │
//! │  resolve, dump                                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Import
//!
//! [`ingest`] reads gzipped CSV files and hands each record to a
//! [`catalog::CatalogBuilder`]. [`rows`] turns records into typed rows (or
//! counted skips), [`ids`] maps source UUIDs to dense integers, and
//! the rule compiler builds one [`model::CategoryRule`] per category when the builder
//! is finished. Malformed data never aborts an import; it shows up in the
//! [`catalog::ImportReport`].
//!
//! ## Query
//!
//! [`resolve::find_visible_attributes`] takes a [`resolve::SearchConditions`]
//! and returns the visible attributes plus a corrected copy of the conditions
//! with stale selections removed.

pub mod api;
pub mod catalog;
pub mod commands;
pub(crate) mod compile;
pub mod config;
pub mod dump;
pub mod error;
pub mod ids;
pub mod ingest;
pub mod model;
pub mod precondition;
pub mod resolve;
pub mod rows;

#[cfg(test)]
mod test_utils;
