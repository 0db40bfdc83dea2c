//! # Command Layer
//!
//! Each command lives in its own submodule and is a plain function over the
//! domain types. Commands return a [`CmdResult`] carrying the data to show and
//! leveled [`CmdMessage`]s; they never print. Rendering is the binary's job.
//!
//! - [`import`]: load and compile a catalog from disk
//! - [`find`]: resolve visible attributes for a query
//! - [`dump`]: render compiled rules for inspection

use crate::catalog::CatalogStats;
use crate::resolve::VisibleAttributes;
use serde::Serialize;

pub mod dump;
pub mod find;
pub mod import;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub visible: Option<VisibleAttributes>,
    pub dump: Option<String>,
    pub stats: Option<CatalogStats>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_visible(mut self, visible: VisibleAttributes) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn with_dump(mut self, dump: String) -> Self {
        self.dump = Some(dump);
        self
    }

    pub fn with_stats(mut self, stats: CatalogStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn has_level(&self, level: MessageLevel) -> bool {
        self.messages.iter().any(|m| m.level == level)
    }
}
