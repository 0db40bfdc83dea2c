//! # Precondition Parser
//!
//! A dynamic option row carries a precondition in Postgres array syntax:
//! `{uuid1,uuid2,...}`. The option becomes visible when any one of the listed
//! options is selected. An empty (or near-empty) precondition means the option
//! is always visible.
//!
//! The export is known to contain two kinds of damaged entries, each repaired
//! by its own branch of [`classify`]:
//!
//! - a stray `¥` glued to the UUID (entries of 37 to 49 bytes)
//! - two UUIDs concatenated without a separator (entries of exactly 72 bytes)
//!
//! Everything else that is not 36 bytes long is rejected.

const UUID_LEN: usize = 36;
const ARTIFACT: char = '¥';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// No precondition: the option is always visible.
    Always,
    /// The option is visible when any of these option UUIDs is selected.
    Triggers {
        uuids: Vec<String>,
        rejected: Vec<String>,
    },
}

/// How a single comma-separated entry was interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment<'a> {
    Valid(&'a str),
    StrippedArtifact(&'a str),
    Concatenated(&'a str, &'a str),
    Invalid(&'a str),
}

pub fn parse_precondition(raw: &str) -> Precondition {
    if raw.len() < 3 {
        return Precondition::Always;
    }

    let mut pending: Vec<&str> = raw
        .trim_matches(|c| c == '{' || c == '}')
        .split(',')
        .collect();
    let mut uuids = Vec::new();
    let mut rejected = Vec::new();

    // Second halves of concatenated entries are queued at the end
    let mut idx = 0;
    while idx < pending.len() {
        match classify(pending[idx]) {
            Fragment::Valid(uuid) | Fragment::StrippedArtifact(uuid) => {
                uuids.push(uuid.to_string())
            }
            Fragment::Concatenated(first, second) => {
                uuids.push(first.to_string());
                pending.push(second);
            }
            Fragment::Invalid(entry) => rejected.push(entry.to_string()),
        }
        idx += 1;
    }

    Precondition::Triggers { uuids, rejected }
}

/// Applies the repair rules to one entry. Lengths are in bytes.
pub fn classify(entry: &str) -> Fragment<'_> {
    match entry.len() {
        UUID_LEN => Fragment::Valid(entry),
        37..=49 => {
            let stripped = entry.trim_matches(ARTIFACT);
            if stripped.len() == UUID_LEN {
                Fragment::StrippedArtifact(stripped)
            } else {
                Fragment::Invalid(entry)
            }
        }
        72 => match (entry.get(..UUID_LEN), entry.get(UUID_LEN..)) {
            (Some(first), Some(second)) => Fragment::Concatenated(first, second),
            _ => Fragment::Invalid(entry),
        },
        _ => Fragment::Invalid(entry),
    }
}
