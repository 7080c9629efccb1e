//! Entity matcher.
//!
//! Resolves an OCR-derived description against a catalog using a strict
//! precedence of exact strategies, stopping at the first hit. Matching
//! never fails; an ambiguous precedence level either takes the first entry
//! in catalog order or rejects the level outright, depending on the
//! configured tie-break.

use tracing::debug;
use uuid::Uuid;

use crate::models::catalog::{LedgerEntry, StockItem};

/// Tie-break when several candidates satisfy the same precedence level.
///
/// `FirstInCatalog` keeps the upstream list order, which depends on the
/// source's grouping order. `RejectAmbiguous` refuses the ambiguous level
/// and falls through to the next precedence level, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    #[default]
    FirstInCatalog,
    RejectAmbiguous,
}

impl TieBreak {
    pub fn from_string(s: &str) -> Self {
        match s {
            "reject_ambiguous" => TieBreak::RejectAmbiguous,
            _ => TieBreak::FirstInCatalog,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreak::FirstInCatalog => "first",
            TieBreak::RejectAmbiguous => "reject_ambiguous",
        }
    }
}

/// Which precedence level produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    ExternalId,
    ExactName,
    GstNumber,
    Alias,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::ExternalId => "external_id",
            MatchStrategy::ExactName => "exact_name",
            MatchStrategy::GstNumber => "gst_number",
            MatchStrategy::Alias => "alias",
        }
    }
}

/// Description of the thing to resolve.
#[derive(Debug, Clone, Default)]
pub struct MatchTarget {
    pub external_id: Option<Uuid>,
    pub name: Option<String>,
    pub gst_number: Option<String>,
}

impl MatchTarget {
    pub fn by_name(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// Enable the GST-number precedence level (vendor matching only).
    pub match_gst: bool,
    pub tie_break: TieBreak,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            match_gst: false,
            tie_break: TieBreak::default(),
        }
    }
}

/// A resolved match and the strategy that produced it.
#[derive(Debug, Clone, Copy)]
pub struct Match<'a, T> {
    pub entry: &'a T,
    pub strategy: MatchStrategy,
}

/// Resolve at most one ledger entry. Precedence: exact id, exact
/// case-sensitive name, exact GST number (when enabled).
pub fn match_ledger<'a>(
    target: &MatchTarget,
    candidates: &'a [LedgerEntry],
    options: MatchOptions,
) -> Option<Match<'a, LedgerEntry>> {
    if let Some(id) = target.external_id {
        if let Some(entry) = pick(
            candidates.iter().filter(|c| c.id == id),
            options.tie_break,
            MatchStrategy::ExternalId,
        ) {
            return Some(Match {
                entry,
                strategy: MatchStrategy::ExternalId,
            });
        }
    }

    if let Some(name) = target.name.as_deref().filter(|n| !n.is_empty()) {
        if let Some(entry) = pick(
            candidates.iter().filter(|c| c.name == name),
            options.tie_break,
            MatchStrategy::ExactName,
        ) {
            return Some(Match {
                entry,
                strategy: MatchStrategy::ExactName,
            });
        }
    }

    if options.match_gst {
        if let Some(gst) = target.gst_number.as_deref().filter(|g| !g.is_empty()) {
            if let Some(entry) = pick(
                candidates
                    .iter()
                    .filter(|c| c.gst_number.as_deref() == Some(gst)),
                options.tie_break,
                MatchStrategy::GstNumber,
            ) {
                return Some(Match {
                    entry,
                    strategy: MatchStrategy::GstNumber,
                });
            }
        }
    }

    None
}

/// Resolve at most one stock item. Precedence: exact id, exact name,
/// exact alias.
pub fn match_stock<'a>(
    target: &MatchTarget,
    candidates: &'a [StockItem],
    options: MatchOptions,
) -> Option<Match<'a, StockItem>> {
    if let Some(id) = target.external_id {
        if let Some(entry) = pick(
            candidates.iter().filter(|c| c.id == id),
            options.tie_break,
            MatchStrategy::ExternalId,
        ) {
            return Some(Match {
                entry,
                strategy: MatchStrategy::ExternalId,
            });
        }
    }

    if let Some(name) = target.name.as_deref().filter(|n| !n.is_empty()) {
        if let Some(entry) = pick(
            candidates.iter().filter(|c| c.name == name),
            options.tie_break,
            MatchStrategy::ExactName,
        ) {
            return Some(Match {
                entry,
                strategy: MatchStrategy::ExactName,
            });
        }

        if let Some(entry) = pick(
            candidates.iter().filter(|c| c.alias.as_deref() == Some(name)),
            options.tie_break,
            MatchStrategy::Alias,
        ) {
            return Some(Match {
                entry,
                strategy: MatchStrategy::Alias,
            });
        }
    }

    None
}

fn pick<'a, T>(
    mut hits: impl Iterator<Item = &'a T>,
    tie_break: TieBreak,
    strategy: MatchStrategy,
) -> Option<&'a T> {
    let first = hits.next()?;
    if hits.next().is_some() {
        debug!(strategy = strategy.as_str(), tie_break = tie_break.as_str(), "Ambiguous match");
        if tie_break == TieBreak::RejectAmbiguous {
            return None;
        }
    }
    Some(first)
}
