//! Watchlist matching engine.
//!
//! Tiered comparison between a candidate identity and two reference lists.
//! The wanted list is investigative and biased toward over-inclusion: an
//! exact match short-circuits everything, otherwise every entry is scanned
//! through a priority-ordered fuzzy chain and all hits are collected for
//! operator review. The watch list is advisory and uses single-hit
//! semantics. Evaluation is pure; prompting lives in the workflow.

use serde::{Deserialize, Serialize};

use crate::model::{Identity, WantedEntry, WatchEntry};
use crate::normalize::{dates_match, normalize};

/// Which comparison rule produced a hit, in decreasing specificity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Verbatim last/first/patronymic plus date of birth.
    Exact,
    /// Normalized last and first name.
    LastFirst,
    /// Normalized last name, first name, and patronymic.
    FullName,
    /// Normalized first name and patronymic, patronymic present on both
    /// sides.
    FirstPatronymic,
    /// Normalized last name plus date of birth.
    LastNameDob,
}

impl MatchTier {
    /// Operator-facing label for the tier.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exact => "full data match",
            Self::LastFirst => "last and first name match",
            Self::FullName => "full name match",
            Self::FirstPatronymic => "first name and patronymic match",
            Self::LastNameDob => "last name and date of birth match",
        }
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One wanted-list hit: the tier that fired plus the matched entry's details
/// formatted for operator review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierMatch {
    /// The rule that fired.
    pub tier: MatchTier,
    /// "label: NAME, DOB. info. actions" explanation line.
    pub summary: String,
}

/// Outcome of screening a candidate identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum MatchDecision {
    /// No list matched.
    Clear,
    /// At least one wanted-list entry matched. Requires an explicit
    /// operator override before a submit may proceed.
    WantedHit {
        /// All hits in detection order, duplicates removed.
        matches: Vec<TierMatch>,
    },
    /// A watch-list entry matched. Advisory; requires confirmation.
    WatchlistHit {
        /// Matched entry details and reason.
        summary: String,
    },
}

impl MatchDecision {
    /// Whether the workflow must stop for operator confirmation.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        !matches!(self, Self::Clear)
    }

    /// Operator-facing message for the decision, one hit per line.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Clear => "no list matches".to_string(),
            Self::WantedHit { matches } => {
                let lines: Vec<&str> = matches.iter().map(|m| m.summary.as_str()).collect();
                format!("WANTED list:\n{}", lines.join("\n"))
            }
            Self::WatchlistHit { summary } => format!("watch list: {summary}"),
        }
    }
}

fn wanted_summary(tier: MatchTier, entry: &WantedEntry) -> String {
    let mut summary = format!(
        "{}: {} {} {}, born {}",
        tier.label(),
        entry.last_name,
        entry.first_name,
        entry.patronymic.as_deref().unwrap_or(""),
        entry.dob
    );
    if let Some(info) = entry.info.as_deref() {
        if !info.is_empty() {
            summary.push_str(". ");
            summary.push_str(info);
        }
    }
    if let Some(actions) = entry.actions.as_deref() {
        if !actions.is_empty() {
            summary.push_str(". Actions: ");
            summary.push_str(actions);
        }
    }
    summary
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_uppercase() == b.to_uppercase()
}

/// Verbatim comparison: case-insensitive names with absent patronymic
/// treated as empty, date-aware DOB.
fn exact_match(candidate: &Identity, entry: &WantedEntry) -> bool {
    eq_ignore_case(&candidate.last_name, &entry.last_name)
        && eq_ignore_case(&candidate.first_name, &entry.first_name)
        && eq_ignore_case(
            candidate.patronymic_or_empty(),
            entry.patronymic.as_deref().unwrap_or(""),
        )
        && dates_match(&candidate.dob, &entry.dob)
}

/// The per-entry fuzzy chain. The first criterion that fires determines the
/// reported tier, so an entry appears at most once and under its most
/// specific rule.
fn fuzzy_tier(candidate: &Identity, entry: &WantedEntry) -> Option<MatchTier> {
    let cand_last = normalize(&candidate.last_name);
    let cand_first = normalize(&candidate.first_name);
    let cand_patr = normalize(candidate.patronymic_or_empty());
    let entry_last = normalize(&entry.last_name);
    let entry_first = normalize(&entry.first_name);
    let entry_patr = normalize(entry.patronymic.as_deref().unwrap_or(""));

    if cand_last == entry_last && cand_first == entry_first {
        Some(MatchTier::LastFirst)
    } else if cand_last == entry_last && cand_first == entry_first && cand_patr == entry_patr {
        Some(MatchTier::FullName)
    } else if !cand_patr.is_empty()
        && !entry_patr.is_empty()
        && cand_first == entry_first
        && cand_patr == entry_patr
    {
        Some(MatchTier::FirstPatronymic)
    } else if cand_last == entry_last && dates_match(&candidate.dob, &entry.dob) {
        Some(MatchTier::LastNameDob)
    } else {
        None
    }
}

/// Screen a candidate against both reference lists.
///
/// Wanted-list hits take precedence: any wanted hit means the watch list is
/// never consulted. An exact wanted match is reported alone and skips the
/// fuzzy pass entirely.
#[must_use]
pub fn evaluate(
    candidate: &Identity,
    wanted: &[WantedEntry],
    watch: &[WatchEntry],
) -> MatchDecision {
    if let Some(entry) = wanted.iter().find(|e| exact_match(candidate, e)) {
        return MatchDecision::WantedHit {
            matches: vec![TierMatch {
                tier: MatchTier::Exact,
                summary: wanted_summary(MatchTier::Exact, entry),
            }],
        };
    }

    let mut matches: Vec<TierMatch> = Vec::new();
    for entry in wanted {
        if let Some(tier) = fuzzy_tier(candidate, entry) {
            let hit = TierMatch {
                tier,
                summary: wanted_summary(tier, entry),
            };
            // Duplicate entries in the list can produce identical messages
            if !matches.contains(&hit) {
                matches.push(hit);
            }
        }
    }
    if !matches.is_empty() {
        return MatchDecision::WantedHit { matches };
    }

    // Advisory list: first hit wins
    let cand_last = normalize(&candidate.last_name);
    let cand_first = normalize(&candidate.first_name);
    for entry in watch {
        if normalize(&entry.last_name) == cand_last
            && normalize(&entry.first_name) == cand_first
            && dates_match(&candidate.dob, &entry.dob)
        {
            let mut summary = format!(
                "{} {}, born {}",
                entry.last_name, entry.first_name, entry.dob
            );
            if let Some(reason) = entry.reason.as_deref() {
                if !reason.is_empty() {
                    summary.push_str(". ");
                    summary.push_str(reason);
                }
            }
            return MatchDecision::WatchlistHit { summary };
        }
    }

    MatchDecision::Clear
}
