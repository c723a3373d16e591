//! Section selection: rank, dedupe and bound the scored pages.
//!
//! Sort order:
//! 1. **Scored before unscored**: a page without a similarity never outranks one with it
//! 2. **Score** descending
//! 3. **Corpus position** ascending (input document order, then page number)
//!
//! The position tie-breaker makes the ranking total, so equal floats still
//! produce the same slate on every run.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::scoring::ScoredUnit;

/// A page kept in the final slate
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedSection {
    pub scored: ScoredUnit,
    /// 1-based, dense
    pub rank: usize,
}

/// Compare two scored units for ranking. `Less` means `a` ranks higher.
pub fn compare_units(a: &ScoredUnit, b: &ScoredUnit) -> Ordering {
    match (a.similarity_score, b.similarity_score) {
        (Some(sa), Some(sb)) => sb.total_cmp(&sa).then(a.position.cmp(&b.position)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.position.cmp(&b.position),
    }
}

/// Pick up to `top_n` sections from the best `pool_size` candidates.
///
/// Unscored pages only take part when no page has a score at all; the
/// result is never padded.
pub fn select_sections(
    scored: Vec<ScoredUnit>,
    pool_size: usize,
    top_n: usize,
) -> Vec<SelectedSection> {
    let any_scored = scored.iter().any(ScoredUnit::is_scored);
    let mut candidates: Vec<ScoredUnit> = if any_scored {
        scored.into_iter().filter(ScoredUnit::is_scored).collect()
    } else {
        scored
    };

    candidates.sort_by(compare_units);
    candidates.truncate(pool_size.max(top_n));

    let mut seen: HashSet<(String, u32)> = HashSet::with_capacity(candidates.len());
    let selected: Vec<SelectedSection> = candidates
        .into_iter()
        .filter(|c| seen.insert((c.unit.document_id.clone(), c.unit.page_number)))
        .take(top_n)
        .enumerate()
        .map(|(i, scored)| SelectedSection {
            scored,
            rank: i + 1,
        })
        .collect();

    tracing::debug!(
        selected = selected.len(),
        any_scored,
        "Selected sections"
    );

    selected
}
