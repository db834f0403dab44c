//! Ranking filter

use crate::config::CriteriaSet;
use crate::events::{EventSink, ScoutEvent};
use crate::matching::scorer::explain;
use crate::model::{JobRecord, ScoredRecord};

/// Scores every record and keeps those at or above the threshold
///
/// The result is sorted by descending score. The sort is stable, so
/// records with equal scores keep the order they were given in. A record
/// is kept only when both its raw score and its rounded score reach the
/// threshold. An empty criteria set matches nothing.
pub fn filter(
    records: &[JobRecord],
    criteria: &CriteriaSet,
    sink: &dyn EventSink,
) -> Vec<ScoredRecord> {
    let mut matched = Vec::new();

    if !criteria.is_empty() {
        for record in records {
            let breakdown = explain(record, criteria);
            sink.emit(&ScoutEvent::RecordScored {
                title: record.title.clone(),
                score: breakdown.score,
                explanation: breakdown.to_string(),
            });

            let scored = ScoredRecord::new(record.clone(), breakdown.score);
            if breakdown.score >= criteria.threshold && scored.score >= criteria.threshold {
                matched.push(scored);
            }
        }
    }

    matched.sort_by(|a, b| b.score.total_cmp(&a.score));

    sink.emit(&ScoutEvent::FilterCompleted {
        evaluated: records.len(),
        matched: matched.len(),
        threshold: criteria.threshold,
    });

    matched
}
