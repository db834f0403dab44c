//! Relevance scorer
//!
//! Scores one record against a criteria set. The stages run in a fixed
//! order and the first three can end scoring early:
//!
//! 1. An excluded term anywhere in the title scores 0.0
//! 2. A location that is neither remote (when allowed) nor recognisably US scores 0.0
//! 3. A title span equal to a primary keyword scores 1.0
//! 4. Otherwise the best fuzzy primary match (weight 0.7) plus the best
//!    fuzzy related match (weight 0.3), with a flat boost for quant roles

use crate::config::CriteriaSet;
use crate::matching::similarity::best_span_similarity;
use crate::model::JobRecord;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

pub const PRIMARY_WEIGHT: f64 = 0.7;
pub const RELATED_WEIGHT: f64 = 0.3;
pub const QUANT_BOOST: f64 = 0.3;

const QUANT_MARKERS: [&str; 2] = ["quant", "quantitative"];

const REMOTE: &str = "remote";

const US_INDICATORS: [&str; 5] = ["united states", "us", "usa", "u.s.", "u.s.a"];

// Matches any standalone two-letter token, so acronyms like "UK" pass too
static STATE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2}\b").expect("state code pattern is valid"));

/// The best-scoring criterion term for a title
#[derive(Debug, Clone, PartialEq)]
pub struct TermMatch {
    pub term: String,
    pub similarity: f64,
}

/// Which stage decided the score
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Excluded { term: String },
    LocationRejected,
    ExactMatch { keyword: String },
    Fuzzy {
        primary: Option<TermMatch>,
        related: Option<TermMatch>,
        boosted: bool,
    },
}

/// A score together with the reason for it
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub verdict: Verdict,

    /// Unrounded score in [0, 1]
    pub score: f64,
}

impl fmt::Display for ScoreBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.verdict {
            Verdict::Excluded { term } => write!(f, "excluded by term '{}'", term),
            Verdict::LocationRejected => write!(f, "location is neither remote nor US"),
            Verdict::ExactMatch { keyword } => write!(f, "exact match on '{}'", keyword),
            Verdict::Fuzzy {
                primary,
                related,
                boosted,
            } => {
                write_term(f, "primary", primary.as_ref())?;
                write!(f, ", ")?;
                write_term(f, "related", related.as_ref())?;
                if *boosted {
                    write!(f, ", quant boost +{}", QUANT_BOOST)?;
                }
                write!(f, " => {:.2}", self.score)
            }
        }
    }
}

fn write_term(f: &mut fmt::Formatter<'_>, label: &str, term: Option<&TermMatch>) -> fmt::Result {
    match term {
        Some(m) => write!(f, "{} '{}' {:.2}", label, m.term, m.similarity),
        None => write!(f, "{} none", label),
    }
}

/// Scores `record` against `criteria`, in [0, 1]
///
/// # Example
///
/// ```
/// use job_scout::config::CriteriaSet;
/// use job_scout::matching::score;
/// use job_scout::model::JobRecord;
///
/// let criteria = CriteriaSet::new(["data scientist"], [], ["remote"], ["senior"], 0.7);
/// let record = JobRecord {
///     title: "Data Scientist".to_string(),
///     location: "New York, NY".to_string(),
///     url: "https://co.example/jobs/1".to_string(),
///     source: "Co".to_string(),
///     discovered_at: chrono::Utc::now(),
/// };
/// assert_eq!(score(&record, &criteria), 1.0);
/// ```
pub fn score(record: &JobRecord, criteria: &CriteriaSet) -> f64 {
    explain(record, criteria).score
}

/// Scores `record` and reports which stage decided the result
pub fn explain(record: &JobRecord, criteria: &CriteriaSet) -> ScoreBreakdown {
    let title = record.title.to_lowercase();

    if let Some(term) = criteria
        .exclude_terms
        .iter()
        .find(|term| title.contains(term.as_str()))
    {
        return ScoreBreakdown {
            verdict: Verdict::Excluded { term: term.clone() },
            score: 0.0,
        };
    }

    if !is_location_match(&record.location, &criteria.locations) {
        return ScoreBreakdown {
            verdict: Verdict::LocationRejected,
            score: 0.0,
        };
    }

    if let Some(keyword) = exact_keyword(&title, &criteria.primary_keywords) {
        return ScoreBreakdown {
            verdict: Verdict::ExactMatch { keyword },
            score: 1.0,
        };
    }

    let primary = best_term(&criteria.primary_keywords, &title);
    let related = best_term(&criteria.related_terms, &title);
    let weighted = similarity_of(&primary) * PRIMARY_WEIGHT + similarity_of(&related) * RELATED_WEIGHT;

    let boosted = QUANT_MARKERS.iter().any(|marker| title.contains(marker));
    let score = if boosted {
        (weighted + QUANT_BOOST).min(1.0)
    } else {
        weighted
    };

    ScoreBreakdown {
        verdict: Verdict::Fuzzy {
            primary,
            related,
            boosted,
        },
        score,
    }
}

/// Whether a free-text location is acceptable
///
/// Remote locations pass only when "remote" is an allowed location. Any
/// location mentioning a US indicator or containing a two-letter
/// state-like code passes regardless of the allowed set.
pub fn is_location_match(location: &str, allowed: &BTreeSet<String>) -> bool {
    let lowered = location.to_lowercase();

    if allowed.contains(REMOTE) && lowered.contains(REMOTE) {
        return true;
    }

    if US_INDICATORS
        .iter()
        .any(|indicator| lowered.contains(indicator))
    {
        return true;
    }

    STATE_CODE.is_match(&location.to_uppercase())
}

/// First contiguous word span of `title` that is itself a primary keyword
fn exact_keyword(title: &str, keywords: &BTreeSet<String>) -> Option<String> {
    let words: Vec<&str> = title.split_whitespace().collect();

    for start in 0..words.len() {
        for end in start + 1..=words.len() {
            let span = words[start..end].join(" ");
            if keywords.contains(&span) {
                return Some(span);
            }
        }
    }

    None
}

/// Term with the highest span similarity; the first one wins ties
fn best_term(terms: &BTreeSet<String>, title: &str) -> Option<TermMatch> {
    let mut best: Option<TermMatch> = None;

    for term in terms {
        let similarity = best_span_similarity(term, title);
        if best.as_ref().map_or(true, |b| similarity > b.similarity) {
            best = Some(TermMatch {
                term: term.clone(),
                similarity,
            });
        }
    }

    best
}

fn similarity_of(term: &Option<TermMatch>) -> f64 {
    term.as_ref().map_or(0.0, |m| m.similarity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(title: &str, location: &str) -> JobRecord {
        JobRecord {
            title: title.to_string(),
            location: location.to_string(),
            url: "https://co.example/jobs/1".to_string(),
            source: "Co".to_string(),
            discovered_at: Utc::now(),
        }
    }

    fn criteria(primary: &[&str], related: &[&str], exclude: &[&str]) -> CriteriaSet {
        CriteriaSet::new(
            primary.iter().copied(),
            related.iter().copied(),
            ["remote"],
            exclude.iter().copied(),
            0.7,
        )
    }

    #[test]
    fn test_exact_span_match_scores_one() {
        let c = criteria(&["data scientist"], &[], &[]);
        let breakdown = explain(&record("Data Scientist", "New York, NY"), &c);
        assert_eq!(breakdown.score, 1.0);
        assert_eq!(
            breakdown.verdict,
            Verdict::ExactMatch {
                keyword: "data scientist".to_string()
            }
        );
    }

    #[test]
    fn test_exact_match_inside_longer_title() {
        let c = criteria(&["machine learning"], &[], &[]);
        assert_eq!(
            score(&record("Staff Machine Learning Engineer", "Remote"), &c),
            1.0
        );
    }

    #[test]
    fn test_exclusion_wins_over_exact_match() {
        let c = criteria(&["data scientist"], &[], &["senior"]);
        let breakdown = explain(&record("Senior Data Scientist", "Remote"), &c);
        assert_eq!(breakdown.score, 0.0);
        assert_eq!(
            breakdown.verdict,
            Verdict::Excluded {
                term: "senior".to_string()
            }
        );
    }

    #[test]
    fn test_exclusion_is_substring_match() {
        let c = criteria(&["engineer"], &[], &["lead"]);
        assert_eq!(score(&record("Team-Leader Engineer", "Remote"), &c), 0.0);
    }

    #[test]
    fn test_location_rejection() {
        let c = criteria(&["data scientist"], &[], &[]);
        let breakdown = explain(&record("Data Scientist", "Berlin, Germany"), &c);
        assert_eq!(breakdown.score, 0.0);
        assert_eq!(breakdown.verdict, Verdict::LocationRejected);
    }

    #[test]
    fn test_remote_requires_allowed_token() {
        let allowed: BTreeSet<String> = BTreeSet::new();
        assert!(!is_location_match("Remote", &allowed));

        let allowed: BTreeSet<String> = ["remote".to_string()].into_iter().collect();
        assert!(is_location_match("Fully Remote", &allowed));
    }

    #[test]
    fn test_us_indicators() {
        let allowed = BTreeSet::new();
        assert!(is_location_match("United States", &allowed));
        assert!(is_location_match("Anywhere in the U.S.", &allowed));
        assert!(is_location_match("Austin", &allowed));
    }

    #[test]
    fn test_state_code_heuristic() {
        let allowed = BTreeSet::new();
        assert!(is_location_match("Chicago, IL", &allowed));
        assert!(is_location_match("London, UK", &allowed));
        assert!(!is_location_match("Paris", &allowed));
        assert!(!is_location_match("Zürich", &allowed));
    }

    #[test]
    fn test_quant_boost_scenario() {
        let c = CriteriaSet::new(["research"], [], ["remote"], [], 0.7);
        let breakdown = explain(&record("Quantitative Researcher", "Remote"), &c);

        let expected = (16.0 / 18.0) * PRIMARY_WEIGHT + QUANT_BOOST;
        assert!((breakdown.score - expected).abs() < 1e-9);
        match breakdown.verdict {
            Verdict::Fuzzy {
                primary, boosted, ..
            } => {
                assert!(boosted);
                assert_eq!(primary.map(|p| p.term), Some("research".to_string()));
            }
            other => panic!("unexpected verdict {:?}", other),
        }
    }

    #[test]
    fn test_boost_is_clamped() {
        let c = CriteriaSet::new(["quant analyst"], ["analyst"], ["remote"], [], 0.7);
        let s = score(&record("Quant Analysts", "Remote"), &c);
        assert_eq!(s, 1.0);
    }

    #[test]
    fn test_fuzzy_without_boost() {
        let c = criteria(&["backend engineer"], &["python"], &[]);
        let s = score(&record("Backend Engineers", "Remote"), &c);
        // "python" shares only the "n" with the "backend" span
        let primary = 2.0 * 16.0 / 33.0;
        let related = 2.0 * 1.0 / 13.0;
        assert!((s - (primary * PRIMARY_WEIGHT + related * RELATED_WEIGHT)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_term_sets_score_zero() {
        let c = CriteriaSet::new([], [], ["remote"], [], 0.7);
        assert_eq!(score(&record("Backend Engineer", "Remote"), &c), 0.0);
    }

    #[test]
    fn test_scores_are_bounded() {
        let c = CriteriaSet::new(
            ["data scientist", "quant researcher"],
            ["python", "statistics", "quantitative"],
            ["remote"],
            [],
            0.7,
        );
        for title in [
            "Quantitative Research Scientist",
            "Quant",
            "Python Developer",
            "",
            "Data",
        ] {
            let s = score(&record(title, "Remote"), &c);
            assert!((0.0..=1.0).contains(&s), "{} scored {}", title, s);
        }
    }

    #[test]
    fn test_breakdown_display() {
        let c = criteria(&["data scientist"], &[], &["senior"]);
        let text = explain(&record("Senior Data Scientist", "Remote"), &c).to_string();
        assert_eq!(text, "excluded by term 'senior'");
    }
}
