//! The result aggregator: dedup, score blending, 3:2 interleave.
//!
//! Takes the already-collected raw lists from the local stores and the
//! external web API and produces one ordered, deduplicated list. The
//! steps run in a fixed order because the order decides which duplicate
//! wins and how ties break; see the step comments below.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::pipeline::identity::normalize_url;
use crate::types::{Origin, RankedResult, RawResult};

/// Local native scores are inflated by this factor to compete with the
/// external score range.
pub const LOCAL_BOOST: f64 = 8.0;
/// Score assigned to the first external result.
pub const EXTERNAL_TOP_SCORE: f64 = 1000.0;
/// Linear decay per external rank position.
pub const EXTERNAL_DECAY_STEP: f64 = 10.0;

/// Interleave ratio: up to this many external results per cycle...
const INTERLEAVE_EXTERNAL: usize = 3;
/// ...followed by up to this many local results.
const INTERLEAVE_LOCAL: usize = 2;

/// Merge local and external raw results into one ordered list.
///
/// `text_search` says whether the stores ran a relevance search (native
/// scores present) — only then are local results re-ordered by score;
/// sentinel and sample queries keep the store-returned order.
///
/// Steps, in this exact order:
///
/// 1. deduplicate locals by normalized identity, first occurrence wins,
///    seeding the seen-set local-side first so a URL present in both
///    origins is emitted as local;
/// 2. if `text_search`, stable-sort locals by native score descending;
/// 3. boost local scores ([`LOCAL_BOOST`]);
/// 4. admit unseen externals with a score decaying linearly from
///    [`EXTERNAL_TOP_SCORE`] by raw list position — a skipped duplicate
///    still consumes its position;
/// 5. sort each list by final score descending (stable);
/// 6. interleave 3 external : 2 local, draining opportunistically, and
///    append whatever remains in score order.
#[must_use]
pub fn aggregate(
    local: Vec<RawResult>,
    external: Vec<RawResult>,
    text_search: bool,
) -> Vec<RankedResult> {
    let mut seen: HashSet<String> = HashSet::new();

    let mut kept_locals: Vec<RawResult> = Vec::with_capacity(local.len());
    for record in local {
        if record.url.is_empty() {
            continue;
        }
        let identity = normalize_url(&record.url);
        if seen.insert(identity) {
            kept_locals.push(record);
        }
    }

    if text_search {
        sort_by_native_score(&mut kept_locals);
    }

    let mut locals: Vec<RankedResult> = kept_locals
        .into_iter()
        .map(|record| RankedResult {
            title: record.title,
            url: record.url,
            description: record.description,
            origin: Origin::Local,
            score: record.score.unwrap_or(0.0) * LOCAL_BOOST,
        })
        .collect();

    let mut externals: Vec<RankedResult> = Vec::with_capacity(external.len());
    for (index, record) in external.into_iter().enumerate() {
        if record.url.is_empty() {
            continue;
        }
        let identity = normalize_url(&record.url);
        if !seen.insert(identity) {
            continue;
        }
        externals.push(RankedResult {
            title: record.title,
            url: record.url,
            description: record.description,
            origin: Origin::External,
            score: EXTERNAL_TOP_SCORE - index as f64 * EXTERNAL_DECAY_STEP,
        });
    }

    sort_by_score(&mut locals);
    sort_by_score(&mut externals);

    interleave(externals, locals)
}

/// Stable descending sort on the optional native score; absent scores as 0.
fn sort_by_native_score(records: &mut [RawResult]) {
    records.sort_by(|a, b| {
        let (sa, sb) = (a.score.unwrap_or(0.0), b.score.unwrap_or(0.0));
        sb.partial_cmp(&sa).unwrap_or(Ordering::Equal)
    });
}

/// Stable descending sort on the normalized score; equal scores keep
/// their prior order, which is what preserves popularity/sample order
/// when every score is the same.
fn sort_by_score(records: &mut [RankedResult]) {
    records.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Merge two score-sorted lists at a 3:2 external:local ratio.
///
/// An exhausted list contributes nothing for its slots while the other
/// keeps draining at its own ratio, so the tail degenerates into a plain
/// score-ordered run of whichever list is longer.
fn interleave(external: Vec<RankedResult>, local: Vec<RankedResult>) -> Vec<RankedResult> {
    let mut merged = Vec::with_capacity(external.len() + local.len());
    let mut external = external.into_iter();
    let mut local = local.into_iter();

    loop {
        let before = merged.len();
        merged.extend(external.by_ref().take(INTERLEAVE_EXTERNAL));
        merged.extend(local.by_ref().take(INTERLEAVE_LOCAL));
        if merged.len() == before {
            break;
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(url: &str, score: Option<f64>) -> RawResult {
        RawResult {
            title: Some(format!("local {url}")),
            url: url.to_string(),
            description: Some("a local document".to_string()),
            origin: Origin::Local,
            score,
        }
    }

    fn external(url: &str) -> RawResult {
        RawResult {
            title: Some(format!("external {url}")),
            url: url.to_string(),
            description: Some("a web result".to_string()),
            origin: Origin::External,
            score: None,
        }
    }

    fn urls(results: &[RankedResult]) -> Vec<&str> {
        results.iter().map(|r| r.url.as_str()).collect()
    }

    #[test]
    fn example_scenario() {
        // b.com is already seen locally, so the external copy is dropped
        // but still burns rank position 0; c.com scores 1000 - 10.
        let locals = vec![local("a.com", Some(5.0)), local("b.com", Some(3.0))];
        let externals = vec![external("b.com"), external("c.com")];

        let merged = aggregate(locals, externals, true);

        assert_eq!(urls(&merged), vec!["c.com", "a.com", "b.com"]);
        assert!((merged[0].score - 990.0).abs() < f64::EPSILON);
        assert!((merged[1].score - 40.0).abs() < f64::EPSILON);
        assert!((merged[2].score - 24.0).abs() < f64::EPSILON);
        assert_eq!(merged[0].origin, Origin::External);
        assert_eq!(merged[1].origin, Origin::Local);
    }

    #[test]
    fn dedup_is_idempotent() {
        let base = vec![
            local("https://a.com/x", Some(2.0)),
            local("https://b.com/y", Some(1.0)),
        ];
        let mut doubled = base.clone();
        doubled.extend(base.clone());

        let once = aggregate(base, Vec::new(), true);
        let twice = aggregate(doubled, Vec::new(), true);
        assert_eq!(once, twice);
    }

    #[test]
    fn first_local_occurrence_wins() {
        let locals = vec![
            local("https://a.com/page/", Some(1.0)),
            local("https://A.com/page", Some(9.0)),
        ];
        let merged = aggregate(locals, Vec::new(), true);
        assert_eq!(merged.len(), 1);
        // The first record is kept even though the duplicate scores higher.
        assert!((merged[0].score - 8.0).abs() < f64::EPSILON);
        assert_eq!(merged[0].url, "https://a.com/page/");
    }

    #[test]
    fn local_wins_over_external_duplicate() {
        let locals = vec![local("https://shared.com/doc", Some(1.0))];
        let externals = vec![external("https://shared.com/doc/")];
        let merged = aggregate(locals, externals, true);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].origin, Origin::Local);
    }

    #[test]
    fn local_scores_boosted_eightfold() {
        let merged = aggregate(vec![local("a.com", Some(2.5))], Vec::new(), true);
        assert!((merged[0].score - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_local_score_boosts_to_zero() {
        let merged = aggregate(vec![local("a.com", None)], Vec::new(), true);
        assert!(merged[0].score.abs() < f64::EPSILON);
    }

    #[test]
    fn external_scores_decay_from_1000() {
        let externals = vec![external("a.com"), external("b.com"), external("c.com")];
        let merged = aggregate(Vec::new(), externals, true);
        let scores: Vec<f64> = merged.iter().map(|r| r.score).collect();
        assert!((scores[0] - 1000.0).abs() < f64::EPSILON);
        assert!((scores[1] - 990.0).abs() < f64::EPSILON);
        assert!((scores[2] - 980.0).abs() < f64::EPSILON);
    }

    #[test]
    fn skipped_duplicate_still_consumes_its_rank() {
        let locals = vec![local("dup.com", Some(1.0))];
        let externals = vec![external("dup.com"), external("fresh.com")];
        let merged = aggregate(locals, externals, true);
        let fresh = merged
            .iter()
            .find(|r| r.url == "fresh.com")
            .map(|r| r.score);
        assert_eq!(fresh, Some(990.0));
    }

    #[test]
    fn records_without_url_are_dropped() {
        let locals = vec![local("", Some(5.0)), local("a.com", Some(1.0))];
        let externals = vec![external(""), external("b.com")];
        let merged = aggregate(locals, externals, true);
        assert_eq!(merged.len(), 2);
        // The empty external record still consumed rank 0.
        let b = merged.iter().find(|r| r.url == "b.com").map(|r| r.score);
        assert_eq!(b, Some(990.0));
    }

    #[test]
    fn interleaves_three_external_then_two_local() {
        let locals = vec![
            local("l1.com", Some(9.0)),
            local("l2.com", Some(8.0)),
            local("l3.com", Some(7.0)),
        ];
        let externals = vec![
            external("e1.com"),
            external("e2.com"),
            external("e3.com"),
            external("e4.com"),
        ];
        let merged = aggregate(locals, externals, true);
        assert_eq!(
            urls(&merged),
            vec!["e1.com", "e2.com", "e3.com", "l1.com", "l2.com", "e4.com", "l3.com"]
        );
    }

    #[test]
    fn exhausted_external_list_drains_locals() {
        let locals = vec![
            local("l1.com", Some(5.0)),
            local("l2.com", Some(4.0)),
            local("l3.com", Some(3.0)),
            local("l4.com", Some(2.0)),
            local("l5.com", Some(1.0)),
        ];
        let merged = aggregate(locals, vec![external("e1.com")], true);
        assert_eq!(
            urls(&merged),
            vec!["e1.com", "l1.com", "l2.com", "l3.com", "l4.com", "l5.com"]
        );
    }

    #[test]
    fn text_search_orders_locals_by_native_score() {
        let locals = vec![
            local("low.com", Some(1.0)),
            local("high.com", Some(7.0)),
            local("mid.com", Some(4.0)),
        ];
        let merged = aggregate(locals, Vec::new(), true);
        assert_eq!(urls(&merged), vec!["high.com", "mid.com", "low.com"]);
    }

    #[test]
    fn non_text_search_preserves_store_order() {
        // Sentinel and sample queries arrive pre-ordered by the store;
        // without native scores the stable sorts must not reshuffle.
        let locals = vec![
            local("first.com", None),
            local("second.com", None),
            local("third.com", None),
        ];
        let merged = aggregate(locals, Vec::new(), false);
        assert_eq!(urls(&merged), vec!["first.com", "second.com", "third.com"]);
    }

    #[test]
    fn all_empty_input_yields_empty_output() {
        let merged = aggregate(Vec::new(), Vec::new(), false);
        assert!(merged.is_empty());
    }

    #[test]
    fn equal_native_scores_keep_input_order() {
        let locals = vec![
            local("a.com", Some(2.0)),
            local("b.com", Some(2.0)),
            local("c.com", Some(2.0)),
        ];
        let merged = aggregate(locals, Vec::new(), true);
        assert_eq!(urls(&merged), vec!["a.com", "b.com", "c.com"]);
    }
}
