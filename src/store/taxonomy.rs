//! Document type taxonomy.
//!
//! Stores tag documents with free-form `doc_type` strings. The config maps
//! those onto canonical categories through synonym groups: consolidation
//! powers the category listing, expansion widens a selected filter to its
//! whole group before it reaches the stores.

use std::collections::{BTreeMap, BTreeSet};

/// Legacy "everything" marker some imports carry as a type; never listed.
const EXCLUDED_TYPE: &str = "alle";

/// Collapse raw store types onto canonical categories.
///
/// Empty and excluded values are skipped. A type found in a synonym group
/// is replaced by the group's canonical name; anything else stands for
/// itself. The result is sorted and duplicate-free.
pub fn consolidate_types<I, S>(synonyms: &BTreeMap<String, Vec<String>>, raw_types: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut categories = BTreeSet::new();
    for raw in raw_types {
        let t = raw.as_ref().trim();
        if t.is_empty() || t.eq_ignore_ascii_case(EXCLUDED_TYPE) {
            continue;
        }
        let canonical = synonyms
            .iter()
            .find(|(_, group)| group.iter().any(|m| m == t))
            .map_or(t, |(canon, _)| canon.as_str());
        categories.insert(canonical.to_owned());
    }
    categories.into_iter().collect()
}

/// Widen a selected type to its full synonym group.
///
/// Returns the first group containing the selection, or the selection
/// alone when no group lists it. A canonical name matches only when it
/// appears in its own member list.
pub fn expand_type_filter(synonyms: &BTreeMap<String, Vec<String>>, selected: &str) -> Vec<String> {
    synonyms
        .values()
        .find(|group| group.iter().any(|m| m == selected))
        .cloned()
        .unwrap_or_else(|| vec![selected.to_owned()])
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn synonyms() -> BTreeMap<String, Vec<String>> {
        let mut map = BTreeMap::new();
        map.insert(
            "wiki".to_owned(),
            vec!["wiki".to_owned(), "encyclopedia".to_owned(), "lexikon".to_owned()],
        );
        map.insert(
            "video".to_owned(),
            vec!["video".to_owned(), "videos".to_owned()],
        );
        map
    }

    #[test]
    fn consolidation_maps_members_to_canonical() {
        let got = consolidate_types(&synonyms(), ["encyclopedia", "videos", "news"]);
        assert_eq!(got, vec!["news", "video", "wiki"]);
    }

    #[test]
    fn consolidation_skips_blank_and_excluded_values() {
        let got = consolidate_types(&synonyms(), ["", "  ", "alle", "Alle", "ALLE", "wiki"]);
        assert_eq!(got, vec!["wiki"]);
    }

    #[test]
    fn consolidation_deduplicates_across_groups() {
        let got = consolidate_types(&synonyms(), ["wiki", "lexikon", "encyclopedia"]);
        assert_eq!(got, vec!["wiki"]);
    }

    #[test]
    fn unknown_types_stand_for_themselves() {
        let got = consolidate_types(&synonyms(), ["podcast"]);
        assert_eq!(got, vec!["podcast"]);
    }

    #[test]
    fn expansion_returns_the_whole_group() {
        let got = expand_type_filter(&synonyms(), "encyclopedia");
        assert_eq!(got, vec!["wiki", "encyclopedia", "lexikon"]);
    }

    #[test]
    fn expansion_falls_back_to_the_selection() {
        let got = expand_type_filter(&synonyms(), "podcast");
        assert_eq!(got, vec!["podcast"]);
    }

    #[test]
    fn canonical_matches_only_through_its_member_list() {
        let mut map = BTreeMap::new();
        map.insert("docs".to_owned(), vec!["manual".to_owned()]);
        // "docs" names the group but is not a member itself.
        assert_eq!(expand_type_filter(&map, "docs"), vec!["docs"]);
        assert_eq!(expand_type_filter(&map, "manual"), vec!["manual"]);
    }

    #[test]
    fn empty_synonym_map_passes_types_through() {
        let empty = BTreeMap::new();
        assert_eq!(consolidate_types(&empty, ["a", "b"]), vec!["a", "b"]);
        assert_eq!(expand_type_filter(&empty, "a"), vec!["a"]);
    }
}
