//! Query preprocessing: tokenization, stopword removal, and stemming.
//!
//! `preprocess_query` turns raw user input into the form fed to the
//! full-text store search. Multi-word queries keep their last word verbatim
//! so that prefix-style queries ("rust asy…") are not mangled mid-typing;
//! earlier words are stopword-filtered and stemmed.
//!
//! The stemmer is a light suffix stripper. Store-side FTS applies its own
//! Porter pass to both indexed text and match terms, so the two normalize
//! toward the same token forms.

use magpie_search::SENTINEL_QUERY;

/// English stopwords, checked lowercased.
const STOPWORDS_EN: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will", "just", "don",
    "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "couldn", "didn",
    "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn", "mustn", "needn", "shan",
    "shouldn", "wasn", "weren", "won", "wouldn",
];

/// German stopwords, checked lowercased.
const STOPWORDS_DE: &[&str] = &[
    "aber", "alle", "allem", "allen", "aller", "alles", "als", "also", "am", "an", "ander",
    "andere", "anderem", "anderen", "anderer", "anderes", "anderm", "andern", "anders", "auch",
    "auf", "aus", "bei", "bin", "bis", "bist", "da", "damit", "dann", "der", "den", "des",
    "dem", "die", "das", "dass", "daß", "dazu", "dein", "deine", "deinem", "deinen", "deiner",
    "deines", "denn", "derer", "dessen", "dich", "dir", "du", "dies", "diese", "diesem",
    "diesen", "dieser", "dieses", "doch", "dort", "durch", "ein", "eine", "einem", "einen",
    "einer", "eines", "einig", "einige", "einigem", "einigen", "einiger", "einiges", "einmal",
    "er", "ihn", "ihm", "es", "etwas", "euer", "eure", "eurem", "euren", "eurer", "eures",
    "euch", "für", "gegen", "gewesen", "hab", "habe", "haben", "hat", "hatte", "hatten",
    "hier", "hin", "hinter", "ich", "mich", "mir", "ihr", "ihre", "ihrem", "ihren", "ihrer",
    "ihres", "im", "in", "indem", "ins", "ist", "jede", "jedem", "jeden", "jeder", "jedes",
    "jene", "jenem", "jenen", "jener", "jenes", "jetzt", "kann", "kein", "keine", "keinem",
    "keinen", "keiner", "keines", "können", "könnte", "machen", "man", "manche", "manchem",
    "manchen", "mancher", "manches", "mein", "meine", "meinem", "meinen", "meiner", "meines",
    "mit", "muss", "musste", "nach", "nicht", "nichts", "noch", "nun", "nur", "ob", "oder",
    "ohne", "sehr", "sein", "seine", "seinem", "seinen", "seiner", "seines", "selbst", "sich",
    "sie", "ihnen", "sind", "solche", "solchem", "solchen", "solcher", "solches", "soll",
    "sollte", "sondern", "sonst", "über", "um", "und", "uns", "unser", "unsere", "unserem",
    "unseren", "unseres", "unter", "viel", "vom", "von", "vor", "während", "war", "waren",
    "warst", "was", "weg", "weil", "weiter", "welche", "welchem", "welchen", "welcher",
    "welches", "wenn", "werde", "werden", "wie", "wieder", "wird", "wirst", "wo", "wollen",
    "wollte", "würde", "würden", "zu", "zum", "zur", "zwar", "zwischen",
];

/// Suffix candidates for deterministic related-term generation.
const RELATED_SUFFIXES: &[&str] = &[
    "installation",
    "tutorial",
    "guide",
    "download",
    "alternatives",
    "vs",
    "how to use",
    "setup",
    "configuration",
    "examples",
    "pricing",
];

/// Prefix candidates for deterministic related-term generation.
const RELATED_PREFIXES: &[&str] = &["best", "how to", "what is", "why use", "compare", "install"];

/// Split text into lowercase-preserving word tokens.
///
/// A token is a maximal run of alphanumeric characters; punctuation and
/// whitespace are boundaries. Umlauts and other letters count as word
/// characters.
#[must_use]
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Returns true if `word` (checked lowercased) is an English or German
/// stopword.
fn is_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOPWORDS_EN.contains(&lower.as_str()) || STOPWORDS_DE.contains(&lower.as_str())
}

/// Light suffix-stripping stemmer.
///
/// Handles the common English plural and participle endings. Deliberately
/// conservative: a wrongly kept suffix only weakens one OR term in the
/// store match, while a wrongly stripped one can lose the token entirely.
fn stem(word: &str) -> String {
    let w = word.to_lowercase();
    let n = w.len();
    if n < 4 || !w.is_ascii() {
        return w;
    }

    if let Some(base) = w.strip_suffix("sses") {
        return format!("{base}ss");
    }
    if n > 4
        && let Some(base) = w.strip_suffix("ies")
    {
        return format!("{base}i");
    }
    if n >= 6
        && let Some(base) = w.strip_suffix("ing")
    {
        return restore_stem(base);
    }
    if n >= 5
        && let Some(base) = w.strip_suffix("ed")
    {
        return restore_stem(base);
    }
    if n >= 5
        && let Some(base) = w.strip_suffix("ly")
    {
        return base.to_owned();
    }
    if w.ends_with('s') && !w.ends_with("ss") && !w.ends_with("us") && !w.ends_with("is") {
        return w[..n - 1].to_owned();
    }
    w
}

/// Clean up a stem after removing an `-ed`/`-ing` suffix: undouble a trailing
/// double consonant (hopped → hop) or restore a dropped final `e` on short
/// consonant-vowel-consonant stems (mak → make).
fn restore_stem(base: &str) -> String {
    let bytes = base.as_bytes();
    let n = bytes.len();
    if n >= 2 && bytes[n - 1] == bytes[n - 2] && !is_vowel(bytes[n - 1]) {
        if matches!(bytes[n - 1], b'l' | b's' | b'z') {
            return base.to_owned();
        }
        return base[..n - 1].to_owned();
    }
    if n >= 3 && n <= 4 && ends_cvc(bytes) {
        return format!("{base}e");
    }
    base.to_owned()
}

fn is_vowel(b: u8) -> bool {
    matches!(b, b'a' | b'e' | b'i' | b'o' | b'u')
}

/// Consonant-vowel-consonant tail, final consonant not w/x/y.
fn ends_cvc(bytes: &[u8]) -> bool {
    let n = bytes.len();
    n >= 3
        && !is_vowel(bytes[n - 3])
        && is_vowel(bytes[n - 2])
        && !is_vowel(bytes[n - 1])
        && !matches!(bytes[n - 1], b'w' | b'x' | b'y')
}

/// Normalize a raw query for store search.
///
/// Multi-word queries: every word but the last is dropped if it is a
/// stopword and stemmed otherwise; the last word is appended verbatim.
/// Single-word queries are kept unless they are a stopword. Empty and
/// sentinel queries pass through untouched.
#[must_use]
pub fn preprocess_query(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.is_empty() || trimmed == SENTINEL_QUERY {
        return trimmed.to_owned();
    }

    let words = tokenize(trimmed);
    match words.as_slice() {
        [] => String::new(),
        [only] => {
            if is_stopword(only) {
                String::new()
            } else {
                (*only).to_owned()
            }
        }
        [head @ .., last] => {
            let mut processed: Vec<String> = head
                .iter()
                .filter(|w| !is_stopword(w))
                .map(|w| stem(w))
                .collect();
            processed.push((*last).to_owned());
            processed.join(" ")
        }
    }
}

/// Deterministic related search terms, used when no answer client is
/// configured or its request fails.
///
/// Pattern-based: the first three suffix and prefix templates, topped up
/// with generic variants when the query already contains one of the
/// templates. At most 6 terms.
#[must_use]
pub fn fallback_related_terms(query: &str) -> Vec<String> {
    let query = query.trim().to_lowercase();
    let mut results = Vec::new();

    for suffix in &RELATED_SUFFIXES[..3] {
        let candidate = format!("{query} {suffix}");
        if candidate != query {
            results.push(candidate);
        }
    }
    for prefix in &RELATED_PREFIXES[..3] {
        let candidate = format!("{prefix} {query}");
        if candidate != query {
            results.push(candidate);
        }
    }

    if results.len() < 6 {
        if !query.contains("open source") && results.len() < 6 {
            results.push(format!("{query} open source"));
        }
        if !query.contains("alternative") && results.len() < 6 {
            results.push(format!("{query} alternatives"));
        }
        if !query.contains("review") && results.len() < 6 {
            results.push(format!("{query} review"));
        }
    }

    results.truncate(6);
    results
}
