//! Surface-form normalization rules.
//!
//! Raw subject/object/predicate strings arrive from the extraction
//! collaborator in whatever shape the language model produced. Everything
//! here is deterministic string canonicalization; no semantic inference.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a canonical key.
const MAX_KEY_LEN: usize = 60;

/// Canonicalizes a surface form into a stable entity key.
///
/// Lowercases, replaces every non-alphanumeric run with `_`, trims leading
/// and trailing underscores, prefixes keys that would start with a digit,
/// and truncates to 60 characters. Empty input maps to `"node"`. The result
/// is a fixed point: re-canonicalizing a key returns it unchanged.
#[must_use]
pub fn canonical_key(surface: &str) -> String {
    let mut out = String::with_capacity(surface.len());
    let mut last_was_sep = true;
    for c in surface.trim().chars() {
        let mut emitted = false;
        if c.is_alphanumeric() {
            // Alphanumerics with no lowercase mapping (mathematical capitals
            // and the like) survive `to_lowercase` as uppercase; treat those
            // as separators so keys stay all-lowercase. Combining marks
            // produced by the mapping are dropped for the same reason.
            for lc in c.to_lowercase() {
                if lc.is_alphanumeric() && !lc.is_uppercase() {
                    out.push(lc);
                    emitted = true;
                }
            }
        }
        if emitted {
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        return "node".to_string();
    }
    if out.chars().next().is_some_and(char::is_numeric) {
        out.insert_str(0, "id_");
    }
    // Pop rather than truncate: multibyte alphanumerics make byte-index
    // truncation panic on char boundaries. Truncation can expose a trailing
    // underscore, so strip again afterwards.
    while out.len() > MAX_KEY_LEN {
        out.pop();
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Canonicalizes a predicate label into `UPPER_SNAKE_CASE`.
///
/// camelCase and PascalCase inputs are split at case boundaries first
/// (`StudiesIn` → `STUDIES_IN`), then non-alphanumeric runs collapse to a
/// single underscore. Empty input maps to `RELATED_TO`.
#[must_use]
pub fn canonical_predicate(label: &str) -> String {
    static CASE_BOUNDARY: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static regex"));

    let trimmed = label.trim();
    if trimmed.is_empty() {
        return "RELATED_TO".to_string();
    }

    let split = CASE_BOUNDARY.replace_all(trimmed, "${1}_${2}");
    let mut out = String::with_capacity(split.len());
    let mut last_was_sep = true;
    for c in split.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_uppercase());
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        "RELATED_TO".to_string()
    } else {
        out
    }
}

/// Normalizes a surface form for matching only (not for storage):
/// lowercased, punctuation treated as spaces, whitespace collapsed.
#[must_use]
pub fn match_form(surface: &str) -> String {
    let mut out = String::with_capacity(surface.len());
    let mut last_was_space = true;
    for c in surface.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Returns true if the surface form refers to the human user
/// ("I", "me", "the user", "speaker", …).
#[must_use]
pub fn is_user_reference(surface: &str) -> bool {
    static USER_REFS: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(i|me|my|myself|user|the user|speaker|the speaker)$").expect("static regex")
    });
    let form = match_form(surface);
    form.is_empty() || USER_REFS.is_match(&form)
}

/// Returns true for placeholder objects that carry no information.
///
/// Extractors occasionally emit generic fillers; storing them would create
/// junk nodes that alias resolution then matches against.
#[must_use]
pub fn is_garbage_object(surface: &str) -> bool {
    matches!(
        match_form(surface).as_str(),
        "" | "object"
            | "thing"
            | "something"
            | "someone"
            | "unknown"
            | "none"
            | "null"
            | "node"
            | "item"
    )
}

/// Similarity score in `[0, 1]` between two surface forms.
///
/// Exact normalized match scores 1.0. Otherwise the score is token-overlap
/// (Jaccard over words) boosted when one form contains the other, which
/// handles "Melbourne" vs "Melbourne, Australia" style aliasing without an
/// edit-distance dependency.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f32 {
    let fa = match_form(a);
    let fb = match_form(b);
    if fa.is_empty() || fb.is_empty() {
        return 0.0;
    }
    if fa == fb {
        return 1.0;
    }

    let ta: std::collections::HashSet<&str> = fa.split(' ').collect();
    let tb: std::collections::HashSet<&str> = fb.split(' ').collect();
    let shared = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    #[allow(clippy::cast_precision_loss)]
    let jaccard = shared as f32 / union as f32;

    if fa.contains(&fb) || fb.contains(&fa) {
        // Containment is a strong signal for alias pairs
        jaccard.max(0.85)
    } else {
        jaccard
    }
}
