//! "Did you mean?" name suggestions.
//!
//! Unknown-identifier diagnostics (E101 unknown variable, E102 unknown
//! function, E103 unknown type, E104 unknown process) suggest the closest
//! match from the set of names that were actually in scope, using
//! Jaro-Winkler similarity over that lexicon.

/// Names with a Jaro-Winkler similarity to `name` strictly greater than this
/// are considered plausible typos.
pub const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Find the closest match to `name` among `candidates`, if any candidate's
/// similarity exceeds [`SUGGESTION_THRESHOLD`].
///
/// Ties are broken by first occurrence in `candidates`.
pub fn suggest<'a, I>(name: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        if candidate == name {
            continue;
        }
        let score = strsim::jaro_winkler(name, candidate);
        if score > SUGGESTION_THRESHOLD {
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((candidate, score)),
            }
        }
    }
    best.map(|(s, _)| s)
}
