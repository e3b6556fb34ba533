//! Fuzzy matching of user input against cached candidate lists.

const MAX_SUGGESTIONS: usize = 10;

/// Similarity (0-100) of the shorter string against the best-matching
/// equal-length window of the longer one. Case-insensitive.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return if long.is_empty() { 100 } else { 0 };
    }

    let needle: String = short.iter().collect();
    let best = long
        .windows(short.len())
        .map(|window| {
            let window: String = window.iter().collect();
            strsim::normalized_levenshtein(&needle, &window)
        })
        .fold(0.0_f64, f64::max);

    (best * 100.0).round() as u8
}

fn ranked<'a, I>(query: &str, candidates: I) -> Vec<(u8, &'a str)>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut scored: Vec<(u8, &str)> = candidates
        .into_iter()
        .map(|c| (partial_ratio(query, c), c.as_str()))
        .collect();
    // Stable sort keeps candidate order for equal scores.
    scored.sort_by(|x, y| y.0.cmp(&x.0));
    scored
}

/// The single best match for `query`, if there are any candidates.
pub fn fuzz_best<'a, I>(query: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a String>,
{
    ranked(query, candidates)
        .into_iter()
        .next()
        .map(|(_, c)| c.to_string())
}

/// Up to ten matches for `query`, best first.
pub fn fuzz_multiple<'a, I>(query: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    ranked(query, candidates)
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, c)| c.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn substring_is_a_perfect_partial_match() {
        assert_eq!(partial_ratio("hana", "Hanamura"), 100);
        assert_eq!(partial_ratio("Hanamura", "hana"), 100);
    }

    #[test]
    fn unrelated_strings_score_low() {
        assert!(partial_ratio("xyz", "Hanamura") < 50);
        assert_eq!(partial_ratio("", "abc"), 0);
    }

    #[test]
    fn best_match_wins() {
        let maps = names(&["Busan", "Ayutthaya", "Hanamura"]);
        assert_eq!(fuzz_best("ayuthaya", &maps).as_deref(), Some("Ayutthaya"));
        assert_eq!(fuzz_best("anything", &Vec::<String>::new()), None);
    }

    #[test]
    fn multiple_matches_are_ranked() {
        let maps = names(&["Hollywood", "Havana", "Hanamura"]);
        assert_eq!(fuzz_multiple("hana", &maps), vec!["Hanamura", "Havana", "Hollywood"]);
    }

    #[test]
    fn multiple_matches_are_capped() {
        let many: Vec<String> = (0..30).map(|i| format!("tag{i}")).collect();
        assert_eq!(fuzz_multiple("tag", &many).len(), 10);
    }
}
