const STAR: char = '★';
const EMPTY_STAR: char = '☆';
const MAX_STARS: usize = 6;

pub const NUMBER_EMOJI: [&str; 10] = [
    "1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟",
];

/// Medal shown next to the top three leaderboard positions.
pub fn placement_emoji(rank: usize) -> &'static str {
    match rank {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "",
    }
}

/// `1` -> `1st`, `12` -> `12th`, `122` -> `122nd`.
pub fn make_ordinal(n: u64) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Star bar for a 1-6 rating, or `Unrated`.
pub fn create_stars(rating: Option<f64>) -> String {
    match rating {
        Some(r) if r > 0.0 => {
            let filled = (r.ceil() as usize).min(MAX_STARS);
            let mut stars: String = std::iter::repeat(STAR).take(filled).collect();
            stars.extend(std::iter::repeat(EMPTY_STAR).take(MAX_STARS - filled));
            stars
        }
        _ => "Unrated".to_string(),
    }
}

/// Whether item `index` of `len` items closes an embed page of `per_page`.
pub fn is_page_boundary(index: usize, per_page: usize, len: usize) -> bool {
    (index + 1) % per_page.max(1) == 0 || index + 1 == len
}

/// Group preformatted lines into page bodies of `per_page` lines each.
pub fn chunk_lines(lines: &[String], per_page: usize) -> Vec<String> {
    lines
        .chunks(per_page.max(1))
        .map(|chunk| chunk.join("\n"))
        .collect()
}

/// `999` -> `999`, `1500` -> `1.5k`, `2_250_000` -> `2.25m`.
pub fn format_xp(xp: i64) -> String {
    fn trim(value: String) -> String {
        value.trim_end_matches('0').trim_end_matches('.').to_string()
    }

    if xp >= 1_000_000 {
        let truncated = (xp / 10_000) as f64 / 100.0;
        format!("{}m", trim(format!("{truncated:.2}")))
    } else if xp > 999 {
        let truncated = (xp / 100) as f64 / 10.0;
        format!("{}k", trim(format!("{truncated:.1}")))
    } else {
        xp.to_string()
    }
}

/// `owo` speech: `l`/`r` become `w`, `L`/`R` become `W`.
pub fn uwuify(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'l' | 'r' => 'w',
            'L' | 'R' => 'W',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals() {
        let cases = [
            (0, "0th"),
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (111, "111th"),
            (122, "122nd"),
            (213, "213th"),
        ];
        for (n, expected) in cases {
            assert_eq!(make_ordinal(n), expected);
        }
    }

    #[test]
    fn stars() {
        assert_eq!(create_stars(None), "Unrated");
        assert_eq!(create_stars(Some(0.0)), "Unrated");
        assert_eq!(create_stars(Some(3.0)), "★★★☆☆☆");
        assert_eq!(create_stars(Some(4.2)), "★★★★★☆");
        assert_eq!(create_stars(Some(6.0)), "★★★★★★");
    }

    #[test]
    fn page_boundaries() {
        assert!(is_page_boundary(0, 10, 1));
        assert!(!is_page_boundary(0, 10, 5));
        assert!(is_page_boundary(4, 10, 5));
        assert!(is_page_boundary(9, 10, 25));
        assert!(!is_page_boundary(10, 10, 25));
        assert!(is_page_boundary(24, 10, 25));
    }

    #[test]
    fn every_page_holds_per_page_items() {
        let page_sizes = |len: usize| {
            let mut sizes = Vec::new();
            let mut current = 0;
            for i in 0..len {
                current += 1;
                if is_page_boundary(i, 10, len) {
                    sizes.push(current);
                    current = 0;
                }
            }
            sizes
        };
        assert_eq!(page_sizes(10), vec![10]);
        assert_eq!(page_sizes(11), vec![10, 1]);
        assert_eq!(page_sizes(25), vec![10, 10, 5]);
    }

    #[test]
    fn chunks_lines_into_pages() {
        let lines: Vec<String> = (1..=5).map(|i| i.to_string()).collect();
        assert_eq!(chunk_lines(&lines, 2), vec!["1\n2", "3\n4", "5"]);
    }

    #[test]
    fn xp_abbreviations() {
        assert_eq!(format_xp(999), "999");
        assert_eq!(format_xp(1000), "1k");
        assert_eq!(format_xp(1500), "1.5k");
        assert_eq!(format_xp(12_345), "12.3k");
        assert_eq!(format_xp(2_250_000), "2.25m");
    }

    #[test]
    fn uwu() {
        assert_eq!(uwuify("Hello World"), "Hewwo Wowwd");
        assert_eq!(uwuify("RARE"), "WAWE");
    }
}
