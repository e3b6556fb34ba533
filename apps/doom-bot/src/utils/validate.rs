//! Argument validation and correction applied before a command runs.

use crate::cache::Cache;
use crate::error::Error;
use crate::utils::{fuzz, time};

const CODE_MIN_LEN: usize = 4;
const CODE_MAX_LEN: usize = 6;

/// Uppercase, swap the letter `O` for zero and trim. The result must be
/// 4-6 ASCII letters or digits.
pub fn normalize_map_code(raw: &str) -> Result<String, Error> {
    let code = raw.trim().to_uppercase().replace('O', "0");
    let valid_len = (CODE_MIN_LEN..=CODE_MAX_LEN).contains(&code.len());
    if valid_len && code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        Ok(code)
    } else {
        Err(Error::IncorrectCodeFormat)
    }
}

/// A normalized map code that must already exist.
pub async fn existing_map_code(cache: &Cache, raw: &str) -> Result<String, Error> {
    let code = normalize_map_code(raw)?;
    if cache.maps.read().await.contains_key(&code) {
        Ok(code)
    } else {
        Err(Error::InvalidMapCode)
    }
}

/// Exact level name, or the closest level on that map.
pub async fn map_level(cache: &Cache, map_code: &str, raw: &str) -> Result<String, Error> {
    let map = cache.map(map_code).await.ok_or(Error::InvalidMapCode)?;
    correct(raw, &map.levels).ok_or(Error::InvalidMapLevel)
}

pub async fn map_name(cache: &Cache, raw: &str) -> Result<String, Error> {
    correct(raw, &cache.map_names.read().await).ok_or(Error::InvalidMapName)
}

pub async fn map_type(cache: &Cache, raw: &str) -> Result<String, Error> {
    correct(raw, &cache.map_types.read().await).ok_or(Error::InvalidMapType)
}

pub async fn exercise(cache: &Cache, raw: &str) -> Result<String, Error> {
    let names: Vec<String> = cache.exercises.read().await.keys().cloned().collect();
    correct(raw, &names).ok_or(Error::ExerciseDoesntExist)
}

/// A user id picked from the user autocomplete list.
pub async fn known_user(cache: &Cache, raw: &str) -> Result<u64, Error> {
    let id: u64 = raw.trim().parse().map_err(|_| Error::UserNotFound)?;
    if cache.users.read().await.contains_key(&id) {
        Ok(id)
    } else {
        Err(Error::UserNotFound)
    }
}

/// A completion time. Zero, negative and non-finite values are rejected.
pub fn record(raw: &str) -> Result<f64, Error> {
    let record = time::time_convert(raw)?;
    if record.is_finite() && record > 0.0 {
        Ok(record)
    } else {
        Err(Error::IncorrectRecordFormat)
    }
}

/// Keep an exact match, otherwise fall back to the closest candidate.
pub fn correct(raw: &str, candidates: &[String]) -> Option<String> {
    if candidates.iter().any(|c| c == raw) {
        return Some(raw.to_string());
    }
    fuzz::fuzz_best(raw, candidates)
}

/// Add a scheme when missing and make sure the link is well formed.
pub fn normalize_url(raw: &str) -> Result<url::Url, Error> {
    let trimmed = raw.trim();
    let with_scheme = if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let parsed = url::Url::parse(&with_scheme).map_err(|_| Error::IncorrectUrlFormat)?;
    match parsed.host_str() {
        Some(host) if host.contains('.') => Ok(parsed),
        _ => Err(Error::IncorrectUrlFormat),
    }
}

/// Normalize the link and check it answers with 200. Returns the final
/// URL after redirects.
pub async fn reachable_url(http: &reqwest::Client, raw: &str) -> Result<String, Error> {
    let url = normalize_url(raw)?;
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|_| Error::IncorrectUrlFormat)?;
    if response.status() != reqwest::StatusCode::OK {
        return Err(Error::IncorrectUrlFormat);
    }
    Ok(response.url().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_codes_are_normalized() {
        assert_eq!(normalize_map_code(" abcde ").unwrap(), "ABCDE");
        assert_eq!(normalize_map_code("o0o0").unwrap(), "0000");
        assert_eq!(normalize_map_code("Sd8Y2").unwrap(), "SD8Y2");
    }

    #[test]
    fn bad_map_codes_are_rejected() {
        for raw in ["abc", "abcdefg", "ab-cd", "ABC D", "ÄBCDE"] {
            assert!(
                matches!(normalize_map_code(raw), Err(Error::IncorrectCodeFormat)),
                "{raw}"
            );
        }
    }

    #[test]
    fn exact_matches_are_kept() {
        let levels = vec!["Level 1".to_string(), "Bonus".to_string()];
        assert_eq!(correct("Bonus", &levels).as_deref(), Some("Bonus"));
        assert_eq!(correct("levl 1", &levels).as_deref(), Some("Level 1"));
        assert_eq!(correct("anything", &[]), None);
    }

    #[test]
    fn records_must_be_positive() {
        assert_eq!(record("1:05.50").unwrap(), 65.5);
        assert_eq!(record("0.01").unwrap(), 0.01);
        for raw in ["0", "-5", "-0:30", "0:00.00"] {
            assert!(
                matches!(record(raw), Err(Error::IncorrectRecordFormat)),
                "{raw} accepted"
            );
        }
    }

    #[test]
    fn urls_get_a_scheme() {
        assert_eq!(
            normalize_url("youtu.be/abc").unwrap().as_str(),
            "https://youtu.be/abc"
        );
        assert_eq!(
            normalize_url("http://example.com/x").unwrap().as_str(),
            "http://example.com/x"
        );
        assert!(normalize_url("not a url").is_err());
        assert!(normalize_url("localhost").is_err());
    }

    #[tokio::test]
    async fn map_lookups_use_the_cache() {
        let cache = Cache::default();
        cache
            .add_map("ABC12".into(), vec!["Start".into(), "Finish".into()], 7)
            .await;
        cache.upsert_user(7, "mapper".into(), true).await;

        assert_eq!(existing_map_code(&cache, "abc12").await.unwrap(), "ABC12");
        assert!(matches!(
            existing_map_code(&cache, "ZZZZ").await,
            Err(Error::InvalidMapCode)
        ));
        assert_eq!(map_level(&cache, "ABC12", "finsh").await.unwrap(), "Finish");
        assert_eq!(known_user(&cache, "7").await.unwrap(), 7);
        assert!(matches!(known_user(&cache, "8").await, Err(Error::UserNotFound)));
    }
}
