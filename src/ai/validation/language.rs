//! Script-ratio language detection
//!
//! A field is "mostly foreign" for a non-Latin target language when ASCII
//! letters make up more than `threshold` of all letters in it.

/// ASCII letters over all alphabetic characters, `None` without letters
pub fn ascii_ratio(text: &str) -> Option<f64> {
    let mut letters = 0usize;
    let mut ascii = 0usize;
    for ch in text.chars().filter(|c| c.is_alphabetic()) {
        letters += 1;
        if ch.is_ascii_alphabetic() {
            ascii += 1;
        }
    }
    (letters > 0).then(|| ascii as f64 / letters as f64)
}

pub fn is_mostly_foreign(text: &str, threshold: f64) -> bool {
    ascii_ratio(text).is_some_and(|ratio| ratio > threshold)
}

/// Check only the first `sample_size` entries of a list
pub fn list_is_mostly_foreign(lines: &[String], sample_size: usize, threshold: f64) -> bool {
    let sample = lines
        .iter()
        .take(sample_size)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    is_mostly_foreign(&sample, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio() {
        assert_eq!(ascii_ratio("abc"), Some(1.0));
        assert_eq!(ascii_ratio("가나다"), Some(0.0));
        assert_eq!(ascii_ratio("가a"), Some(0.5));
        assert_eq!(ascii_ratio("123 !?"), None);
        assert_eq!(ascii_ratio(""), None);
    }

    #[test]
    fn test_mostly_foreign() {
        assert!(is_mostly_foreign("Top 5 foods to avoid after 50", 0.4));
        assert!(!is_mostly_foreign("50대 이후 조심해야 할 음식 TOP5", 0.4));
        assert!(!is_mostly_foreign("", 0.4));
        assert!(!is_mostly_foreign("2024-01-01", 0.4));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // 2 ascii of 4 letters = 0.5
        assert!(!is_mostly_foreign("ab가나", 0.5));
        assert!(is_mostly_foreign("ab가나", 0.49));
    }

    #[test]
    fn test_list_sample() {
        let lines: Vec<String> = vec!["건강 식단", "운동 습관", "수면 관리", "English tail line"]
            .into_iter()
            .map(String::from)
            .collect();
        assert!(!list_is_mostly_foreign(&lines, 3, 0.4));

        let english: Vec<String> = vec!["Healthy diet", "Exercise", "건강"]
            .into_iter()
            .map(String::from)
            .collect();
        assert!(list_is_mostly_foreign(&english, 3, 0.4));
    }
}
