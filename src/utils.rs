/// Cuts `s` to at most `max_chars` characters without splitting a code point.
#[inline]
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}


/// Like [`safe_truncate`], marking the cut with `...`. Used for log previews.
#[inline]
pub fn preview(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", safe_truncate(s, max_chars))
    } else {
        s.to_string()
    }
}


/// Rounds to two decimals for presentation. Scores are never rounded before
/// they are compared or ranked.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(safe_truncate("naïve résumé", 5), "naïve");
        assert_eq!(safe_truncate("日本語のテキスト", 3), "日本語");
        assert_eq!(safe_truncate("hi", 10), "hi");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("plagiarism", 4), "plag...");
        assert_eq!(preview("ok", 4), "ok");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(45.0), 45.0);
        assert_eq!(round2(0.004), 0.0);
    }
}
