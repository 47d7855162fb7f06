/// Gross words per minute over every keystroke typed, correct or not.
///
/// The 5-characters-per-word constant is the standard typing-test
/// convention. Counting erroneous keystrokes is intentional and matches the
/// scoring the rest of the system was tuned against.
pub fn gross_wpm(chars: usize, seconds: f64) -> f64 {
    if seconds <= 0.0 {
        return 0.0;
    }
    (chars as f64 / 5.0) / (seconds / 60.0)
}

/// [`gross_wpm`] rounded to the nearest whole number, as displayed and as
/// carried on the wire.
pub fn rounded_wpm(chars: usize, seconds: f64) -> u32 {
    gross_wpm(chars, seconds).round() as u32
}

/// Accuracy percentage, rounded. An empty session counts as 100%.
pub fn accuracy(correct_chars: usize, total_chars: usize) -> u8 {
    if total_chars == 0 {
        return 100;
    }
    ((correct_chars as f64 / total_chars as f64) * 100.0).round() as u8
}

/// Share of the target text typed so far, 0-100.
pub fn progress_percent(typed_chars: usize, target_chars: usize) -> f64 {
    if target_chars == 0 {
        return 0.0;
    }
    typed_chars as f64 / target_chars as f64 * 100.0
}
