/// One "word" is five characters, the conventional WPM normalization.
const CHARS_PER_WORD: f64 = 5.0;

/// Words per minute from correct characters over elapsed wall-clock seconds.
/// The one-second floor on the denominator guards the divide during the very
/// first second of a run.
pub fn wpm(correct_count: usize, elapsed_secs: f64) -> f64 {
    let minutes = (elapsed_secs / 60.0).max(1.0 / 60.0);
    ((correct_count as f64 / CHARS_PER_WORD) / minutes).max(0.0).round()
}

/// Error percentage over typed keystrokes. This is the canonical denominator
/// everywhere in the crate; live and final displays always agree.
pub fn error_rate(error_count: usize, keystroke_count: usize) -> f64 {
    if keystroke_count == 0 {
        0.0
    } else {
        (error_count as f64 / keystroke_count as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wpm_zero_correct_is_zero() {
        assert_eq!(wpm(0, 1.0), 0.0);
        assert_eq!(wpm(0, 60.0), 0.0);
        assert_eq!(wpm(0, 0.0), 0.0);
    }

    #[test]
    fn wpm_seven_chars_in_a_minute_rounds_to_one() {
        // 7 correct chars = 1.4 words over one minute
        assert_eq!(wpm(7, 60.0), 1.0);
    }

    #[test]
    fn wpm_first_second_is_clamped() {
        // 10 chars in 0.1s would explode without the floor; with the 1/60
        // minute clamp it reads as 10 chars in one second.
        assert_eq!(wpm(10, 0.1), 120.0);
    }

    #[test]
    fn wpm_is_never_negative() {
        assert!(wpm(0, 0.0) >= 0.0);
        assert!(wpm(1000, 1.0) >= 0.0);
    }

    #[test]
    fn error_rate_no_keystrokes_is_zero() {
        assert_eq!(error_rate(0, 0), 0.0);
    }

    #[test]
    fn error_rate_one_in_four_is_25_percent() {
        assert_eq!(error_rate(1, 4), 25.0);
    }

    #[test]
    fn error_rate_is_bounded() {
        assert_eq!(error_rate(0, 10), 0.0);
        assert_eq!(error_rate(10, 10), 100.0);
    }
}
