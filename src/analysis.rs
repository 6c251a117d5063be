//! Text analysis engine.
//!
//! Pure functions only, no shared state: validation of the incoming
//! message, target-character selection (last character or last vowel),
//! case-insensitive occurrence counting, and the primality check used
//! in vowel mode.

use clap::ValueEnum;
use serde::Deserialize;

/// Which character the server counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMode {
    /// Count occurrences of the last character. Input must be purely
    /// alphabetic.
    LastChar,
    /// Count occurrences of the last vowel, scanning from the end, and
    /// report whether the count is prime. Input may contain whitespace.
    LastVowel,
}

/// Result of analyzing one message. Derived deterministically from the
/// input text; immutable once computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    /// The case-folded character that was counted.
    pub target: char,
    /// How many times it occurs in the (case-folded) message.
    pub count: usize,
    /// Whether `count` is prime. `Some` only in `LastVowel` mode.
    pub prime: Option<bool>,
}

/// Client-input failures detected during analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisError {
    /// Empty message (or whitespace-only in vowel mode).
    NoData,
    /// A character outside the mode's permitted class.
    InvalidCharacters,
    /// Valid text with no vowel to count (vowel mode only).
    NoTargetCharacter,
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::NoData => write!(f, "no data"),
            AnalysisError::InvalidCharacters => write!(f, "invalid characters"),
            AnalysisError::NoTargetCharacter => write!(f, "no target character"),
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Check that `text` contains only the character classes the mode permits.
///
/// `LastChar` accepts alphabetic characters only; `LastVowel` also accepts
/// whitespace but rejects text that is whitespace throughout.
pub fn validate(text: &str, mode: AnalysisMode) -> bool {
    match mode {
        AnalysisMode::LastChar => {
            !text.is_empty() && text.chars().all(|c| c.is_alphabetic())
        }
        AnalysisMode::LastVowel => {
            !text.trim().is_empty()
                && text.chars().all(|c| c.is_alphabetic() || c.is_whitespace())
        }
    }
}

/// Pick the character to count, case-folded.
///
/// In `LastChar` mode this is the last character and is always present for
/// valid input. In `LastVowel` mode the text is scanned from the end for
/// the first vowel; `None` means the message has no vowel, which is a
/// reportable condition rather than a defect.
pub fn select_target(text: &str, mode: AnalysisMode) -> Option<char> {
    match mode {
        AnalysisMode::LastChar => text.chars().last().map(fold),
        AnalysisMode::LastVowel => text
            .chars()
            .rev()
            .find(|c| is_vowel(*c))
            .map(fold),
    }
}

/// Case-insensitive count of `target` within `text`.
pub fn count_occurrences(text: &str, target: char) -> usize {
    let target = fold(target);
    text.chars().filter(|c| fold(*c) == target).count()
}

/// Trial division up to the square root. 0 and 1 are not prime.
pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n == 2 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut i = 3;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Run the full pipeline for one message: validate, select the target,
/// count, and (in vowel mode) check primality.
pub fn analyze(text: &str, mode: AnalysisMode) -> Result<AnalysisResult, AnalysisError> {
    if text.is_empty() {
        return Err(AnalysisError::NoData);
    }
    if !validate(text, mode) {
        // Whitespace-only text passes the character-class check in vowel
        // mode but carries no message.
        if mode == AnalysisMode::LastVowel && text.trim().is_empty() {
            return Err(AnalysisError::NoData);
        }
        return Err(AnalysisError::InvalidCharacters);
    }

    let target = select_target(text, mode).ok_or(AnalysisError::NoTargetCharacter)?;
    let count = count_occurrences(text, target);

    let prime = match mode {
        AnalysisMode::LastChar => None,
        AnalysisMode::LastVowel => Some(is_prime(count)),
    };

    Ok(AnalysisResult {
        target,
        count,
        prime,
    })
}

fn is_vowel(c: char) -> bool {
    matches!(fold(c), 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Single-character case fold. Characters whose lowercase expands to more
/// than one character keep their first mapping.
fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_last_char() {
        assert!(validate("hola", AnalysisMode::LastChar));
        assert!(validate("Banana", AnalysisMode::LastChar));
        assert!(!validate("", AnalysisMode::LastChar));
        assert!(!validate("test123", AnalysisMode::LastChar));
        assert!(!validate("hello world", AnalysisMode::LastChar));
        assert!(!validate("punto.", AnalysisMode::LastChar));
    }

    #[test]
    fn test_validate_last_vowel() {
        assert!(validate("hello world", AnalysisMode::LastVowel));
        assert!(validate("hola", AnalysisMode::LastVowel));
        assert!(!validate("test123", AnalysisMode::LastVowel));
        assert!(!validate("   ", AnalysisMode::LastVowel));
        assert!(!validate("", AnalysisMode::LastVowel));
    }

    #[test]
    fn test_select_target_last_char() {
        assert_eq!(select_target("hola", AnalysisMode::LastChar), Some('a'));
        assert_eq!(select_target("reconoceR", AnalysisMode::LastChar), Some('r'));
        assert_eq!(select_target("", AnalysisMode::LastChar), None);
    }

    #[test]
    fn test_select_target_last_vowel() {
        assert_eq!(select_target("hello world", AnalysisMode::LastVowel), Some('o'));
        assert_eq!(select_target("banana", AnalysisMode::LastVowel), Some('a'));
        assert_eq!(select_target("xyz", AnalysisMode::LastVowel), None);
        assert_eq!(select_target("grEy", AnalysisMode::LastVowel), Some('e'));
    }

    #[test]
    fn test_count_occurrences() {
        assert_eq!(count_occurrences("banana", 'a'), 3);
        assert_eq!(count_occurrences("reconocer", 'r'), 3);
        assert_eq!(count_occurrences("Banana", 'A'), 3);
        assert_eq!(count_occurrences("xyz", 'a'), 0);
    }

    #[test]
    fn test_is_prime() {
        assert!(!is_prime(0));
        assert!(!is_prime(1));
        assert!(is_prime(2));
        assert!(is_prime(3));
        assert!(!is_prime(4));
        assert!(is_prime(5));
        assert!(!is_prime(9));
        assert!(is_prime(13));
        assert!(!is_prime(15));
        assert!(is_prime(97));
        assert!(!is_prime(100));
    }

    #[test]
    fn test_analyze_last_char_scenarios() {
        let r = analyze("hola", AnalysisMode::LastChar).unwrap();
        assert_eq!((r.target, r.count, r.prime), ('a', 1, None));

        let r = analyze("banana", AnalysisMode::LastChar).unwrap();
        assert_eq!((r.target, r.count), ('a', 3));

        let r = analyze("reconocer", AnalysisMode::LastChar).unwrap();
        assert_eq!((r.target, r.count), ('r', 3));

        assert_eq!(
            analyze("test123", AnalysisMode::LastChar),
            Err(AnalysisError::InvalidCharacters)
        );
        assert_eq!(
            analyze("hello world", AnalysisMode::LastChar),
            Err(AnalysisError::InvalidCharacters)
        );
        assert_eq!(analyze("", AnalysisMode::LastChar), Err(AnalysisError::NoData));
    }

    #[test]
    fn test_analyze_last_vowel_scenarios() {
        let r = analyze("hello world", AnalysisMode::LastVowel).unwrap();
        assert_eq!(r.target, 'o');
        assert_eq!(r.count, 2);
        assert_eq!(r.prime, Some(true));

        let r = analyze("banana", AnalysisMode::LastVowel).unwrap();
        assert_eq!(r.count, 3);
        assert_eq!(r.prime, Some(true));

        assert_eq!(
            analyze("xyz", AnalysisMode::LastVowel),
            Err(AnalysisError::NoTargetCharacter)
        );
        assert_eq!(
            analyze("   ", AnalysisMode::LastVowel),
            Err(AnalysisError::NoData)
        );
        assert_eq!(
            analyze("test123", AnalysisMode::LastVowel),
            Err(AnalysisError::InvalidCharacters)
        );
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let a = analyze("reconocer", AnalysisMode::LastChar).unwrap();
        let b = analyze("reconocer", AnalysisMode::LastChar).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_count_at_least_one_for_valid_last_char() {
        for s in ["a", "hola", "abcdefg", "aaa", "Zz"] {
            let r = analyze(s, AnalysisMode::LastChar).unwrap();
            assert!(r.count >= 1, "count for {s:?} should be >= 1");
        }
    }
}
