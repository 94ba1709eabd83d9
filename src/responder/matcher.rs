//! Typo tolerant keyword matching for casual Banglish/Bengali text.

/// Keywords at least this long may miss one character.
const FUZZY_MIN_LEN: usize = 5;

/// Lowercases and keeps only ASCII letters, digits, Bengali script and whitespace.
pub fn normalize(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || is_bengali(*c) || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

fn is_bengali(c: char) -> bool {
    ('\u{0980}'..='\u{09FF}').contains(&c)
}

/// True when any keyword occurs in `input` as an in-order subsequence.
///
/// A keyword is matched against runs of as many consecutive words as it
/// has, so `kemon aso` spans two words while `hi` must fit in one and does
/// not fire on "w*h*at t*i*me". Keywords of five or more characters may
/// miss one character.
pub fn is_match(input: &str, keywords: &[&str]) -> bool {
    let normalized = normalize(input);
    let words: Vec<&str> = normalized.split_whitespace().collect();
    if words.is_empty() {
        return false;
    }

    keywords.iter().any(|kw| {
        let width = kw.split_whitespace().count();
        if width == 0 {
            return false;
        }
        let kw: Vec<char> = kw.chars().collect();
        let allow_skip = kw.len() >= FUZZY_MIN_LEN;
        words
            .windows(width.min(words.len()))
            .any(|run| {
                let text: Vec<char> = run.join(" ").chars().collect();
                subsequence_with_skip(&text, &kw, allow_skip)
            })
    })
}

/// `kw` is a subsequence of `text`, optionally after dropping one of its chars.
fn subsequence_with_skip(text: &[char], kw: &[char], allow_skip: bool) -> bool {
    let n = kw.len();

    // prefix[j]: end of the earliest match of kw[..j] (None once it fails)
    let mut prefix = vec![None; n + 1];
    prefix[0] = Some(0);
    for j in 0..n {
        prefix[j + 1] = prefix[j].and_then(|from| {
            text[from..]
                .iter()
                .position(|c| *c == kw[j])
                .map(|i| from + i + 1)
        });
    }
    if prefix[n].is_some() {
        return true;
    }
    if !allow_skip {
        return false;
    }

    // suffix[j]: start of the latest match of kw[j..]
    let mut suffix = vec![None; n + 1];
    suffix[n] = Some(text.len());
    for j in (0..n).rev() {
        suffix[j] = suffix[j + 1].and_then(|until| text[..until].iter().rposition(|c| *c == kw[j]));
    }

    (0..n).any(|skip| match (prefix[skip], suffix[skip + 1]) {
        (Some(end), Some(start)) => end <= start,
        _ => false,
    })
}

/// Mood guessed from the message, used to decorate replies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Laugh,
}

const HAPPY: &[&str] = &["khushi", "happy", "bhalo", "mazar", "mone bhalo", "valo"];
const SAD: &[&str] = &["dukho", "kosto", "bore", "tension", "bujhte parchi na", "ontor"];
const ANGRY: &[&str] = &["ragi", "raag", "krodh", "kichu bhalo lagche na"];
const LAUGH: &[&str] = &["hashi", "majadar", "boshonto", "funn", "komedi", "joke"];

/// First emotion whose keyword list has a plain substring hit, checked in
/// the order happy, sad, angry, laugh.
pub fn detect_emotion(text: &str) -> Option<Emotion> {
    let text = text.to_lowercase();
    let hit = |words: &[&str]| words.iter().any(|w| text.contains(w));

    if hit(HAPPY) {
        Some(Emotion::Happy)
    } else if hit(SAD) {
        Some(Emotion::Sad)
    } else if hit(ANGRY) {
        Some(Emotion::Angry)
    } else if hit(LAUGH) {
        Some(Emotion::Laugh)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Hello, World!! "), "hello world");
        assert_eq!(normalize("কেমন আছো?"), "কেমন আছো");
        assert_eq!(normalize("?!"), "");
    }

    #[test]
    fn test_exact_and_scattered() {
        assert!(is_match("Hello there", &["hello"]));
        assert!(is_match("h-e-l-l-o", &["hello"]));
        assert!(is_match("kemon aso bhai", &["kemon aso"]));
        assert!(!is_match("", &["hello"]));
        assert!(!is_match("anything", &[]));
    }

    #[test]
    fn test_long_keyword_tolerates_one_miss() {
        assert!(is_match("helo", &["hello"]));
        assert!(is_match("dhonobad", &["dhonnobad"]));
        assert!(is_match("thaks", &["thanks"]));
        assert!(!is_match("hlo", &["hello"]));
        assert!(!is_match("help", &["hello"]));
        // the miss may not be spread across unrelated words
        assert!(!is_match("tell me a joke", &["hello"]));
    }

    #[test]
    fn test_short_keyword_is_strict() {
        assert!(is_match("hi", &["hi"]));
        assert!(is_match("hiii bro", &["hi"]));
        assert!(!is_match("h", &["hi"]));
        assert!(!is_match("what time", &["hi"]));
        assert!(!is_match("as", &["asa"]));
        assert!(!is_match("a sa", &["asa"]));
        assert!(is_match("assalam", &["asa"]));
        assert!(!is_match("help", &["helo"]));
        assert!(is_match("helo", &["helo"]));
    }

    #[test]
    fn test_detect_emotion() {
        assert_eq!(detect_emotion("ami aj khub HAPPY"), Some(Emotion::Happy));
        assert_eq!(detect_emotion("onek tension"), Some(Emotion::Sad));
        assert_eq!(detect_emotion("ami ragi"), Some(Emotion::Angry));
        assert_eq!(detect_emotion("ekta joke bolo"), Some(Emotion::Laugh));
        assert_eq!(detect_emotion("5 + 7"), None);
        // happy wins over sad
        assert_eq!(detect_emotion("bhalo kintu tension"), Some(Emotion::Happy));
    }
}
