//! Text helpers shared by formatters, intents and skills.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use rand::seq::IndexedRandom;
use regex::Regex;

pub(crate) static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://[^\s()]+").expect("valid link regex"));

static CONFIRM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:да|конечно|соглас\w*|подтвер\w*|хорошо|ладно|давай|верно)\b")
        .expect("valid confirm regex")
});

static NEGATED_CONFIRM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bне\s+(?:соглас|подтвер|хорошо|ладно|давай|верно)")
        .expect("valid negation regex")
});

static REJECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:нет|неа|не|отказ\w*|отмен\w*|никогда)\b").expect("valid reject regex")
});

/// Compiled intent patterns keyed by the joined source; `None` for patterns that do not compile.
static PATTERN_CACHE: Lazy<DashMap<String, Option<Regex>>> = Lazy::new(DashMap::new);

/// Outcome of [`text_similarity`].
#[derive(Debug, Clone, PartialEq)]
pub struct Similarity {
    pub status: bool,
    /// Index of the best candidate.
    pub index: Option<usize>,
    pub text: Option<String>,
    pub percent: f64,
}

/// Truncate `text` to `size` characters. With `ellipsis`, the last three are replaced by `...`.
pub fn resize(text: &str, size: usize, ellipsis: bool) -> String {
    if text.chars().count() <= size {
        return text.to_string();
    }
    if ellipsis {
        let keep = size.saturating_sub(3);
        let mut out: String = text.chars().take(keep).collect();
        out.push_str("...");
        out
    } else {
        text.chars().take(size).collect()
    }
}

pub fn is_url(link: &str) -> bool {
    LINK_RE.is_match(link)
}

/// User agreed ("да", "согласен", "подтверждаю"), unless the agreement is negated.
pub fn is_say_true(text: &str) -> bool {
    !text.is_empty() && CONFIRM_RE.is_match(text) && !NEGATED_CONFIRM_RE.is_match(text)
}

/// User refused ("нет", "не согласен", "отмена").
pub fn is_say_false(text: &str) -> bool {
    !text.is_empty() && REJECT_RE.is_match(text)
}

/// True when any of `find` occurs in `text`. With `is_pattern`, each entry is a
/// case-insensitive regular expression.
pub fn is_say_text<S: AsRef<str>>(find: &[S], text: &str, is_pattern: bool) -> bool {
    if text.is_empty() {
        return false;
    }
    if is_pattern {
        let joined = find
            .iter()
            .map(|f| format!("(?:{})", f.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        return pattern(joined).is_some_and(|re| re.is_match(text));
    }
    find.iter().any(|f| {
        let f = f.as_ref();
        !f.is_empty() && text.contains(f)
    })
}

fn pattern(joined: String) -> Option<Regex> {
    if let Some(cached) = PATTERN_CACHE.get(&joined) {
        return cached.clone();
    }
    let compiled = match Regex::new(&format!("(?i){joined}")) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(target: "umbot::text", "invalid intent pattern {joined}: {e}");
            None
        }
    };
    PATTERN_CACHE.insert(joined, compiled.clone());
    compiled
}

/// Random variant from the list; empty string for an empty list.
pub fn get_text<S: AsRef<str>>(variants: &[S]) -> String {
    variants
        .choose(&mut rand::rng())
        .map(|s| s.as_ref().to_string())
        .unwrap_or_default()
}

/// Russian plural form: `titles` = [one, few, many], e.g. ["яблоко", "яблока", "яблок"].
pub fn get_ending<S: AsRef<str>>(num: i64, titles: &[S]) -> Option<&str> {
    let n = num.unsigned_abs() % 100;
    let idx = if (5..=20).contains(&n) {
        2
    } else {
        match n % 10 {
            1 => 0,
            2..=4 => 1,
            _ => 2,
        }
    };
    titles
        .get(idx)
        .or_else(|| titles.first())
        .map(|s| s.as_ref())
}

/// Best match of `orig` among `candidates` by similar-text percentage (case-insensitive).
pub fn text_similarity<S: AsRef<str>>(orig: &str, candidates: &[S], percent: f64) -> Similarity {
    let orig_lower: Vec<char> = orig.to_lowercase().chars().collect();
    let mut best = Similarity {
        status: false,
        index: None,
        text: None,
        percent: 0.0,
    };

    for (i, candidate) in candidates.iter().enumerate() {
        let candidate = candidate.as_ref();
        let lower: Vec<char> = candidate.to_lowercase().chars().collect();
        if lower == orig_lower {
            return Similarity {
                status: true,
                index: Some(i),
                text: Some(candidate.to_string()),
                percent: 100.0,
            };
        }
        let total = orig_lower.len() + lower.len();
        if total == 0 {
            continue;
        }
        let score = similar_chars(&orig_lower, &lower) as f64 * 2.0 * 100.0 / total as f64;
        if score > best.percent {
            best.percent = score;
            best.index = Some(i);
            best.text = Some(candidate.to_string());
        }
    }

    best.status = best.index.is_some() && best.percent >= percent;
    best
}

/// Number of matching characters: longest common substring, then recurse on both sides.
fn similar_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (mut pos_a, mut pos_b, mut max) = (0, 0, 0);
    for i in 0..a.len() {
        for j in 0..b.len() {
            let mut k = 0;
            while i + k < a.len() && j + k < b.len() && a[i + k] == b[j + k] {
                k += 1;
            }
            if k > max {
                max = k;
                pos_a = i;
                pos_b = j;
            }
        }
    }
    if max == 0 {
        return 0;
    }
    max + similar_chars(&a[..pos_a], &b[..pos_b])
        + similar_chars(&a[pos_a + max..], &b[pos_b + max..])
}
