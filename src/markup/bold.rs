use std::sync::LazyLock;

use regex::Regex;

/// Matches either a maximal run of word characters or one single
/// non-word, non-whitespace character. Whitespace acts as a separator and
/// never becomes a token of its own.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+|[^\w\s]").unwrap());

/// Matches a token that is exactly one punctuation character.
static PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\w\s]$").unwrap());

/// Wrap the leading characters of each word in `text` in `<b>` markers.
///
/// Words of up to three characters get a one-character prefix; longer
/// words get `ceil(log2(len))` characters. Punctuation hugs the word
/// before it, and tokens are joined with single spaces — interior
/// whitespace is normalized, not preserved.
///
/// # Example
///
/// ```
/// use embold::bold;
///
/// assert_eq!(bold("cat"), "<b>c</b>at");
/// assert_eq!(bold("Hello, world!"), "<b>Hel</b>lo, <b>wor</b>ld!");
/// ```
pub fn bold(text: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    for token in TOKEN_RE.find_iter(text).map(|m| m.as_str()) {
        if PUNCT_RE.is_match(token) {
            match parts.last_mut() {
                Some(last) => last.push_str(token),
                None => parts.push(token.to_string()),
            }
        } else {
            parts.push(bold_word(token));
        }
    }
    parts.join(" ")
}

/// Bold-prefix length for a word of `len` characters.
///
/// `ceil(log2(len))` stays strictly below `len` for every `len > 3`, so
/// the prefix never swallows a whole word.
fn prefix_len(len: usize) -> usize {
    if len <= 3 {
        1
    } else {
        (len - 1).ilog2() as usize + 1
    }
}

fn bold_word(word: &str) -> String {
    let len = word.chars().count();
    let prefix = prefix_len(len);
    // Prefix is counted in characters; find its byte boundary.
    let split = word
        .char_indices()
        .nth(prefix)
        .map_or(word.len(), |(index, _)| index);
    format!("<b>{}</b>{}", &word[..split], &word[split..])
}
