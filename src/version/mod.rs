//! Item name/version parsing and version ordering.
//!
//! Munki refers to items either by bare name (`"Firefox"`) or by name and
//! version (`"Firefox-52.0"`). [`split_name_and_version`] recovers the two
//! parts; [`compare_versions`] orders version strings so that newer versions
//! sort first when used with a reversed comparator.
//!
//! # Example
//!
//! ```
//! use std::cmp::Ordering;
//!
//! use munki_repo::version::{compare_versions, split_name_and_version};
//!
//! assert_eq!(split_name_and_version("Firefox-52.0", true), ("Firefox", "52.0"));
//! assert_eq!(compare_versions("1.0", "1.0b1"), Ordering::Greater);
//! ```

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;


/// Separators accepted between name and version when `only_hyphens` is false.
const SEPARATORS: &[char] = &['-', ' ', '_', '.'];

/// Split an item identifier into `(name, version)`.
///
/// With `only_hyphens` set (manifest entries and `requires` / `update_for`
/// lists, where names may contain spaces), only `--` or `-` separate name from
/// version. A `--` is tried first; otherwise the last `-` wins, provided the
/// text after it starts with a digit. `"foo-1.2.3-1"` therefore yields
/// `("foo-1.2.3", "1")` and `"foo--1.2.3-1"` yields `("foo", "1.2.3-1")`.
///
/// Without `only_hyphens`, a hyphen, space, underscore or dot may separate
/// the two parts, but only when everything after the separator is a single
/// version token (a digit followed by alphanumerics, optionally more
/// dot-separated alphanumeric groups). The leftmost such separator wins, so
/// names that merely contain dots stay intact.
///
/// When no version can be found the whole input is returned as the name and
/// the version is empty.
pub fn split_name_and_version(identifier: &str, only_hyphens: bool) -> (&str, &str) {
    if only_hyphens {
        split_on_hyphens(identifier)
    } else {
        split_on_separators(identifier)
    }
}

fn split_on_hyphens(identifier: &str) -> (&str, &str) {
    for delim in ["--", "-"] {
        if let Some(idx) = identifier.rfind(delim) {
            let version = &identifier[idx + delim.len()..];
            if version.starts_with(|c: char| c.is_ascii_digit()) {
                return (&identifier[..idx], version);
            }
        }
    }
    (identifier, "")
}

fn split_on_separators(identifier: &str) -> (&str, &str) {
    let mut search_from = 0;
    while let Some(offset) = identifier[search_from..].find(SEPARATORS) {
        let sep_start = search_from + offset;
        let rest = &identifier[sep_start..];
        let version = rest.trim_start_matches(SEPARATORS);
        let name = identifier[..sep_start].trim_end_matches(SEPARATORS);

        if !name.is_empty() && is_version_token(version) {
            return (name, version);
        }

        // Skip the whole run of separators before looking again
        search_from = identifier.len() - version.len();
        if version.is_empty() {
            break;
        }
    }
    (identifier, "")
}

/// True if `candidate` looks like a version: `12`, `2.3b1`, `11.0.1a`.
pub(crate) fn is_version_token(candidate: &str) -> bool {
    static VERSION_TOKEN_RE: OnceLock<Regex> = OnceLock::new();

    let re = VERSION_TOKEN_RE.get_or_init(|| {
        Regex::new(r"^[0-9]+[0-9A-Za-z]*(?:\.[0-9A-Za-z]+)*$")
            .expect("version token regex should compile")
    });
    re.is_match(candidate)
}

/// One run inside a version component: all digits or all non-digits.
#[derive(Debug, Clone, Copy)]
enum Token<'a> {
    Number(&'a str),
    Text(&'a str),
}

/// A dot-separated version component split into its numeric prefix and the
/// remaining suffix runs (`"3b1"` → prefix `3`, suffix `[b, 1]`).
#[derive(Debug)]
struct Component<'a> {
    prefix: Option<&'a str>,
    suffix: Vec<Token<'a>>,
}

impl<'a> Component<'a> {
    fn parse(text: &'a str) -> Self {
        let mut tokens = tokenize(text);
        let prefix = match tokens.first() {
            Some(Token::Number(digits)) => {
                let digits = *digits;
                tokens.remove(0);
                Some(digits)
            }
            _ => None,
        };
        Self {
            prefix,
            suffix: tokens,
        }
    }

    /// Padding used when one version has fewer components than the other.
    fn zero() -> Self {
        Self {
            prefix: Some("0"),
            suffix: Vec::new(),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        let prefix = match (self.prefix, other.prefix) {
            (Some(a), Some(b)) => compare_numeric(a, b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if prefix != Ordering::Equal {
            return prefix;
        }

        // A bare number outranks the same number with a pre-release suffix
        match (self.suffix.is_empty(), other.suffix.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => compare_tokens(&self.suffix, &other.suffix),
        }
    }
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_digits = None;

    for (idx, ch) in text.char_indices() {
        let is_digit = ch.is_ascii_digit();
        match in_digits {
            Some(current) if current != is_digit => {
                tokens.push(make_token(&text[start..idx], current));
                start = idx;
                in_digits = Some(is_digit);
            }
            None => in_digits = Some(is_digit),
            _ => {}
        }
    }
    if let Some(current) = in_digits {
        tokens.push(make_token(&text[start..], current));
    }
    tokens
}

fn make_token(run: &str, is_digit: bool) -> Token<'_> {
    if is_digit {
        Token::Number(run)
    } else {
        Token::Text(run)
    }
}

fn compare_tokens(a: &[Token<'_>], b: &[Token<'_>]) -> Ordering {
    for (left, right) in a.iter().zip(b.iter()) {
        let ordering = match (left, right) {
            (Token::Number(x), Token::Number(y)) => compare_numeric(x, y),
            (Token::Text(x), Token::Text(y)) => x.cmp(y),
            (Token::Number(_), Token::Text(_)) => Ordering::Greater,
            (Token::Text(_), Token::Number(_)) => Ordering::Less,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.len().cmp(&b.len())
}

/// Compare two digit strings numerically without parsing (no overflow).
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Order two version strings.
///
/// Components are compared left to right after splitting on `.`; the shorter
/// version is padded with `0` components, so `"10.6"` and `"10.6.0"` are
/// equivalent and `"1.2" < "1.2.1"`. Within a component the numeric prefix
/// decides first; a pre-release suffix (`"0b2"`) ranks below the bare number
/// and suffixes compare run by run, numerically where both runs are digits,
/// so `"1.0b2" < "1.0b10" < "1.0"`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<Component<'_>> = a.split('.').map(Component::parse).collect();
    let right: Vec<Component<'_>> = b.split('.').map(Component::parse).collect();
    let len = left.len().max(right.len());

    for idx in 0..len {
        let zero = Component::zero();
        let x = left.get(idx).unwrap_or(&zero);
        let y = right.get(idx).unwrap_or(&zero);
        let ordering = x.compare(y);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Sort version strings newest first.
pub fn sort_newest_first<S: AsRef<str>>(versions: &mut [S]) {
    versions.sort_by(|a, b| compare_versions(b.as_ref(), a.as_ref()));
}
