//! # Cache Key Space
//!
//! Composite keys for cached listings and documents, and the glob patterns
//! used to invalidate them without knowing which exact keys exist.
//!
//! ```text
//! docs:<login>:<filter key>:<filter value>   listing of documents visible to <login>
//! doc:<document id>:<requester login>         one document as read by <requester login>
//! ```
//!
//! Each part is encoded with `\` before any `:` or `\` it contains, so the
//! separators are unambiguous and `docs:<login>:*` addresses exactly the
//! listings of one login and never those of a longer login sharing a prefix.

use uuid::Uuid;

const LISTING_PREFIX: &str = "docs";
const DOCUMENT_PREFIX: &str = "doc";

/// Builders for concrete cache keys
pub struct CacheKey;

impl CacheKey {
    /// Key of a (possibly filtered) listing for `login`
    pub fn listing(login: &str, filter_key: &str, filter_value: &str) -> String {
        format!(
            "{}:{}:{}:{}",
            LISTING_PREFIX,
            encode_part(login),
            encode_part(filter_key),
            encode_part(filter_value)
        )
    }

    /// Key of a single document as read by `requester_login`
    pub fn document(id: Uuid, requester_login: &str) -> String {
        format!("{}:{}:{}", DOCUMENT_PREFIX, id, encode_part(requester_login))
    }
}

/// Builders for invalidation patterns
pub struct KeyPattern;

impl KeyPattern {
    /// Every cached listing of `login`, whatever the filter
    pub fn listings_of(login: &str) -> String {
        format!("{}:{}:*", LISTING_PREFIX, escape(&encode_part(login)))
    }

    /// Every requester-scoped copy of document `id`
    pub fn document_variants(id: Uuid) -> String {
        format!("{}:{}:*", DOCUMENT_PREFIX, id)
    }

    /// Every key containing `fragment` verbatim
    pub fn containing(fragment: &str) -> String {
        format!("*{}*", escape(fragment))
    }
}

/// Encode one key part so an embedded `:` can never act as a separator
fn encode_part(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, ':' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape glob metacharacters so `raw` only matches itself
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    AnyRun,
    AnyOne,
    Literal(char),
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '*' => Token::AnyRun,
            '?' => Token::AnyOne,
            '\\' => Token::Literal(chars.next().unwrap_or('\\')),
            other => Token::Literal(other),
        });
    }
    tokens
}

/// Match `key` against a Redis `KEYS`-style glob.
///
/// `*` matches any run (including empty), `?` exactly one character and
/// `\x` the literal `x`. Everything else is literal.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let tokens = tokenize(pattern);
    let key: Vec<char> = key.chars().collect();

    let (mut t, mut k) = (0, 0);
    // last `*` seen and the key position it currently absorbs up to
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        match tokens.get(t) {
            Some(Token::AnyRun) => {
                backtrack = Some((t, k));
                t += 1;
            }
            Some(Token::AnyOne) => {
                t += 1;
                k += 1;
            }
            Some(Token::Literal(c)) if *c == key[k] => {
                t += 1;
                k += 1;
            }
            _ => match backtrack {
                Some((star, absorbed)) => {
                    t = star + 1;
                    k = absorbed + 1;
                    backtrack = Some((star, absorbed + 1));
                }
                None => return false,
            },
        }
    }

    tokens[t..].iter().all(|tok| *tok == Token::AnyRun)
}
