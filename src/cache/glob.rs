//! Glob Matching
//!
//! Redis-style glob patterns: `*`, `?`, `[abc]`, `[a-z]`, `[^a]` and `\` escapes.
//! Patterns are translated to anchored regular expressions.

use regex::Regex;

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    regex: Regex,
}

impl GlobPattern {
    /// Compiles `pattern`.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(&to_regex(pattern))?,
        })
    }

    /// Returns true if `text` matches the whole pattern.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Escapes glob metacharacters so `literal` matches only itself.
pub fn escape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// == Translation ==
fn to_regex(pattern: &str) -> String {
    let p: Vec<char> = pattern.chars().collect();
    let mut out = String::from("(?s)^");

    let mut i = 0;
    while i < p.len() {
        match p[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' if i + 1 < p.len() => {
                i += 1;
                out.push_str(&escape_char(p[i]));
            }
            '[' => match translate_class(&p, i) {
                Some((class, next)) => {
                    out.push_str(&class);
                    i = next;
                    continue;
                }
                // Unterminated class reads as a literal bracket
                None => out.push_str(&escape_char('[')),
            },
            c => out.push_str(&escape_char(c)),
        }
        i += 1;
    }

    out.push('$');
    out
}

/// Translates the class starting at `p[start] == '['`.
///
/// Returns the regex class and the index after the closing `]`, or None if
/// the class is never closed. A `]` right after the opening bracket is a
/// member, not the terminator.
fn translate_class(p: &[char], start: usize) -> Option<(String, usize)> {
    let mut i = start + 1;
    let negated = matches!(p.get(i), Some('^') | Some('!'));
    if negated {
        i += 1;
    }

    let mut class = String::from(if negated { "[^" } else { "[" });
    let mut first = true;
    loop {
        let cur = *p.get(i)?;
        if cur == ']' && !first {
            class.push(']');
            return Some((class, i + 1));
        }
        first = false;

        let lo = if cur == '\\' {
            i += 1;
            *p.get(i)?
        } else {
            cur
        };

        if p.get(i + 1) == Some(&'-') && p.get(i + 2).is_some_and(|&hi| hi != ']') {
            let hi = p[i + 2];
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            class.push_str(&escape_char(lo));
            class.push('-');
            class.push_str(&escape_char(hi));
            i += 3;
        } else {
            class.push_str(&escape_char(lo));
            i += 1;
        }
    }
}

fn escape_char(c: char) -> String {
    regex::escape(c.encode_utf8(&mut [0; 4]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glob_match(pattern: &str, text: &str) -> bool {
        GlobPattern::new(pattern).unwrap().is_match(text)
    }

    #[test]
    fn test_literal() {
        assert!(glob_match("orders:42", "orders:42"));
        assert!(!glob_match("orders:42", "orders:423"));
        assert!(!glob_match("orders:42", "orders:4"));
        assert!(glob_match("a.b", "a.b"));
        assert!(!glob_match("a.b", "axb"));
    }

    #[test]
    fn test_star() {
        assert!(glob_match("orders:42*", "orders:42"));
        assert!(glob_match("orders:42*", "orders:423"));
        assert!(!glob_match("orders:42*", "orders:142"));
        assert!(glob_match("*", ""));
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(!glob_match("a*b*c", "axxbyy"));
        assert!(glob_match("*:*", "users:1"));
        assert!(glob_match("k*", "k\nv"));
    }

    #[test]
    fn test_question_mark() {
        assert!(glob_match("user?", "user1"));
        assert!(!glob_match("user?", "user"));
        assert!(!glob_match("user?", "user12"));
    }

    #[test]
    fn test_classes() {
        assert!(glob_match("v[0-9]", "v7"));
        assert!(!glob_match("v[0-9]", "vx"));
        assert!(glob_match("[abc]x", "bx"));
        assert!(!glob_match("[^abc]x", "bx"));
        assert!(glob_match("[^abc]x", "dx"));
        assert!(glob_match("[!abc]x", "dx"));
        assert!(glob_match("[]]", "]"));
        assert!(glob_match("[9-0]", "5"));
        // Regex class operators are plain members
        assert!(glob_match("[&~-]", "~"));
        assert!(glob_match("[a-]", "-"));
    }

    #[test]
    fn test_unterminated_class_is_literal() {
        assert!(glob_match("a[b", "a[b"));
        assert!(!glob_match("a[b", "ab"));
    }

    #[test]
    fn test_escape() {
        assert!(glob_match("a\\*", "a*"));
        assert!(!glob_match("a\\*", "ab"));
        assert!(glob_match("a\\", "a\\"));

        let literal = "weird*[key]?";
        assert!(glob_match(&escape(literal), literal));
        assert!(!glob_match(&escape(literal), "weirdX[key]?"));
    }

    #[test]
    fn test_compiled_pattern_reuse() {
        let glob = GlobPattern::new("orders:#[0-9a-f][0-9a-f]").unwrap();
        assert!(glob.is_match("orders:#a1"));
        assert!(!glob.is_match("orders:#g1"));
        assert!(!glob.is_match("orders:#a1x"));
    }
}
