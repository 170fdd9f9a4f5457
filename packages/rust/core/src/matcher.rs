//! Fuzzy folder and filename matching.
//!
//! Human-curated folder trees drift: `Filed Copy`, `FILED_COPY` and
//! `FILE-COPY` all mean the same thing. Matching therefore normalizes case,
//! underscores, hyphens and whitespace runs before comparing. Filename
//! patterns come in three flavors: plain substrings, `*`/`?` globs, and
//! `regex:`-prefixed regular expressions.

use regex::{Regex, RegexBuilder};

use packetpress_shared::{PacketPressError, Result};

/// Reserved prefix marking a filename pattern as a regular expression.
pub const REGEX_MARKER: &str = "regex:";

/// Normalize text for fuzzy comparison: lowercase, `_` and `-` become
/// spaces, whitespace runs collapse to a single space.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for ch in text.chars() {
        let ch = match ch {
            '_' | '-' => ' ',
            other => other,
        };
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            last_was_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// True if the path matches at least one folder keyword, fuzzily.
/// An empty keyword list matches everything.
pub fn path_matches_keywords(path: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let normalized_path = normalize(path);
    keywords
        .iter()
        .any(|kw| normalized_path.contains(&normalize(kw)))
}

/// True if every segment appears, in order, among the path's components.
///
/// Used by recursive-download slots: `["Case", "Evidence"]` matches
/// `/Intake/CASE-2024/evidence/scan.pdf` but not `/Evidence/Case/scan.pdf`.
pub fn path_contains_segments(path: &str, segments: &[String]) -> bool {
    if segments.is_empty() {
        return true;
    }
    let components: Vec<String> = path
        .split('/')
        .filter(|c| !c.is_empty())
        .map(normalize)
        .collect();

    let mut position = 0;
    for segment in segments {
        let wanted = normalize(segment);
        match components[position..]
            .iter()
            .position(|c| c.contains(&wanted))
        {
            Some(offset) => position += offset + 1,
            None => return false,
        }
    }
    true
}

/// A compiled filename pattern.
#[derive(Debug, Clone)]
pub enum FilePattern {
    /// Case-insensitive substring match. The empty pattern matches
    /// everything (wildcard).
    Substring(String),
    /// Glob (`*`/`?`) translated to an anchored regex over the whole name.
    Glob(Regex),
    /// `regex:`-prefixed pattern, searched against the filename.
    Regex(Regex),
}

impl FilePattern {
    /// Compile a raw pattern string.
    ///
    /// An invalid regular expression is a per-slot resolution error, not a
    /// process-fatal one: callers degrade the slot to `Missing`.
    pub fn compile(pattern: &str) -> Result<Self> {
        if let Some(expr) = pattern.strip_prefix(REGEX_MARKER) {
            let regex = RegexBuilder::new(expr)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    PacketPressError::pattern(format!("invalid regex '{expr}': {e}"))
                })?;
            return Ok(Self::Regex(regex));
        }

        if pattern.contains('*') || pattern.contains('?') {
            let regex = RegexBuilder::new(&glob_to_regex(pattern))
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    PacketPressError::pattern(format!("invalid glob '{pattern}': {e}"))
                })?;
            return Ok(Self::Glob(regex));
        }

        Ok(Self::Substring(pattern.to_lowercase()))
    }

    /// Compile a list of patterns. An empty list yields a single wildcard.
    pub fn compile_all(patterns: &[String]) -> Result<Vec<Self>> {
        if patterns.is_empty() {
            return Ok(vec![Self::Substring(String::new())]);
        }
        patterns.iter().map(|p| Self::compile(p)).collect()
    }

    /// Match against a bare filename (final path component).
    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            Self::Substring(needle) => file_name.to_lowercase().contains(needle),
            Self::Glob(regex) => regex.is_match(file_name),
            Self::Regex(regex) => regex.is_match(file_name),
        }
    }
}

/// True if any pattern in the list matches the filename.
pub fn matches_any(patterns: &[FilePattern], file_name: &str) -> bool {
    patterns.iter().any(|p| p.matches(file_name))
}

/// Translate a glob into an anchored regex: `*` is any run of characters,
/// `?` a single character, everything else literal.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 4);
    out.push('^');
    for ch in glob.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_separators() {
        assert_eq!(normalize("FILED-COPY"), "filed copy");
        assert_eq!(normalize("Filed_Copy"), "filed copy");
        assert_eq!(normalize("  Filed   Copy  "), "filed copy");
        assert_eq!(normalize("Ready to print"), "ready to print");
    }

    #[test]
    fn folder_keywords_are_fuzzy() {
        let keywords = vec!["Filed Copy".to_string()];
        assert!(path_matches_keywords("/Case/FILE... no", &[])); // empty = all
        assert!(path_matches_keywords("/Case/FILED-COPY/doc.pdf", &keywords));
        assert!(path_matches_keywords("/Case/filed_copy/doc.pdf", &keywords));
        assert!(!path_matches_keywords("/Case/Evidence/doc.pdf", &keywords));
    }

    #[test]
    fn any_keyword_is_enough() {
        let keywords = vec!["USCIS".to_string(), "Receipts".to_string()];
        assert!(path_matches_keywords("/Intake/receipts 2024/a.pdf", &keywords));
        assert!(path_matches_keywords("/uscis/a.pdf", &keywords));
        assert!(!path_matches_keywords("/Evidence/a.pdf", &keywords));
    }

    #[test]
    fn segment_containment_is_ordered() {
        let segments = vec!["Case".to_string(), "Evidence".to_string()];
        assert!(path_contains_segments(
            "/Intake/CASE-2024/evidence/scan.pdf",
            &segments
        ));
        assert!(!path_contains_segments(
            "/Evidence/Case/scan.pdf",
            &segments
        ));
        assert!(path_contains_segments("/anything", &[]));
    }

    #[test]
    fn substring_pattern_is_case_insensitive() {
        let pattern = FilePattern::compile("prima facie").unwrap();
        assert!(pattern.matches("I-360 PRIMA FACIE Renewed.pdf"));
        assert!(!pattern.matches("transfer notice.pdf"));
    }

    #[test]
    fn empty_pattern_is_wildcard() {
        let patterns = FilePattern::compile_all(&[]).unwrap();
        assert_eq!(patterns.len(), 1);
        assert!(matches_any(&patterns, "anything-at-all.pdf"));
    }

    #[test]
    fn glob_pattern_matches_whole_name() {
        let pattern = FilePattern::compile("cover*.pdf").unwrap();
        assert!(pattern.matches("cover_final.pdf"));
        assert!(pattern.matches("COVER.pdf"));
        assert!(!pattern.matches("a_cover_final.pdf")); // anchored
        assert!(!pattern.matches("cover_final.docx"));

        let single = FilePattern::compile("scan_?.pdf").unwrap();
        assert!(single.matches("scan_1.pdf"));
        assert!(!single.matches("scan_12.pdf"));
    }

    #[test]
    fn regex_pattern_searches_name() {
        let pattern = FilePattern::compile(r"regex:^i-\d{3}.*\.pdf$").unwrap();
        assert!(pattern.matches("I-360 receipt.pdf"));
        assert!(!pattern.matches("receipt I-36.pdf"));
    }

    #[test]
    fn invalid_regex_is_a_pattern_error() {
        let err = FilePattern::compile("regex:([unclosed").unwrap_err();
        assert!(err.to_string().contains("pattern error"));
    }

    #[test]
    fn glob_escapes_regex_metacharacters() {
        let pattern = FilePattern::compile("report (v2)*.pdf").unwrap();
        assert!(pattern.matches("report (v2) final.pdf"));
        assert!(!pattern.matches("report v2 final.pdf"));
    }
}
