// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Path glob matching for ownership scopes.
//!
//! Only two wildcards are recognized:
//!
//! - `*` matches any run of characters that does not contain `/`
//! - `**` matches across separators, including zero segments
//!
//! Everything else (including `?`, `[...]` and `{a,b}`) is matched literally.
//! Matching is anchored against the whole path after both sides have been
//! normalized (forward slashes, no `.` segments, `..` resolved). A trailing
//! `/**` also matches the directory itself.

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    normalized: String,
    set: Option<GlobSet>,
}

impl GlobPattern {
    /// Compile a pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        let normalized = normalize_path(&raw);
        let set = match compile(&normalized) {
            Ok(set) => Some(set),
            Err(e) => {
                tracing::warn!("Glob pattern '{}' could not be compiled: {}", raw, e);
                None
            }
        };
        Self {
            raw,
            normalized,
            set,
        }
    }

    /// The pattern as it was written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check whether a path matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize_path(path);
        match &self.set {
            Some(set) => set.is_match(&path),
            None => self.normalized == path,
        }
    }
}

fn compile(pattern: &str) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    builder.add(build_glob(pattern)?);
    if let Some(dir) = pattern.strip_suffix("/**").filter(|dir| !dir.is_empty()) {
        builder.add(build_glob(dir)?);
    }
    builder.build()
}

fn build_glob(pattern: &str) -> Result<Glob, globset::Error> {
    GlobBuilder::new(&escape_literals(pattern))
        .literal_separator(true)
        .build()
}

/// Wrap every metacharacter except `*` in a one-character class.
fn escape_literals(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '?' | '[' | ']' | '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            c => out.push(c),
        }
    }
    out
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for GlobPattern {}

impl From<&str> for GlobPattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

impl From<String> for GlobPattern {
    fn from(pattern: String) -> Self {
        Self::new(pattern)
    }
}

impl std::fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Check whether `path` matches `pattern`.
pub fn matches(path: &str, pattern: &str) -> bool {
    GlobPattern::new(pattern).matches(path)
}

/// Convert backslashes to forward slashes and collapse repeated separators.
pub fn normalize_separators(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_sep = false;
    for c in input.chars() {
        let c = if c == '\\' { '/' } else { c };
        if c == '/' {
            if last_was_sep {
                continue;
            }
            last_was_sep = true;
        } else {
            last_was_sep = false;
        }
        out.push(c);
    }
    out
}

/// Normalize a target path into canonical form.
///
/// Separators become `/`, `.` segments are dropped and `..` segments are
/// resolved lexically so that `/backend/../frontend/x` cannot masquerade as
/// a path under `/backend`.
pub fn normalize_path(path: &str) -> String {
    let unified = normalize_separators(path);
    let absolute = unified.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_star_stays_in_segment() {
        assert!(matches("a/b", "a/*"));
        assert!(!matches("a/b/c", "a/*"));
        assert!(matches("src/main.rs", "src/*.rs"));
        assert!(!matches("src/bin/main.rs", "src/*.rs"));
    }

    #[test]
    fn test_double_star_spans_directories() {
        assert!(matches("a/b/c", "a/**"));
        assert!(matches("/backend/api/server.js", "/backend/**"));
        assert!(matches("a/b", "a/**/b"));
        assert!(matches("a/x/y/b", "a/**/b"));
        assert!(matches("deep/nested/file.rs", "**/*.rs"));
        assert!(matches("file.rs", "**/*.rs"));
    }

    #[test]
    fn test_trailing_double_star_matches_directory_itself() {
        assert!(matches("/backend", "/backend/**"));
        assert!(!matches("/backend-old/x", "/backend/**"));
    }

    #[test]
    fn test_anchored_match() {
        assert!(!matches("x/a/b", "a/*"));
        assert!(!matches("a/b.txt.bak", "a/*.txt"));
        assert!(matches("README.md", "README.md"));
    }

    #[test]
    fn test_other_metacharacters_are_literal() {
        assert!(matches("a/[b].txt", "a/[b].txt"));
        assert!(!matches("a/b.txt", "a/[b].txt"));
        assert!(matches("file?.rs", "file?.rs"));
        assert!(!matches("file1.rs", "file?.rs"));
        assert!(!matches("a.rs", "{a,b}.rs"));
        assert!(matches("a.c", "a.c"));
        assert!(!matches("abc", "a.c"));
        assert!(matches("{a,b}.rs", "{a,b}.rs"));
        assert!(matches("x/]y", "x/]*"));
    }

    #[test]
    fn test_separator_normalization() {
        assert!(matches("src\\lib\\mod.rs", "src/**"));
        assert!(matches("src/lib.rs", "src\\*.rs"));
        assert!(matches("src//lib.rs", "src/*.rs"));
        assert!(matches("./src/lib.rs", "src/*.rs"));
    }

    #[test]
    fn test_dot_prefixed_patterns_match() {
        assert!(matches("src/lib.rs", "./src/*"));
        assert!(matches("./src/lib.rs", "./src/*"));
        assert!(matches("src/a/b.rs", "./src/**"));
        assert!(matches("/backend/x.js", "/./backend/*"));
    }

    #[test]
    fn test_normalize_path_resolves_parent_segments() {
        assert_eq!(normalize_path("/backend/../frontend/app.js"), "/frontend/app.js");
        assert_eq!(normalize_path("a/./b/"), "a/b");
        assert_eq!(normalize_path("../x"), "../x");
        assert_eq!(normalize_path("/../x"), "/x");
        assert!(!matches("/backend/../frontend/app.js", "/backend/**"));
    }

    #[test]
    fn test_glob_pattern_display() {
        let pattern = GlobPattern::new("src/**/*.rs");
        assert_eq!(pattern.as_str(), "src/**/*.rs");
        assert_eq!(pattern.to_string(), "src/**/*.rs");
        assert_eq!(pattern, GlobPattern::from("src/**/*.rs"));
    }
}
