use crate::resolve::ResolveError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Normalize a path into the slash-separated relative form patterns match against.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut segments = unified.split('/').filter(|s| !s.is_empty()).peekable();

    // only leading `./` segments are dropped; interior ones are left to the caller
    while segments.peek() == Some(&".") {
        segments.next();
    }

    segments.collect::<Vec<_>>().join("/")
}

/// Compile a set of override patterns.
///
/// `*` stays within a single path segment and `**` spans segments. Patterns
/// must be relative and may not climb out of the base directory.
pub fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ResolveError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        check_relative(pattern)?;
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| ResolveError::MalformedPattern {
                pattern: pattern.clone(),
                reason: e.kind().to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ResolveError::MalformedPattern {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })
}

fn check_relative(pattern: &str) -> Result<(), ResolveError> {
    let malformed = |reason: &str| ResolveError::MalformedPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if pattern.is_empty() {
        return Err(malformed("pattern is empty"));
    }
    if pattern.starts_with('/') {
        return Err(malformed("pattern must be relative"));
    }
    if pattern.split('/').any(|segment| segment == "..") {
        return Err(malformed("pattern may not contain '..'"));
    }
    Ok(())
}

/// Include/exclude pattern pair of one override block.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    include: GlobSet,
    exclude: GlobSet,
}

impl PathMatcher {
    pub fn new(files: &[String], excluded_files: &[String]) -> Result<Self, ResolveError> {
        Ok(Self {
            include: build_glob_set(files)?,
            exclude: build_glob_set(excluded_files)?,
        })
    }

    /// True when any include pattern matches and no exclude pattern does.
    pub fn is_match(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(files: &[&str]) -> PathMatcher {
        let files: Vec<String> = files.iter().map(|s| s.to_string()).collect();
        PathMatcher::new(&files, &[]).unwrap()
    }

    #[test]
    fn double_star_spans_segments() {
        let m = matcher(&["src/**/*.test.ts"]);
        assert!(m.is_match("src/a/b/x.test.ts"));
        assert!(m.is_match("src/x.test.ts"));
        assert!(!m.is_match("src/a/b/x.ts"));
    }

    #[test]
    fn single_star_stays_in_segment() {
        let m = matcher(&["*.js"]);
        assert!(m.is_match("index.js"));
        assert!(!m.is_match("lib/index.js"));
    }

    #[test]
    fn leading_double_star_matches_root_files() {
        let m = matcher(&["**/*.js"]);
        assert!(m.is_match("app.js"));
        assert!(m.is_match("legacy/app.js"));
        assert!(!m.is_match("src/app.ts"));
    }

    #[test]
    fn literal_segments_match_exactly() {
        let m = matcher(&["src/main.rs"]);
        assert!(m.is_match("src/main.rs"));
        assert!(!m.is_match("src/main.rsx"));
        assert!(!m.is_match("other/src/main.rs"));
    }

    #[test]
    fn any_pattern_matches() {
        let m = matcher(&["*.ts", "*.tsx"]);
        assert!(m.is_match("a.tsx"));
        assert!(m.is_match("a.ts"));
        assert!(!m.is_match("a.js"));
    }

    #[test]
    fn empty_pattern_list_never_matches() {
        let m = matcher(&[]);
        assert!(!m.is_match("anything.js"));
    }

    #[test]
    fn excluded_files_win() {
        let m = PathMatcher::new(
            &["**/*.js".to_string()],
            &["vendor/**".to_string()],
        )
        .unwrap();
        assert!(m.is_match("src/a.js"));
        assert!(!m.is_match("vendor/jquery.js"));
    }

    #[test]
    fn malformed_patterns_fail() {
        for bad in ["src/[a", "", "/abs/*.js", "../up/*.js", "a/../b"] {
            let err = build_glob_set(&[bad.to_string()]).unwrap_err();
            assert!(
                matches!(err, ResolveError::MalformedPattern { .. }),
                "expected MalformedPattern for {:?}, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn normalize_path_forms() {
        assert_eq!(normalize_path("./src/app.js"), "src/app.js");
        assert_eq!(normalize_path("././src//app.js"), "src/app.js");
        assert_eq!(normalize_path("src\\lib\\x.ts"), "src/lib/x.ts");
        assert_eq!(normalize_path("index.js"), "index.js");
    }
}
