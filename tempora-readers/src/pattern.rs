//! File path patterns
//!
//! A pattern is either a plain path or a path whose file name contains the
//! wildcards `*` (any run of characters) and `?` (any single character).
//! Directories are taken literally.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Check if `pattern` contains wildcards
pub fn is_pattern(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

/// Match `name` against a wildcard `pattern`
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    // Position of the last `*` and the name position it is matched up to
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            p += 1;
            n += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, n));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            n = matched + 1;
            backtrack = Some((star, n));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

/// Resolve a path or pattern into existing files, sorted by path.
///
/// A plain path resolves to itself, whether or not it exists. A pattern
/// matching no file is an error.
pub fn expand(pattern: &str) -> Result<Vec<PathBuf>> {
    if !is_pattern(pattern) {
        return Ok(vec![PathBuf::from(pattern)]);
    }

    let path = Path::new(pattern);
    let file_pattern = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::InvalidArgument(format!("Pattern \"{pattern}\" has no file name")))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if directory.to_str().is_some_and(is_pattern) {
        return Err(Error::InvalidArgument(format!(
            "Wildcards are only supported in the file name: \"{pattern}\""
        )));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(&directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if wildcard_match(file_pattern, name) {
                paths.push(entry.path());
            }
        }
    }
    if paths.is_empty() {
        return Err(Error::InvalidArgument(format!("No file matches \"{pattern}\"")));
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use proptest::prelude::*;
    use test_case::test_case;

    use super::*;

    #[test_case("*.csv", "data.csv", true)]
    #[test_case("*.csv", "data.csv.gz", false)]
    #[test_case("part-?????-of-*", "part-00001-of-00004", true)]
    #[test_case("part-?-of-*", "part-01-of-4", false)]
    #[test_case("a*b*c", "aXXbYYc", true)]
    #[test_case("a*b*c", "aXXbYY", false)]
    #[test_case("*", "", true)]
    #[test_case("data*", "data", true; "trailing star matching nothing")]
    #[test_case("a*b", "ab", true; "inner star matching nothing")]
    #[test_case("*.csv", ".csv", true; "leading star matching nothing")]
    #[test_case("a**", "a", true; "repeated trailing stars")]
    #[test_case("data.*", "data.csv", true; "trailing star matching a suffix")]
    #[test_case("part-*", "part-00001-of-00002", true)]
    #[test_case("data*x", "data", false; "star then missing literal")]
    #[test_case("exact", "exact", true)]
    fn test_wildcard_match(pattern: &str, name: &str, expected: bool) {
        assert_eq!(wildcard_match(pattern, name), expected);
    }

    #[test]
    fn test_expand_sorts_matches() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.csv", "a.csv", "c.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let pattern = dir.path().join("*.csv");

        let paths = expand(pattern.to_str().unwrap()).unwrap();
        assert_eq!(paths, vec![dir.path().join("a.csv"), dir.path().join("b.csv")]);
    }

    #[test]
    fn test_expand_without_match() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = dir.path().join("*.csv");
        assert!(expand(pattern.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_plain_path() {
        assert_eq!(expand("some/file.csv").unwrap(), vec![PathBuf::from("some/file.csv")]);
    }

    proptest! {
        #[test]
        fn prop_literal_matches_itself(name in "[a-z0-9._-]{0,12}") {
            prop_assert!(wildcard_match(&name, &name));
        }

        #[test]
        fn prop_star_prefix_matches_suffix(head in "[a-z0-9]{0,8}", tail in "[a-z0-9.]{0,8}") {
            let pattern = format!("*{tail}");
            let name = format!("{head}{tail}");
            prop_assert!(wildcard_match(&pattern, &name));
        }
    }
}
