//! Canonical form for user-supplied wiki paths.
//!
//! Canonical paths use `/` as the only separator, carry no leading or
//! trailing separator and contain no empty, `.` or `..` segments. The empty
//! string denotes the root.

pub const SEPARATOR: char = '/';

/// Normalize a user-supplied path into its canonical form.
///
/// Back-slashes are converted before cleaning so `a\..\b` and `a/../b`
/// agree. `..` never climbs above the root.
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Parent of a canonical path, `""` for top-level nodes.
pub fn parent(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Final segment (the slug) of a canonical path.
pub fn slug(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Join two canonical paths, treating an empty side as the root.
pub fn join(base: &str, child: &str) -> String {
    match (base.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}/{child}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_separators_and_dots() {
        assert_eq!(normalize("/Projects/./test/"), "Projects/test");
        assert_eq!(normalize("a//b///c"), "a/b/c");
        assert_eq!(normalize("a/b/../c"), "a/c");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("/"), "");
        assert_eq!(normalize("."), "");
    }

    #[test]
    fn converts_backslashes() {
        assert_eq!(normalize("docs\\guides\\setup"), "docs/guides/setup");
        assert_eq!(normalize("a\\..\\b"), "b");
        assert_eq!(normalize("\\a\\"), "a");
    }

    #[test]
    fn parent_dirs_never_escape_root() {
        assert_eq!(normalize("../../etc/passwd"), "etc/passwd");
        assert_eq!(normalize("a/../../b"), "b");
        assert_eq!(normalize(".."), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "",
            "/",
            "a",
            "/a/b/",
            "a\\b\\c",
            "./a/./b",
            "../x/../../y",
            "a//b\\\\c/.",
            "pages/home",
            " spaced / name ",
            "\\\\server\\share",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn parent_slug_and_join() {
        assert_eq!(parent("a/b/c"), "a/b");
        assert_eq!(parent("a"), "");
        assert_eq!(slug("a/b/c"), "c");
        assert_eq!(slug("a"), "a");
        assert_eq!(join("", "b"), "b");
        assert_eq!(join("a", "b"), "a/b");
        assert_eq!(join("a", ""), "a");
    }
}
