//! Slash-separated path helpers for remote object keys.
//!
//! Remote object paths are always `/`-separated regardless of the host
//! platform, so `std::path` is not used here.

/// Lexically normalize a slash-separated path.
///
/// - Repeated separators collapse into one
/// - `.` elements are removed
/// - `..` elements remove the preceding element; at the root of an absolute
///   path they are dropped, in a relative path they are kept
/// - Trailing separators are removed
/// - An empty result becomes `.`
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Join path elements with `/` and normalize the result.
///
/// Empty elements are ignored; joining only empty elements yields an empty
/// string.
pub fn join<I, S>(elements: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let non_empty: Vec<String> = elements
        .into_iter()
        .filter(|e| !e.as_ref().is_empty())
        .map(|e| e.as_ref().to_string())
        .collect();

    if non_empty.is_empty() {
        return String::new();
    }

    clean(&non_empty.join("/"))
}

/// Directory portion of a path (everything before the final element).
pub fn dir(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => clean(&path[..=idx]),
        None => ".".to_string(),
    }
}

/// Final element of a path, ignoring trailing separators.
pub fn base(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { ".".to_string() } else { "/".to_string() };
    }
    match trimmed.rfind('/') {
        Some(idx) => trimmed[idx + 1..].to_string(),
        None => trimmed.to_string(),
    }
}

/// Extension of the final element including the leading dot, or empty.
pub fn ext(path: &str) -> &str {
    for (idx, ch) in path.char_indices().rev() {
        match ch {
            '/' => return "",
            '.' => return &path[idx..],
            _ => {}
        }
    }
    ""
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean() {
        assert_eq!(clean(""), ".");
        assert_eq!(clean("a//b/./c/"), "a/b/c");
        assert_eq!(clean("a/b/../c"), "a/c");
        assert_eq!(clean("../../a"), "../../a");
        assert_eq!(clean("/../a"), "/a");
        assert_eq!(clean("/"), "/");
        assert_eq!(clean("out/./q1.csv"), "out/q1.csv");
    }

    #[test]
    fn test_join() {
        assert_eq!(join(["out", "q1.csv"]), "out/q1.csv");
        assert_eq!(join(["bucket/", "/data", "mutex"]), "bucket/data/mutex");
        assert_eq!(join(["", "a"]), "a");
        assert_eq!(join(["", ""]), "");
    }

    #[test]
    fn test_dir_base_ext() {
        assert_eq!(dir("reports/q1.csv"), "reports");
        assert_eq!(dir("q1.csv"), ".");
        assert_eq!(dir("/q1.csv"), "/");
        assert_eq!(base("reports/q1.csv"), "q1.csv");
        assert_eq!(base("reports/"), "reports");
        assert_eq!(ext("reports/q1.csv"), ".csv");
        assert_eq!(ext("archive.tar.gz"), ".gz");
        assert_eq!(ext("dir.d/README"), "");
    }
}
