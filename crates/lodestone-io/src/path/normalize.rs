//! Logical path normalization and string utilities.
//!
//! Logical paths are always "/"-separated. Normalization is options-driven so
//! callers can choose exactly which inputs to reject (absolute-like prefixes,
//! `..` traversal, null bytes) and which to rewrite.

use crate::error::{IoError, IoErrorCode, IoResult};

/// Options controlling [`normalize`].
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// Convert `\` to `/`.
    pub convert_backslash: bool,
    /// Collapse `a//b` to `a/b`.
    pub collapse_slashes: bool,
    /// Drop `.` segments.
    pub remove_dot: bool,
    /// Resolve `a/../b` to `b`; escaping above the start is an error.
    pub resolve_dot_dot: bool,
    /// Reject `/a`, `C:`, `\\server`.
    pub reject_absolute_like: bool,
    /// Reject `..` segments (also applies when `resolve_dot_dot` is off).
    pub reject_traversal: bool,
    /// Reject embedded null bytes.
    pub reject_null_byte: bool,
    /// Keep a single trailing `/` if the input had one.
    pub keep_trailing_slash: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            convert_backslash: true,
            collapse_slashes: true,
            remove_dot: true,
            resolve_dot_dot: true,
            reject_absolute_like: true,
            reject_traversal: true,
            reject_null_byte: true,
            keep_trailing_slash: false,
        }
    }
}

pub fn contains_null_byte(s: &str) -> bool {
    s.bytes().any(|b| b == 0)
}

fn is_ascii_alpha(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

/// `/...`, `C:`, `\\server`, `//server`.
pub fn is_absolute_like(s: &str) -> bool {
    let b = s.as_bytes();
    if b.is_empty() {
        return false;
    }
    if b[0] == b'/' {
        return true;
    }
    if b.len() >= 2 && ((b[0] == b'\\' && b[1] == b'\\') || (b[0] == b'/' && b[1] == b'/')) {
        return true;
    }
    if b.len() >= 2 && is_ascii_alpha(b[0]) && b[1] == b':' {
        return true;
    }
    false
}

/// True when any segment is exactly `..`.
pub fn contains_traversal(s: &str) -> bool {
    s.split(['/', '\\']).any(|seg| seg == "..")
}

/// Normalize a raw path into a logical "/"-separated path.
pub fn normalize(raw: &str, opt: &NormalizeOptions) -> IoResult<String> {
    if opt.reject_null_byte && contains_null_byte(raw) {
        return Err(IoError::with_detail(
            IoErrorCode::InvalidPath,
            "path contains null byte",
            raw,
        ));
    }

    if opt.reject_absolute_like && is_absolute_like(raw) {
        return Err(IoError::with_detail(
            IoErrorCode::InvalidPath,
            "absolute-like path is not allowed",
            raw,
        ));
    }

    let mut s = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if opt.convert_backslash && ch == '\\' {
            s.push('/');
        } else {
            s.push(ch);
        }
    }

    let had_trailing_slash = s.ends_with('/');

    if opt.collapse_slashes {
        let mut t = String::with_capacity(s.len());
        let mut prev_slash = false;
        for ch in s.chars() {
            if ch == '/' {
                if !prev_slash {
                    t.push(ch);
                }
                prev_slash = true;
            } else {
                t.push(ch);
                prev_slash = false;
            }
        }
        s = t;
    }

    let mut stack: Vec<&str> = Vec::with_capacity(16);
    for seg in s.split('/') {
        if seg.is_empty() {
            continue;
        }
        if opt.remove_dot && seg == "." {
            continue;
        }
        if seg == ".." {
            if opt.resolve_dot_dot {
                if stack.pop().is_some() {
                    continue;
                }
                return Err(IoError::with_detail(
                    IoErrorCode::PathEscapesRoot,
                    "path escapes root by '..'",
                    raw,
                ));
            } else if opt.reject_traversal {
                return Err(IoError::with_detail(
                    IoErrorCode::InvalidPath,
                    "path traversal '..' is not allowed",
                    raw,
                ));
            }
            // resolve_dot_dot off and traversal allowed: keep the segment
            stack.push(seg);
            continue;
        }
        stack.push(seg);
    }

    let mut out = String::with_capacity(s.len());
    for (k, seg) in stack.iter().enumerate() {
        if k != 0 {
            out.push('/');
        }
        out.push_str(seg);
    }

    if opt.keep_trailing_slash && had_trailing_slash && !out.is_empty() {
        out.push('/');
    }

    if opt.reject_traversal && contains_traversal(&out) {
        return Err(IoError::with_detail(
            IoErrorCode::InvalidPath,
            "path traversal '..' is not allowed",
            out,
        ));
    }

    Ok(out)
}

/// Join two path fragments with exactly one separator between them.
pub fn join(a: &str, b: &str) -> String {
    if a.is_empty() {
        return b.to_string();
    }
    if b.is_empty() {
        return a.to_string();
    }

    let a_ends = a.ends_with('/');
    let b_begins = b.starts_with('/');

    let mut out = String::with_capacity(a.len() + 1 + b.len());
    match (a_ends, b_begins) {
        (true, true) => {
            out.push_str(&a[..a.len() - 1]);
            out.push_str(b);
        }
        (false, false) => {
            out.push_str(a);
            out.push('/');
            out.push_str(b);
        }
        _ => {
            out.push_str(a);
            out.push_str(b);
        }
    }
    out
}

/// Everything before the last segment; empty when there is no parent.
pub fn parent(s: &str) -> &str {
    let t = s.trim_end_matches('/');
    if t.is_empty() {
        return "";
    }
    match t.rfind('/') {
        Some(pos) => &t[..pos],
        None => "",
    }
}

/// The last segment, ignoring trailing slashes.
pub fn file_name(s: &str) -> &str {
    let t = s.trim_end_matches('/');
    if t.is_empty() {
        return "";
    }
    match t.rfind('/') {
        Some(pos) => &t[pos + 1..],
        None => t,
    }
}

/// Extension including the dot; empty for none. A leading dot
/// (".gitignore") is not treated as an extension.
pub fn extension(s: &str) -> &str {
    let fname = file_name(s);
    if fname.is_empty() {
        return "";
    }
    match fname.rfind('.') {
        Some(0) | None => "",
        Some(dot) => &fname[dot..],
    }
}

/// Replace (or append) the extension; `ext` may be given with or without the
/// leading dot.
pub fn replace_extension(s: &str, ext: &str) -> String {
    let mut e = String::new();
    if !ext.is_empty() && !ext.starts_with('.') {
        e.push('.');
    }
    e.push_str(ext);

    let mut out = s.to_string();
    if file_name(s).is_empty() {
        return out;
    }

    let start = out.rfind('/').map(|p| p + 1).unwrap_or(0);
    match out.rfind('.') {
        Some(dot) if dot >= start && dot > 0 => {
            out.truncate(dot);
            out.push_str(&e);
        }
        _ => out.push_str(&e),
    }
    out
}

pub fn is_slash(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Convert separators to `/` and squash repeated slashes. Trailing slashes
/// are kept as-is.
pub fn normalize_slashes(path: &str, normalize_separators: bool, squash_slashes: bool) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        let x = if normalize_separators && c == '\\' { '/' } else { c };
        let slash = x == '/';
        if squash_slashes {
            if slash {
                if prev_slash {
                    continue;
                }
                prev_slash = true;
            } else {
                prev_slash = false;
            }
        }
        out.push(x);
    }
    out
}

/// `/...`, `\\server\share`, `C:/...` (requires the separator after the
/// drive, unlike [`is_absolute_like`]).
pub fn is_absolute_path_like(p: &str) -> bool {
    let b = p.as_bytes();
    if b.is_empty() {
        return false;
    }
    if b[0] == b'/' {
        return true;
    }
    if b.len() >= 2 && is_slash(b[0] as char) && is_slash(b[1] as char) {
        return true;
    }
    if b.len() >= 3 && is_ascii_alpha(b[0]) && b[1] == b':' && is_slash(b[2] as char) {
        return true;
    }
    false
}

/// Strip any `scheme://` prefix without validating the scheme name; leading
/// slashes after it are trimmed so `res:///a` yields `a`. Returns the
/// remainder and whether a scheme was stripped.
pub fn strip_scheme_loose(p: &str) -> (String, bool) {
    let Some(pos) = p.find("://") else {
        return (p.to_string(), false);
    };
    let rest = p[pos + 3..].trim_start_matches(['/', '\\']);
    (rest.to_string(), true)
}

/// Join a root directory and a relative path, forcing `/` separators and
/// exactly one separator at the seam. An empty root defaults to "assets".
pub fn join_root_and_relative(root: &str, rel: &str) -> String {
    let mut r = if root.is_empty() {
        "assets".to_string()
    } else {
        root.replace('\\', "/")
    };
    if !r.ends_with('/') {
        r.push('/');
    }
    let rel = rel.trim_start_matches(|c| is_slash(c));
    r.push_str(rel);
    r
}

/// Resolve `.` / `..` segments, preserving a root prefix among `/`, `//`,
/// or a drive like `C:/`. The second value reports whether a `..` tried to
/// step above the root; it never fails.
pub fn remove_dot_segments(path: &str) -> (String, bool) {
    let mut escaped_above_root = false;

    let bytes = path.as_bytes();
    let (prefix, rest): (&str, &str) =
        if bytes.len() >= 3 && is_ascii_alpha(bytes[0]) && bytes[1] == b':' && bytes[2] == b'/' {
            (&path[..3], &path[3..])
        } else if bytes.len() >= 2 && bytes[0] == b'/' && bytes[1] == b'/' {
            ("//", &path[2..])
        } else if !bytes.is_empty() && bytes[0] == b'/' {
            ("/", &path[1..])
        } else {
            ("", path)
        };

    let mut stack: Vec<&str> = Vec::with_capacity(16);
    for seg in rest.split('/') {
        if seg.is_empty() || seg == "." {
            continue;
        }
        if seg == ".." {
            if stack.pop().is_none() {
                escaped_above_root = true;
            }
            continue;
        }
        stack.push(seg);
    }

    let mut out = String::from(prefix);
    for seg in &stack {
        if !out.is_empty() && !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(seg);
    }

    (out, escaped_above_root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_basic() {
        let opt = NormalizeOptions::default();
        assert_eq!(normalize("a/b/c", &opt).unwrap(), "a/b/c");
        assert_eq!(normalize("a\\b\\c", &opt).unwrap(), "a/b/c");
        assert_eq!(normalize("a//b///c", &opt).unwrap(), "a/b/c");
        assert_eq!(normalize("./a/./b", &opt).unwrap(), "a/b");
        assert_eq!(normalize("a/x/../b", &opt).unwrap(), "a/b");
    }

    #[test]
    fn normalize_is_idempotent() {
        let opt = NormalizeOptions::default();
        for raw in ["a/b/c", "textures/player.png", "a"] {
            let once = normalize(raw, &opt).unwrap();
            let twice = normalize(&once, &opt).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn normalize_rejects_escape() {
        let opt = NormalizeOptions::default();
        let err = normalize("../outside", &opt).unwrap_err();
        assert_eq!(err.code, IoErrorCode::PathEscapesRoot);
    }

    #[test]
    fn normalize_rejects_absolute_like() {
        let opt = NormalizeOptions::default();
        for raw in ["/etc/passwd", "C:stuff", "\\\\server\\share"] {
            let err = normalize(raw, &opt).unwrap_err();
            assert_eq!(err.code, IoErrorCode::InvalidPath, "raw={raw}");
        }
    }

    #[test]
    fn normalize_rejects_null_byte() {
        let opt = NormalizeOptions::default();
        let err = normalize("a\0b", &opt).unwrap_err();
        assert_eq!(err.code, IoErrorCode::InvalidPath);
    }

    #[test]
    fn normalize_keeps_trailing_slash_on_request() {
        let opt = NormalizeOptions {
            keep_trailing_slash: true,
            ..Default::default()
        };
        assert_eq!(normalize("a/b/", &opt).unwrap(), "a/b/");
        let opt = NormalizeOptions::default();
        assert_eq!(normalize("a/b/", &opt).unwrap(), "a/b");
    }

    #[test]
    fn normalize_retains_dot_dot_when_allowed() {
        let opt = NormalizeOptions {
            resolve_dot_dot: false,
            reject_traversal: false,
            ..Default::default()
        };
        assert_eq!(normalize("a/../b", &opt).unwrap(), "a/../b");
    }

    #[test]
    fn join_seams() {
        assert_eq!(join("a/", "/b"), "a/b");
        assert_eq!(join("a", "b"), "a/b");
        assert_eq!(join("a/", "b"), "a/b");
        assert_eq!(join("", "b"), "b");
        assert_eq!(join("a", ""), "a");
    }

    #[test]
    fn filename_and_extension() {
        assert_eq!(file_name("a/b/c.png"), "c.png");
        assert_eq!(file_name("a/b/"), "b");
        assert_eq!(extension("a/b/c.png"), ".png");
        assert_eq!(extension("a/b/.gitignore"), "");
        assert_eq!(extension("a/b/c"), "");
        assert_eq!(parent("a/b/c"), "a/b");
        assert_eq!(parent("c"), "");
    }

    #[test]
    fn replace_extension_variants() {
        assert_eq!(replace_extension("a/b.png", "jpg"), "a/b.jpg");
        assert_eq!(replace_extension("a/b.png", ".jpg"), "a/b.jpg");
        assert_eq!(replace_extension("a/b", "jpg"), "a/b.jpg");
    }

    #[test]
    fn remove_dot_segments_reports_escape() {
        let (out, escaped) = remove_dot_segments("a/b/../c");
        assert_eq!(out, "a/c");
        assert!(!escaped);

        let (out, escaped) = remove_dot_segments("a/../../b");
        assert_eq!(out, "b");
        assert!(escaped);

        let (out, escaped) = remove_dot_segments("/a/../..");
        assert_eq!(out, "/");
        assert!(escaped);
    }

    #[test]
    fn remove_dot_segments_keeps_prefixes() {
        let (out, _) = remove_dot_segments("C:/a/../b");
        assert_eq!(out, "C:/b");
        let (out, _) = remove_dot_segments("//server/share/../x");
        assert_eq!(out, "//server/x");
        let (out, _) = remove_dot_segments("/a/b/../c");
        assert_eq!(out, "/a/c");
    }

    #[test]
    fn strip_scheme_loose_variants() {
        assert_eq!(strip_scheme_loose("asset://a/b"), ("a/b".into(), true));
        assert_eq!(strip_scheme_loose("res:///a"), ("a".into(), true));
        assert_eq!(strip_scheme_loose("a/b"), ("a/b".into(), false));
    }

    #[test]
    fn join_root_and_relative_seams() {
        assert_eq!(join_root_and_relative("assets", "a/b"), "assets/a/b");
        assert_eq!(join_root_and_relative("assets/", "/a"), "assets/a");
        assert_eq!(join_root_and_relative("", "a"), "assets/a");
    }
}
