//! URI parsing: a strict form that validates, and a loose form that never
//! fails and is used internally for mount routing.

use std::fmt;

use crate::error::{IoError, IoErrorCode, IoResult};
use crate::path::{LogicalPath, NormalizeOptions};

/// Recognized URI schemes. Unknown schemes parse but stay opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UriScheme {
    #[default]
    None,
    Asset,
    File,
    Http,
    Https,
    Unknown,
}

fn scheme_from(lower: &str) -> UriScheme {
    match lower {
        "asset" => UriScheme::Asset,
        "file" => UriScheme::File,
        "http" => UriScheme::Http,
        "https" => UriScheme::Https,
        _ => UriScheme::Unknown,
    }
}

/// `scheme "://" authority ("/" path)? ("?" query)? ("#" fragment)?`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Uri {
    pub scheme: UriScheme,
    /// Original scheme text, kept for `Unknown` schemes.
    pub scheme_text: String,
    pub authority: String,
    pub path: LogicalPath,
    pub query: String,
    pub fragment: String,
}

impl Uri {
    /// Strict parse: scheme-less input is treated as a relative logical path
    /// and fully normalized; absolute-like paths are permitted only for
    /// `file://`.
    pub fn parse(s: &str) -> IoResult<Uri> {
        if s.is_empty() {
            return Err(IoError::new(IoErrorCode::InvalidPath, "uri is empty"));
        }

        let (base, fragment) = match s.find('#') {
            Some(pos) => (&s[..pos], &s[pos + 1..]),
            None => (s, ""),
        };
        let (base, query) = match base.find('?') {
            Some(pos) => (&base[..pos], &base[pos + 1..]),
            None => (base, ""),
        };

        let mut uri = Uri {
            query: query.to_string(),
            fragment: fragment.to_string(),
            ..Default::default()
        };

        let Some(scheme_pos) = base.find("://") else {
            // No scheme: a pure relative logical path, strictly normalized.
            let opt = NormalizeOptions::default();
            uri.scheme = UriScheme::None;
            uri.path = LogicalPath::parse(base, &opt)?;
            return Ok(uri);
        };

        let scheme_lower = base[..scheme_pos].to_ascii_lowercase();
        uri.scheme = scheme_from(&scheme_lower);
        if uri.scheme == UriScheme::Unknown {
            uri.scheme_text = base[..scheme_pos].to_string();
        }

        let rest = &base[scheme_pos + 3..];
        let (auth, path_part) = match rest.find('/') {
            None => (rest, ""),
            Some(slash) => (&rest[..slash], &rest[slash + 1..]),
        };
        uri.authority = auth.to_string();

        let opt = NormalizeOptions {
            // file:// is tooling territory; absolute-like is permitted there
            // and rejected everywhere else.
            reject_absolute_like: uri.scheme != UriScheme::File,
            ..Default::default()
        };

        if !path_part.is_empty() {
            uri.path = LogicalPath::parse(path_part, &opt)?;
        } else {
            uri.path = LogicalPath::from_normalized(String::new());
        }

        Ok(uri)
    }

    /// Loose parse: never fails. Strips any `scheme://`, trims leading
    /// slashes after it, and stores the remainder unnormalized.
    pub fn parse_loose(s: &str) -> Uri {
        let mut uri = Uri::default();

        let Some(pos) = s.find("://") else {
            uri.path = LogicalPath::from_normalized(s);
            return uri;
        };

        let scheme_lower = s[..pos].to_ascii_lowercase();
        uri.scheme = scheme_from(&scheme_lower);
        if uri.scheme == UriScheme::Unknown {
            uri.scheme_text = s[..pos].to_string();
        }

        let rest = s[pos + 3..].trim_start_matches(['/', '\\']);
        uri.path = LogicalPath::from_normalized(rest);
        uri
    }

    /// The scheme as routing text: `""` for `None`, the original text for
    /// `Unknown`, the canonical name otherwise.
    pub fn scheme_str(&self) -> &str {
        match self.scheme {
            UriScheme::None => "",
            UriScheme::Asset => "asset",
            UriScheme::File => "file",
            UriScheme::Http => "http",
            UriScheme::Https => "https",
            UriScheme::Unknown => &self.scheme_text,
        }
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scheme == UriScheme::None {
            f.write_str(self.path.as_str())?;
        } else {
            f.write_str(self.scheme_str())?;
            f.write_str("://")?;
            f.write_str(&self.authority)?;
            if !self.authority.is_empty()
                && !self.path.is_empty()
                && !self.path.as_str().starts_with('/')
            {
                f.write_str("/")?;
            }
            f.write_str(self.path.as_str())?;
        }
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parses_scheme_authority_path() {
        let u = Uri::parse("asset://pack0/ui/title.txt").unwrap();
        assert_eq!(u.scheme, UriScheme::Asset);
        assert_eq!(u.authority, "pack0");
        assert_eq!(u.path.as_str(), "ui/title.txt");
    }

    #[test]
    fn strict_splits_query_and_fragment() {
        let u = Uri::parse("http://host/a/b?x=1#frag").unwrap();
        assert_eq!(u.scheme, UriScheme::Http);
        assert_eq!(u.query, "x=1");
        assert_eq!(u.fragment, "frag");
        assert_eq!(u.path.as_str(), "a/b");
    }

    #[test]
    fn strict_scheme_is_case_insensitive() {
        let u = Uri::parse("ASSET://ui/x").unwrap();
        assert_eq!(u.scheme, UriScheme::Asset);
    }

    #[test]
    fn strict_relative_without_scheme() {
        let u = Uri::parse("ui//title.txt").unwrap();
        assert_eq!(u.scheme, UriScheme::None);
        assert_eq!(u.path.as_str(), "ui/title.txt");
    }

    #[test]
    fn strict_rejects_absolute_for_asset_scheme() {
        // The authority slot absorbs the first segment, so a double slash
        // after it makes the path absolute-like.
        assert!(Uri::parse("asset://a//etc/passwd").is_err());
    }

    #[test]
    fn strict_allows_absolute_for_file_scheme() {
        let u = Uri::parse("file:///home/me/assets").unwrap();
        assert_eq!(u.scheme, UriScheme::File);
        assert_eq!(u.path.as_str(), "/home/me/assets");
    }

    #[test]
    fn strict_rejects_traversal() {
        assert!(Uri::parse("asset://pack/../escape").is_err());
        assert!(Uri::parse("../escape").is_err());
    }

    #[test]
    fn strict_rejects_empty() {
        assert!(Uri::parse("").is_err());
    }

    #[test]
    fn unknown_scheme_is_kept_opaque() {
        let u = Uri::parse("pak://base/textures").unwrap();
        assert_eq!(u.scheme, UriScheme::Unknown);
        assert_eq!(u.scheme_str(), "pak");
    }

    #[test]
    fn loose_never_fails() {
        let u = Uri::parse_loose("asset:///ui/x.txt");
        assert_eq!(u.scheme, UriScheme::Asset);
        assert_eq!(u.path.as_str(), "ui/x.txt");

        let u = Uri::parse_loose("../whatever");
        assert_eq!(u.scheme, UriScheme::None);
        assert_eq!(u.path.as_str(), "../whatever");
    }

    #[test]
    fn display_round_trip() {
        let u = Uri::parse("asset://pack/ui/x.txt?v=2#f").unwrap();
        assert_eq!(u.to_string(), "asset://pack/ui/x.txt?v=2#f");

        let u = Uri::parse("ui/x.txt").unwrap();
        assert_eq!(u.to_string(), "ui/x.txt");
    }
}
