//! Request path shape: `{base_path}{group}/{key}`
//!
//! Both segments are percent-encoded on the wire, so a key containing `/`
//! still yields exactly two raw segments.

use thiserror::Error;

/// Path prefix under which nodes serve each other
pub const DEFAULT_BASE_PATH: &str = "/_cache_/";

/// Reasons a request path is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path {0:?} is outside the peer prefix")]
    WrongPrefix(String),

    #[error("expected {{group}}/{{key}}, got {0} segment(s)")]
    SegmentCount(usize),

    #[error("empty {0} segment")]
    EmptySegment(&'static str),

    #[error("segment is not valid percent-encoded UTF-8")]
    InvalidEncoding,
}

/// Build the path a peer is asked for
pub fn request_path(base_path: &str, group: &str, key: &str) -> String {
    format!(
        "{}{}/{}",
        base_path,
        urlencoding::encode(group),
        urlencoding::encode(key)
    )
}

/// Split a raw request path into decoded `(group, key)`
pub fn parse_request_path(base_path: &str, path: &str) -> Result<(String, String), PathError> {
    let rest = path
        .strip_prefix(base_path)
        .ok_or_else(|| PathError::WrongPrefix(path.to_string()))?;

    let segments: Vec<&str> = rest.split('/').collect();
    if segments.len() != 2 {
        return Err(PathError::SegmentCount(segments.len()));
    }

    let group = decode_segment(segments[0], "group")?;
    let key = decode_segment(segments[1], "key")?;

    Ok((group, key))
}

fn decode_segment(raw: &str, what: &'static str) -> Result<String, PathError> {
    if raw.is_empty() {
        return Err(PathError::EmptySegment(what));
    }

    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .map_err(|_| PathError::InvalidEncoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let parsed = parse_request_path(DEFAULT_BASE_PATH, "/_cache_/scores/alice").unwrap();
        assert_eq!(parsed, ("scores".to_string(), "alice".to_string()));
    }

    #[test]
    fn test_build_then_parse_escaped_key() {
        let path = request_path(DEFAULT_BASE_PATH, "my group", "a/b?c");
        assert_eq!(path, "/_cache_/my%20group/a%2Fb%3Fc");

        let (group, key) = parse_request_path(DEFAULT_BASE_PATH, &path).unwrap();
        assert_eq!(group, "my group");
        assert_eq!(key, "a/b?c");
    }

    #[test]
    fn test_missing_key_segment() {
        assert_eq!(
            parse_request_path(DEFAULT_BASE_PATH, "/_cache_/scores"),
            Err(PathError::SegmentCount(1))
        );
    }

    #[test]
    fn test_too_many_segments() {
        assert_eq!(
            parse_request_path(DEFAULT_BASE_PATH, "/_cache_/scores/alice/extra"),
            Err(PathError::SegmentCount(3))
        );
    }

    #[test]
    fn test_empty_segments() {
        assert_eq!(
            parse_request_path(DEFAULT_BASE_PATH, "/_cache_/scores/"),
            Err(PathError::EmptySegment("key"))
        );
        assert_eq!(
            parse_request_path(DEFAULT_BASE_PATH, "/_cache_//alice"),
            Err(PathError::EmptySegment("group"))
        );
    }

    #[test]
    fn test_wrong_prefix() {
        assert!(matches!(
            parse_request_path(DEFAULT_BASE_PATH, "/other/scores/alice"),
            Err(PathError::WrongPrefix(_))
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(
            parse_request_path(DEFAULT_BASE_PATH, "/_cache_/scores/%FF"),
            Err(PathError::InvalidEncoding)
        );
    }
}
