//! Share token encoding
//!
//! A token is the URL-safe base64 (no padding) encoding of the compact JSON
//! array of asset URLs. Links carry it as `?data=<token>`. Tokens produced
//! with the standard base64 alphabet and padding are still accepted.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use percent_encoding::percent_decode_str;

/// Query parameter carrying the token
pub const SHARE_PARAM: &str = "data";

/// Errors that can occur while encoding or decoding a share token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    Encode(String),
    Malformed(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Encode(msg) => write!(f, "Failed to encode share token: {}", msg),
            TokenError::Malformed(msg) => write!(f, "Malformed share token: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

/// Encodes an ordered URL list into a token
pub fn encode_urls(urls: &[String]) -> Result<String, TokenError> {
    let json = serde_json::to_string(urls).map_err(|e| TokenError::Encode(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json.as_bytes()))
}

/// Decodes a token back into the ordered URL list
pub fn decode_token(token: &str) -> Result<Vec<String>, TokenError> {
    // '+' may arrive as ' ' after form decoding
    let normalized: String = token
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' | ' ' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    if normalized.is_empty() {
        return Err(TokenError::Malformed("empty token".to_string()));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| TokenError::Malformed(format!("invalid base64: {}", e)))?;

    serde_json::from_slice::<Vec<String>>(&bytes)
        .map_err(|e| TokenError::Malformed(format!("not a list of URLs: {}", e)))
}

/// A shareable link with its embedded token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    url: String,
    token: String,
}

impl ShareLink {
    /// Builds `<base>?data=<token>` for the given URLs
    ///
    /// A fragment on the base is dropped; an existing query string is kept
    /// and the parameter is appended to it.
    pub fn compose(base: &str, urls: &[String]) -> Result<Self, TokenError> {
        let token = encode_urls(urls)?;
        let base = base.split('#').next().unwrap_or_default();
        let separator = match base.find('?') {
            Some(pos) if pos + 1 == base.len() => "",
            Some(_) if base.ends_with('&') => "",
            Some(_) => "&",
            None => "?",
        };
        let url = format!("{}{}{}={}", base, separator, SHARE_PARAM, token);
        Ok(Self { url, token })
    }

    /// Extracts and decodes the token of a shared link
    pub fn parse(link: &str) -> Result<Vec<String>, TokenError> {
        decode_token(&Self::extract_token(link)?)
    }

    fn extract_token(link: &str) -> Result<String, TokenError> {
        let without_fragment = link.split('#').next().unwrap_or_default();
        let query = without_fragment
            .split_once('?')
            .map(|(_, query)| query)
            .ok_or_else(|| TokenError::Malformed("link has no query string".to_string()))?;

        let value = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == SHARE_PARAM)
            .map(|(_, value)| value)
            .ok_or_else(|| {
                TokenError::Malformed(format!("link has no '{}' parameter", SHARE_PARAM))
            })?;

        percent_decode_str(value)
            .decode_utf8()
            .map(|decoded| decoded.to_string())
            .map_err(|e| TokenError::Malformed(format!("invalid percent-encoding: {}", e)))
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Decodes the URLs back out of this link
    pub fn urls(&self) -> Result<Vec<String>, TokenError> {
        decode_token(&self.token)
    }
}

impl std::fmt::Display for ShareLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_round_trip_single_and_many() {
        let single = urls(&["https://host/a"]);
        assert_eq!(decode_token(&encode_urls(&single).unwrap()).unwrap(), single);

        let many: Vec<String> = (0..50)
            .map(|i| format!("https://res.cloudinary.com/demo/image/upload/v1/{}.jpg", i))
            .collect();
        assert_eq!(decode_token(&encode_urls(&many).unwrap()).unwrap(), many);
    }

    #[test]
    fn test_round_trip_urls_needing_escapes() {
        let tricky = urls(&[
            "https://host/a?b=c&d=~e#frag",
            "https://host/\"quoted\"\\slash",
            "https://host/ünïcödé/图片.jpg",
            "https://host/space here/+plus",
        ]);
        let token = encode_urls(&tricky).unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(decode_token(&token).unwrap(), tricky);
    }

    #[test]
    fn test_known_token() {
        let token = encode_urls(&urls(&["https://host/a", "https://host/b"])).unwrap();
        assert_eq!(token, "WyJodHRwczovL2hvc3QvYSIsImh0dHBzOi8vaG9zdC9iIl0");
    }

    #[test]
    fn test_decodes_standard_alphabet_tokens() {
        let expected = urls(&["https://h/a??b>>c"]);
        assert_eq!(decode_token("WyJodHRwczovL2gvYT8/Yj4+YyJd").unwrap(), expected);
        assert_eq!(decode_token("WyJodHRwczovL2gvYT8_Yj4-YyJd").unwrap(), expected);
        // '+' turned into a space by form decoding
        assert_eq!(decode_token("WyJodHRwczovL2gvYT8/Yj4 YyJd").unwrap(), expected);
        // padded
        assert_eq!(
            decode_token("WyJodHRwczovL2hvc3QvYSIsImh0dHBzOi8vaG9zdC9iIl0=").unwrap(),
            urls(&["https://host/a", "https://host/b"])
        );
    }

    #[test]
    fn test_malformed_tokens() {
        // not base64
        assert!(matches!(decode_token("!!!"), Err(TokenError::Malformed(_))));
        assert!(matches!(decode_token(""), Err(TokenError::Malformed(_))));
        // {"a":1}
        assert!(matches!(decode_token("eyJhIjoxfQ"), Err(TokenError::Malformed(_))));
        // [1,2]
        assert!(matches!(decode_token("WzEsMl0"), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_compose_link() {
        let list = urls(&["https://host/a", "https://host/b"]);
        let link = ShareLink::compose("https://tree.example.com/", &list).unwrap();
        assert_eq!(
            link.as_str(),
            format!("https://tree.example.com/?data={}", link.token())
        );
        assert_eq!(link.urls().unwrap(), list);

        let with_query = ShareLink::compose("https://tree.example.com/?lang=en#top", &list).unwrap();
        assert!(with_query
            .as_str()
            .starts_with("https://tree.example.com/?lang=en&data="));
    }

    #[test]
    fn test_parse_link() {
        let list = urls(&["https://host/a"]);
        let link = ShareLink::compose("https://tree.example.com/", &list).unwrap();
        assert_eq!(ShareLink::parse(link.as_str()).unwrap(), list);

        let escaped = "https://tree.example.com/?x=1&data=WyJodHRwczovL2gvYT8%2FYj4%2BYyJd#view";
        assert_eq!(ShareLink::parse(escaped).unwrap(), urls(&["https://h/a??b>>c"]));

        assert!(ShareLink::parse("https://tree.example.com/").is_err());
        assert!(ShareLink::parse("https://tree.example.com/?other=1").is_err());
    }
}
