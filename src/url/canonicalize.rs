use crate::UrlError;
use url::Url;

/// Query parameters that only carry tracking information
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "ref",
];

/// Well-known default ports, stripped when given explicitly
const DEFAULT_PORTS: &[(&str, u16)] = &[
    ("http", 80),
    ("https", 443),
    ("ftp", 21),
    ("ftps", 990),
    ("ssh", 22),
    ("telnet", 23),
    ("smtp", 25),
    ("pop3", 110),
    ("imap", 143),
    ("ldap", 389),
    ("ldaps", 636),
];

/// Canonicalizes a URL so that it can serve as a page identity
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject it if it has no host
/// 2. Lowercase the scheme and host
/// 3. Strip an explicit port equal to the scheme's default
/// 4. Normalize the path:
///    - Collapse duplicate slashes and remove dot segments
///    - Percent-normalize every segment
///    - Remove the trailing slash (except for root /)
/// 5. Drop the fragment
/// 6. Drop tracking query parameters (case-insensitive)
/// 7. Sort the remaining parameters by name and re-encode them
///
/// The function is idempotent: canonicalizing a canonical URL returns it
/// unchanged.
///
/// # Examples
///
/// ```
/// use spidey::url::canonicalize;
///
/// let url = canonicalize("http://X.com:80/p/").unwrap();
/// assert_eq!(url.as_str(), "http://x.com/p");
/// ```
pub fn canonicalize(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_lowercase(),
        _ => return Err(UrlError::MissingHost(url_str.to_string())),
    };
    if url.host_str() != Some(host.as_str()) {
        url.set_host(Some(&host))
            .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
    }

    if let Some(port) = url.port() {
        if default_port(url.scheme()) == Some(port) {
            url.set_port(None)
                .map_err(|_| UrlError::Malformed(format!("Cannot strip port from {}", url_str)))?;
        }
    }

    let path = normalize_path(url.path());
    url.set_path(&path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);

        if params.is_empty() {
            url.set_query(None);
        } else {
            let query_string = params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query_string));
        }
    }

    Ok(url)
}

/// Returns the well-known port for a scheme, if there is one
pub fn default_port(scheme: &str) -> Option<u16> {
    DEFAULT_PORTS
        .iter()
        .find(|(name, _)| *name == scheme)
        .map(|(_, port)| *port)
}

/// Normalizes a URL path: percent-normalized segments, no empty or dot
/// segments, no trailing slash
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<String> = Vec::new();

    for raw in path.split('/') {
        let decoded = urlencoding::decode_binary(raw.as_bytes());
        match decoded.as_ref() {
            b"" | b"." => continue,
            b".." => {
                segments.pop();
            }
            bytes => segments.push(urlencoding::encode_binary(bytes).into_owned()),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters by name
///
/// Parameters sharing a name keep their relative order.
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    TRACKING_PARAMS.contains(&key.as_str())
}
