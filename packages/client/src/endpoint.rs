//! URLs derived from the backend base URL.

use reqwest::Url;

use crate::error::ClientError;

/// Parse an `http(s)` base URL
fn parse_base(base: &str) -> Result<Url, ClientError> {
    let url = Url::parse(base).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            base, other
        ))),
    }
}

/// Replace the base path with `segments` (each one percent-encoded)
fn with_segments(mut url: Url, segments: &[&str]) -> Result<Url, ClientError> {
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidUrl("URL cannot have a path".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `{base}/<segments...>` for REST calls
pub fn api_url(base: &str, segments: &[&str]) -> Result<Url, ClientError> {
    with_segments(parse_base(base)?, segments)
}

/// Target of the secondary HTTP write: `{base}/api/realtime`
pub fn fallback_url(base: &str) -> Result<Url, ClientError> {
    api_url(base, &["api", "realtime"])
}

/// Same host as `base` with `http → ws` and `https → wss`
fn websocket_url(base: &str, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = parse_base(base)?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::InvalidUrl(format!("{}: cannot switch to {}", base, scheme)))?;
    with_segments(url, segments)
}

/// Raw socket endpoint: `ws(s)://<host>/api/socket`
pub fn socket_url(base: &str) -> Result<String, ClientError> {
    Ok(websocket_url(base, &["api", "socket"])?.into())
}

/// Pub/sub hub endpoint with the API key as the `apikey` query parameter
pub fn hub_url(base: &str, api_key: &str) -> Result<String, ClientError> {
    let mut url = websocket_url(base, &["realtime"])?;
    url.query_pairs_mut().append_pair("apikey", api_key);
    Ok(url.into())
}
