use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = "InterfaceCore/0.1.0";

/// Connection establishment budget per request.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Whole-request budget; the download engine owns retries on top of this.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// Client for metadata/auth endpoints: same identity, no total-request cap
/// beyond the connect budget (token endpoints can be slow behind proxies).
pub fn build_rest_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(APP_USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
}
