//! Externally visible base URL for asset links.
//!
//! Resolution order:
//! 1. `server.public_base_url` when configured
//! 2. `X-Forwarded-Host` / `X-Forwarded-Proto` / `X-Forwarded-Port`
//! 3. The request URI when absolute, else the `Host` header over http
//! 4. The bind address over http

use axum::http::{HeaderMap, Uri, header};
use picstash_core::config::ServerConfig;

const FORWARDED_HOST: &str = "x-forwarded-host";
const FORWARDED_PROTO: &str = "x-forwarded-proto";
const FORWARDED_PORT: &str = "x-forwarded-port";

/// Resolve the base URL (scheme and authority, no trailing slash) that
/// public paths are appended to.
pub fn resolve_base_url(config: &ServerConfig, headers: &HeaderMap, uri: &Uri) -> String {
    if let Some(base) = config.public_base_url() {
        return base.to_string();
    }

    if let Some(base) = from_forwarded_headers(headers) {
        return base;
    }

    if let Some(base) = from_request(headers, uri) {
        return base;
    }

    format!("http://{}", config.bind)
}

/// First non-empty value of a possibly comma-separated header.
fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn from_forwarded_headers(headers: &HeaderMap) -> Option<String> {
    let host = first_value(headers, FORWARDED_HOST)?;
    let proto = first_value(headers, FORWARDED_PROTO)
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "http".to_string());

    let mut base = format!("{proto}://{host}");
    if let Some(port) = first_value(headers, FORWARDED_PORT)
        && !host_has_port(host)
        && !is_default_port(&proto, port)
    {
        base.push(':');
        base.push_str(port);
    }

    Some(base)
}

fn from_request(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    if let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) {
        return Some(format!("{scheme}://{authority}"));
    }

    let host = headers.get(header::HOST)?.to_str().ok()?.trim();
    if host.is_empty() {
        return None;
    }
    Some(format!("http://{host}"))
}

/// Whether `host` already carries a port. Handles bracketed IPv6 literals.
fn host_has_port(host: &str) -> bool {
    match host.rfind(']') {
        Some(end) => host[end..].contains(':'),
        None => host.contains(':'),
    }
}

fn is_default_port(proto: &str, port: &str) -> bool {
    matches!((proto, port), ("http", "80") | ("https", "443"))
}
