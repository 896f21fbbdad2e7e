// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridchart.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! CORS layer built from `[cors]` settings.

use axum::http::HeaderValue;
use axum::http::request::Parts;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::CorsSettings;

/// Whether `origin` matches `pattern`.
///
/// A pattern ending in `:*` accepts the same scheme and host with any
/// numeric port, or no port at all.
#[must_use]
pub fn origin_matches(pattern: &str, origin: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    let Some(base) = pattern.strip_suffix(":*") else {
        return pattern == origin;
    };
    match origin.strip_prefix(base) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix(':')
            .is_some_and(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}

#[must_use]
pub fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    let patterns = settings.allowed_origins.clone();
    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
        origin
            .to_str()
            .is_ok_and(|origin| patterns.iter().any(|p| origin_matches(p, origin)))
    });

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(settings.allow_credentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_port_pattern() {
        let pattern = "http://localhost:*";
        assert!(origin_matches(pattern, "http://localhost:3000"));
        assert!(origin_matches(pattern, "http://localhost"));
        assert!(!origin_matches(pattern, "http://localhost:"));
        assert!(!origin_matches(pattern, "http://localhost:80abc"));
        assert!(!origin_matches(pattern, "http://localhost.evil.com:80"));
        assert!(!origin_matches(pattern, "https://localhost:3000"));
    }

    #[test]
    fn test_exact_pattern() {
        assert!(origin_matches("https://saricmilos.com", "https://saricmilos.com"));
        assert!(!origin_matches("https://saricmilos.com", "https://saricmilos.com:8443"));
        assert!(origin_matches("*", "http://anything"));
    }
}
