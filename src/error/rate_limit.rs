use http::HeaderMap;
use std::fmt;

use super::api::ApiError;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";
const RETRY_AFTER_HEADER: &str = "retry-after";
const CLIENT_QUOTA_HEADER: &str = "auth0-client-quota-limit";
const ORGANIZATION_QUOTA_HEADER: &str = "auth0-organization-quota-limit";

/// Value used for every counter missing from the response.
pub const UNKNOWN: i64 = -1;

/// `429 Too Many Requests` returned once every retry was rate limited too.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitError {
    api: ApiError,
    limit: i64,
    remaining: i64,
    reset: i64,
    retry_after: i64,
    client_quota_limit: Option<QuotaLimit>,
    organization_quota_limit: Option<QuotaLimit>,
}

impl std::error::Error for RateLimitError {}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (limit: {}, remaining: {}, reset: {})",
            self.api, self.limit, self.remaining, self.reset
        )
    }
}

impl RateLimitError {
    pub fn from_response(body: &[u8], headers: &HeaderMap) -> Self {
        Self {
            api: ApiError::from_body(429, body),
            limit: header_number(headers, LIMIT_HEADER),
            remaining: header_number(headers, REMAINING_HEADER),
            reset: header_number(headers, RESET_HEADER),
            retry_after: header_number(headers, RETRY_AFTER_HEADER),
            client_quota_limit: header_text(headers, CLIENT_QUOTA_HEADER).map(QuotaLimit::parse),
            organization_quota_limit: header_text(headers, ORGANIZATION_QUOTA_HEADER)
                .map(QuotaLimit::parse),
        }
    }

    /// The error body returned along with the 429.
    pub fn api(&self) -> &ApiError {
        &self.api
    }

    /// Maximum number of requests available in the current window, or [`UNKNOWN`].
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Requests left in the current window, or [`UNKNOWN`].
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    /// UNIX timestamp when the window resets, or [`UNKNOWN`].
    pub fn reset(&self) -> i64 {
        self.reset
    }

    /// Seconds to wait before sending more requests, or [`UNKNOWN`].
    pub fn retry_after(&self) -> i64 {
        self.retry_after
    }

    pub fn client_quota_limit(&self) -> Option<&QuotaLimit> {
        self.client_quota_limit.as_ref()
    }

    pub fn organization_quota_limit(&self) -> Option<&QuotaLimit> {
        self.organization_quota_limit.as_ref()
    }
}

/// Usage of one quota bucket, `b=per_hour;q=100;r=99;t=3600`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaBucket {
    /// Quota of the bucket.
    pub quota: i64,
    /// Requests left.
    pub remaining: i64,
    /// Seconds until the bucket resets.
    pub reset_after: i64,
}

/// Quotas reported through the `Auth0-*-Quota-Limit` headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotaLimit {
    pub per_hour: Option<QuotaBucket>,
    pub per_day: Option<QuotaBucket>,
}

impl QuotaLimit {
    /// Parses a header value such as `b=per_hour;q=100;r=99;t=1,b=per_day;q=1000;r=999;t=2`.
    /// Unknown buckets and attributes are ignored.
    pub fn parse(value: &str) -> Self {
        let mut limit = QuotaLimit::default();
        for bucket in value.split(',') {
            let mut name = None;
            let mut parsed = QuotaBucket {
                quota: UNKNOWN,
                remaining: UNKNOWN,
                reset_after: UNKNOWN,
            };
            for attribute in bucket.split(';') {
                let Some((key, value)) = attribute.trim().split_once('=') else {
                    continue;
                };
                let number = || value.trim().parse().unwrap_or(UNKNOWN);
                match key.trim() {
                    "b" => name = Some(value.trim()),
                    "q" => parsed.quota = number(),
                    "r" => parsed.remaining = number(),
                    "t" => parsed.reset_after = number(),
                    _ => {}
                }
            }
            match name {
                Some("per_hour") => limit.per_hour = Some(parsed),
                Some("per_day") => limit.per_day = Some(parsed),
                _ => {}
            }
        }
        limit
    }
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn header_number(headers: &HeaderMap, name: &str) -> i64 {
    header_text(headers, name)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn reads_rate_limit_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("10"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("5"));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1713182400"));
        headers.insert("retry-after", HeaderValue::from_static("4"));

        let err = RateLimitError::from_response(
            br#"{"statusCode":429,"error":"Too Many Requests","message":"Global limit has been reached"}"#,
            &headers,
        );

        assert_eq!(err.limit(), 10);
        assert_eq!(err.remaining(), 5);
        assert_eq!(err.reset(), 1713182400);
        assert_eq!(err.retry_after(), 4);
        assert_eq!(err.api().status_code(), 429);
        assert_eq!(err.api().description(), "Global limit has been reached");
        assert_eq!(err.client_quota_limit(), None);
    }

    #[test]
    fn missing_or_invalid_headers_default_to_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("ten"));

        let err = RateLimitError::from_response(b"", &headers);

        assert_eq!(err.limit(), UNKNOWN);
        assert_eq!(err.remaining(), UNKNOWN);
        assert_eq!(err.reset(), UNKNOWN);
        assert_eq!(err.retry_after(), UNKNOWN);
    }

    #[test]
    fn parses_quota_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "auth0-client-quota-limit",
            HeaderValue::from_static("b=per_hour;q=100;r=99;t=1234,b=per_day;q=1000;r=999;t=5678"),
        );
        headers.insert(
            "auth0-organization-quota-limit",
            HeaderValue::from_static("b=per_day;q=10;r=x;t=60"),
        );

        let err = RateLimitError::from_response(b"", &headers);

        assert_eq!(
            err.client_quota_limit(),
            Some(&QuotaLimit {
                per_hour: Some(QuotaBucket { quota: 100, remaining: 99, reset_after: 1234 }),
                per_day: Some(QuotaBucket { quota: 1000, remaining: 999, reset_after: 5678 }),
            })
        );
        assert_eq!(
            err.organization_quota_limit(),
            Some(&QuotaLimit {
                per_hour: None,
                per_day: Some(QuotaBucket { quota: 10, remaining: UNKNOWN, reset_after: 60 }),
            })
        );
    }
}
