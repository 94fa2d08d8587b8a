use chrono::{DateTime, Utc};

use crate::transport::Headers;

pub const RATE_LIMIT_HEADER: &str = "x-rate-limit";
pub const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Period a rate limit applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Window {
    Second,
    Minute,
}

impl Window {
    fn from_seconds(seconds: &str) -> Option<Self> {
        match seconds.trim() {
            "1" => Some(Window::Second),
            "60" => Some(Window::Minute),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Window::Second => "second",
            Window::Minute => "minute",
        }
    }
}

/// Rate limit as last reported by the evaluator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u64>,
    pub window: Option<Window>,
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimit {
    /// Reads `x-rate-limit: <limit>;window=<seconds>` and
    /// `x-rate-limit-reset: <epoch seconds>`. Absent or malformed values
    /// become `None`.
    pub fn from_headers(headers: &Headers) -> Self {
        let (limit, window) = match headers.get(RATE_LIMIT_HEADER) {
            Some(value) => match value.split_once(";window=") {
                Some((limit, window)) => (limit.trim().parse().ok(), Window::from_seconds(window)),
                None => (value.trim().parse().ok(), None),
            },
            None => (None, None),
        };
        let reset_at = headers
            .get(RATE_LIMIT_RESET_HEADER)
            .and_then(|value| value.trim().parse::<i64>().ok())
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0));

        Self {
            limit,
            window,
            reset_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs.iter().copied().collect()
    }

    #[test]
    fn parses_limit_window_and_reset() {
        let rate_limit = RateLimit::from_headers(&headers(&[
            ("x-rate-limit", "100;window=60"),
            ("x-rate-limit-reset", "1700000000"),
        ]));

        assert_eq!(rate_limit.limit, Some(100));
        assert_eq!(rate_limit.window, Some(Window::Minute));
        assert_eq!(rate_limit.reset_at.map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn second_window() {
        let rate_limit = RateLimit::from_headers(&headers(&[("x-rate-limit", "5;window=1")]));

        assert_eq!(rate_limit.limit, Some(5));
        assert_eq!(rate_limit.window, Some(Window::Second));
        assert_eq!(rate_limit.reset_at, None);
    }

    #[test]
    fn absent_headers_reset_everything() {
        assert_eq!(RateLimit::from_headers(&Headers::new()), RateLimit::default());
    }

    #[test]
    fn unknown_window_is_none() {
        let rate_limit = RateLimit::from_headers(&headers(&[("x-rate-limit", "5;window=3600")]));

        assert_eq!(rate_limit.limit, Some(5));
        assert_eq!(rate_limit.window, None);
    }
}
