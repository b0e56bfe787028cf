use std::time::Duration;

// The same throttling condition surfaces under different error codes across
// AWS APIs.
pub const RATE_LIMIT_ERROR_CODES: [&str; 3] = [
    "LimitExceededException",
    "ClientLimitExceededException",
    "TooManyRequestsException",
];

pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorClass {
    RateLimited,
    Pagination,
    Other,
}

impl RemoteErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Pagination => "pagination",
            Self::Other => "other",
        }
    }
}

pub fn classify_error_code(code: Option<&str>) -> RemoteErrorClass {
    match code {
        Some(code) if RATE_LIMIT_ERROR_CODES.contains(&code) => RemoteErrorClass::RateLimited,
        _ => RemoteErrorClass::Other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay before re-issuing a call that failed on its `attempt`-th try,
    /// counted from zero.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }

    /// `Some(delay)` when the failed attempt should be retried after sleeping,
    /// `None` when the error class is not retryable or attempts ran out.
    pub fn next_delay(&self, class: RemoteErrorClass, attempt: u32) -> Option<Duration> {
        if class != RemoteErrorClass::RateLimited {
            return None;
        }
        if attempt.saturating_add(1) >= self.max_attempts {
            return None;
        }
        Some(self.backoff_delay(attempt))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCallError {
    pub operation: String,
    pub class: RemoteErrorClass,
    pub code: Option<String>,
    pub message: String,
}

impl std::fmt::Display for RemoteCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} failed ({code}): {}", self.operation, self.message),
            None => write!(f, "{} failed: {}", self.operation, self.message),
        }
    }
}

impl std::error::Error for RemoteCallError {}
