use std::future::Future;

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use serde_json::json;

use crate::logging::{log_error, log_warn};
use crate::runtime::contract::MirrorError;
use crate::runtime::retry::{classify_error_code, RemoteCallError, RemoteErrorClass, RetryPolicy};

/// Drives one remote operation under the retry policy. Rate-limited failures
/// sleep and re-run `call`; every other failure class propagates immediately.
/// Exhausting the attempt budget returns `MirrorError::RetriesExhausted`
/// without a trailing sleep.
pub async fn run_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    component: &str,
    mut call: F,
) -> Result<T, MirrorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteCallError>>,
{
    let mut attempt = 0u32;
    loop {
        let error = match call().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        match policy.next_delay(error.class, attempt) {
            Some(delay) => {
                log_warn(
                    component,
                    "throttled_retry",
                    json!({
                        "operation": error.operation,
                        "attempt": attempt + 1,
                        "max_attempts": policy.max_attempts,
                        "delay_ms": delay.as_millis(),
                        "error": error.to_string(),
                    }),
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            None if error.class == RemoteErrorClass::RateLimited => {
                log_error(
                    component,
                    "retries_exhausted",
                    json!({
                        "operation": error.operation,
                        "attempts": attempt + 1,
                        "error": error.to_string(),
                    }),
                );
                return Err(MirrorError::RetriesExhausted {
                    attempts: attempt + 1,
                    last: error,
                });
            }
            None => {
                log_error(
                    component,
                    "remote_call_failed",
                    json!({
                        "operation": error.operation,
                        "class": error.class.as_str(),
                        "code": error.code,
                        "error": error.to_string(),
                    }),
                );
                return Err(MirrorError::Remote(error));
            }
        }
    }
}

/// Flattens any AWS SDK error into the job's transport-agnostic error shape,
/// classifying it by the service error code.
pub fn sdk_remote_error<E>(operation: &str, error: SdkError<E>) -> RemoteCallError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let code = error.code().map(str::to_string);
    let class = classify_error_code(code.as_deref());
    RemoteCallError {
        operation: operation.to_string(),
        class,
        code,
        message: DisplayErrorContext(error).to_string(),
    }
}
