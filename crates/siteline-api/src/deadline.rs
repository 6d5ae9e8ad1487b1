// Deadline guard for remote calls.
//
// Races an API future against a timer. If the timer fires first the
// caller gets `Error::Timeout`; the original future is dropped, not
// cancelled at the HTTP layer — no signal crosses the wire.

use std::future::Future;
use std::time::Duration;

use crate::error::Error;

/// Default deadline applied to remote calls unless a service config
/// overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Run `fut` under a deadline.
///
/// Resolves to `Error::Timeout` (a connectivity-class failure) if the
/// call does not settle within `timeout`. `operation` names the call in
/// the error message, e.g. `"site search"`.
pub async fn deadline<T>(
    operation: &str,
    timeout: Duration,
    fut: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation: operation.to_owned(),
            timeout_secs: timeout.as_secs(),
        }),
    }
}
