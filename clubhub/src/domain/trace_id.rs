//! Correlation identifier for one checkout run.
//!
//! [`TraceId::traced`] runs a workflow with an identifier in task-local
//! scope and stamps it onto any [`Error`] the workflow returns, so a failure
//! a user reports can be matched to the log lines of the same run. Nested
//! runs keep the outer identifier. Task-local values do not cross
//! `tokio::spawn`.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

use super::Error;

task_local! {
    static CURRENT: TraceId;
}

/// Identifier shared by every log line and error of one run.
///
/// # Examples
/// ```
/// use clubhub::TraceId;
/// use clubhub::domain::Error;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let failed = TraceId::traced(async { Err::<(), _>(Error::not_found("club")) }).await;
/// assert!(failed.unwrap_err().trace_id().is_some());
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// A fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The identifier of the enclosing run, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Run `work` under the enclosing run's identifier, or a new one.
    ///
    /// Errors leave with the identifier attached.
    pub async fn traced<T, Fut>(work: Fut) -> Result<T, Error>
    where
        Fut: Future<Output = Result<T, Error>>,
    {
        let id = Self::current().unwrap_or_else(Self::generate);
        CURRENT
            .scope(id, work)
            .await
            .map_err(|err| err.with_trace_id(id.to_string()))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
