//! Operation context - deadline and logging span threaded through every call
//!
//! Each provider operation receives an `OperationContext`. It carries the
//! deadline derived from the resource's timeouts and the `tracing` span that
//! all log output of the operation is recorded under.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{Instrument, Span};

use crate::provider::{ProviderError, ProviderResult};
use crate::resource::ResourceId;

/// Kind of operation being performed on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Import => "import",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-operation timeouts of a resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Timeouts {
    pub const fn minutes(create: u64, read: u64, update: u64, delete: u64) -> Self {
        Self {
            create: Duration::from_secs(create * 60),
            read: Duration::from_secs(read * 60),
            update: Duration::from_secs(update * 60),
            delete: Duration::from_secs(delete * 60),
        }
    }

    /// Timeout for an operation. Import is bounded by the read timeout.
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Read | Operation::Import => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }

    pub fn with_overrides(mut self, overrides: &TimeoutOverrides) -> Self {
        if let Some(d) = overrides.create {
            self.create = d;
        }
        if let Some(d) = overrides.read {
            self.read = d;
        }
        if let Some(d) = overrides.update {
            self.update = d;
        }
        if let Some(d) = overrides.delete {
            self.delete = d;
        }
        self
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::minutes(30, 5, 30, 30)
    }
}

/// User supplied timeouts from a resource's `timeouts` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeoutOverrides {
    pub create: Option<Duration>,
    pub read: Option<Duration>,
    pub update: Option<Duration>,
    pub delete: Option<Duration>,
}

/// Error parsing a `timeouts` block
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeoutParseError {
    #[error("Unknown timeout '{0}', expected one of: create, read, update, delete")]
    UnknownOperation(String),

    #[error("Invalid duration '{value}' for timeout '{operation}': {message}")]
    InvalidDuration {
        operation: String,
        value: String,
        message: String,
    },
}

impl TimeoutOverrides {
    /// Parse a map like `{"create": "45m", "delete": "1h"}`
    pub fn parse(raw: &HashMap<String, String>) -> Result<Self, TimeoutParseError> {
        let mut overrides = Self::default();
        for (operation, value) in raw {
            let duration = humantime::parse_duration(value).map_err(|e| {
                TimeoutParseError::InvalidDuration {
                    operation: operation.clone(),
                    value: value.clone(),
                    message: e.to_string(),
                }
            })?;
            let slot = match operation.as_str() {
                "create" => &mut overrides.create,
                "read" => &mut overrides.read,
                "update" => &mut overrides.update,
                "delete" => &mut overrides.delete,
                other => return Err(TimeoutParseError::UnknownOperation(other.to_string())),
            };
            *slot = Some(duration);
        }
        Ok(overrides)
    }
}

/// Context of a single provider operation
#[derive(Debug, Clone)]
pub struct OperationContext {
    operation: Operation,
    deadline: Instant,
    span: Span,
}

impl OperationContext {
    pub fn new(operation: Operation, timeout: Duration, span: Span) -> Self {
        Self {
            operation,
            deadline: Instant::now() + timeout,
            span,
        }
    }

    /// Create a context whose span records the operation and resource
    pub fn for_resource(operation: Operation, id: &ResourceId, timeout: Duration) -> Self {
        let span = tracing::info_span!(
            "operation",
            op = operation.as_str(),
            resource = %id,
        );
        Self::new(operation, timeout, span)
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Time left before the deadline, zero once elapsed
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Run a future under this context's span, bounded by the deadline
    pub async fn run<F, T>(&self, fut: F) -> ProviderResult<T>
    where
        F: Future<Output = ProviderResult<T>>,
    {
        match tokio::time::timeout_at(self.deadline, fut.instrument(self.span.clone())).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::timeout(format!(
                "{} did not complete before the deadline",
                self.operation
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ErrorKind;

    #[test]
    fn timeouts_for_operation() {
        let t = Timeouts::minutes(60, 5, 60, 30);
        assert_eq!(t.for_operation(Operation::Create), Duration::from_secs(3600));
        assert_eq!(t.for_operation(Operation::Import), Duration::from_secs(300));
        assert_eq!(t.for_operation(Operation::Delete), Duration::from_secs(1800));
    }

    #[test]
    fn overrides_replace_only_given_values() {
        let raw = HashMap::from([("delete".to_string(), "90s".to_string())]);
        let overrides = TimeoutOverrides::parse(&raw).unwrap();
        let t = Timeouts::default().with_overrides(&overrides);
        assert_eq!(t.delete, Duration::from_secs(90));
        assert_eq!(t.create, Timeouts::default().create);
    }

    #[test]
    fn overrides_reject_unknown_operation() {
        let raw = HashMap::from([("destroy".to_string(), "1m".to_string())]);
        assert_eq!(
            TimeoutOverrides::parse(&raw),
            Err(TimeoutParseError::UnknownOperation("destroy".to_string()))
        );
    }

    #[test]
    fn overrides_reject_bad_duration() {
        let raw = HashMap::from([("create".to_string(), "soon".to_string())]);
        assert!(matches!(
            TimeoutOverrides::parse(&raw),
            Err(TimeoutParseError::InvalidDuration { .. })
        ));
    }

    #[tokio::test]
    async fn run_returns_result_before_deadline() {
        let ctx = OperationContext::new(Operation::Read, Duration::from_secs(5), Span::none());
        let result = ctx.run(async { Ok(42) }).await.unwrap();
        assert_eq!(result, 42);
        assert!(!ctx.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn run_times_out_after_deadline() {
        let ctx = OperationContext::new(Operation::Delete, Duration::from_secs(1), Span::none());
        let result: ProviderResult<()> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }
}
