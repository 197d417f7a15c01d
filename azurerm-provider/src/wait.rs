//! Polling until a deleted object is gone
//!
//! Relay deletes can report success before the object disappears, so
//! handlers poll Get on a fixed interval until it answers 404.

use std::future::Future;
use std::time::Duration;

use azurerm_core::context::OperationContext;
use azurerm_core::provider::{ProviderError, ProviderResult};

use crate::arm::ArmError;

/// Interval between Get calls while waiting for a deletion
pub const DEFAULT_DELETE_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Call `get` every `interval` until it reports not found
///
/// Fails if `get` returns any other error, or once the context deadline
/// passes while the object still exists.
pub async fn wait_for_deletion<F, Fut, T>(
    ctx: &OperationContext,
    interval: Duration,
    description: &str,
    mut get: F,
) -> ProviderResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ArmError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match get().await {
            Err(e) if e.is_not_found() => {
                tracing::debug!(attempt, "{} is gone", description);
                return Ok(());
            }
            Err(e) => {
                return Err(ProviderError::api(format!(
                    "waiting for {} to be deleted",
                    description
                ))
                .with_cause(e));
            }
            Ok(_) => {}
        }

        let remaining = ctx.remaining();
        if remaining.is_zero() {
            return Err(ProviderError::timeout(format!(
                "timed out waiting for {} to be deleted",
                description
            )));
        }

        tracing::debug!(attempt, "{} still exists, polling again in {:?}", description, interval);
        tokio::time::sleep(interval.min(remaining)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azurerm_core::context::Operation;
    use azurerm_core::provider::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;
    use tracing::Span;

    fn not_found() -> ArmError {
        ArmError::NotFound {
            method: "GET".to_string(),
            url: "https://management.azure.com/ns".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_only_after_not_found() {
        let ctx = OperationContext::new(Operation::Delete, Duration::from_secs(3600), Span::none());
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        wait_for_deletion(&ctx, DEFAULT_DELETE_POLL_INTERVAL, "Relay Namespace", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Ok(())
                } else {
                    Err(not_found())
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_object_never_disappears() {
        let ctx = OperationContext::new(Operation::Delete, Duration::from_secs(40), Span::none());

        let err = wait_for_deletion(
            &ctx,
            DEFAULT_DELETE_POLL_INTERVAL,
            "Relay Namespace",
            || async { Ok::<_, ArmError>(()) },
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.message.contains("Relay Namespace"));
    }

    #[tokio::test]
    async fn other_errors_abort_polling() {
        let ctx = OperationContext::new(Operation::Delete, Duration::from_secs(60), Span::none());

        let err = wait_for_deletion(&ctx, Duration::from_millis(1), "Relay Namespace", || async {
            Err::<(), _>(ArmError::Auth("expired".to_string()))
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Api);
    }
}
