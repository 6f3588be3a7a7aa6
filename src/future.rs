//! Context propagation for futures.

use std::{pin::Pin, task::Poll};

use pin_project::pin_project;

use crate::{ContextSnapshot, LogContext, bridge::capture_for_handoff, store::ContextStore};

/// Extension methods running a future in its own log context.
pub trait FutureExt: Future + Sized {
    /// Runs the future with `context` entered on top of an empty store.
    fn in_log_context(self, context: LogContext) -> LogContextFuture<Self>;

    /// Runs the future with `snapshot` installed.
    fn with_snapshot(self, snapshot: &ContextSnapshot) -> LogContextFuture<Self>;

    /// Runs the future with the context of the calling unit, captured now.
    fn with_current_context(self) -> LogContextFuture<Self> {
        self.with_snapshot(&capture_for_handoff())
    }
}

impl<F> FutureExt for F
where
    F: Future,
{
    fn in_log_context(self, context: LogContext) -> LogContextFuture<Self> {
        self.with_snapshot(&context.to_snapshot())
    }

    fn with_snapshot(self, snapshot: &ContextSnapshot) -> LogContextFuture<Self> {
        LogContextFuture {
            inner: self,
            store: ContextStore::from_snapshot(snapshot),
        }
    }
}

/// A future that owns its context store.
///
/// The store is swapped into the polling thread for the duration of every
/// poll, so scopes opened inside the future survive across `.await` points
/// and never leak into other tasks sharing the worker thread.
#[pin_project]
#[derive(Debug)]
pub struct LogContextFuture<F> {
    #[pin]
    inner: F,
    store: ContextStore,
}

struct SwapBack<'a>(&'a ContextStore);

impl<'a> SwapBack<'a> {
    fn swap_in(store: &'a ContextStore) -> Self {
        ContextStore::with_current(|current| current.swap(store));
        Self(store)
    }
}

impl Drop for SwapBack<'_> {
    fn drop(&mut self) {
        let _ = ContextStore::try_with_current(|current| current.swap(self.0));
    }
}

impl<F> Future for LogContextFuture<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        let _swapped = SwapBack::swap_in(this.store);
        this.inner.poll(cx)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::open;

    #[tokio::test]
    async fn test_future_context_is_isolated_per_task() {
        let first = tokio::spawn(
            async {
                tokio::task::yield_now().await;
                capture_for_handoff()
            }
            .in_log_context(LogContext::new().record("task", "first")),
        );
        let second = tokio::spawn(
            async {
                tokio::task::yield_now().await;
                capture_for_handoff()
            }
            .in_log_context(LogContext::new().record("task", "second")),
        );

        assert_eq!(first.await.unwrap().get("task"), Some("first"));
        assert_eq!(second.await.unwrap().get("task"), Some("second"));
        assert!(capture_for_handoff().is_empty());
    }

    #[tokio::test]
    async fn test_scope_inside_future_survives_await() {
        let snapshot = async {
            let step = open("step", "fetch");
            tokio::task::yield_now().await;
            let during = capture_for_handoff();
            drop(step);
            (during, capture_for_handoff())
        }
        .with_snapshot(&[("request_id", "req-3")].into_iter().collect())
        .await;

        assert_eq!(
            snapshot.0.iter().collect::<Vec<_>>(),
            vec![("request_id", "req-3"), ("step", "fetch")]
        );
        assert_eq!(snapshot.1.iter().collect::<Vec<_>>(), vec![("request_id", "req-3")]);
    }

    #[tokio::test]
    async fn test_outer_context_restored_after_poll() {
        let _outer = open("request_id", "outer");
        let inner = async { capture_for_handoff() }
            .in_log_context(LogContext::new().record("request_id", "inner"))
            .await;

        assert_eq!(inner.get("request_id"), Some("inner"));
        assert_eq!(capture_for_handoff().get("request_id"), Some("outer"));
    }

    #[tokio::test]
    async fn test_outer_scope_dropped_inside_future_is_released() {
        let outer = open("request_id", "outer");
        let inside = async move {
            let _step = open("step", "inner");
            drop(outer);
            capture_for_handoff()
        }
        .with_snapshot(&ContextSnapshot::empty())
        .await;

        assert_eq!(inside.iter().collect::<Vec<_>>(), vec![("step", "inner")]);
        assert!(capture_for_handoff().is_empty());
    }
}
