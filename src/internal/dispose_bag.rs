//! Internal disposal bag for managing teardown hooks.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future type for disposal operations.
pub(crate) type BoxFutureUnit = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Container for disposal hooks with LIFO execution order.
///
/// Async hooks run first (in reverse order), then sync hooks (in reverse
/// order). Every hook is isolated: a panicking disposer is reported and
/// skipped so the remaining hooks still run and resources are not leaked
/// under partial failure.
#[derive(Default)]
pub(crate) struct DisposeBag {
    sync: Vec<Box<dyn FnOnce() + Send>>,
    asyncs: Vec<Box<dyn FnOnce() -> BoxFutureUnit + Send>>,
}

impl DisposeBag {
    /// Add a synchronous disposal hook.
    pub(crate) fn push_sync(&mut self, f: Box<dyn FnOnce() + Send>) {
        self.sync.push(f);
    }

    /// Add an asynchronous disposal hook.
    pub(crate) fn push_async<Fut, F>(&mut self, f: F)
    where
        Fut: Future<Output = ()> + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
    {
        self.asyncs.push(Box::new(move || Box::pin(f())));
    }

    /// Execute all sync hooks in reverse order (LIFO), isolating each.
    pub(crate) fn run_all_sync_reverse(&mut self) {
        while let Some(f) = self.sync.pop() {
            if catch_unwind(AssertUnwindSafe(f)).is_err() {
                eprintln!("[graft-di] disposal hook panicked; continuing teardown");
            }
        }
    }

    /// Execute all async hooks in reverse order (LIFO), isolating each.
    pub(crate) async fn run_all_async_reverse(&mut self) {
        while let Some(f) = self.asyncs.pop() {
            match catch_unwind(AssertUnwindSafe(f)) {
                Ok(fut) => Isolated(fut).await,
                Err(_) => {
                    eprintln!("[graft-di] disposal hook panicked; continuing teardown");
                }
            }
        }
    }

    /// Whether any disposers are registered.
    pub(crate) fn is_empty(&self) -> bool {
        self.sync.is_empty() && self.asyncs.is_empty()
    }

    /// Whether any async disposers are registered.
    pub(crate) fn has_async(&self) -> bool {
        !self.asyncs.is_empty()
    }
}

/// Awaits a boxed disposal future, swallowing a panic from any poll.
struct Isolated(BoxFutureUnit);

impl Future for Isolated {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        match catch_unwind(AssertUnwindSafe(|| self.0.as_mut().poll(cx))) {
            Ok(poll) => poll,
            Err(_) => {
                eprintln!("[graft-di] disposal hook panicked; continuing teardown");
                Poll::Ready(())
            }
        }
    }
}
