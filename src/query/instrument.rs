//! Wrapping an async data-access call with lifecycle hooks.
//!
//! `instrument_call` fires `on_start` before the call and exactly one of
//! `on_success` / `on_error` after it. A panicking call is caught at the poll
//! boundary, recorded as `Panicked`, then resumed. If the future is dropped
//! before it resolves (timeout, task abort) a drop guard fires `on_error`, so
//! the call is never lost from the accounting.

use std::any::Any;
use std::borrow::Cow;
use std::future::Future;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::task::Poll;
use tracing::Instrument as _;

use crate::query::context::{QueryCall, QueryCallContext};
use crate::query::observer::{QueryInterceptor, QueryObserver};

/// Error type recorded when the call future is dropped unfinished.
pub const CANCELLED_ERROR_TYPE: &str = "Cancelled";
/// Error type recorded when the call panicked.
pub const PANICKED_ERROR_TYPE: &str = "Panicked";

/// Classification of a call error into an `error_type` label.
///
/// The default is the unqualified type name; enums usually override it to
/// report the variant.
pub trait ErrorType {
    fn error_type(&self) -> Cow<'static, str> {
        Cow::Borrowed(short_type_name(std::any::type_name::<Self>()))
    }
}

impl ErrorType for std::io::Error {
    fn error_type(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{:?}", self.kind()))
    }
}

impl ErrorType for redis::RedisError {
    fn error_type(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{:?}", self.kind()))
    }
}

/// `alloc::string::String` → `String`, `Vec<u8>` generics stripped.
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

struct InFlight<'a, I: QueryInterceptor + ?Sized> {
    interceptor: &'a I,
    ctx: Option<QueryCallContext>,
}

impl<I: QueryInterceptor + ?Sized> InFlight<'_, I> {
    fn finish(mut self) -> Option<QueryCallContext> {
        self.ctx.take()
    }
}

impl<I: QueryInterceptor + ?Sized> Drop for InFlight<'_, I> {
    fn drop(&mut self) {
        // A second panic from the interceptor while unwinding would abort the
        // process, so an unwinding drop records nothing.
        if std::thread::panicking() {
            return;
        }
        if let Some(ctx) = self.ctx.take() {
            self.interceptor.on_error(ctx, CANCELLED_ERROR_TYPE);
        }
    }
}

/// Run `call_fn` between the interceptor's hooks and return its result unchanged.
pub async fn instrument_call<I, F, Fut, T, E>(interceptor: &I, call: QueryCall, call_fn: F) -> Result<T, E>
where
    I: QueryInterceptor + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: ErrorType,
{
    let ctx = interceptor.on_start(call);
    let span = tracing::debug_span!("db.query", operation = %ctx.operation());
    let guard = InFlight {
        interceptor,
        ctx: Some(ctx),
    };

    let outcome = match catch_unwind(AssertUnwindSafe(call_fn)) {
        Ok(fut) => catch_poll_panic(fut.instrument(span.clone())).await,
        Err(payload) => Err(payload),
    };

    let Some(ctx) = guard.finish() else {
        return match outcome {
            Ok(result) => result,
            Err(payload) => resume_unwind(payload),
        };
    };
    match outcome {
        Ok(result) => {
            match &result {
                Ok(_) => interceptor.on_success(ctx),
                Err(e) => {
                    let error_type = e.error_type();
                    span.in_scope(|| tracing::debug!(error_type = %error_type, "Query returned an error"));
                    interceptor.on_error(ctx, &error_type);
                }
            }
            result
        }
        Err(payload) => {
            span.in_scope(|| tracing::debug!("Query panicked"));
            interceptor.on_error(ctx, PANICKED_ERROR_TYPE);
            resume_unwind(payload)
        }
    }
}

/// Poll `fut` to completion, turning a panic in any poll into `Err(payload)`.
async fn catch_poll_panic<Fut: Future>(fut: Fut) -> Result<Fut::Output, Box<dyn Any + Send>> {
    let mut fut = Box::pin(fut);
    std::future::poll_fn(|cx| match catch_unwind(AssertUnwindSafe(|| fut.as_mut().poll(cx))) {
        Ok(Poll::Ready(output)) => Poll::Ready(Ok(output)),
        Ok(Poll::Pending) => Poll::Pending,
        Err(payload) => Poll::Ready(Err(payload)),
    })
    .await
}

impl QueryObserver {
    /// Convenience wrapper over [`instrument_call`] with this observer.
    pub async fn instrument<F, Fut, T, E>(&self, call: QueryCall, call_fn: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ErrorType,
    {
        instrument_call(self, call, call_fn).await
    }
}
