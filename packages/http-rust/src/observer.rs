//! Request lifecycle observers.
//!
//! [`HttpObserver`] receives the four lifecycle events of an
//! [`HttpOperator`](crate::HttpOperator) invocation, and
//! [`CompositeHttpObserver`] fans each event out to every registered observer.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::HttpError;
use crate::transport::{HttpRequest, HttpResponse};

/// Observer for the lifecycle of a single pipeline invocation.
///
/// Every method defaults to a no-op, so implementations only override the
/// events they care about. Called synchronously before `perform` returns.
///
/// Used as `Arc<dyn HttpObserver<A>>`.
pub trait HttpObserver<A>: Send + Sync {
    /// Called once the request descriptor has been built, before dispatch.
    fn on_request_created(&self, _arg: &A, _request: &HttpRequest) {}

    /// Called when the transport fails (network error or deadline abort).
    fn on_request_error(&self, _arg: &A, _request: &HttpRequest, _error: &HttpError) {}

    /// Called when a response with a status in `[200, 300)` arrives.
    fn on_response_received(&self, _arg: &A, _response: &HttpResponse) {}

    /// Called when a response arrives with any other status.
    fn on_response_error(&self, _arg: &A, _response: &HttpResponse, _error: &HttpError) {}
}

/// Composite observer that fans out to multiple observers in registration order.
pub struct CompositeHttpObserver<A> {
    observers: RwLock<Vec<Arc<dyn HttpObserver<A>>>>,
}

impl<A> Default for CompositeHttpObserver<A> {
    fn default() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
        }
    }
}

impl<A> CompositeHttpObserver<A> {
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn HttpObserver<A>>>) -> Self {
        Self {
            observers: RwLock::new(observers),
        }
    }

    /// Adds an observer after construction.
    pub fn add(&self, observer: Arc<dyn HttpObserver<A>>) {
        self.observers.write().push(observer);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<dyn HttpObserver<A>>> {
        self.observers.read().clone()
    }
}

impl<A> HttpObserver<A> for CompositeHttpObserver<A> {
    fn on_request_created(&self, arg: &A, request: &HttpRequest) {
        for observer in self.snapshot() {
            observer.on_request_created(arg, request);
        }
    }

    fn on_request_error(&self, arg: &A, request: &HttpRequest, error: &HttpError) {
        for observer in self.snapshot() {
            observer.on_request_error(arg, request, error);
        }
    }

    fn on_response_received(&self, arg: &A, response: &HttpResponse) {
        for observer in self.snapshot() {
            observer.on_response_received(arg, response);
        }
    }

    fn on_response_error(&self, arg: &A, response: &HttpResponse, error: &HttpError) {
        for observer in self.snapshot() {
            observer.on_response_error(arg, response, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use parking_lot::Mutex;

    use super::*;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl HttpObserver<u32> for Recorder {
        fn on_response_received(&self, arg: &u32, response: &HttpResponse) {
            self.log
                .lock()
                .push(format!("{}:{arg}:{}", self.label, response.status.as_u16()));
        }
    }

    /// Observer that registers another observer while handling an event.
    struct Reentrant {
        composite: Arc<CompositeHttpObserver<u32>>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl HttpObserver<u32> for Reentrant {
        fn on_response_received(&self, _arg: &u32, _response: &HttpResponse) {
            self.composite.add(Arc::new(Recorder {
                label: "late",
                log: Arc::clone(&self.log),
            }));
        }
    }

    #[test]
    fn delivers_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let composite = CompositeHttpObserver::<u32>::new(vec![Arc::new(Recorder {
            label: "first",
            log: Arc::clone(&log),
        })]);
        composite.add(Arc::new(Recorder {
            label: "second",
            log: Arc::clone(&log),
        }));

        composite.on_response_received(&7, &HttpResponse::new(StatusCode::OK, ""));
        assert_eq!(*log.lock(), ["first:7:200", "second:7:200"]);
    }

    #[test]
    fn unhandled_events_are_ignored() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let composite = CompositeHttpObserver::<u32>::new(vec![Arc::new(Recorder {
            label: "only",
            log: Arc::clone(&log),
        })]);
        let response = HttpResponse::new(StatusCode::NOT_FOUND, "");
        composite.on_response_error(&1, &response, &HttpError::Status { status: 404 });
        assert!(log.lock().is_empty());
    }

    #[test]
    fn observers_added_during_delivery_see_later_events_only() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let composite = Arc::new(CompositeHttpObserver::<u32>::default());
        composite.add(Arc::new(Reentrant {
            composite: Arc::clone(&composite),
            log: Arc::clone(&log),
        }));
        let response = HttpResponse::new(StatusCode::OK, "");

        composite.on_response_received(&1, &response);
        assert!(log.lock().is_empty());
        assert_eq!(composite.len(), 2);

        composite.on_response_received(&2, &response);
        assert_eq!(*log.lock(), ["late:2:200"]);
    }
}
