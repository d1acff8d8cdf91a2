//! Tests for the handle surface shared by dispatched and queued requests

use std::sync::Arc;

use parking_lot::Mutex;
use prometheus_request_gate::core::{CallbackHandle, RequestHandle, ResultHandle, ResultProxy};

type Handle = CallbackHandle<u32, String>;

fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn() + Send>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let make = move |label: &str| -> Box<dyn Fn() + Send> {
        let sink = Arc::clone(&sink);
        let label = label.to_string();
        Box::new(move || sink.lock().push(label.clone()))
    };
    (log, make)
}

#[test]
fn test_dispatched_handle_forwards_everything() {
    let inner = Handle::new();
    let handle = RequestHandle::Dispatched(inner.clone());
    assert!(!handle.is_queued());
    assert!(handle.proxy().is_none());

    let (log, make) = recorder();
    let (on_done, on_always) = (make("done"), make("always"));
    handle
        .set_request_header("X-Trace", "1")
        .override_mime_type("text/plain")
        .success(move |_| on_done())
        .error(|_| panic!("no failure expected"))
        .complete(move |_| on_always());

    assert_eq!(inner.request_headers(), vec![("X-Trace".to_string(), "1".to_string())]);
    assert_eq!(inner.mime_override().as_deref(), Some("text/plain"));

    inner.set_response_headers([("Content-Type", "text/plain")]);
    inner.resolve(7);
    assert_eq!(*log.lock(), vec!["done", "always"]);
    assert_eq!(
        handle.response_header("content-type").as_deref(),
        Some("text/plain")
    );
    assert!(handle.all_response_headers().is_some());
}

#[test]
fn test_queued_handle_buffers_until_bound() {
    let proxy: ResultProxy<Handle> = ResultProxy::new(1);
    let handle = RequestHandle::Queued(proxy.clone());
    assert!(handle.is_queued());

    let (log, make) = recorder();
    let (on_fail, on_always) = (make("fail"), make("always"));
    handle
        .then(|_| panic!("no success expected"), move |_| on_fail())
        .always(move |_| on_always());
    assert_eq!(proxy.buffered(), 3);
    assert!(handle.response_header("content-type").is_none());

    let inner = Handle::new();
    proxy.bind(inner.clone()).expect("first bind");
    assert!(log.lock().is_empty());

    inner.reject("boom".into());
    assert_eq!(*log.lock(), vec!["fail", "always"]);
}

#[test]
fn test_progress_reaches_handler_through_proxy() {
    let proxy: ResultProxy<Handle> = ResultProxy::new(2);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    proxy.progress(move |loaded, total| sink.lock().push((loaded, total)));

    let inner = Handle::new();
    proxy.bind(inner.clone()).unwrap();
    inner.notify_progress(10, Some(100));
    inner.notify_progress(100, Some(100));
    inner.resolve(1);
    inner.notify_progress(200, Some(100));

    assert_eq!(*seen.lock(), vec![(10, Some(100)), (100, Some(100))]);
}
