//! Hermetic `HttpSend` and `FileRead` doubles for unit tests.

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use loadreport_core::{Error, FileRead, HttpSend, Result};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Handler = dyn Fn(&Request<Bytes>) -> Result<Response<Bytes>> + Send + Sync;

/// Answers every request through a handler and records what was sent.
#[derive(Clone)]
pub struct MockHttpSend {
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<Request<Bytes>>>>,
}

impl Debug for MockHttpSend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpSend").finish_non_exhaustive()
    }
}

impl MockHttpSend {
    pub fn new(
        handler: impl Fn(&Request<Bytes>) -> Result<Response<Bytes>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Arc::new(handler),
            requests: Arc::default(),
        }
    }

    /// Reply to requests in order; the last reply repeats.
    pub fn sequence(replies: Vec<(StatusCode, &'static str)>) -> Self {
        let replies = Arc::new(Mutex::new(replies));
        Self::new(move |_| {
            let mut replies = replies.lock().expect("lock poisoned");
            let (status, body) = if replies.len() > 1 {
                replies.remove(0)
            } else {
                replies[0]
            };
            Ok(response(status, body))
        })
    }

    pub fn requests(&self) -> Vec<Request<Bytes>> {
        self.requests.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: Request<Bytes>) -> Result<Response<Bytes>> {
        let resp = (self.handler)(&req);
        self.requests.lock().expect("lock poisoned").push(req);
        resp
    }
}

/// Never answers within any sane timeout.
#[derive(Debug, Default)]
pub struct HangingHttpSend;

#[async_trait]
impl HttpSend for HangingHttpSend {
    async fn http_send(&self, _: Request<Bytes>) -> Result<Response<Bytes>> {
        tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
        Err(Error::unexpected("hanging request finished"))
    }
}

/// In-memory file system.
#[derive(Debug, Default, Clone)]
pub struct MemoryFileRead {
    pub files: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl FileRead for MemoryFileRead {
    async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::unexpected(format!("file {path} not found")))
    }
}

pub fn response(status: StatusCode, body: &str) -> Response<Bytes> {
    Response::builder()
        .status(status)
        .body(Bytes::from(body.to_string()))
        .expect("response must be valid")
}
