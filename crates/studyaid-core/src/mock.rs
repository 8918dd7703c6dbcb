//! Mock backends for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::backend::{BackendError, PdfBackend};
use crate::voice::{SpeechBackend, SpeechError, SpeechFuture};

/// A hand-rolled [`PdfBackend`] returning fixed pages or a fixed error.
pub struct MockPdf {
    result: Result<Vec<String>, String>,
    call_count: AtomicUsize,
}

impl MockPdf {
    /// Return `pages` for every PDF.
    pub fn pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            result: Ok(pages.into_iter().map(Into::into).collect()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Fail every extraction with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `extract_pages()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl PdfBackend for MockPdf {
    fn extract_pages(&self, _data: &[u8]) -> Result<Vec<String>, BackendError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.result
            .clone()
            .map_err(BackendError::ExtractionError)
    }
}

#[derive(Clone, Debug)]
enum MockAudio {
    /// Audio bytes are the UTF-8 bytes of the input text.
    Echo,
    HttpError(u16),
    Error(String),
}

/// A hand-rolled [`SpeechBackend`] that records every call.
pub struct MockSpeech {
    response: MockAudio,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockSpeech {
    pub fn echo() -> Self {
        Self::with_response(MockAudio::Echo)
    }

    pub fn http_error(status: u16) -> Self {
        Self::with_response(MockAudio::HttpError(status))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_response(MockAudio::Error(message.to_string()))
    }

    fn with_response(response: MockAudio) -> Self {
        Self {
            response,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every `(text, lang)` pair passed to `synthesize()`, in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl SpeechBackend for MockSpeech {
    fn name(&self) -> &str {
        "mock"
    }

    fn synthesize<'a>(&'a self, text: &'a str, lang: &'a str) -> SpeechFuture<'a> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), lang.to_string()));
        let response = self.response.clone();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            match response {
                MockAudio::Echo => Ok(text.as_bytes().to_vec()),
                MockAudio::HttpError(status) => Err(SpeechError::Http { status }),
                MockAudio::Error(msg) => Err(SpeechError::Request(msg)),
            }
        })
    }
}
