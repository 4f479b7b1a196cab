//! Background page fetching.
//!
//! A dedicated worker thread owns a single-threaded tokio runtime and the
//! [`PageSource`].  The UI thread submits [`PageRequest`]s and drains
//! [`FetchMsg`]s on every tick; the loader state itself never leaves the UI
//! thread.
//!
//! Requests run one after another.  The loader never has more than one
//! outstanding, so there is nothing to gain from running them concurrently.

use std::sync::mpsc;
use std::thread;

use crate::loader::PageRequest;
use crate::source::{FetchError, Page, PageSource};

/// Messages sent from the fetch worker to the UI thread.
#[derive(Debug)]
pub enum FetchMsg {
    /// Request `id` finished, successfully or not.
    Completed {
        id: u64,
        result: Result<Page, FetchError>,
    },
}

/// UI-side end of the fetch worker.
pub struct FetchHandle {
    requests: mpsc::Sender<PageRequest>,
    completions: mpsc::Receiver<FetchMsg>,
}

impl FetchHandle {
    /// Queue a request.  Fails with [`FetchError::WorkerGone`] if the worker
    /// thread has exited.
    pub fn submit(&self, request: PageRequest) -> Result<(), FetchError> {
        self.requests
            .send(request)
            .map_err(|_| FetchError::WorkerGone)
    }

    /// Next finished request, without blocking.
    pub fn try_recv(&self) -> Option<FetchMsg> {
        self.completions.try_recv().ok()
    }

    /// A handle whose worker has already exited.
    #[cfg(test)]
    pub fn disconnected() -> Self {
        let (requests, _) = mpsc::channel();
        let (_, completions) = mpsc::channel();
        Self {
            requests,
            completions,
        }
    }

    #[cfg(test)]
    fn recv_timeout(&self, timeout: std::time::Duration) -> Option<FetchMsg> {
        self.completions.recv_timeout(timeout).ok()
    }
}

/// Reports a request's outcome exactly once.
///
/// If the fetch unwinds before [`finish`](Self::finish) is called, dropping
/// the guard reports [`FetchError::WorkerGone`] so the loader still leaves
/// its loading state.
struct CompletionGuard<'a> {
    id: u64,
    tx: &'a mpsc::Sender<FetchMsg>,
    done: bool,
}

impl<'a> CompletionGuard<'a> {
    fn new(id: u64, tx: &'a mpsc::Sender<FetchMsg>) -> Self {
        Self { id, tx, done: false }
    }

    /// Send the result.  Returns `false` when the UI side is gone.
    fn finish(mut self, result: Result<Page, FetchError>) -> bool {
        self.done = true;
        self.tx
            .send(FetchMsg::Completed {
                id: self.id,
                result,
            })
            .is_ok()
    }
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            tracing::error!(request = self.id, "fetch aborted without a result");
            let _ = self.tx.send(FetchMsg::Completed {
                id: self.id,
                result: Err(FetchError::WorkerGone),
            });
        }
    }
}

/// Spawn the fetch worker for `source`.
///
/// The thread runs until the [`FetchHandle`] is dropped.  A result that
/// arrives after that is discarded, so a closed view is never updated.
pub fn spawn(source: Box<dyn PageSource>) -> std::io::Result<FetchHandle> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (req_tx, req_rx) = mpsc::channel::<PageRequest>();
    let (msg_tx, msg_rx) = mpsc::channel();
    let thread_name = format!("fetch-{}", source.name());

    thread::Builder::new()
        .name(thread_name)
        .spawn(move || {
            while let Ok(request) = req_rx.recv() {
                let guard = CompletionGuard::new(request.id, &msg_tx);
                let result = runtime.block_on(source.fetch_page(&request.url));
                if let Err(e) = &result {
                    tracing::debug!(request = request.id, error = %e, "fetch returned an error");
                }
                // If the receiver is gone the UI has exited; stop fetching.
                if !guard.finish(result) {
                    return;
                }
            }
        })?;

    Ok(FetchHandle {
        requests: req_tx,
        completions: msg_rx,
    })
}
