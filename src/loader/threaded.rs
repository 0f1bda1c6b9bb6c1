//! Threaded remote loader for `file://` image URLs.
//!
//! - Bounded worker pool decodes off the control thread
//! - Results come back over a flume channel and are applied by [`ThreadedLoader::pump`]
//! - Recently decoded bitmaps are kept in a small LRU shared with the workers
//! - Cancellation is a shared flag checked by workers and again when delivering

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, Sender};
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};
use url::Url;

use super::cancel::{CancelFlag, CancelHandle};
use super::remote::{LoadCallback, RemoteLoader};
use crate::config::MAX_LOADER_WORKERS;
use crate::error::LightboxError;
use crate::image_loader;
use crate::models::Bitmap;
use crate::surface::SurfaceHandle;

/// Maximum number of queued decode requests.
const MAX_QUEUE_SIZE: usize = 64;

/// Number of decoded bitmaps kept for repeat loads.
const DEFAULT_CACHE_ENTRIES: usize = 16;

/// How long an idle worker waits before re-checking for shutdown.
const WORKER_POLL_MS: u64 = 100;

struct DecodeRequest {
    id: u64,
    url: Url,
    cancel: CancelFlag,
}

enum Outcome {
    Decoded(Bitmap),
    Failed(LightboxError),
    /// Cancelled before the worker started on it.
    Skipped,
}

struct LoadResult {
    id: u64,
    outcome: Outcome,
}

/// Control-thread half of a load: where to put the bitmap and whom to tell.
struct PendingLoad {
    target: SurfaceHandle,
    on_complete: LoadCallback,
    cancel: CancelFlag,
}

pub struct ThreadedLoader {
    /// Sender for new decode requests.
    request_tx: Sender<DecodeRequest>,
    /// Sender for failures reported without reaching a worker.
    result_tx: Sender<LoadResult>,
    /// Receiver for finished loads (control thread reads this in `pump`).
    result_rx: Receiver<LoadResult>,
    /// Worker thread handles.
    workers: Vec<JoinHandle<()>>,
    /// Flag to signal workers to stop.
    shutdown: Arc<AtomicBool>,
    /// Decoded bitmaps shared with workers, keyed by URL.
    cache: Arc<Mutex<LruCache<Url, Bitmap>>>,
    /// Loads waiting for delivery, keyed by request id.
    pending: RefCell<HashMap<u64, PendingLoad>>,
    /// Last request id handed out.
    next_id: Cell<u64>,
}

impl ThreadedLoader {
    pub fn new(workers: usize) -> Self {
        Self::with_cache_entries(workers, DEFAULT_CACHE_ENTRIES)
    }

    pub fn with_cache_entries(workers: usize, cache_entries: usize) -> Self {
        let num_workers = workers.clamp(1, MAX_LOADER_WORKERS);
        let capacity = NonZeroUsize::new(cache_entries).unwrap_or(NonZeroUsize::MIN);

        let (request_tx, request_rx) = flume::bounded(MAX_QUEUE_SIZE);
        let (result_tx, result_rx) = flume::unbounded();

        let shutdown = Arc::new(AtomicBool::new(false));
        let cache = Arc::new(Mutex::new(LruCache::new(capacity)));

        let mut handles = Vec::with_capacity(num_workers);
        for worker_id in 0..num_workers {
            let ctx = WorkerContext {
                worker_id,
                rx: request_rx.clone(),
                tx: result_tx.clone(),
                shutdown: Arc::clone(&shutdown),
                cache: Arc::clone(&cache),
            };

            match thread::Builder::new()
                .name(format!("lightbox-decode-{}", worker_id))
                .spawn(move || worker_loop(ctx))
            {
                Ok(handle) => handles.push(handle),
                Err(e) => error!(worker_id, error = ?e, "Failed to spawn decode worker"),
            }
        }

        debug!(num_workers = handles.len(), "Started image loader");

        Self {
            request_tx,
            result_tx,
            result_rx,
            workers: handles,
            shutdown,
            cache,
            pending: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        }
    }

    /// Apply every finished load on the calling thread. Returns how many
    /// completions were delivered.
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        while let Ok(result) = self.result_rx.try_recv() {
            if self.deliver(result) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Wait up to `timeout` for one result, then drain the rest.
    pub fn pump_timeout(&self, timeout: Duration) -> usize {
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => usize::from(self.deliver(result)) + self.pump(),
            Err(_) => 0,
        }
    }

    fn deliver(&self, result: LoadResult) -> bool {
        // Release the borrow before running the callback; it may start another load.
        let Some(pending) = self.pending.borrow_mut().remove(&result.id) else {
            trace!(id = result.id, "Result for unknown load");
            return false;
        };

        if pending.cancel.is_cancelled() {
            trace!(id = result.id, "Dropping cancelled load");
            return false;
        }

        match result.outcome {
            Outcome::Decoded(bitmap) => {
                pending.target.borrow_mut().set_image(Some(bitmap.clone()));
                (pending.on_complete)(Some(bitmap));
            }
            Outcome::Failed(e) => {
                warn!(id = result.id, error = %e, "Image load failed");
                (pending.on_complete)(None);
            }
            Outcome::Skipped => {
                trace!(id = result.id, "Load skipped");
                return false;
            }
        }
        true
    }

    /// Number of loads waiting for delivery.
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn cached(&self, url: &Url) -> bool {
        self.cache.lock().contains(url)
    }

    /// Stop the workers. Loads still pending are never completed.
    pub fn shutdown(&mut self) {
        debug!("Shutting down image loader");
        self.shutdown.store(true, Ordering::SeqCst);
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        self.pending.borrow_mut().clear();
        debug!("Image loader shutdown complete");
    }

    fn fail(&self, id: u64, error: LightboxError) {
        // result_rx lives on self, so this send cannot hit a closed channel.
        let _ = self.result_tx.send(LoadResult {
            id,
            outcome: Outcome::Failed(error),
        });
    }
}

impl RemoteLoader for ThreadedLoader {
    fn load(&self, target: &SurfaceHandle, url: &Url, on_complete: LoadCallback) -> CancelHandle {
        let id = self.next_id.get().wrapping_add(1);
        self.next_id.set(id);

        let cancel = CancelFlag::new();
        self.pending.borrow_mut().insert(
            id,
            PendingLoad {
                target: target.clone(),
                on_complete,
                cancel: cancel.clone(),
            },
        );

        if self.shutdown.load(Ordering::Relaxed) {
            self.fail(id, LightboxError::LoaderShutdown);
            return cancel.handle();
        }

        if url.scheme() != "file" {
            self.fail(id, LightboxError::UnsupportedScheme(url.scheme().to_string()));
            return cancel.handle();
        }

        let request = DecodeRequest {
            id,
            url: url.clone(),
            cancel: cancel.clone(),
        };

        match self.request_tx.try_send(request) {
            Ok(()) => trace!(id, %url, "Queued image load"),
            Err(flume::TrySendError::Full(req)) => {
                warn!(%url, "Image loader queue full, failing load");
                self.fail(req.id, LightboxError::QueueFull);
            }
            Err(flume::TrySendError::Disconnected(req)) => {
                error!("Image loader queue disconnected");
                self.fail(req.id, LightboxError::LoaderShutdown);
            }
        }

        cancel.handle()
    }
}

impl Drop for ThreadedLoader {
    fn drop(&mut self) {
        if !self.shutdown.load(Ordering::Relaxed) {
            self.shutdown();
        }
    }
}

struct WorkerContext {
    worker_id: usize,
    rx: Receiver<DecodeRequest>,
    tx: Sender<LoadResult>,
    shutdown: Arc<AtomicBool>,
    cache: Arc<Mutex<LruCache<Url, Bitmap>>>,
}

fn worker_loop(ctx: WorkerContext) {
    let worker_id = ctx.worker_id;
    debug!(worker_id, "Decode worker started");

    loop {
        if ctx.shutdown.load(Ordering::Relaxed) {
            break;
        }

        match ctx.rx.recv_timeout(Duration::from_millis(WORKER_POLL_MS)) {
            Ok(req) => {
                let outcome = if req.cancel.is_cancelled() {
                    Outcome::Skipped
                } else {
                    decode_request(&req, &ctx.cache)
                };

                if let Err(e) = ctx.tx.send(LoadResult { id: req.id, outcome }) {
                    warn!(worker_id, error = ?e, "Failed to send load result");
                }
            }
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!(worker_id, "Decode worker stopped");
}

fn decode_request(req: &DecodeRequest, cache: &Mutex<LruCache<Url, Bitmap>>) -> Outcome {
    if let Some(bitmap) = cache.lock().get(&req.url) {
        trace!(url = %req.url, "Bitmap cache hit");
        return Outcome::Decoded(bitmap.clone());
    }

    let decoded = image_loader::path_for_url(&req.url).and_then(|path| image_loader::load_bitmap(&path));
    match decoded {
        Ok(bitmap) => {
            cache.lock().put(req.url.clone(), bitmap.clone());
            Outcome::Decoded(bitmap)
        }
        Err(e) => Outcome::Failed(e),
    }
}
