//! Fixed-size worker pool for blocking conversions.
//!
//! Conversions are CPU-bound and may block for seconds, so they never run on
//! the async runtime. Handlers hand a job to [`ConversionPool::submit`] and
//! await a oneshot reply while the runtime keeps serving other requests.
//!
//! ```text
//! handler ──submit──▶ queue (FIFO, unbounded) ──▶ worker 0..N ──▶ oneshot ──▶ handler
//! ```
//!
//! At most `workers` conversions run at once; the rest wait in submission
//! order. A panic inside the backend is caught on the worker and reported
//! as [`ConversionError::WorkerPanicked`]; the worker survives. Dropping the
//! pool lets the workers finish whatever is queued, then joins them.

use crate::converter::{convert_upload, DocumentConverter};
use crate::error::ConversionError;
use crate::output::{ConversionResult, FileKind, UploadedFile};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

type Reply = oneshot::Sender<Result<ConversionResult, ConversionError>>;

struct Job {
    upload: UploadedFile,
    kind: FileKind,
    reply: Reply,
}

struct Shared {
    queue: Mutex<VecDeque<Job>>,
    available: Condvar,
    stop: AtomicBool,
    converter: Arc<dyn DocumentConverter>,
}

impl Shared {
    fn queue(&self) -> MutexGuard<'_, VecDeque<Job>> {
        // Jobs run outside the lock, so a poisoned queue is still consistent.
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-wide pool of conversion threads, shared by all handlers.
pub struct ConversionPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ConversionPool {
    /// Spawn `workers` threads (at least one) named `conversion-worker-N`.
    pub fn new(workers: usize, converter: Arc<dyn DocumentConverter>) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            stop: AtomicBool::new(false),
            converter,
        });

        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(workers.max(1)),
        };
        for id in 0..workers.max(1) {
            let shared = Arc::clone(&pool.shared);
            // On error `pool` drops here, which stops and joins the threads
            // already spawned.
            let handle = thread::Builder::new()
                .name(format!("conversion-worker-{id}"))
                .spawn(move || worker_loop(id, shared))?;
            pool.workers.push(handle);
        }

        info!(workers = pool.workers.len(), "Conversion pool started");
        Ok(pool)
    }

    /// Queue one upload and wait for its result.
    ///
    /// The job is dropped unrun if the caller stops waiting before a worker
    /// picks it up. `PoolClosed` means the job was dropped without a reply.
    pub async fn submit(&self, upload: UploadedFile, kind: FileKind) -> Result<ConversionResult, ConversionError> {
        let (reply, response) = oneshot::channel();
        {
            let mut queue = self.shared.queue();
            queue.push_back(Job { upload, kind, reply });
            debug!(queued = queue.len(), "Conversion job queued");
        }
        self.shared.available.notify_one();

        response.await.unwrap_or(Err(ConversionError::PoolClosed))
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Jobs waiting for a free worker.
    pub fn queued_jobs(&self) -> usize {
        self.shared.queue().len()
    }
}

impl std::fmt::Debug for ConversionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionPool")
            .field("workers", &self.workers.len())
            .field("queued_jobs", &self.queued_jobs())
            .finish()
    }
}

impl Drop for ConversionPool {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.available.notify_all();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("Conversion worker exited abnormally");
            }
        }
        debug!("Conversion pool stopped");
    }
}

fn worker_loop(id: usize, shared: Arc<Shared>) {
    debug!(worker = id, "Conversion worker started");
    loop {
        let job = {
            let mut queue = shared.queue();
            loop {
                if let Some(job) = queue.pop_front() {
                    break job;
                }
                if shared.stop.load(Ordering::Acquire) {
                    debug!(worker = id, "Conversion worker stopping");
                    return;
                }
                queue = shared
                    .available
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        if job.reply.is_closed() {
            debug!(worker = id, filename = %job.upload.filename, "Caller went away, skipping job");
            continue;
        }

        let filename = job.upload.filename.clone();
        debug!(worker = id, filename = %filename, "Conversion job started");
        let converter = shared.converter.as_ref();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            convert_upload(converter, job.upload, job.kind)
        }))
        .unwrap_or_else(|payload| {
            Err(ConversionError::WorkerPanicked {
                filename: filename.clone(),
                detail: panic_message(payload.as_ref()),
            })
        });
        debug!(worker = id, filename = %filename, ok = result.is_ok(), "Conversion job finished");

        // The receiver may have been dropped while the job ran.
        let _ = job.reply.send(result);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ConvertedDocument;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Records the highest number of overlapping conversions.
    #[derive(Default)]
    struct Gauge {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl DocumentConverter for Gauge {
        fn convert(&self, bytes: &[u8], _filename: &str) -> Result<ConvertedDocument, ConversionError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(ConvertedDocument::new(String::from_utf8_lossy(bytes), None))
        }
    }

    struct Panicky;

    impl DocumentConverter for Panicky {
        fn convert(&self, bytes: &[u8], _filename: &str) -> Result<ConvertedDocument, ConversionError> {
            if bytes == b"boom" {
                panic!("decoder exploded");
            }
            Ok(ConvertedDocument::new("fine", None))
        }
    }

    #[test]
    fn zero_workers_still_spawns_one() {
        let pool = ConversionPool::new(0, Arc::new(Panicky)).unwrap();
        assert_eq!(pool.worker_count(), 1);
    }

    #[test]
    fn submit_returns_converted_result() {
        let pool = ConversionPool::new(2, Arc::new(Panicky)).unwrap();
        let result = tokio_test::block_on(pool.submit(UploadedFile::new("a.html", b"<p/>".to_vec()), FileKind::Html))
            .unwrap();
        assert_eq!(result.markdown_content, "fine");
        assert_eq!(result.title, "a.html");
        assert_eq!(result.metadata.file_type, FileKind::Html);
        assert_eq!(pool.queued_jobs(), 0);
    }

    #[test]
    fn panic_becomes_error_and_worker_survives() {
        let pool = ConversionPool::new(1, Arc::new(Panicky)).unwrap();

        let err = tokio_test::block_on(pool.submit(UploadedFile::new("x.pdf", b"boom".to_vec()), FileKind::Binary))
            .unwrap_err();
        match err {
            ConversionError::WorkerPanicked { filename, detail } => {
                assert_eq!(filename, "x.pdf");
                assert!(detail.contains("decoder exploded"), "got: {detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Same single worker still serves the next job.
        let ok = tokio_test::block_on(pool.submit(UploadedFile::new("y.pdf", b"ok".to_vec()), FileKind::Binary));
        assert!(ok.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_is_bounded_by_worker_count() {
        let gauge = Arc::new(Gauge::default());
        let pool = Arc::new(ConversionPool::new(2, gauge.clone()).unwrap());

        let jobs = (0..6).map(|i| {
            let pool = Arc::clone(&pool);
            async move {
                pool.submit(UploadedFile::new(format!("{i}.html"), format!("doc {i}")), FileKind::Html)
                    .await
            }
        });
        let results = futures::future::join_all(jobs).await;

        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap().markdown_content, format!("doc {i}"));
        }
        let peak = gauge.peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "peak concurrency {peak} exceeded pool size");
        assert!(peak >= 1);
    }

    #[test]
    fn stopped_worker_drains_queue_before_exiting() {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            stop: AtomicBool::new(true),
            converter: Arc::new(Panicky),
        });
        let mut replies = Vec::new();
        for name in ["a.pdf", "b.pdf"] {
            let (reply, response) = oneshot::channel();
            shared.queue().push_back(Job {
                upload: UploadedFile::new(name, b"ok".to_vec()),
                kind: FileKind::Binary,
                reply,
            });
            replies.push(response);
        }

        // Returns only once the queue is empty.
        worker_loop(0, Arc::clone(&shared));

        assert!(shared.queue().is_empty());
        for mut response in replies {
            let result = response.try_recv().expect("every queued job gets a reply");
            assert_eq!(result.unwrap().markdown_content, "fine");
        }
    }

    #[test]
    fn panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u32), "unknown panic payload");
    }
}
