//! Hash Request Serializer
//!
//! Admission controller for file hashing. Requests are queued FIFO and only
//! one request at a time may be in the *opening* step; once a stream is open
//! it is handed to its own task and streams independently. When the OS
//! reports descriptor exhaustion the head request stays queued and the
//! processing step is retried after a fixed delay, which gives natural
//! backpressure without a concurrency limit constant.

use crate::config::HashingConfig;
use crate::digest::{Algorithm, DigestEngine};
use crate::error::DigestError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::{debug, trace, warn};

/// Byte source handed back by a [`StreamOpener`].
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Opens read streams for hash requests.
///
/// The default [`FsOpener`] opens files with tokio; tests substitute an
/// opener that simulates descriptor exhaustion or permission failures.
#[async_trait]
pub trait StreamOpener: Send + Sync {
    async fn open(&self, path: &Path) -> io::Result<ByteStream>;
}

/// Opens files from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsOpener;

#[async_trait]
impl StreamOpener for FsOpener {
    async fn open(&self, path: &Path) -> io::Result<ByteStream> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Box::pin(file))
    }
}

/// Request-scoped result code delivered to the waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashStatus {
    Ok,
    InvalidAlgorithm,
    AccessDenied,
    /// Retryable; only delivered when a retry cap is configured and exhausted.
    TooManyFilesOpen,
    Other,
}

/// Completion value for one hash request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashOutcome {
    pub status: HashStatus,
    pub digest: Option<String>,
    /// Number of times the request was dequeued for an open attempt.
    pub attempts: u32,
}

impl HashOutcome {
    fn failed(status: HashStatus, attempts: u32) -> Self {
        Self {
            status,
            digest: None,
            attempts,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == HashStatus::Ok && self.digest.is_some()
    }
}

/// Request ID for tracking and rescinding queued requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        RequestId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A queued request to hash one file.
#[derive(Debug, Clone)]
pub struct HashRequest {
    pub id: RequestId,
    pub source: PathBuf,
    /// Algorithm name as supplied by the caller; validated when dequeued.
    pub algorithm: String,
    /// True while the open attempt for this request is in flight.
    pub pending: bool,
    pub dequeue_count: u32,
}

struct QueuedRequest {
    request: HashRequest,
    waiter: oneshot::Sender<HashOutcome>,
}

#[derive(Default)]
struct SerializerState {
    queue: VecDeque<QueuedRequest>,
    active: HashSet<RequestId>,
    /// Re-entrancy guard: only one processing step runs at a time.
    processing: bool,
}

impl SerializerState {
    fn take(&mut self, id: RequestId) -> Option<QueuedRequest> {
        let index = self.queue.iter().position(|q| q.request.id == id)?;
        self.queue.remove(index)
    }

    fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.active.is_empty()
    }
}

/// Tunables for the processing loop.
#[derive(Debug, Clone)]
pub struct SerializerOptions {
    /// Delay before the next processing step while the queue is non-empty.
    pub retry_delay: Duration,
    /// Give up on a request after this many descriptor-exhausted open attempts.
    pub max_open_attempts: Option<u32>,
    pub read_buffer_size: usize,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self::from(&HashingConfig::default())
    }
}

impl From<&HashingConfig> for SerializerOptions {
    fn from(config: &HashingConfig) -> Self {
        Self {
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            max_open_attempts: config.max_open_attempts,
            read_buffer_size: config.read_buffer_size,
        }
    }
}

struct Inner {
    state: Mutex<SerializerState>,
    opener: Arc<dyn StreamOpener>,
    options: SerializerOptions,
}

/// Handle to the admission controller.
///
/// Cheap to clone; all clones share one queue. File nodes receive a handle at
/// construction time rather than reaching for global state.
#[derive(Clone)]
pub struct HashSerializer {
    inner: Arc<Inner>,
}

/// Waiter side of a submitted request.
#[derive(Debug)]
pub struct HashTicket {
    id: RequestId,
    receiver: oneshot::Receiver<HashOutcome>,
}

impl HashTicket {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Wait for the request to finish. A rescinded request resolves `Other`.
    pub async fn wait(self) -> HashOutcome {
        self.receiver
            .await
            .unwrap_or_else(|_| HashOutcome::failed(HashStatus::Other, 0))
    }
}

enum OpenStep {
    InvalidAlgorithm,
    Opened(ByteStream, Algorithm),
    Exhausted,
    Denied(io::Error),
    Failed(io::Error),
}

impl HashSerializer {
    /// Serializer over the local filesystem with default options.
    pub fn new() -> Self {
        Self::with_opener(Arc::new(FsOpener), SerializerOptions::default())
    }

    pub fn with_opener(opener: Arc<dyn StreamOpener>, options: SerializerOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SerializerState::default()),
                opener,
                options,
            }),
        }
    }

    /// Serializer configured from validated hashing settings.
    ///
    /// Rejected settings are a configuration error; the controller itself
    /// is an ordinary value and can always be constructed.
    pub fn from_config(config: &HashingConfig) -> Result<Self, DigestError> {
        config
            .validate()
            .map_err(|e| DigestError::Config(format!("hash serializer: {}", e)))?;
        Ok(Self::with_opener(
            Arc::new(FsOpener),
            SerializerOptions::from(config),
        ))
    }

    /// Process-wide default instance, created on first use.
    pub fn shared() -> HashSerializer {
        static SHARED: OnceLock<HashSerializer> = OnceLock::new();
        SHARED.get_or_init(HashSerializer::new).clone()
    }

    pub fn options(&self) -> &SerializerOptions {
        &self.inner.options
    }

    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn active_len(&self) -> usize {
        self.inner.state.lock().active.len()
    }

    pub fn is_idle(&self) -> bool {
        self.inner.state.lock().is_idle()
    }

    /// Queue a request to hash `source` and trigger a processing step.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, source: impl Into<PathBuf>, algorithm: impl Into<String>) -> HashTicket {
        let (tx, rx) = oneshot::channel();
        let request = HashRequest {
            id: RequestId::next(),
            source: source.into(),
            algorithm: algorithm.into(),
            pending: false,
            dequeue_count: 0,
        };
        let id = request.id;

        let queue_size = {
            let mut state = self.inner.state.lock();
            debug!(
                request_id = id.as_u64(),
                source = %request.source.display(),
                algorithm = %request.algorithm,
                "Queued hash request"
            );
            state.queue.push_back(QueuedRequest {
                request,
                waiter: tx,
            });
            state.queue.len()
        };
        trace!(queue_size, "Hash queue grew");

        self.schedule(Duration::ZERO);
        HashTicket { id, receiver: rx }
    }

    /// Withdraw a request that has not begun opening.
    ///
    /// Returns false if the request is unknown, is mid-open, or is already
    /// streaming.
    pub fn rescind(&self, id: RequestId) -> bool {
        let mut state = self.inner.state.lock();
        let Some(index) = state
            .queue
            .iter()
            .position(|q| q.request.id == id && !q.request.pending)
        else {
            return false;
        };
        state.queue.remove(index);
        debug!(request_id = id.as_u64(), "Rescinded hash request");
        if state.is_idle() {
            debug!("Hash serializer idle");
        }
        true
    }

    fn schedule(&self, delay: Duration) {
        let serializer = self.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            serializer.process_step().await;
        });
    }

    /// One processing step: attempt to open the head of the queue.
    async fn process_step(&self) {
        let (id, source, algorithm_name, attempts) = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            if state.processing {
                return;
            }
            let Some(head) = state.queue.front_mut() else {
                return;
            };
            state.processing = true;
            head.request.dequeue_count += 1;
            head.request.pending = true;
            (
                head.request.id,
                head.request.source.clone(),
                head.request.algorithm.clone(),
                head.request.dequeue_count,
            )
        };

        let step = match algorithm_name.parse::<Algorithm>() {
            Err(_) => OpenStep::InvalidAlgorithm,
            Ok(algorithm) => match self.inner.opener.open(&source).await {
                Ok(stream) => OpenStep::Opened(stream, algorithm),
                Err(e) if is_descriptor_exhaustion(&e) => OpenStep::Exhausted,
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => OpenStep::Denied(e),
                Err(e) => OpenStep::Failed(e),
            },
        };

        let mut state = self.inner.state.lock();
        match step {
            OpenStep::InvalidAlgorithm => {
                warn!(
                    request_id = id.as_u64(),
                    algorithm = %algorithm_name,
                    "Unrecognised hash algorithm"
                );
                Self::resolve(
                    &mut state,
                    id,
                    HashOutcome::failed(HashStatus::InvalidAlgorithm, attempts),
                );
            }
            OpenStep::Opened(stream, algorithm) => {
                if let Some(queued) = state.take(id) {
                    state.active.insert(id);
                    trace!(request_id = id.as_u64(), attempts, "Opened stream");
                    self.spawn_stream(queued, stream, algorithm);
                }
            }
            OpenStep::Exhausted => {
                let capped = self
                    .inner
                    .options
                    .max_open_attempts
                    .is_some_and(|cap| attempts >= cap);
                if capped {
                    warn!(
                        request_id = id.as_u64(),
                        source = %source.display(),
                        attempts,
                        "Giving up after repeated descriptor exhaustion"
                    );
                    Self::resolve(
                        &mut state,
                        id,
                        HashOutcome::failed(HashStatus::TooManyFilesOpen, attempts),
                    );
                } else if let Some(head) = state.queue.iter_mut().find(|q| q.request.id == id) {
                    head.request.pending = false;
                    debug!(
                        request_id = id.as_u64(),
                        attempts,
                        "Too many open files, will retry"
                    );
                }
            }
            OpenStep::Denied(e) => {
                warn!(source = %source.display(), error = %e, "Access denied opening file");
                Self::resolve(
                    &mut state,
                    id,
                    HashOutcome::failed(HashStatus::AccessDenied, attempts),
                );
            }
            OpenStep::Failed(e) => {
                warn!(source = %source.display(), error = %e, "Failed to open file for hashing");
                Self::resolve(&mut state, id, HashOutcome::failed(HashStatus::Other, attempts));
            }
        }

        state.processing = false;
        let more = !state.queue.is_empty();
        if state.is_idle() {
            debug!("Hash serializer idle");
        }
        drop(state);

        if more {
            self.schedule(self.inner.options.retry_delay);
        }
    }

    fn resolve(state: &mut SerializerState, id: RequestId, outcome: HashOutcome) {
        if let Some(queued) = state.take(id) {
            let _ = queued.waiter.send(outcome);
        }
    }

    fn spawn_stream(&self, queued: QueuedRequest, stream: ByteStream, algorithm: Algorithm) {
        let serializer = self.clone();
        let buffer_size = self.inner.options.read_buffer_size;
        tokio::spawn(async move {
            let QueuedRequest { request, waiter } = queued;
            let outcome = match stream_digest(stream, algorithm, buffer_size).await {
                Ok(digest) => {
                    debug!(
                        source = %request.source.display(),
                        algorithm = %algorithm,
                        digest = %digest,
                        "Hashed file"
                    );
                    HashOutcome {
                        status: HashStatus::Ok,
                        digest: Some(digest),
                        attempts: request.dequeue_count,
                    }
                }
                Err(e) => {
                    warn!(
                        source = %request.source.display(),
                        error = %e,
                        "Stream failed while hashing"
                    );
                    HashOutcome::failed(HashStatus::Other, request.dequeue_count)
                }
            };
            let _ = waiter.send(outcome);

            let mut state = serializer.inner.state.lock();
            state.active.remove(&request.id);
            if state.is_idle() {
                debug!("Hash serializer idle");
            }
        });
    }
}

impl Default for HashSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HashSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("HashSerializer")
            .field("pending", &state.queue.len())
            .field("active", &state.active.len())
            .field("options", &self.inner.options)
            .finish()
    }
}

async fn stream_digest(
    mut stream: ByteStream,
    algorithm: Algorithm,
    buffer_size: usize,
) -> io::Result<String> {
    let mut engine = DigestEngine::new(algorithm);
    let mut buffer = vec![0u8; buffer_size.max(1)];
    loop {
        let read = stream.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        engine.update(&buffer[..read]);
    }
    Ok(engine.finalize_hex())
}

#[cfg(windows)]
const ERROR_TOO_MANY_OPEN_FILES: i32 = 4;

#[cfg(unix)]
const EXHAUSTION_CODES: &[i32] = &[libc::EMFILE, libc::ENFILE];
#[cfg(windows)]
const EXHAUSTION_CODES: &[i32] = &[ERROR_TOO_MANY_OPEN_FILES];
#[cfg(not(any(unix, windows)))]
const EXHAUSTION_CODES: &[i32] = &[];

/// EMFILE / ENFILE class errors.
fn is_descriptor_exhaustion(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(code) if EXHAUSTION_CODES.contains(&code))
}
