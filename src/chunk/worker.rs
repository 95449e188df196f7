//! Background chunk requests.
//!
//! Each request runs on its own thread against a shared [`ChunkCache`] and streams
//! progress back over a channel, so an interactive loop can poll without blocking.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use tracing::{error, trace};

use crate::error::GenerationError;

use super::cache::ChunkCache;
use super::generator::{ChunkGenerator, ChunkSource};
use super::types::{Chunk, ChunkCoord};

/// Phase shown before the first progress event arrives
pub const QUEUED_PHASE: &str = "Queued";

/// Observable state of a request
#[derive(Clone, Debug)]
pub enum RequestStatus {
    /// Still running; `fraction` is in `[0, 1]` and never decreases
    Pending { phase: String, fraction: f64 },
    Ready(Arc<Chunk>),
    Failed(String),
}

impl RequestStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, RequestStatus::Pending { .. })
    }
}

enum WorkerEvent {
    Progress { phase: String, fraction: f64 },
    Done(Result<Arc<Chunk>, GenerationError>),
}

/// Spawns background generation requests.
pub struct ChunkWorker<S: ChunkSource + 'static = ChunkGenerator> {
    cache: Arc<ChunkCache<S>>,
}

impl<S: ChunkSource + 'static> Clone for ChunkWorker<S> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<S: ChunkSource + 'static> ChunkWorker<S> {
    pub fn new(cache: Arc<ChunkCache<S>>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ChunkCache<S>> {
        &self.cache
    }

    /// Start fetching `coord` in the background.
    pub fn request(&self, coord: ChunkCoord) -> ChunkRequest {
        let (sender, receiver) = unbounded();
        let cache = Arc::clone(&self.cache);

        let spawned = thread::Builder::new()
            .name(format!("chunk-{}-{}", coord.x, coord.y))
            .spawn(move || {
                let progress_sender = sender.clone();
                let mut sink = |phase: &str, fraction: f64| {
                    let _ = progress_sender.send(WorkerEvent::Progress {
                        phase: phase.to_string(),
                        fraction,
                    });
                };
                let result = cache.get_chunk_with_progress(coord, &mut sink);
                // Receiver may have been dropped; the chunk is cached either way
                let _ = sender.send(WorkerEvent::Done(result));
            });

        let mut request = ChunkRequest {
            coord,
            receiver,
            status: RequestStatus::Pending {
                phase: QUEUED_PHASE.to_string(),
                fraction: 0.0,
            },
            failure: None,
        };

        if let Err(err) = spawned {
            error!(x = coord.x, y = coord.y, "failed to spawn chunk worker: {err}");
            request.fail(GenerationError::Failed {
                x: coord.x,
                y: coord.y,
                reason: format!("could not spawn worker thread: {err}"),
            });
        }
        request
    }
}

/// Handle to one background request
pub struct ChunkRequest {
    coord: ChunkCoord,
    receiver: Receiver<WorkerEvent>,
    status: RequestStatus,
    failure: Option<GenerationError>,
}

impl ChunkRequest {
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Drain pending events without blocking and return the latest status.
    pub fn poll(&mut self) -> &RequestStatus {
        while !self.status.is_finished() {
            match self.receiver.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.fail(GenerationError::Disconnected),
            }
        }
        &self.status
    }

    /// Block until the request finishes.
    pub fn wait(mut self) -> Result<Arc<Chunk>, GenerationError> {
        while !self.status.is_finished() {
            match self.receiver.recv() {
                Ok(event) => self.apply(event),
                Err(_) => self.fail(GenerationError::Disconnected),
            }
        }

        match self.status {
            RequestStatus::Ready(chunk) => Ok(chunk),
            _ => Err(self.failure.unwrap_or(GenerationError::Disconnected)),
        }
    }

    fn apply(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Progress { phase, fraction } => {
                if let RequestStatus::Pending { fraction: current, .. } = self.status {
                    let fraction = fraction.clamp(current, 1.0);
                    trace!(x = self.coord.x, y = self.coord.y, %phase, fraction, "chunk progress");
                    self.status = RequestStatus::Pending { phase, fraction };
                }
            }
            WorkerEvent::Done(Ok(chunk)) => self.status = RequestStatus::Ready(chunk),
            WorkerEvent::Done(Err(err)) => self.fail(err),
        }
    }

    fn fail(&mut self, err: GenerationError) {
        self.status = RequestStatus::Failed(err.to_string());
        self.failure = Some(err);
    }
}
