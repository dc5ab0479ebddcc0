//! Background frame worker.
//!
//! The primary thread keeps the authoritative grid and talks to the worker
//! only through [`protocol`] messages.  At most one request is outstanding at
//! a time; while it is, new frames are simply not scheduled and cell changes
//! accumulate until the next draw.

pub mod protocol;
mod thread;

use std::{sync::Arc, thread::JoinHandle, time::Duration};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{error, info, warn};

use crate::{
    config::EngineConfig,
    engine::{lighting::AdaptiveSampler, types::Projection},
    world::{Camera, CellDelta, Grid, PushBlock, Sprite, TextureBank},
};
pub use protocol::{DrawRequest, FrameOutput, InitPayload, Request, Response};

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to spawn frame worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("frame worker is no longer running")]
    Disconnected,
    #[error("frame worker has not been initialised")]
    NotInitialised,
}

/// Primary-side handle to the render thread.
pub struct FrameWorker {
    requests: Sender<Request>,
    responses: Receiver<Response>,
    handle: Option<JoinHandle<()>>,
    in_flight: bool,
    initialised: bool,
    alive: bool,
    pending: Vec<CellDelta>,
    next_frame: u64,
}

impl FrameWorker {
    pub fn spawn() -> Result<Self, WorkerError> {
        let (req_tx, req_rx) = crossbeam_channel::unbounded();
        let (resp_tx, resp_rx) = crossbeam_channel::unbounded();
        let handle = std::thread::Builder::new()
            .name("tilecast-frame-worker".to_owned())
            .spawn(move || thread::run(req_rx, resp_tx))?;
        info!("frame worker started");
        Ok(Self {
            requests: req_tx,
            responses: resp_rx,
            handle: Some(handle),
            in_flight: false,
            initialised: false,
            alive: true,
            pending: Vec::new(),
            next_frame: 0,
        })
    }

    /// A request (init or draw) is awaiting its response.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Ship a full world snapshot.  Counts as in flight until `Ready`.
    pub fn init(
        &mut self,
        grid: &Grid,
        bank: Arc<TextureBank>,
        sprites: Vec<Sprite>,
        (width, height): (usize, usize),
        cfg: &EngineConfig,
    ) -> Result<(), WorkerError> {
        let payload = InitPayload {
            grid: grid.clone(),
            bank,
            sprites,
            width,
            height,
            cfg: cfg.clone(),
        };
        self.send(Request::Init(Box::new(payload)))?;
        self.pending.clear();
        self.initialised = true;
        Ok(())
    }

    /// Remember changed cells for the next draw; a later delta for the same
    /// coordinate replaces the earlier one.
    pub fn queue_deltas(&mut self, deltas: impl IntoIterator<Item = CellDelta>) {
        for d in deltas {
            match self.pending.iter_mut().find(|p| p.coord == d.coord) {
                Some(slot) => *slot = d,
                None => self.pending.push(d),
            }
        }
    }

    #[inline]
    pub fn pending_deltas(&self) -> usize {
        self.pending.len()
    }

    /// Ask for a frame.  Returns `Ok(false)` without sending when a previous
    /// request is still outstanding.
    pub fn request_frame(
        &mut self,
        camera: Camera,
        projection: Projection,
        push_block: Option<PushBlock>,
        row_step: u32,
    ) -> Result<bool, WorkerError> {
        if !self.initialised {
            return Err(WorkerError::NotInitialised);
        }
        if self.in_flight {
            return Ok(false);
        }
        let draw = DrawRequest {
            frame: self.next_frame,
            camera,
            projection,
            deltas: self.pending.clone(),
            push_block,
            row_step,
        };
        self.send(Request::Draw(draw))?;
        // only now are the deltas on their way
        self.pending.clear();
        self.next_frame += 1;
        Ok(true)
    }

    /// One main-loop turn: collect a finished frame, let its ray count steer
    /// `sampler`, then schedule the next frame with the updated row step.
    ///
    /// Request failures are logged; the frame already received is still
    /// returned.
    pub fn exchange(
        &mut self,
        sampler: &mut AdaptiveSampler,
        camera: Camera,
        projection: Projection,
        push_block: Option<PushBlock>,
    ) -> Option<FrameOutput> {
        let got = self.poll();
        if let Some(frame) = &got {
            sampler.observe(frame.rays_cast);
        }
        if self.alive && !self.in_flight {
            if let Err(e) = self.request_frame(camera, projection, push_block, sampler.row_step()) {
                warn!(error = %e, "frame request failed");
            }
        }
        got
    }

    /// Non-blocking check for a response.
    pub fn poll(&mut self) -> Option<FrameOutput> {
        match self.responses.try_recv() {
            Ok(resp) => self.accept(resp),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.lost();
                None
            }
        }
    }

    /// Block for up to `timeout` waiting for a response.
    pub fn poll_timeout(&mut self, timeout: Duration) -> Option<FrameOutput> {
        match self.responses.recv_timeout(timeout) {
            Ok(resp) => self.accept(resp),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.lost();
                None
            }
        }
    }

    /// Stop the worker and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    /*────────────────────────── internals ──────────────────────────*/

    fn send(&mut self, req: Request) -> Result<(), WorkerError> {
        if !self.alive {
            return Err(WorkerError::Disconnected);
        }
        match self.requests.send(req) {
            Ok(()) => {
                self.in_flight = true;
                Ok(())
            }
            Err(_) => {
                warn!("frame worker request channel closed");
                self.alive = false;
                self.in_flight = false;
                Err(WorkerError::Disconnected)
            }
        }
    }

    fn accept(&mut self, resp: Response) -> Option<FrameOutput> {
        self.in_flight = false;
        match resp {
            Response::Ready => None,
            Response::Frame(out) => Some(out),
            Response::Rejected { frame } => {
                warn!(frame, "frame worker rejected draw before init");
                None
            }
        }
    }

    fn lost(&mut self) {
        if self.alive {
            error!("frame worker disconnected; rendering stops");
        }
        self.alive = false;
        self.in_flight = false;
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.requests.send(Request::Shutdown);
            if handle.join().is_err() {
                error!("frame worker panicked");
            }
            self.alive = false;
            info!("frame worker shut down");
        }
    }
}

impl Drop for FrameWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
