//! Background worker for the per-pixel Mandelbrot/Julia fill.
//!
//! That computation is O(width x height x max_iter) and can take hundreds of
//! milliseconds, so it runs on its own OS thread. Communication is strictly
//! message passing over mpsc channels with buffer ownership transferred on
//! return; the render loop polls a one-slot cache and never blocks.
//!
//! The dispatch protocol keeps at most one job in flight plus one pending
//! superseding job. In-flight jobs are never cancelled; a superseded result
//! is cached on arrival and immediately replaced by the pending request's.

use crate::density::{DensityBuffer, fill_pixel_fractal};
use crate::dynamics::PixelFractal;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread;

#[derive(Clone, Copy, Debug)]
struct Job {
    params: PixelFractal,
    width: usize,
    height: usize,
    hash: u64,
}

struct JobResult {
    hash: u64,
    buffer: DensityBuffer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchPhase {
    Idle,
    Dispatched,
    DispatchedWithPending,
}

/// The protocol state machine, separated from the thread so it can be driven
/// directly in tests. `request` returns a job to send now (if any);
/// `complete` returns the pending job to send next (if any).
pub struct DispatchState {
    phase: DispatchPhase,
    pending: Option<Job>,
    latest_hash: Option<u64>,
}

impl DispatchState {
    pub fn new() -> Self {
        Self {
            phase: DispatchPhase::Idle,
            pending: None,
            latest_hash: None,
        }
    }

    pub fn phase(&self) -> DispatchPhase {
        self.phase
    }

    fn request(&mut self, job: Job) -> Option<Job> {
        if self.latest_hash == Some(job.hash) {
            return None;
        }
        self.latest_hash = Some(job.hash);
        match self.phase {
            DispatchPhase::Idle => {
                self.phase = DispatchPhase::Dispatched;
                Some(job)
            }
            DispatchPhase::Dispatched | DispatchPhase::DispatchedWithPending => {
                // Supersede any previously pending job; the intermediate
                // parameter set is never computed.
                self.pending = Some(job);
                self.phase = DispatchPhase::DispatchedWithPending;
                None
            }
        }
    }

    fn complete(&mut self) -> Option<Job> {
        match self.pending.take() {
            Some(job) => {
                self.phase = DispatchPhase::Dispatched;
                Some(job)
            }
            None => {
                self.phase = DispatchPhase::Idle;
                None
            }
        }
    }
}

pub struct FractalWorker {
    tx: Sender<Job>,
    rx: Receiver<JobResult>,
    dispatch: DispatchState,
    cache: Option<(u64, DensityBuffer)>,
}

impl FractalWorker {
    pub fn spawn() -> Self {
        let (tx, job_rx) = channel::<Job>();
        let (result_tx, rx) = channel::<JobResult>();

        thread::spawn(move || {
            // Fully self-contained: jobs in, finished buffers out.
            while let Ok(job) = job_rx.recv() {
                let mut buffer = DensityBuffer::new(job.width, job.height);
                fill_pixel_fractal(&job.params, &mut buffer);
                if result_tx.send(JobResult { hash: job.hash, buffer }).is_err() {
                    break;
                }
            }
        });

        Self {
            tx,
            rx,
            dispatch: DispatchState::new(),
            cache: None,
        }
    }

    /// Called every render tick with the current parameters; dispatches only
    /// when the parameter hash changed.
    pub fn update(&mut self, params: &PixelFractal, width: usize, height: usize) {
        let job = Job {
            params: *params,
            width,
            height,
            hash: hash_request(params, width, height),
        };
        if let Some(job) = self.dispatch.request(job) {
            // A dead worker thread degrades to "no cache": the render loop
            // keeps painting the background.
            let _ = self.tx.send(job);
        }
    }

    /// Drain finished results into the cache and dispatch any pending job.
    pub fn poll(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(res) => {
                    self.cache = Some((res.hash, res.buffer));
                    if let Some(next) = self.dispatch.complete() {
                        let _ = self.tx.send(next);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Latest finished buffer, if its dimensions still match the canvas.
    /// A one-frame-stale fractal is acceptable; a wrong-sized one is not.
    pub fn cached(&self, width: usize, height: usize) -> Option<&DensityBuffer> {
        self.cache
            .as_ref()
            .filter(|(_, buf)| buf.width() == width && buf.height() == height)
            .map(|(_, buf)| buf)
    }

    pub fn phase(&self) -> DispatchPhase {
        self.dispatch.phase()
    }
}

/// FNV-1a over the canonical bit patterns of everything that affects the
/// output buffer.
pub fn hash_request(p: &PixelFractal, width: usize, height: usize) -> u64 {
    let mut h = 0xcbf2_9ce4_8422_2325u64;
    let mut mix = |v: u64| {
        for byte in v.to_le_bytes() {
            h ^= byte as u64;
            h = h.wrapping_mul(0x0000_0100_0000_01b3);
        }
    };
    mix(p.max_iter as u64);
    mix(p.center_x.to_bits());
    mix(p.center_y.to_bits());
    mix(p.zoom.to_bits());
    mix(p.julia as u64);
    mix(p.julia_r.to_bits());
    mix(p.julia_i.to_bits());
    mix(width as u64);
    mix(height as u64);
    h
}
