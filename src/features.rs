//! Inbound modulation contract.
//!
//! Audio capture/FFT and the coefficient animator live outside this crate;
//! the simulation core only consumes their outputs. `AudioFeatures` is the
//! per-frame feature vector, `ParamDeltas` the opaque coefficient deltas the
//! animator emits. Which feature drives which coefficient is the animator's
//! policy, not ours.

#[derive(Clone, Copy, Debug, Default)]
pub struct AudioFeatures {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub energy: f32,
    pub beat: bool,
}

/// Additive deltas for up to six scalar coefficients, applied positionally to
/// the active parameter variant. Unused slots stay zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParamDeltas {
    pub slots: [f64; 6],
}

impl ParamDeltas {
    pub fn is_zero(&self) -> bool {
        self.slots.iter().all(|&d| d == 0.0)
    }
}

/// Per-frame parameter update function supplied by the (out-of-scope)
/// animator; `None` means "no drift this frame".
pub type Animator = Box<dyn FnMut(f64, &AudioFeatures) -> Option<ParamDeltas>>;
