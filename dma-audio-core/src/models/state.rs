/// Lifecycle of the playback subsystem.
///
/// ```text
/// Uninitialized ──init()──→ Initialized ──shutdown()──→ Uninitialized
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubsystemState {
    #[default]
    Uninitialized,
    Initialized,
}

impl SubsystemState {
    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::Initialized)
    }
}

/// Capture channel sub-lifecycle, nested inside `SubsystemState::Initialized`.
///
/// ```text
/// Unavailable            (gated off, or the device failed to open)
/// Idle ──start()──→ Capturing ──stop()──→ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Unavailable,
    Idle,
    Capturing,
}

impl CaptureState {
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing)
    }
}
