use std::time::Duration;

///
/// Poller construction parameters.
#[derive(Clone, Debug)]
pub struct PollerConfig {
    /// Maximum number of ready entries a single wait call can deliver.
    /// Fixes the event buffer length for the poller's whole lifetime.
    /// Must be nonzero.
    ///
    /// **[default]**: 256.
    pub capacity: usize,

    /// How long a wait call may block.
    ///
    /// `None` blocks until at least one registered descriptor is ready;
    /// `Some(Duration::ZERO)` returns immediately with whatever is
    /// already ready, possibly nothing.
    ///
    /// **[default]**: `None`.
    pub timeout: Option<Duration>,

    /// Backend-native modifier bits OR'd into every registration, e.g.
    /// `EPOLLET` on Linux or `EV_CLEAR` on kqueue targets. The event-port
    /// backend has no registration modifiers and ignores this field.
    ///
    /// **[default]**: 0.
    pub extra_flags: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            timeout: None,
            extra_flags: 0,
        }
    }
}
