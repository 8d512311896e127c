use bitflags::bitflags;

use crate::interest::Token;

bitflags! {
    /// Readiness conditions reported for a ready descriptor.
    ///
    /// One vocabulary across backends: facilities that signal peer close
    /// out of band (kqueue's `EV_EOF`) have that indicator folded into
    /// [`HUNGUP`](Readiness::HUNGUP), facilities that signal it in band
    /// (`EPOLLHUP`, `POLLHUP`) map it to the same bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Readiness: u8 {
        /// The descriptor can be read without blocking.
        const READABLE = 0b001;
        /// The descriptor can be written without blocking.
        const WRITABLE = 0b010;
        /// The remote end of the connection has closed, or the descriptor
        /// is in an error state.
        const HUNGUP = 0b100;
    }
}

/// A ready entry decoded from the poller's event buffer.
///
/// The underlying buffer entry is only meaningful until the next
/// [`wait`](crate::Poller::wait) call; the decoded `Event` is a plain copy
/// and can outlive it.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Event {
    /// The token supplied at attach/modify time, returned verbatim.
    pub token: Token,
    /// Which of the registered conditions are satisfied.
    pub readiness: Readiness,
}
