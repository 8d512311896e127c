use std::io;
use std::os::unix::io::RawFd;

use crate::config::PollerConfig;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::interest::{Interest, Token};
use crate::syscore::SysPoller;

///
/// Readiness poller over the target platform's native facility.
///
/// Construction allocates the native handle and a fixed event buffer;
/// both are released when the poller is dropped, on every exit path of
/// the owning scope. One poller is meant to be driven by one thread, and
/// the `&mut self` receivers make concurrent mutation unrepresentable
/// without external synchronization.
pub struct Poller(SysPoller);

impl Poller {
    /// Creates a poller from `config`.
    ///
    /// Fails with [`Error::Resource`] if the native handle cannot be
    /// created; nothing is returned on failure.
    pub fn new(config: PollerConfig) -> Result<Poller> {
        if config.capacity == 0 {
            return Err(Error::Resource(io::Error::new(
                io::ErrorKind::InvalidInput,
                "capacity must be nonzero",
            )));
        }
        let sys = SysPoller::new(&config).map_err(Error::Resource)?;
        log::trace!(
            "poller created, capacity={}, timeout={:?}, extra_flags={:#x}",
            config.capacity,
            config.timeout,
            config.extra_flags
        );
        Ok(Poller(sys))
    }

    /// Registers `fd` for the conditions in `interest`, associating
    /// `token`.
    ///
    /// A descriptor should be attached at most once per poller; what a
    /// duplicate attach does is backend-defined and not corrected here.
    pub fn attach(&mut self, fd: RawFd, interest: Interest, token: Token) -> Result<()> {
        log::trace!("attach, fd={}, interest={:?}, token={:?}", fd, interest, token);
        self.0.attach(fd, interest, token).map_err(Error::Registration)
    }

    /// Replaces the interest set and token of an already-attached `fd`.
    ///
    /// Conditions absent from `interest` stop being reported, including
    /// on backends where each direction is a separately registered filter
    /// that has to be removed explicitly.
    pub fn modify(&mut self, fd: RawFd, interest: Interest, token: Token) -> Result<()> {
        log::trace!("modify, fd={}, interest={:?}, token={:?}", fd, interest, token);
        self.0.modify(fd, interest, token).map_err(Error::Registration)
    }

    /// Removes all interest for `fd`.
    ///
    /// A descriptor the backend no longer knows about (never attached, or
    /// the registration was dropped when the descriptor closed) is a
    /// benign no-op, not an error.
    pub fn detach(&mut self, fd: RawFd) -> Result<()> {
        log::trace!("detach, fd={}", fd);
        self.0.detach(fd).map_err(Error::Registration)
    }

    /// Blocks until at least one registered descriptor is ready, the
    /// event buffer is full, or the configured timeout elapses, and
    /// returns the number of ready entries.
    ///
    /// An interrupted or timed-out wait is not an error: if the backend
    /// already delivered entries their count is returned, otherwise the
    /// result is `Ok(0)`. Anything else surfaces as [`Error::Wait`].
    pub fn wait(&mut self) -> Result<usize> {
        match self.0.wait() {
            Ok(ready) => {
                log::trace!("wait complete, ready={}", ready);
                Ok(ready)
            }
            Err(err) => {
                log::error!("wait failed, err={}", err);
                Err(Error::Wait(err))
            }
        }
    }

    /// Decodes ready entry `idx` from the last wait.
    ///
    /// `idx` must be below the count returned by the last [`wait`]; the
    /// buffer contents are stale once the next wait begins.
    ///
    /// [`wait`]: Poller::wait
    pub fn event(&self, idx: usize) -> Event {
        self.0.event(idx)
    }

    /// Iterates over the ready entries of the last wait.
    pub fn events(&self) -> impl Iterator<Item = Event> + '_ {
        (0..self.0.ready_len()).map(move |idx| self.0.event(idx))
    }

    /// Maximum ready entries a single wait call can deliver.
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }
}
