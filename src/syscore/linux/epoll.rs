use std::io;
use std::os::unix::io::RawFd;
use std::ptr;

use crate::config::PollerConfig;
use crate::error::benign_wait_code;
use crate::event::{Event, Readiness};
use crate::interest::{Interest, Token};

macro_rules! syscall {
    ($fn:ident $args:tt) => {{
        let res = unsafe { libc::$fn $args };
        if res == -1 {
            Err(std::io::Error::last_os_error())
        } else {
            Ok(res)
        }
    }};
}

/// Builds the epoll interest mask for a registration.
///
/// `EPOLLRDHUP` rides along with read interest so a half-closed peer is
/// observable as a hang-up, the way the filter-based backends report it.
fn interest_bits(interest: Interest, extra_flags: u32) -> u32 {
    let mut bits = extra_flags;
    if interest.contains(Interest::READABLE) {
        bits |= (libc::EPOLLIN | libc::EPOLLRDHUP) as u32;
    }
    if interest.contains(Interest::WRITABLE) {
        bits |= libc::EPOLLOUT as u32;
    }
    bits
}

fn readiness_bits(events: u32) -> Readiness {
    let mut readiness = Readiness::empty();
    if events & libc::EPOLLIN as u32 != 0 {
        readiness |= Readiness::READABLE;
    }
    if events & libc::EPOLLOUT as u32 != 0 {
        readiness |= Readiness::WRITABLE;
    }
    // EPOLLHUP and EPOLLERR are always armed by the kernel.
    if events & (libc::EPOLLHUP | libc::EPOLLERR | libc::EPOLLRDHUP) as u32 != 0 {
        readiness |= Readiness::HUNGUP;
    }
    readiness
}

/// Mask-based backend: one interest mask per descriptor, overwritten
/// atomically by modify.
pub struct SysPoller {
    /// epoll_fd
    epoll_fd: RawFd,

    /// Ready-event buffer, length fixed at construction.
    events: Vec<libc::epoll_event>,

    /// Entries filled by the last wait.
    ready: usize,

    /// Milliseconds, -1 blocks indefinitely.
    timeout: libc::c_int,

    /// Modifier bits OR'd into every registration.
    extra_flags: u32,
}

impl SysPoller {
    pub(crate) fn new(config: &PollerConfig) -> io::Result<SysPoller> {
        let epoll_fd = syscall!(epoll_create1(libc::EPOLL_CLOEXEC))?;
        let timeout = match config.timeout {
            Some(timeout) => timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
            None => -1,
        };
        let events = vec![libc::epoll_event { events: 0, u64: 0 }; config.capacity];
        Ok(SysPoller {
            epoll_fd,
            events,
            ready: 0,
            timeout,
            extra_flags: config.extra_flags,
        })
    }

    pub(crate) fn attach(&mut self, fd: RawFd, interest: Interest, token: Token) -> io::Result<()> {
        let mut ev = libc::epoll_event {
            events: interest_bits(interest, self.extra_flags),
            u64: token.0 as u64,
        };
        syscall!(epoll_ctl(self.epoll_fd, libc::EPOLL_CTL_ADD, fd, &mut ev))?;
        Ok(())
    }

    pub(crate) fn modify(&mut self, fd: RawFd, interest: Interest, token: Token) -> io::Result<()> {
        let mut ev = libc::epoll_event {
            events: interest_bits(interest, self.extra_flags),
            u64: token.0 as u64,
        };
        syscall!(epoll_ctl(self.epoll_fd, libc::EPOLL_CTL_MOD, fd, &mut ev))?;
        Ok(())
    }

    pub(crate) fn detach(&mut self, fd: RawFd) -> io::Result<()> {
        // The kernel drops a registration itself once the last reference
        // to the descriptor closes; ENOENT/EBADF here only mean that
        // already happened (or nothing was ever attached).
        match syscall!(epoll_ctl(
            self.epoll_fd,
            libc::EPOLL_CTL_DEL,
            fd,
            ptr::null_mut()
        )) {
            Ok(_) => Ok(()),
            Err(err)
                if matches!(err.raw_os_error(), Some(libc::ENOENT) | Some(libc::EBADF)) =>
            {
                log::warn!("detach without live registration, fd={}", fd);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub(crate) fn wait(&mut self) -> io::Result<usize> {
        self.ready = 0;
        let res = syscall!(epoll_wait(
            self.epoll_fd,
            self.events.as_mut_ptr(),
            self.events.len() as libc::c_int,
            self.timeout
        ));
        match res {
            Ok(ready) => {
                self.ready = ready as usize;
                Ok(self.ready)
            }
            // epoll delivers no entries when it fails, so a benign code
            // is an ordinary empty timeout.
            Err(err) if benign_wait_code(&err) => Ok(0),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn event(&self, idx: usize) -> Event {
        debug_assert!(idx < self.ready);
        let ev = self.events[idx];
        Event {
            token: Token(ev.u64 as usize),
            readiness: readiness_bits(ev.events),
        }
    }

    pub(crate) fn ready_len(&self) -> usize {
        self.ready
    }

    pub(crate) fn capacity(&self) -> usize {
        self.events.len()
    }
}

impl Drop for SysPoller {
    fn drop(&mut self) {
        let _ = syscall!(close(self.epoll_fd));
    }
}
