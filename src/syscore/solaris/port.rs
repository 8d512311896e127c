use std::io;
use std::mem::MaybeUninit;
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

fn interest_bits(interest: Interest) -> libc::c_int {
    let mut bits = 0;
    if interest.contains(Interest::READABLE) {
        bits |= libc::POLLIN as libc::c_int;
    }
    if interest.contains(Interest::WRITABLE) {
        bits |= libc::POLLOUT as libc::c_int;
    }
    bits
}

fn readiness_bits(events: libc::c_int) -> Readiness {
    let mut readiness = Readiness::empty();
    if events & libc::POLLIN as libc::c_int != 0 {
        readiness |= Readiness::READABLE;
    }
    if events & libc::POLLOUT as libc::c_int != 0 {
        readiness |= Readiness::WRITABLE;
    }
    if events & (libc::POLLHUP | libc::POLLERR) as libc::c_int != 0 {
        readiness |= Readiness::HUNGUP;
    }
    readiness
}

/// Completion-port-style backend over Solaris/illumos event ports.
///
/// An association is consumed when its event is retrieved; re-arming a
/// descriptor after a delivery is the caller's business, exactly like
/// closing it. Event ports have no registration modifier bits, so the
/// configured extra flags are not applied here.
pub struct SysPoller {
    /// port_fd
    port_fd: RawFd,

    /// Ready-event buffer, length fixed at construction.
    events: Vec<libc::port_event>,

    /// Entries filled by the last wait.
    ready: usize,

    /// `None` blocks indefinitely.
    timeout: Option<libc::timespec>,
}

impl SysPoller {
    pub(crate) fn new(config: &PollerConfig) -> io::Result<SysPoller> {
        let port_fd = syscall!(port_create())?;
        let timeout = config.timeout.map(|timeout| libc::timespec {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_nsec: timeout.subsec_nanos() as libc::c_long,
        });
        let zero: libc::port_event = unsafe { MaybeUninit::zeroed().assume_init() };
        let events = vec![zero; config.capacity];
        Ok(SysPoller {
            port_fd,
            events,
            ready: 0,
            timeout,
        })
    }

    pub(crate) fn attach(&mut self, fd: RawFd, interest: Interest, token: Token) -> io::Result<()> {
        syscall!(port_associate(
            self.port_fd,
            libc::PORT_SOURCE_FD,
            fd as libc::uintptr_t,
            interest_bits(interest),
            token.0 as *mut libc::c_void
        ))?;
        Ok(())
    }

    pub(crate) fn modify(&mut self, fd: RawFd, interest: Interest, token: Token) -> io::Result<()> {
        // Re-associating an already-associated object overwrites its
        // event set and user data in one call.
        self.attach(fd, interest, token)
    }

    pub(crate) fn detach(&mut self, fd: RawFd) -> io::Result<()> {
        match syscall!(port_dissociate(
            self.port_fd,
            libc::PORT_SOURCE_FD,
            fd as libc::uintptr_t
        )) {
            Ok(_) => Ok(()),
            // Delivering an event already consumed the association.
            Err(err) if err.raw_os_error() == Some(libc::ENOENT) => {
                log::warn!("detach without live association, fd={}", fd);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub(crate) fn wait(&mut self) -> io::Result<usize> {
        self.ready = 0;
        let timeout = self
            .timeout
            .as_mut()
            .map_or(ptr::null_mut(), |timeout| timeout as *mut libc::timespec);
        let mut nget: libc::c_uint = 1;
        let res = unsafe {
            libc::port_getn(
                self.port_fd,
                self.events.as_mut_ptr(),
                self.events.len() as libc::c_uint,
                &mut nget,
                timeout,
            )
        };
        if res == 0 {
            self.ready = nget as usize;
            return Ok(self.ready);
        }
        let err = io::Error::last_os_error();
        // port_getn reports EINTR/ETIME even after it has already written
        // entries into the buffer; the fill count decides whether this is
        // a partial success or an empty timeout.
        if benign_wait_code(&err) {
            self.ready = nget as usize;
            return Ok(self.ready);
        }
        Err(err)
    }

    pub(crate) fn event(&self, idx: usize) -> Event {
        debug_assert!(idx < self.ready);
        let ev = self.events[idx];
        Event {
            token: Token(ev.portev_user as usize),
            readiness: readiness_bits(ev.portev_events),
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
        let _ = syscall!(close(self.port_fd));
    }
}
