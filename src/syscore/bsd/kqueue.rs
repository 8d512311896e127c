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

fn filter_change(fd: RawFd, filter: i16, flags: u16, token_bits: usize) -> libc::kevent {
    let mut ev: libc::kevent = unsafe { MaybeUninit::zeroed().assume_init() };
    ev.ident = fd as libc::uintptr_t;
    ev.filter = filter;
    ev.flags = flags;
    ev.udata = token_bits as *mut libc::c_void;
    ev
}

fn readiness_bits(ev: &libc::kevent) -> Readiness {
    let mut readiness = Readiness::empty();
    if ev.filter == libc::EVFILT_READ {
        readiness |= Readiness::READABLE;
    }
    if ev.filter == libc::EVFILT_WRITE {
        readiness |= Readiness::WRITABLE;
    }
    // Peer close arrives out of band as EV_EOF rather than as a filter of
    // its own; fold it into the portable hang-up bit.
    if ev.flags & libc::EV_EOF != 0 {
        readiness |= Readiness::HUNGUP;
    }
    readiness
}

/// Filter-based backend: one kqueue filter per direction, each persisting
/// until explicitly deleted.
pub struct SysPoller {
    /// kqueue_fd
    kqueue_fd: RawFd,

    /// Ready-event buffer, length fixed at construction.
    events: Vec<libc::kevent>,

    /// Entries filled by the last wait.
    ready: usize,

    /// `None` blocks indefinitely.
    timeout: Option<libc::timespec>,

    /// Modifier bits OR'd into every `EV_ADD` change.
    extra_flags: u16,
}

impl SysPoller {
    pub(crate) fn new(config: &PollerConfig) -> io::Result<SysPoller> {
        let kqueue_fd = syscall!(kqueue())?;
        syscall!(fcntl(kqueue_fd, libc::F_SETFD, libc::FD_CLOEXEC))?;
        let timeout = config.timeout.map(|timeout| libc::timespec {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_nsec: timeout.subsec_nanos() as libc::c_long,
        });
        let zero: libc::kevent = unsafe { MaybeUninit::zeroed().assume_init() };
        let events = vec![zero; config.capacity];
        Ok(SysPoller {
            kqueue_fd,
            events,
            ready: 0,
            timeout,
            extra_flags: config.extra_flags as u16,
        })
    }

    /// Applies a changelist, harvesting per-change receipts.
    ///
    /// `ENOENT` on a delete means the filter was already gone (descriptor
    /// closed, or the direction was never registered) and is tolerated,
    /// as is `EPIPE`: https://github.com/tokio-rs/mio/issues/582
    fn submit(&self, changes: &[libc::kevent]) -> io::Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut receipts = [unsafe { MaybeUninit::<libc::kevent>::zeroed().assume_init() }; 2];
        debug_assert!(changes.len() <= receipts.len());
        let immediate = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        let n = syscall!(kevent(
            self.kqueue_fd,
            changes.as_ptr(),
            changes.len() as libc::c_int,
            receipts.as_mut_ptr(),
            changes.len() as libc::c_int,
            &immediate
        ))?;
        for receipt in &receipts[..n as usize] {
            if receipt.flags & libc::EV_ERROR != 0
                && receipt.data != 0
                && receipt.data != libc::ENOENT as _
                && receipt.data != libc::EPIPE as _
            {
                return Err(io::Error::from_raw_os_error(receipt.data as i32));
            }
        }
        Ok(())
    }

    pub(crate) fn attach(&mut self, fd: RawFd, interest: Interest, token: Token) -> io::Result<()> {
        let add = libc::EV_ADD | libc::EV_RECEIPT | self.extra_flags;
        let mut changes = [filter_change(fd, 0, 0, 0); 2];
        let mut n = 0;
        if interest.contains(Interest::READABLE) {
            changes[n] = filter_change(fd, libc::EVFILT_READ, add, token.0);
            n += 1;
        }
        if interest.contains(Interest::WRITABLE) {
            changes[n] = filter_change(fd, libc::EVFILT_WRITE, add, token.0);
            n += 1;
        }
        self.submit(&changes[..n])
    }

    pub(crate) fn modify(&mut self, fd: RawFd, interest: Interest, token: Token) -> io::Result<()> {
        // Filters persist until deleted: every direction absent from the
        // new interest must be removed here or it keeps firing with the
        // old token.
        let add = libc::EV_ADD | libc::EV_RECEIPT | self.extra_flags;
        let del = libc::EV_DELETE | libc::EV_RECEIPT;
        let changes = [
            filter_change(
                fd,
                libc::EVFILT_READ,
                if interest.contains(Interest::READABLE) { add } else { del },
                token.0,
            ),
            filter_change(
                fd,
                libc::EVFILT_WRITE,
                if interest.contains(Interest::WRITABLE) { add } else { del },
                token.0,
            ),
        ];
        self.submit(&changes)
    }

    pub(crate) fn detach(&mut self, fd: RawFd) -> io::Result<()> {
        let del = libc::EV_DELETE | libc::EV_RECEIPT;
        let changes = [
            filter_change(fd, libc::EVFILT_READ, del, 0),
            filter_change(fd, libc::EVFILT_WRITE, del, 0),
        ];
        self.submit(&changes)
    }

    pub(crate) fn wait(&mut self) -> io::Result<usize> {
        self.ready = 0;
        let timeout = self
            .timeout
            .as_ref()
            .map_or(ptr::null(), |timeout| timeout as *const libc::timespec);
        let res = unsafe {
            libc::kevent(
                self.kqueue_fd,
                ptr::null(),
                0,
                self.events.as_mut_ptr(),
                self.events.len() as libc::c_int,
                timeout,
            )
        };
        if res == -1 {
            let err = io::Error::last_os_error();
            // kevent delivers no entries when it fails, so a benign code
            // is an ordinary empty timeout.
            return if benign_wait_code(&err) { Ok(0) } else { Err(err) };
        }
        self.ready = res as usize;
        Ok(self.ready)
    }

    pub(crate) fn event(&self, idx: usize) -> Event {
        debug_assert!(idx < self.ready);
        let ev = self.events[idx];
        Event {
            token: Token(ev.udata as usize),
            readiness: readiness_bits(&ev),
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
        let _ = syscall!(close(self.kqueue_fd));
    }
}
