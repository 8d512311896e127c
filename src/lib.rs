//! Portable descriptor-readiness multiplexing.
//!
//! One [`Poller`] interface over the target platform's scalable readiness
//! facility. The backend is selected at build time from the compilation
//! target; there is no runtime dispatch.
//!
//! The poller owns nothing but its native handle and event buffer. Callers
//! keep ownership of descriptors and of the [`Token`] values they attach,
//! and drive a single poller from a single thread (or serialize access
//! themselves).

mod config;
mod error;
mod event;
mod interest;
mod poller;

#[cfg(not(any(
    target_os = "linux",     // epoll
    target_os = "android",   // epoll
    target_os = "macos",     // kqueue
    target_os = "ios",       // kqueue
    target_os = "freebsd",   // kqueue
    target_os = "dragonfly", // kqueue
    target_os = "illumos",   // event ports
    target_os = "solaris",   // event ports
)))]
compile_error!("Target OS is not supported");

#[cfg(any(target_os = "linux", target_os = "android"))]
mod syscore {
    mod linux;
    pub(crate) use linux::*;
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
))]
mod syscore {
    mod bsd;
    pub(crate) use bsd::*;
}

#[cfg(any(target_os = "illumos", target_os = "solaris"))]
mod syscore {
    mod solaris;
    pub(crate) use solaris::*;
}

pub use config::PollerConfig;
pub use error::{Error, Result};
pub use event::{Event, Readiness};
pub use interest::{Interest, Token};
pub use poller::Poller;
