use std::io;

/// A poller error.
///
/// Every variant carries the originating OS-level cause; the raw errno is
/// reachable through [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Creating the native poll handle or its event buffer failed. No
    /// poller is produced; retry construction from scratch if at all.
    #[error("poll backend creation failed")]
    Resource(#[source] io::Error),

    /// The backend rejected an attach/modify/detach call. Never retried
    /// internally; the caller decides what to do with the descriptor.
    #[error("descriptor registration failed")]
    Registration(#[source] io::Error),

    /// A wait failed with a code that is not a benign interrupt or
    /// timeout.
    #[error("wait for readiness failed")]
    Wait(#[source] io::Error),
}

/// Short for `std::result::Result<T, crate::Error>`
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(any(target_os = "illumos", target_os = "solaris"))]
const BENIGN_WAIT: [i32; 3] = [libc::EINTR, libc::EAGAIN, libc::ETIME];
#[cfg(not(any(target_os = "illumos", target_os = "solaris")))]
const BENIGN_WAIT: [i32; 2] = [libc::EINTR, libc::EAGAIN];

/// Wait-side failure codes that report an interrupted, would-block or
/// timed-out wait rather than a broken poller.
///
/// A backend seeing one of these returns whatever fill count it already
/// has (possibly zero) as an ordinary result instead of an error.
pub(crate) fn benign_wait_code(err: &io::Error) -> bool {
    match err.raw_os_error() {
        Some(code) => BENIGN_WAIT.contains(&code),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_and_would_block_are_benign() {
        assert!(benign_wait_code(&io::Error::from_raw_os_error(libc::EINTR)));
        assert!(benign_wait_code(&io::Error::from_raw_os_error(libc::EAGAIN)));
    }

    #[test]
    fn real_failures_are_fatal() {
        assert!(!benign_wait_code(&io::Error::from_raw_os_error(libc::EBADF)));
        assert!(!benign_wait_code(&io::Error::from_raw_os_error(libc::EINVAL)));
        assert!(!benign_wait_code(&io::Error::new(
            io::ErrorKind::Other,
            "no os code"
        )));
    }
}
