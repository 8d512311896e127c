use bitflags::bitflags;

bitflags! {
    /// Readiness conditions a descriptor is registered for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Interest: u8 {
        /// Report when the descriptor can be read without blocking.
        const READABLE = 0b01;
        /// Report when the descriptor can be written without blocking.
        const WRITABLE = 0b10;
    }
}

/// Caller-owned opaque value carried by a registration.
///
/// The poller stores the token in the backend's user-data word and returns
/// it verbatim with every ready entry; it never interprets the value. If
/// the token encodes an index or a pointer, the caller must keep whatever
/// it refers to alive for as long as the descriptor stays registered.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Token(pub usize);
