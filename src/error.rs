use core::fmt;

/// Errors produced by the OCB3 core and its one-shot [`crate::Ocb3`] wrapper.
///
/// The session is left in an undefined state after any of these and must be
/// [`reset`](crate::session::Ocb3Core::reset) before reuse.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// The hash and main permutation instances don't agree on block size or
    /// algorithm identity.
    Configuration,
    /// `tagLenBits` was outside `[32, 256]` or not a multiple of 8.
    InvalidTagLength,
    /// The nonce was empty or 16 bytes or longer.
    InvalidNonce,
    /// The caller-supplied output buffer was shorter than the promised size.
    BufferTooSmall,
    /// Decrypt `finalize` was called with fewer than `tagLen` buffered bytes.
    DataTooShort,
    /// Tag verification failed on decrypt.
    AuthenticationFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::Configuration => "mismatched block permutation configuration",
            Error::InvalidTagLength => "tag length out of range or not a multiple of 8 bits",
            Error::InvalidNonce => "nonce must be 1..=15 bytes",
            Error::BufferTooSmall => "output buffer too small",
            Error::DataTooShort => "fewer bytes buffered than the tag length",
            Error::AuthenticationFailed => "tag verification failed",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Collapses every internal error kind into the opaque [`aead::Error`], the
/// same simplification `aes-gcm-siv` performs at its `Aead`/`AeadInPlace`
/// boundary.
impl From<Error> for aead::Error {
    fn from(_: Error) -> aead::Error {
        aead::Error
    }
}
