use thiserror::Error;

/// Errors from mmv-codec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// If we read a container length that was longer than allowed.
    #[error("overflow container (len {0})")]
    OverflowContainer(u64),

    /// If we tried to read past the end of the underlying buffer.
    #[error("would overrun end of input")]
    OverrunInput,

    /// If there was extra data in a buffer than we didn't consume reading a
    /// message.
    #[error("extra unnecessary input leftover")]
    ExtraInput,

    /// A compact size was encoded with more bytes than it needed.
    #[error("non-minimal compact size encoding")]
    NonMinimalLength,

    /// A varint did not fit in 64 bits.
    #[error("varint overflows u64")]
    VarIntOverflow,

    /// A value was out of range for the type being decoded.
    #[error("invalid variant for {0}")]
    InvalidVariant(&'static str),

    /// A tagged union carried a tag nobody recognizes.
    #[error("unknown tag {0}")]
    UnknownTag(u8),
}
