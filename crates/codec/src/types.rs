use crate::CodecError;
use crate::varint::CompactSize;

/// Largest container length we will accept from a stream, 32 MiB worth of
/// entries.
pub const MAX_CONTAINER_LEN: u64 = 0x0200_0000;

/// Cap on how many entries we preallocate for before we've actually read them.
const MAX_PREALLOC: usize = 4096;

/// Generic codec trait for "plain old data" types that compactly go between bytes.
pub trait Codec: Sized {
    /// Decodes self from a decoder.
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError>;

    /// Encodes self into an encoder.
    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError>;
}

/// Generic decoder trait that reads inputs.
pub trait Decoder {
    /// Fills `into` from the input.  This does NOT include length tagging.
    fn read_buf(&mut self, into: &mut [u8]) -> Result<(), CodecError>;

    /// Reads a fixed size array.  This does NOT include length tagging.
    fn read_arr<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut buf = [0; N];
        self.read_buf(&mut buf)?;
        Ok(buf)
    }
}

/// Generic encoder trait that writes outputs.
pub trait Encoder {
    /// Writes a buf.  This does NOT include length tagging.
    fn write_buf(&mut self, buf: &[u8]) -> Result<(), CodecError>;
}

impl Encoder for Vec<u8> {
    fn write_buf(&mut self, buf: &[u8]) -> Result<(), CodecError> {
        self.extend_from_slice(buf);
        Ok(())
    }
}

impl<const N: usize> Codec for [u8; N] {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        dec.read_arr::<N>()
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        enc.write_buf(self)
    }
}

impl Codec for bool {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        match dec.read_arr::<1>()?[0] {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(CodecError::InvalidVariant("bool")),
        }
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        enc.write_buf(&[u8::from(*self)])
    }
}

/// Fixed-width ints, little-endian like the rest of the chain formats.
macro_rules! impl_int_codec {
    ( $ity:ident $bytes:literal ) => {
        impl Codec for $ity {
            fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
                let arr: [u8; $bytes] = dec.read_arr()?;
                Ok(<$ity>::from_le_bytes(arr))
            }

            fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
                enc.write_buf(&self.to_le_bytes())
            }
        }
    };
}

impl_int_codec!(u8 1);
impl_int_codec!(u16 2);
impl_int_codec!(u32 4);
impl_int_codec!(i32 4);
impl_int_codec!(u64 8);
impl_int_codec!(i64 8);
impl_int_codec!(u128 16);

/// Vectors are a [`CompactSize`] count followed by each entry.  For `Vec<u8>`
/// this is the usual length-prefixed byte blob.
impl<T: Codec> Codec for Vec<T> {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        let len = CompactSize::decode(dec)?.inner();
        if len > MAX_CONTAINER_LEN {
            return Err(CodecError::OverflowContainer(len));
        }

        // Don't trust the length for the allocation, the stream might be lying.
        let len = len as usize;
        let mut out = Vec::with_capacity(len.min(MAX_PREALLOC));
        for _ in 0..len {
            out.push(T::decode(dec)?);
        }

        Ok(out)
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        let len = self.len() as u64;
        if len > MAX_CONTAINER_LEN {
            return Err(CodecError::OverflowContainer(len));
        }

        CompactSize::new(len).encode(enc)?;
        for item in self {
            item.encode(enc)?;
        }

        Ok(())
    }
}
