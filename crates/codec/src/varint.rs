//! Variable-length integers.
//!
//! Two layouts are used.  [`CompactSize`] prefixes containers and favours
//! cheap decoding of short lengths:
//!
//! ```txt
//! 0x00..=0xfc             value itself
//! 0xfd  u16 (le)          values up to 0xffff
//! 0xfe  u32 (le)          values up to 0xffffffff
//! 0xff  u64 (le)          anything else
//! ```
//!
//! [`VarInt`] encodes indices and sizes as big-endian base-128 groups where
//! every byte but the last has the high bit set, and each continuation group
//! is offset by one so that every value has exactly one encoding.

use crate::errors::CodecError;
use crate::types::{Codec, Decoder, Encoder};

/// Container length prefix.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CompactSize(u64);

impl CompactSize {
    /// Constructs a new instance.
    pub fn new(v: u64) -> Self {
        Self(v)
    }

    /// Converts to inner value.
    pub fn inner(self) -> u64 {
        self.0
    }

    /// Number of bytes this takes up when encoded.
    pub fn byte_len(&self) -> usize {
        match self.0 {
            0..=0xfc => 1,
            0xfd..=0xffff => 3,
            0x1_0000..=0xffff_ffff => 5,
            _ => 9,
        }
    }
}

impl Codec for CompactSize {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        let first = u8::decode(dec)?;
        let (v, min) = match first {
            0xfd => (u16::decode(dec)? as u64, 0xfd),
            0xfe => (u32::decode(dec)? as u64, 0x1_0000),
            0xff => (u64::decode(dec)?, 0x1_0000_0000),
            b => return Ok(Self(b as u64)),
        };

        if v < min {
            return Err(CodecError::NonMinimalLength);
        }

        Ok(Self(v))
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        let v = self.0;
        match self.byte_len() {
            1 => (v as u8).encode(enc),
            3 => {
                0xfdu8.encode(enc)?;
                (v as u16).encode(enc)
            }
            5 => {
                0xfeu8.encode(enc)?;
                (v as u32).encode(enc)
            }
            _ => {
                0xffu8.encode(enc)?;
                v.encode(enc)
            }
        }
    }
}

/// Index/size varint.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VarInt(u64);

impl VarInt {
    /// Constructs a new instance.
    pub fn new(v: u64) -> Self {
        Self(v)
    }

    /// Converts to inner value.
    pub fn inner(self) -> u64 {
        self.0
    }
}

impl Codec for VarInt {
    fn decode(dec: &mut impl Decoder) -> Result<Self, CodecError> {
        let mut n: u64 = 0;
        loop {
            let b = u8::decode(dec)?;
            if n > (u64::MAX >> 7) {
                return Err(CodecError::VarIntOverflow);
            }

            n = (n << 7) | (b & 0x7f) as u64;
            if b & 0x80 == 0 {
                return Ok(Self(n));
            }

            if n == u64::MAX {
                return Err(CodecError::VarIntOverflow);
            }
            n += 1;
        }
    }

    fn encode(&self, enc: &mut impl Encoder) -> Result<(), CodecError> {
        // 64 bits needs at most 10 groups.
        let mut tmp = [0u8; 10];
        let mut at = tmp.len();
        let mut n = self.0;
        let mut cont = 0;
        loop {
            at -= 1;
            tmp[at] = (n & 0x7f) as u8 | cont;
            if n <= 0x7f {
                break;
            }
            n = (n >> 7) - 1;
            cont = 0x80;
        }

        enc.write_buf(&tmp[at..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode_buf_exact, encode_to_vec};

    #[test]
    fn test_compact_size_widths() {
        for (v, len) in [
            (0u64, 1),
            (0xfc, 1),
            (0xfd, 3),
            (0xffff, 3),
            (0x1_0000, 5),
            (0xffff_ffff, 5),
            (0x1_0000_0000, 9),
            (u64::MAX, 9),
        ] {
            let cs = CompactSize::new(v);
            let buf = encode_to_vec(&cs).unwrap();
            assert_eq!(buf.len(), len, "compact size {v:#x}");
            assert_eq!(cs.byte_len(), len);
            assert_eq!(decode_buf_exact::<CompactSize>(&buf).unwrap().inner(), v);
        }
    }

    #[test]
    fn test_compact_size_rejects_nonminimal() {
        // 5 encoded in the 3 byte form.
        let res = decode_buf_exact::<CompactSize>(&[0xfd, 0x05, 0x00]);
        assert_eq!(res, Err(CodecError::NonMinimalLength));
    }

    #[test]
    fn test_varint_known_encodings() {
        // Reference vectors for the offset base-128 layout.
        let cases: [(u64, &[u8]); 7] = [
            (0, &[0x00]),
            (0x7f, &[0x7f]),
            (0x80, &[0x80, 0x00]),
            (0x1234, &[0xa3, 0x34]),
            (0xffff, &[0x82, 0xfe, 0x7f]),
            (0x1_0000, &[0x82, 0xff, 0x00]),
            (0x1234_5678, &[0x80, 0x90, 0xd0, 0xab, 0x78]),
        ];

        for (v, expected) in cases {
            let buf = encode_to_vec(&VarInt::new(v)).unwrap();
            assert_eq!(buf, expected, "varint {v:#x}");
            assert_eq!(decode_buf_exact::<VarInt>(&buf).unwrap().inner(), v);
        }
    }

    #[test]
    fn test_varint_max() {
        let buf = encode_to_vec(&VarInt::new(u64::MAX)).unwrap();
        assert_eq!(decode_buf_exact::<VarInt>(&buf).unwrap().inner(), u64::MAX);
    }

    #[test]
    fn test_varint_overflow() {
        let res = decode_buf_exact::<VarInt>(&[0xff; 11]);
        assert_eq!(res, Err(CodecError::VarIntOverflow));
    }

    #[test]
    fn test_varint_truncated() {
        let res = decode_buf_exact::<VarInt>(&[0x80]);
        assert_eq!(res, Err(CodecError::OverrunInput));
    }
}
