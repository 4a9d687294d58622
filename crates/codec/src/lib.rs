//! Compact binary encoding framework for proof streams.
//!
//! Everything is written in a self-describing order: fixed-width integers are
//! little-endian, container lengths use [`CompactSize`], and indices use the
//! MSB base-128 [`VarInt`].

mod buf_decoder;
mod errors;
mod types;
mod util;
mod varint;

pub use buf_decoder::BufDecoder;
pub use errors::CodecError;
pub use types::{Codec, Decoder, Encoder, MAX_CONTAINER_LEN};
pub use util::{decode_buf_exact, encode_to_vec};
pub use varint::{CompactSize, VarInt};
