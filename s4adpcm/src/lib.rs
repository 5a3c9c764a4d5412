//! A small predictive codec family for compressed sample playback on
//! microcontrollers.
//!
//! Each sample is guessed from the previous ones; only the quantized delta
//! from that guess is stored. The delta is scaled by an adaptive power of
//! two (`State::shift`), which chases the signal: a large delta raises the
//! scale for the next sample, a small one lowers it. Everything is integer
//! math with 32-bit intermediates; multiplies appear only in the volume
//! path, and there is no division anywhere on the decode side.
//!
//! Three wire formats share one state machine: 4 bits per sample (two
//! samples per byte, low nibble first), 8 bits per sample, and an
//! uncompressed 16-bit passthrough. The decoder produces stereo-duplicated
//! 16.16 fixed-point output and can saturating-add into an existing buffer,
//! which is how multiple voices mix.

mod clip;
mod codec;
mod expander;
mod stream;

pub use clip::{parse_clip, ClipError, ClipHeader, CLIP_HEADER_LEN, CLIP_MAGIC};
pub use codec::{
    decode4, decode8, decode_raw, encode4, encode8, encode_raw, table4, table8, table_for, Codec,
    DeltaTable, Predictor, State, N_TABLES_4, N_TABLES_8, SHIFT_LIMIT_4, SHIFT_LIMIT_8, TABLES_4,
    TABLES_8,
};
pub use expander::{fill_buffer, Expander, BUFFER_SIZE};
pub use stream::{MemStream, Stream};
