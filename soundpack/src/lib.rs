//! Offline packer: reads WAV clips, picks the best codec tuning per clip by
//! brute-force trial, and assembles the fixed-layout memory image the
//! playback firmware consumes.

mod compress;
mod pack;
mod report;
mod wav;

pub use compress::{compress_best, Compressed};
pub use pack::{
    even_length, pack_dirs, parse_palette, rotate_zero, write_clip, PackOptions, PaletteEntry,
};
pub use report::report;
pub use wav::{decimate2, load_wav, save_wav, SAMPLE_RATE};
