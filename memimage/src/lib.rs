//! The fixed-layout binary image a playback device consumes.
//!
//! Geometry, from offset zero:
//!
//! ```text
//! 0        unit table: 4 directory slots + 60 file slots, 16 bytes each
//! 1024     description, 64 bytes, zero padded
//! 1088     heap: compressed payloads, appended in file order
//! ```
//!
//! Every unit record is 16 bytes with an 8-byte name. File records pack
//! their codec parameters into one little-endian word; records owned by the
//! reserved `config` directory hold palette settings instead and are decoded
//! as a distinct variant. Total capacity is fixed at two million bytes; the
//! builder refuses anything that will not fit rather than producing a
//! partial image.

mod builder;
mod reader;
mod units;

pub use builder::{BuildError, ImageBuilder};
pub use reader::{Image, ReadError};
pub use units::{
    pack_name, pack_unit_bits, unit_is_8_bit, unit_predictor, unit_short_sample, unit_size,
    unit_table, ConfigUnit, DirUnit, FileUnit, Unit,
};

pub const NAME_LEN: usize = 8;
pub const UNIT_SIZE: usize = 16;
pub const NUM_DIR: usize = 4;
pub const NUM_FILES: usize = 60;
pub const NUM_UNITS: usize = NUM_DIR + NUM_FILES;

pub const DESC_OFFSET: usize = NUM_UNITS * UNIT_SIZE;
pub const DESC_LEN: usize = 64;
pub const HEAP_OFFSET: usize = DESC_OFFSET + DESC_LEN;
pub const IMAGE_CAPACITY: usize = 2_000_000;

/// Directory name whose file slots hold palette records.
pub const CONFIG_DIR: &str = "config";
pub const NUM_CONFIG: usize = 8;
