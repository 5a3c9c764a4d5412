use std::io;

use crate::units::{pack_name, ConfigUnit, DirUnit, FileUnit};
use crate::{
    CONFIG_DIR, DESC_LEN, DESC_OFFSET, HEAP_OFFSET, IMAGE_CAPACITY, NUM_CONFIG, NUM_DIR, NUM_FILES,
    UNIT_SIZE,
};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("image already holds {} directories", NUM_DIR)]
    TooManyDirs,
    #[error("image already holds {} files", NUM_FILES)]
    TooManyFiles,
    #[error("no directory added yet")]
    NoDirectory,
    #[error("heap full: {needed} bytes needed, {available} available")]
    HeapFull { needed: usize, available: usize },
    #[error("palette records only belong to the '{}' directory", CONFIG_DIR)]
    NotConfigDir,
    #[error("image already holds {} palette records", NUM_CONFIG)]
    TooManyConfigs,
    #[error("description longer than {} bytes", DESC_LEN)]
    DescriptionTooLong,
}

/// Append-only writer for one image. Directories are added first-level,
/// files and palette records attach to the most recent directory, payloads
/// grow the heap. Nothing is ever moved or rewritten, so a failed add
/// leaves the image exactly as it was.
pub struct ImageBuilder {
    data: Box<[u8]>,
    cursor: usize,
    n_dirs: usize,
    n_files: usize,
    n_configs: usize,
    mse: [u64; NUM_FILES],
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    pub fn new() -> ImageBuilder {
        ImageBuilder {
            data: vec![0u8; IMAGE_CAPACITY].into_boxed_slice(),
            cursor: HEAP_OFFSET,
            n_dirs: 0,
            n_files: 0,
            n_configs: 0,
            mse: [0; NUM_FILES],
        }
    }

    fn put_unit(&mut self, slot: usize, bytes: [u8; UNIT_SIZE]) {
        let at = slot * UNIT_SIZE;
        self.data[at..at + UNIT_SIZE].copy_from_slice(&bytes);
    }

    fn current_dir(&self) -> Result<DirUnit, BuildError> {
        if self.n_dirs == 0 {
            return Err(BuildError::NoDirectory);
        }
        let at = (self.n_dirs - 1) * UNIT_SIZE;
        let bytes: &[u8; UNIT_SIZE] = self.data[at..at + UNIT_SIZE].try_into().unwrap();
        Ok(DirUnit::from_bytes(bytes))
    }

    // Grow the current directory by one file slot and return that slot's
    // index within the file table.
    fn claim_file_slot(&mut self) -> Result<usize, BuildError> {
        let mut dir = self.current_dir()?;
        if self.n_files == NUM_FILES {
            return Err(BuildError::TooManyFiles);
        }
        let index = self.n_files;
        dir.file_count += 1;
        self.put_unit(self.n_dirs - 1, dir.to_bytes());
        self.n_files += 1;
        Ok(index)
    }

    pub fn add_dir(&mut self, name: &str) -> Result<(), BuildError> {
        if self.n_dirs == NUM_DIR {
            return Err(BuildError::TooManyDirs);
        }
        let dir = DirUnit {
            name: pack_name(name),
            first_file: self.n_files as u32,
            file_count: 0,
        };
        self.put_unit(self.n_dirs, dir.to_bytes());
        self.n_dirs += 1;
        log::debug!("dir {name}");
        Ok(())
    }

    /// Append one compressed clip under the current directory.
    pub fn add_file(
        &mut self,
        name: &str,
        payload: &[u8],
        n_samples: u32,
        table: u8,
        predictor: u8,
        is_8_bit: bool,
        mse: u64,
    ) -> Result<(), BuildError> {
        let available = IMAGE_CAPACITY - self.cursor;
        if payload.len() > available {
            return Err(BuildError::HeapFull {
                needed: payload.len(),
                available,
            });
        }
        let size = payload.len() as u32;
        let short_sample = !is_8_bit && size > 0 && n_samples == size * 2 - 1;
        debug_assert!(if is_8_bit {
            n_samples == size
        } else {
            n_samples == size * 2 || short_sample
        });

        let index = self.claim_file_slot()?;
        let file = FileUnit {
            name: pack_name(name),
            offset: self.cursor as u32,
            size,
            table,
            is_8_bit,
            short_sample,
            predictor,
        };
        self.put_unit(NUM_DIR + index, file.to_bytes());
        self.data[self.cursor..self.cursor + payload.len()].copy_from_slice(payload);
        self.cursor += payload.len();
        self.mse[index] = mse;
        log::debug!("file {name}: {} bytes at {}", size, file.offset);
        Ok(())
    }

    /// Append one palette record. Only legal while the current directory is
    /// the reserved config directory; the record occupies a file slot but no
    /// heap space.
    pub fn add_config(&mut self, font: u8, bc: [u8; 3], ic: [u8; 3]) -> Result<(), BuildError> {
        if self.current_dir()?.name_str() != CONFIG_DIR {
            return Err(BuildError::NotConfigDir);
        }
        if self.n_configs == NUM_CONFIG {
            return Err(BuildError::TooManyConfigs);
        }
        let config = ConfigUnit {
            name: pack_name(&format!("pal{}", self.n_configs)),
            font,
            bc,
            ic,
        };
        let index = self.claim_file_slot()?;
        self.put_unit(NUM_DIR + index, config.to_bytes());
        self.n_configs += 1;
        Ok(())
    }

    pub fn set_description(&mut self, text: &str) -> Result<(), BuildError> {
        if text.len() > DESC_LEN {
            return Err(BuildError::DescriptionTooLong);
        }
        let region = &mut self.data[DESC_OFFSET..DESC_OFFSET + DESC_LEN];
        region.fill(0);
        region[..text.len()].copy_from_slice(text.as_bytes());
        Ok(())
    }

    /// The image bytes written so far: header through the heap cursor.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.cursor]
    }

    /// Reconstruction error per file slot, for reporting; not serialized.
    pub fn mse(&self) -> &[u64; NUM_FILES] {
        &self.mse
    }

    pub fn write<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.bytes())
    }

    /// Text form of the same bytes: the decimal length on the first line,
    /// then lower-case hex, 64 bytes per line. Diffable, and restartable by
    /// any consumer that reads the length line first.
    pub fn write_text<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "{}", self.cursor)?;
        for chunk in self.bytes().chunks(64) {
            for byte in chunk {
                write!(w, "{byte:02x}")?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Image;

    #[test]
    fn capacity_limits_hold() {
        let mut b = ImageBuilder::new();
        for i in 0..NUM_DIR {
            b.add_dir(&format!("d{i}")).unwrap();
        }
        assert!(matches!(b.add_dir("over"), Err(BuildError::TooManyDirs)));

        for i in 0..NUM_FILES {
            b.add_file(&format!("f{i}"), &[0, 0], 4, 0, 0, false, 0).unwrap();
        }
        assert!(matches!(
            b.add_file("over", &[0, 0], 4, 0, 0, false, 0),
            Err(BuildError::TooManyFiles)
        ));
    }

    #[test]
    fn heap_capacity_holds() {
        let mut b = ImageBuilder::new();
        b.add_dir("d").unwrap();
        let big = vec![0u8; IMAGE_CAPACITY - HEAP_OFFSET];
        b.add_file("huge", &big, big.len() as u32 * 2, 0, 0, false, 0)
            .unwrap();
        assert!(matches!(
            b.add_file("one", &[0, 0], 4, 0, 0, false, 0),
            Err(BuildError::HeapFull { .. })
        ));
    }

    #[test]
    fn file_needs_a_directory() {
        let mut b = ImageBuilder::new();
        assert!(matches!(
            b.add_file("f", &[0, 0], 4, 0, 0, false, 0),
            Err(BuildError::NoDirectory)
        ));
    }

    #[test]
    fn lookup_round_trip() {
        let mut b = ImageBuilder::new();
        b.add_dir("dir0").unwrap();
        b.add_file("file0", &[0, 1, 2, 3], 8, 2, 1, false, 77).unwrap();
        b.add_file("file1", &[9, 9], 4, 0, 0, false, 0).unwrap();
        b.add_dir("dir1abcd").unwrap();
        b.add_file("file2", &[5], 1, 0, 0, true, 0).unwrap();

        let image = Image::new(b.bytes()).unwrap();
        assert!(image.dir("dir2").is_none());
        assert!(image.lookup("dir0", "file3").is_none());
        assert!(image.lookup("dir1abcd", "file0").is_none());

        let f = image.lookup("dir0", "file0").unwrap();
        assert_eq!(f.size, 4);
        assert_eq!(f.table, 2);
        assert_eq!(f.predictor, 1);
        assert_eq!(f.n_samples(), 8);
        assert_eq!(image.payload(&f).unwrap(), &[0, 1, 2, 3]);

        let f2 = image.lookup("dir1abcd", "file2").unwrap();
        assert!(f2.is_8_bit);
        assert_eq!(image.payload(&f2).unwrap(), &[5]);
        assert_eq!(b.mse()[0], 77);
    }

    #[test]
    fn config_records() {
        let mut b = ImageBuilder::new();
        b.add_dir("sounds").unwrap();
        assert!(matches!(
            b.add_config(0, [0, 0, 0], [0, 0, 0]),
            Err(BuildError::NotConfigDir)
        ));

        b.add_dir(CONFIG_DIR).unwrap();
        for i in 0..NUM_CONFIG as u8 {
            b.add_config(i & 1, [i, 0x88, 0xff], [0x44, i, 0xff]).unwrap();
        }
        assert!(matches!(
            b.add_config(0, [0, 0, 0], [0, 0, 0]),
            Err(BuildError::TooManyConfigs)
        ));

        let image = Image::new(b.bytes()).unwrap();
        let configs = image.configs();
        assert_eq!(configs.len(), NUM_CONFIG);
        assert_eq!(configs[3].font, 1);
        assert_eq!(configs[3].bc, [3, 0x88, 0xff]);
        assert_eq!(configs[3].name_str(), "pal3");
    }

    #[test]
    fn description_round_trip() {
        let mut b = ImageBuilder::new();
        b.set_description("lightsaber soundfont v2").unwrap();
        let image = Image::new(b.bytes()).unwrap();
        assert_eq!(image.description(), "lightsaber soundfont v2");

        let long = "x".repeat(DESC_LEN + 1);
        assert!(matches!(
            b.set_description(&long),
            Err(BuildError::DescriptionTooLong)
        ));
    }

    #[test]
    fn text_dump_shape() {
        let mut b = ImageBuilder::new();
        b.add_dir("d").unwrap();
        b.add_file("f", &[0xab; 10], 20, 0, 0, false, 0).unwrap();

        let mut out = Vec::new();
        b.write_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        let len: usize = lines.next().unwrap().parse().unwrap();
        assert_eq!(len, HEAP_OFFSET + 10);

        let hex: String = lines.collect();
        assert_eq!(hex.len(), len * 2);
        assert!(hex.ends_with(&"ab".repeat(10)));
        // Full lines carry 64 bytes each.
        assert!(text.lines().nth(1).unwrap().len() == 128);
    }
}
