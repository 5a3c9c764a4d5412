use crate::units::{pack_name, ConfigUnit, DirUnit, FileUnit, Unit};
use crate::{CONFIG_DIR, DESC_LEN, DESC_OFFSET, HEAP_OFFSET, NUM_DIR, UNIT_SIZE};

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("image truncated: {got} bytes, header needs {}", HEAP_OFFSET)]
    Truncated { got: usize },
}

/// Read-only view of a finished image. Lookups are linear scans over the
/// fixed unit table and allocate nothing, which is what the playback target
/// runs at voice-start time.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    data: &'a [u8],
}

impl<'a> Image<'a> {
    pub fn new(data: &'a [u8]) -> Result<Image<'a>, ReadError> {
        if data.len() < HEAP_OFFSET {
            return Err(ReadError::Truncated { got: data.len() });
        }
        Ok(Image { data })
    }

    fn unit(&self, slot: usize) -> &'a [u8; UNIT_SIZE] {
        let at = slot * UNIT_SIZE;
        self.data[at..at + UNIT_SIZE].try_into().unwrap()
    }

    pub fn dirs(&self) -> impl Iterator<Item = DirUnit> + '_ {
        let this = *self;
        (0..NUM_DIR)
            .map(move |slot| DirUnit::from_bytes(this.unit(slot)))
            .filter(|d| d.name[0] != 0)
    }

    pub fn dir(&self, name: &str) -> Option<DirUnit> {
        let packed = pack_name(name);
        self.dirs().find(|d| d.name == packed)
    }

    pub fn files(&self, dir: &DirUnit) -> impl Iterator<Item = FileUnit> + '_ {
        let this = *self;
        let first = dir.first_file as usize;
        let count = dir.file_count as usize;
        (first..first + count).map(move |i| FileUnit::from_bytes(this.unit(NUM_DIR + i)))
    }

    pub fn file(&self, dir: &DirUnit, name: &str) -> Option<FileUnit> {
        let packed = pack_name(name);
        self.files(dir).find(|f| f.name == packed)
    }

    pub fn lookup(&self, dir: &str, file: &str) -> Option<FileUnit> {
        self.file(&self.dir(dir)?, file)
    }

    /// A directory's slots under their proper interpretation.
    pub fn units(&self, dir: &DirUnit) -> impl Iterator<Item = Unit> + '_ {
        let config = dir.name == pack_name(CONFIG_DIR);
        let first = dir.first_file as usize;
        let count = dir.file_count as usize;
        (first..first + count).map(move |i| {
            let bytes = self.unit(NUM_DIR + i);
            if config {
                Unit::Config(ConfigUnit::from_bytes(bytes))
            } else {
                Unit::File(FileUnit::from_bytes(bytes))
            }
        })
    }

    pub fn configs(&self) -> Vec<ConfigUnit> {
        let Some(dir) = self.dir(CONFIG_DIR) else {
            return Vec::new();
        };
        self.units(&dir)
            .filter_map(|u| match u {
                Unit::Config(c) => Some(c),
                Unit::File(_) => None,
            })
            .collect()
    }

    pub fn description(&self) -> &'a str {
        let region = &self.data[DESC_OFFSET..DESC_OFFSET + DESC_LEN];
        let end = region.iter().position(|&b| b == 0).unwrap_or(DESC_LEN);
        std::str::from_utf8(&region[..end]).unwrap_or("")
    }

    /// The heap bytes a file record points at.
    pub fn payload(&self, file: &FileUnit) -> Option<&'a [u8]> {
        let start = file.offset as usize;
        self.data.get(start..start + file.size as usize)
    }
}
