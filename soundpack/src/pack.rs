use {
    anyhow::{bail, Context, Result},
    camino::{Utf8Path, Utf8PathBuf},
    memimage::{ImageBuilder, NUM_CONFIG},
    s4adpcm::{table_for, ClipHeader, Codec, Expander, MemStream},
};

use crate::compress::compress_best;
use crate::wav::{load_wav, save_wav};

pub struct PackOptions {
    pub codec: Codec,
    /// Clip stems to rotate to their quietest point before encoding
    /// (clips meant to loop seamlessly).
    pub loop_names: Vec<String>,
    pub description: Option<String>,
    /// Also emit each clip as a standalone headered blob here.
    pub clips_dir: Option<Utf8PathBuf>,
    /// Also decode each clip back to WAV here, for auditioning.
    pub post_dir: Option<Utf8PathBuf>,
}

impl Default for PackOptions {
    fn default() -> Self {
        PackOptions {
            codec: Codec::Bit4,
            loop_names: Vec::new(),
            description: None,
            clips_dir: None,
            post_dir: None,
        }
    }
}

/// Duplicate the final sample when the count is odd. Keeps 4-bit clips on
/// whole-byte boundaries without audibly changing anything.
pub fn even_length(samples: &mut Vec<i16>) {
    if samples.len() % 2 == 1 {
        if let Some(&last) = samples.last() {
            samples.push(last);
        }
    }
}

/// Rotate a looping clip so it starts at the quietest neighborhood, scored
/// as `2|s[i]| + |s[i-1]| + |s[i+1]|`. Starting a loop at a near-zero point
/// compresses much better and removes the seam click. Returns the rotation.
pub fn rotate_zero(samples: &mut [i16]) -> usize {
    let n = samples.len();
    if n == 0 {
        return 0;
    }
    let mut zero = 0;
    let mut best = i64::MAX;
    for i in 0..n {
        let left = (i + n - 1) % n;
        let right = (i + 1) % n;
        let e = 2 * (samples[i] as i64).abs()
            + (samples[left] as i64).abs()
            + (samples[right] as i64).abs();
        if e < best {
            best = e;
            zero = i;
        }
    }
    samples.rotate_left(zero);
    zero
}

/// A clip as a standalone headered blob, for consumers that do not carry a
/// whole image.
pub fn write_clip(path: &Utf8Path, codec: Codec, n_samples: u32, payload: &[u8]) -> Result<()> {
    let header = ClipHeader {
        payload_len: payload.len() as u32,
        n_samples,
        codec,
    };
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(payload);
    std::fs::write(path.as_std_path(), bytes).with_context(|| format!("write {path}"))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub font: u8,
    pub bc: [u8; 3],
    pub ic: [u8; 3],
}

fn parse_hex_rgb(s: &str) -> Result<[u8; 3]> {
    if s.len() != 6 {
        bail!("color '{s}' is not 6 hex digits");
    }
    let channel = |i: usize| {
        u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).with_context(|| format!("color '{s}'"))
    };
    Ok([channel(0)?, channel(1)?, channel(2)?])
}

/// Palette config: one `font bc ic` line per record, `#` comments and blank
/// lines ignored, e.g. `0 0088ff 44ccff`.
pub fn parse_palette(text: &str) -> Result<Vec<PaletteEntry>> {
    let mut entries = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let entry = (|| -> Result<PaletteEntry> {
            let font = fields.next().context("missing font")?.parse()?;
            let bc = parse_hex_rgb(fields.next().context("missing blade color")?)?;
            let ic = parse_hex_rgb(fields.next().context("missing impact color")?)?;
            Ok(PaletteEntry { font, bc, ic })
        })()
        .with_context(|| format!("palette line {}", lineno + 1))?;
        entries.push(entry);
    }
    Ok(entries)
}

fn wav_files(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    for entry in dir.as_std_path().read_dir().with_context(|| format!("read {dir}"))? {
        let path = entry?.path();
        let path = Utf8PathBuf::from_path_buf(path)
            .map_err(|p| anyhow::anyhow!("non-utf8 path {}", p.display()))?;
        if path.extension() == Some("wav") {
            files.push(path);
        }
    }
    // Directory order is filesystem-dependent; the image layout must not be.
    files.sort();
    Ok(files)
}

/// Build an image from directories of WAV clips. Each input directory
/// becomes one image directory; each clip is encoded with the best candidate
/// tuning and appended under it.
pub fn pack_dirs(
    dirs: &[Utf8PathBuf],
    config: Option<&Utf8Path>,
    opts: &PackOptions,
) -> Result<ImageBuilder> {
    let mut image = ImageBuilder::new();
    if let Some(desc) = &opts.description {
        image.set_description(desc)?;
    }

    for dir in dirs {
        let dir_name = dir
            .file_name()
            .map(str::to_lowercase)
            .unwrap_or_else(|| "sounds".into());
        image.add_dir(&dir_name)?;

        for path in wav_files(dir)? {
            let stem = path
                .file_stem()
                .map(str::to_lowercase)
                .unwrap_or_default();

            let mut samples = load_wav(&path)?;
            even_length(&mut samples);
            if opts.loop_names.iter().any(|n| n == &stem) {
                let rotated = rotate_zero(&mut samples);
                log::info!("{stem}: rotated {rotated} samples to loop point");
            }

            let best = compress_best(&samples, opts.codec);
            log::info!(
                "{stem}: {} samples -> {} bytes, table={} predictor={} mse={}",
                samples.len(),
                best.bytes.len(),
                best.table,
                best.predictor.id(),
                best.mse
            );

            image.add_file(
                &stem,
                &best.bytes,
                samples.len() as u32,
                best.table,
                best.predictor.id(),
                best.codec == Codec::Bit8,
                best.mse,
            )?;

            if let Some(clips) = &opts.clips_dir {
                let out = clips.join(format!("{stem}.w12"));
                write_clip(&out, best.codec, samples.len() as u32, &best.bytes)?;
            }
            if let Some(post) = &opts.post_dir {
                let mut frames = vec![0i32; samples.len() * 2];
                let mut expander = Expander::new(
                    MemStream::new(&best.bytes),
                    best.codec,
                    table_for(best.codec, best.table),
                    best.predictor,
                );
                expander.expand(&mut frames, samples.len(), 256, false, true);
                save_wav(&post.join(format!("{stem}.wav")), &frames)?;
            }
        }
    }

    if let Some(config) = config {
        let text = std::fs::read_to_string(config.as_std_path())
            .with_context(|| format!("read {config}"))?;
        let entries = parse_palette(&text)?;
        if entries.len() != NUM_CONFIG {
            bail!(
                "{config}: need exactly {} palette entries, got {}",
                NUM_CONFIG,
                entries.len()
            );
        }
        image.add_dir(memimage::CONFIG_DIR)?;
        for entry in entries {
            image.add_config(entry.font, entry.bc, entry.ic)?;
        }
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_length_duplicates_last() {
        let mut s = vec![1i16, 2, 3];
        even_length(&mut s);
        assert_eq!(s, vec![1, 2, 3, 3]);
        even_length(&mut s);
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn rotation_finds_the_quiet_point() {
        let mut s = vec![1000i16, 900, 800, 0, 1, 2, 700, 900];
        let zero = rotate_zero(&mut s);
        // Index 4 scores 2*1 + 0 + 2, the quietest neighborhood.
        assert_eq!(zero, 4);
        assert_eq!(s, vec![1, 2, 700, 900, 1000, 900, 800, 0]);
    }

    #[test]
    fn rotation_of_empty_is_noop() {
        let mut s: Vec<i16> = Vec::new();
        assert_eq!(rotate_zero(&mut s), 0);
    }

    #[test]
    fn palette_parsing() {
        let text = "# colors\n0 0088ff 44ccff\n\n1 c000ff 80a080\n";
        let entries = parse_palette(text).unwrap();
        assert_eq!(
            entries,
            vec![
                PaletteEntry {
                    font: 0,
                    bc: [0x00, 0x88, 0xff],
                    ic: [0x44, 0xcc, 0xff],
                },
                PaletteEntry {
                    font: 1,
                    bc: [0xc0, 0x00, 0xff],
                    ic: [0x80, 0xa0, 0x80],
                },
            ]
        );

        assert!(parse_palette("0 0088ff").is_err());
        assert!(parse_palette("0 xyzxyz 44ccff").is_err());
        assert!(parse_palette("0 0088f 44ccff").is_err());
    }
}
