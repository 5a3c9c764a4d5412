use {
    anyhow::{bail, Context, Result},
    camino::Utf8Path,
};

/// The one rate the playback device runs at.
pub const SAMPLE_RATE: u32 = 22_050;

/// Read a clip as a flat mono sample buffer. Only mono 16-bit PCM is
/// accepted; 44100 Hz input is decimated 2:1, anything else is rejected
/// before it reaches the codec.
pub fn load_wav(path: &Utf8Path) -> Result<Vec<i16>> {
    let mut reader =
        hound::WavReader::open(path.as_std_path()).with_context(|| format!("open {path}"))?;
    let spec = reader.spec();
    if spec.channels != 1
        || spec.bits_per_sample != 16
        || spec.sample_format != hound::SampleFormat::Int
    {
        bail!(
            "{path}: need mono 16-bit PCM, got {} channels at {} bits",
            spec.channels,
            spec.bits_per_sample
        );
    }
    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<_, _>>()
        .with_context(|| format!("read {path}"))?;

    match spec.sample_rate {
        SAMPLE_RATE => Ok(samples),
        44_100 => Ok(decimate2(&samples)),
        rate => bail!("{path}: unsupported sample rate {rate} (want 22050 or 44100)"),
    }
}

/// Halve the sample rate by averaging adjacent pairs. A trailing odd sample
/// is dropped.
pub fn decimate2(samples: &[i16]) -> Vec<i16> {
    samples
        .chunks_exact(2)
        .map(|pair| ((pair[0] as i32 + pair[1] as i32) / 2) as i16)
        .collect()
}

/// Write decoded 16.16 stereo frames back out as a mono WAV, for auditioning
/// what the codec actually did to a clip.
pub fn save_wav(path: &Utf8Path, frames: &[i32]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path.as_std_path(), spec)
        .with_context(|| format!("create {path}"))?;
    for frame in frames.chunks_exact(2) {
        writer.write_sample((frame[0] / 65536) as i16)?;
    }
    writer.finalize().with_context(|| format!("finish {path}"))?;
    Ok(())
}
