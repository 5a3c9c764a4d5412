use crate::codec::{decode4, decode8, decode_raw, Codec, DeltaTable, Predictor, State};
use crate::stream::Stream;

/// Working-buffer size. Sized for an audio interrupt on a small target:
/// one fetch decodes at most 512 samples.
pub const BUFFER_SIZE: usize = 256;

/// Incremental decoder for one voice. Wraps the codec state machine with a
/// bounded working buffer so playback never needs the whole compressed clip
/// in memory; codec state and any half-consumed byte carry across calls, so
/// callers may ask for any number of samples at a time.
pub struct Expander<S: Stream> {
    stream: S,
    codec: Codec,
    table: &'static DeltaTable,
    predictor: Predictor,
    state: State,
    buffer: [u8; BUFFER_SIZE],
    start: usize,
    end: usize,
}

impl<S: Stream> Expander<S> {
    pub fn new(stream: S, codec: Codec, table: &'static DeltaTable, predictor: Predictor) -> Self {
        Expander {
            stream,
            codec,
            table,
            predictor,
            state: State::new(),
            buffer: [0; BUFFER_SIZE],
            start: 0,
            end: 0,
        }
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Reset to the start of the stream. The next decode reproduces the
    /// first pass exactly.
    pub fn rewind(&mut self) {
        self.state = State::new();
        self.start = 0;
        self.end = 0;
        self.stream.rewind();
    }

    // Whole samples decodable from what is buffered right now.
    fn buffered_samples(&self) -> usize {
        let bytes = self.end - self.start;
        match self.codec {
            Codec::Bit4 => {
                if bytes == 0 {
                    0
                } else {
                    bytes * 2 - self.state.half_byte() as usize
                }
            }
            Codec::Bit8 => bytes,
            Codec::Pcm16 => bytes / 2,
        }
    }

    fn refill(&mut self) {
        // A byte with a pending high nibble (or a lone passthrough byte)
        // moves to the front and stays current.
        let kept = self.end - self.start;
        self.buffer.copy_within(self.start..self.end, 0);
        let got = self.stream.fetch(&mut self.buffer[kept..]);
        self.start = 0;
        self.end = kept + got;
    }

    /// Decode up to `n_samples` stereo frames into `target` (which must hold
    /// `2 * n_samples` values). Returns how many frames were produced; short
    /// counts mean the stream ran out, not an error. `volume` is 0..=256 and
    /// is eased per sample unless `override_easing` snaps it first.
    pub fn expand(
        &mut self,
        target: &mut [i32],
        n_samples: usize,
        volume: i32,
        add: bool,
        override_easing: bool,
    ) -> usize {
        if override_easing {
            self.state.snap_volume(volume);
        }

        let mut n = 0;
        while n < n_samples {
            if self.buffered_samples() == 0 {
                self.refill();
                if self.buffered_samples() == 0 {
                    break;
                }
            }

            let want = (n_samples - n).min(self.buffered_samples());
            let src = &self.buffer[self.start..self.end];
            let out = &mut target[n * 2..];
            let (produced, consumed) = match self.codec {
                Codec::Bit4 => decode4(
                    src,
                    want,
                    volume,
                    add,
                    self.table,
                    self.predictor,
                    &mut self.state,
                    out,
                ),
                Codec::Bit8 => decode8(
                    src,
                    want,
                    volume,
                    add,
                    self.table,
                    self.predictor,
                    &mut self.state,
                    out,
                ),
                Codec::Pcm16 => decode_raw(src, want, volume, add, &mut self.state, out),
            };
            self.start += consumed;
            n += produced;
            if produced == 0 {
                break;
            }
        }
        n
    }
}

/// Fill one stereo mix buffer from several voices. The buffer is zeroed,
/// then every voice is decoded additively at its own volume. A voice that
/// comes up short is rewound and continued when its loop flag is set,
/// otherwise it contributes silence for the rest of the buffer.
pub fn fill_buffer<S: Stream>(
    target: &mut [i32],
    n_samples: usize,
    voices: &mut [Expander<S>],
    looping: &[bool],
    volumes: &[i32],
    override_easing: bool,
) {
    target[..n_samples * 2].fill(0);

    for (i, voice) in voices.iter_mut().enumerate() {
        let volume = volumes[i];
        let mut n = 0;
        while n < n_samples {
            let got = voice.expand(
                &mut target[n * 2..n_samples * 2],
                n_samples - n,
                volume,
                true,
                override_easing,
            );
            n += got;
            if n == n_samples || !looping[i] || got == 0 {
                break;
            }
            voice.rewind();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode4, Predictor, State, TABLES_4};
    use crate::stream::MemStream;

    fn test_wave(n: usize) -> Vec<i16> {
        (0..n)
            .map(|i| {
                let t = i as f32 * 0.03;
                (2500.0 * t.sin() + 900.0 * (t * 3.7).sin()) as i16
            })
            .collect()
    }

    fn encoded(n: usize) -> (Vec<i16>, Vec<u8>) {
        let samples = test_wave(n);
        let (bytes, _) = encode4(&samples, &TABLES_4[0], Predictor::Velocity, &mut State::new());
        (samples, bytes)
    }

    fn expander(bytes: &[u8]) -> Expander<MemStream<'_>> {
        Expander::new(
            MemStream::new(bytes),
            Codec::Bit4,
            &TABLES_4[0],
            Predictor::Velocity,
        )
    }

    #[test]
    fn chunked_decode_matches_bulk() {
        let (samples, bytes) = encoded(1500);
        let n = samples.len();

        let mut bulk = vec![0i32; n * 2];
        let mut ex = expander(&bytes);
        assert_eq!(ex.expand(&mut bulk, n, 256, false, true), n);

        for chunks in [
            &[1usize][..],
            &[6][..],
            &[10][..],
            &[1024][..],
            &[1, 6, 10, 1024][..],
        ] {
            let mut out = vec![0i32; n * 2];
            let mut ex = expander(&bytes);
            let mut pos = 0;
            let mut first = true;
            'outer: loop {
                for &c in chunks {
                    let want = c.min(n - pos);
                    let got = ex.expand(&mut out[pos * 2..], want, 256, false, first);
                    first = false;
                    pos += got;
                    if pos == n || got < want {
                        break 'outer;
                    }
                }
            }
            assert_eq!(pos, n, "chunks {chunks:?}");
            assert_eq!(out, bulk, "chunks {chunks:?}");
        }
    }

    #[test]
    fn rewind_reproduces_first_pass() {
        let (samples, bytes) = encoded(700);
        let n = samples.len();
        let mut ex = expander(&bytes);

        let mut first = vec![0i32; n * 2];
        assert_eq!(ex.expand(&mut first, n, 256, false, true), n);

        ex.rewind();
        let mut second = vec![0i32; n * 2];
        assert_eq!(ex.expand(&mut second, n, 256, false, true), n);
        assert_eq!(first, second);
    }

    #[test]
    fn exhausted_stream_returns_short() {
        let (samples, bytes) = encoded(100);
        let mut ex = expander(&bytes);
        let mut out = vec![0i32; 400 * 2];
        let got = ex.expand(&mut out, 400, 256, false, true);
        assert_eq!(got, samples.len());
        assert_eq!(ex.expand(&mut out, 400, 256, false, true), 0);
    }

    #[test]
    fn fill_buffer_loops_a_short_voice() {
        let (samples, bytes) = encoded(96);
        let clip = samples.len();
        let n = clip * 3 + 17;

        let mut voices = [expander(&bytes)];
        let mut out = vec![0i32; n * 2];
        fill_buffer(&mut out, n, &mut voices, &[true], &[256], true);

        // Each pass restarts from a rewound state, so the output repeats
        // with the clip's period.
        for i in 0..n - clip {
            assert_eq!(out[i * 2], out[(i + clip) * 2], "sample {i}");
        }
    }

    #[test]
    fn fill_buffer_silences_a_finished_voice() {
        let (samples, bytes) = encoded(60);
        let clip = samples.len();
        let n = clip + 40;

        let mut voices = [expander(&bytes)];
        let mut out = vec![99i32; n * 2 + 2];
        out[n * 2] = 37;
        out[n * 2 + 1] = 53;
        fill_buffer(&mut out, n, &mut voices, &[false], &[256], true);

        for i in clip..n {
            assert_eq!(out[i * 2], 0);
            assert_eq!(out[i * 2 + 1], 0);
        }
        // Nothing past the requested frames is touched.
        assert_eq!(out[n * 2], 37);
        assert_eq!(out[n * 2 + 1], 53);
    }

    #[test]
    fn fill_buffer_mixes_voices_additively() {
        let (_, bytes) = encoded(128);
        let n = 64;

        let mut solo = [expander(&bytes)];
        let mut one = vec![0i32; n * 2];
        fill_buffer(&mut one, n, &mut solo, &[false], &[256], true);

        let mut duo = [expander(&bytes), expander(&bytes)];
        let mut two = vec![0i32; n * 2];
        fill_buffer(&mut two, n, &mut duo, &[false, false], &[256, 256], true);

        for i in 0..n * 2 {
            assert_eq!(two[i], one[i].saturating_add(one[i]));
        }
    }
}
