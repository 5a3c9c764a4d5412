use rayon::prelude::*;

use s4adpcm::{
    encode4, encode8, encode_raw, table_for, Codec, Expander, MemStream, Predictor, State,
    N_TABLES_4, N_TABLES_8,
};

/// One clip's winning encode: the payload plus the parameters the image
/// records so the decoder can mirror it.
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub codec: Codec,
    pub table: u8,
    pub predictor: Predictor,
    pub mse: u64,
}

// Encode with one candidate tuning, then decode the result through the real
// playback path and measure against the source. Scoring on the decoded
// output (rather than the encoder's own running error) also catches any
// asymmetry between the two halves.
fn trial(samples: &[i16], codec: Codec, table: u8, predictor: Predictor) -> Compressed {
    let bytes = match codec {
        Codec::Bit4 => {
            encode4(samples, table_for(codec, table), predictor, &mut State::new()).0
        }
        Codec::Bit8 => {
            encode8(samples, table_for(codec, table), predictor, &mut State::new()).0
        }
        Codec::Pcm16 => encode_raw(samples),
    };

    let mut out = vec![0i32; samples.len() * 2];
    let mut expander = Expander::new(
        MemStream::new(&bytes),
        codec,
        table_for(codec, table),
        predictor,
    );
    let produced = expander.expand(&mut out, samples.len(), 256, false, true);
    debug_assert_eq!(produced, samples.len());

    let sum_sq: u64 = samples
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let e = (s as i32 - out[i * 2] / 65536) as i64;
            (e * e) as u64
        })
        .sum();
    let mse = if samples.is_empty() {
        0
    } else {
        sum_sq / samples.len() as u64
    };

    Compressed {
        bytes,
        codec,
        table,
        predictor,
        mse,
    }
}

/// Try every candidate `(table, predictor)` pair for the requested codec and
/// keep the lowest-error result. Trials are independent pure computations,
/// so they fan out across the thread pool; ties go to the earliest
/// candidate, which keeps the choice reproducible.
pub fn compress_best(samples: &[i16], codec: Codec) -> Compressed {
    let predictors = [Predictor::Velocity, Predictor::Previous];
    let candidates: Vec<(u8, Predictor)> = match codec {
        Codec::Bit4 => (0..N_TABLES_4 as u8)
            .flat_map(|t| predictors.map(|p| (t, p)))
            .collect(),
        Codec::Bit8 => (0..N_TABLES_8 as u8)
            .flat_map(|t| predictors.map(|p| (t, p)))
            .collect(),
        Codec::Pcm16 => vec![(0, Predictor::Velocity)],
    };

    candidates
        .par_iter()
        .enumerate()
        .map(|(i, &(table, predictor))| (i, trial(samples, codec, table, predictor)))
        .min_by_key(|(i, c)| (c.mse, *i))
        .map(|(_, c)| c)
        .expect("candidate set is never empty")
}
