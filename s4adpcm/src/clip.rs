use crate::codec::Codec;

/// Header for a clip emitted as a standalone blob rather than packed into a
/// memory image. The image stores the same parameters in its unit records
/// instead, so payloads there are headerless.
pub const CLIP_MAGIC: [u8; 4] = *b"wv12";

pub const CLIP_HEADER_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    #[error("clip header has wrong magic (not 'wv12')")]
    WrongMagic,
    #[error("unknown codec id {0}")]
    BadCodec(u8),
    #[error("clip truncated: header says {expected} payload bytes, got {got}")]
    Truncated { expected: usize, got: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipHeader {
    pub payload_len: u32,
    pub n_samples: u32,
    pub codec: Codec,
}

impl ClipHeader {
    pub fn to_bytes(&self) -> [u8; CLIP_HEADER_LEN] {
        let mut buf = [0u8; CLIP_HEADER_LEN];
        buf[0..4].copy_from_slice(&CLIP_MAGIC);
        buf[4..8].copy_from_slice(&self.payload_len.to_le_bytes());
        buf[8..12].copy_from_slice(&self.n_samples.to_le_bytes());
        buf[12] = self.codec.id();
        buf
    }

    pub fn from_bytes(bytes: [u8; CLIP_HEADER_LEN]) -> Result<Self, ClipError> {
        if bytes[0..4] != CLIP_MAGIC {
            return Err(ClipError::WrongMagic);
        }
        let payload_len = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let n_samples = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        let codec = Codec::from_id(bytes[12]).ok_or(ClipError::BadCodec(bytes[12]))?;
        Ok(ClipHeader {
            payload_len,
            n_samples,
            codec,
        })
    }
}

/// Split a standalone clip blob into its header and payload.
pub fn parse_clip(bytes: &[u8]) -> Result<(ClipHeader, &[u8]), ClipError> {
    if bytes.len() < CLIP_HEADER_LEN {
        return Err(ClipError::Truncated {
            expected: CLIP_HEADER_LEN,
            got: bytes.len(),
        });
    }
    let header = ClipHeader::from_bytes(bytes[..CLIP_HEADER_LEN].try_into().unwrap())?;
    let payload = &bytes[CLIP_HEADER_LEN..];
    if payload.len() < header.payload_len as usize {
        return Err(ClipError::Truncated {
            expected: header.payload_len as usize,
            got: payload.len(),
        });
    }
    Ok((header, &payload[..header.payload_len as usize]))
}
