//! One-shot DEFLATE compression for ZIP entry payloads.
//!
//! The compressor runs in zlib mode and the framing is stripped afterwards:
//! a 2-byte header (CMF, FLG) in front and a 4-byte Adler-32 behind. What is
//! left is the raw deflate stream a ZIP entry with method 8 carries.

use flate2::{Compress, Compression, FlushCompress, Status};

/// Bytes of zlib framing around the raw deflate stream.
pub const ZLIB_FRAMING_OVERHEAD: usize = ZLIB_HEADER_LEN + ZLIB_TRAILER_LEN;

const ZLIB_HEADER_LEN: usize = 2;
const ZLIB_TRAILER_LEN: usize = 4;

/// Upper bound on the zlib-framed size of `len` input bytes.
///
/// Same bound as zlib's `compressBound`, which is enough for a single
/// `Finish` call to complete at any level.
pub fn deflate_bound(len: usize) -> usize {
    len + (len >> 12) + (len >> 14) + (len >> 25) + 13
}

/// Compress `data` at `level` (1..=9) into a raw deflate stream.
///
/// Returns `None` if the compressor fails or does not finish within
/// [`deflate_bound`]; callers store the data uncompressed instead.
pub fn deflate(data: &[u8], level: u32) -> Option<Vec<u8>> {
    let mut compressor = Compress::new(Compression::new(level), true);
    let mut out = Vec::with_capacity(deflate_bound(data.len()));

    match compressor.compress_vec(data, &mut out, FlushCompress::Finish) {
        Ok(Status::StreamEnd) => {}
        _ => return None,
    }

    if out.len() < ZLIB_FRAMING_OVERHEAD {
        return None;
    }
    out.truncate(out.len() - ZLIB_TRAILER_LEN);
    out.drain(..ZLIB_HEADER_LEN);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::DeflateDecoder;
    use std::io::Read;

    fn inflate(raw: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        DeflateDecoder::new(raw).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_raw_stream_inflates() {
        let data = b"abcabcabcabcabcabcabcabcabcabcabcabcabcabc".repeat(20);
        let raw = deflate(&data, 6).unwrap();

        assert!(raw.len() < data.len());
        assert_eq!(inflate(&raw), data);
    }

    #[test]
    fn test_every_level() {
        let data = b"the quick brown fox jumps over the lazy dog ".repeat(50);
        for level in 1..=9 {
            let raw = deflate(&data, level).unwrap();
            assert_eq!(inflate(&raw), data, "level {}", level);
        }
    }

    #[test]
    fn test_empty_input() {
        let raw = deflate(b"", 9).unwrap();
        assert!(inflate(&raw).is_empty());
    }

    #[test]
    fn test_incompressible_fits_bound() {
        // xorshift noise does not compress
        let mut state = 0x2545f491u32;
        let data: Vec<u8> = (0..70_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect();

        let raw = deflate(&data, 9).unwrap();
        assert!(raw.len() + ZLIB_FRAMING_OVERHEAD <= deflate_bound(data.len()));
        assert_eq!(inflate(&raw), data);
    }
}
