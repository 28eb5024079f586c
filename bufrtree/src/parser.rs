use crate::block::BUFRFile;
use crate::errors::Result;
use crate::structs::versions::{BUFRMessage, MessageVersion};
use flate2::read::GzDecoder;
use std::{fs::File, io::Read, path::Path};
use tracing::{debug, info, warn};

const BUFR_PATTERN: &[u8] = b"BUFR";
const END_PATTERN: &[u8] = b"7777";
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Smallest possible message (368 bits).
pub const MIN_MESSAGE_LENGTH: usize = 46;

pub fn parse<P: AsRef<Path>>(path: P) -> Result<BUFRFile> {
    let mut bytes = vec![];
    File::open(path.as_ref())?.read_to_end(&mut bytes)?;
    info!("Read {} bytes from {}", bytes.len(), path.as_ref().display());
    parse_bytes(&bytes)
}

/// Split a (possibly gzipped) buffer into messages.
pub fn parse_bytes(bytes: &[u8]) -> Result<BUFRFile> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut gz_decoder = GzDecoder::new(bytes);
        let mut inflated = vec![];
        gz_decoder.read_to_end(&mut inflated)?;
        debug!("Inflated gzip input to {} bytes", inflated.len());
        return Ok(parse_inner(&inflated));
    }
    Ok(parse_inner(bytes))
}

/// Find the next framed message at or after `start`.
///
/// A candidate needs the "BUFR" magic, edition 2, 3 or 4, a declared length
/// of at least 46 bytes that fits in the buffer, and "7777" as its last four
/// octets. Anything else resumes the scan one byte further.
pub fn locate_next_message(buffer: &[u8], start: usize) -> Option<(usize, usize)> {
    let mut pos = start;
    while pos + 8 <= buffer.len() {
        let found = buffer[pos..]
            .windows(BUFR_PATTERN.len())
            .position(|w| w == BUFR_PATTERN)?;
        pos += found;

        if let Some(length) = framed_length(buffer, pos) {
            return Some((pos, length));
        }
        pos += 1;
    }
    None
}

fn framed_length(buffer: &[u8], pos: usize) -> Option<usize> {
    let header = buffer.get(pos..pos + 8)?;
    if !matches!(header[7], 2..=4) {
        return None;
    }
    let length = u32::from_be_bytes([0, header[4], header[5], header[6]]) as usize;
    if length < MIN_MESSAGE_LENGTH || pos + length > buffer.len() {
        return None;
    }
    (&buffer[pos + length - 4..pos + length] == END_PATTERN).then_some(length)
}

/// Every framed message in `buffer`, as (offset, length).
pub fn message_offsets(buffer: &[u8]) -> Vec<(usize, usize)> {
    let mut offsets = vec![];
    let mut pos = 0;
    while let Some((offset, length)) = locate_next_message(buffer, pos) {
        offsets.push((offset, length));
        pos = offset + length;
    }
    offsets
}

fn parse_inner(buffer: &[u8]) -> BUFRFile {
    let mut file_block = BUFRFile::new();

    for (offset, length) in message_offsets(buffer) {
        match BUFRMessage::parse(&buffer[offset..offset + length]) {
            Ok(message) => {
                debug!(
                    "Message at offset {}: edition {}, {} bytes",
                    offset,
                    message.edition(),
                    length
                );
                file_block.push_message(message, offset);
            }
            Err(e) => {
                warn!("Failed to parse BUFR message at offset {}: {}", offset, e);
            }
        }
    }

    file_block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(edition: u8, length: usize) -> Vec<u8> {
        let mut m = vec![0u8; length];
        m[..4].copy_from_slice(BUFR_PATTERN);
        m[4..7].copy_from_slice(&(length as u32).to_be_bytes()[1..]);
        m[7] = edition;
        m[length - 4..].copy_from_slice(END_PATTERN);
        m
    }

    #[test]
    fn locates_messages_behind_garbage() {
        let mut buf = b"GARBAGE BUFR".to_vec();
        buf.extend(framed(4, 50));
        buf.extend(b"xx");
        buf.extend(framed(3, 46));

        let offsets = message_offsets(&buf);
        assert_eq!(offsets, vec![(12, 50), (64, 46)]);
    }

    #[test]
    fn skips_bad_candidates() {
        // unknown edition
        assert_eq!(locate_next_message(&framed(5, 50), 0), None);
        // too short
        assert_eq!(locate_next_message(&framed(4, 40), 0), None);
        // truncated
        let m = framed(4, 60);
        assert_eq!(locate_next_message(&m[..55], 0), None);
        // no terminator
        let mut m = framed(4, 50);
        m[49] = 0;
        assert_eq!(locate_next_message(&m, 0), None);
    }

    #[test]
    fn gzip_input_is_inflated() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let mut encoder = GzEncoder::new(vec![], Compression::default());
        encoder.write_all(&framed(4, 50)).unwrap();
        let gz = encoder.finish().unwrap();

        // the framed bytes are not a parsable message, so nothing is kept
        let file = parse_bytes(&gz).unwrap();
        assert_eq!(file.message_count(), 0);
    }
}
