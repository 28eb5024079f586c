use crate::errors::{Error, Result};
use encoding_rs::WINDOWS_1252;

const OCTET: usize = 8;

/// Text returned for character fields whose octets are all 0xFF.
pub const MISSING_STRING: &str = "MISSING";

#[inline]
fn mask(bits: usize) -> u32 {
    if bits >= 32 { u32::MAX } else { (1u32 << bits) - 1 }
}

/// MSB-first cursor over the data section.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    buffer: &'a [u8],
    length: usize,
    position: usize,
    offset: usize,
}

impl<'a> BitReader<'a> {
    /// `length` is in bits and is clamped to the buffer. `offset` is the
    /// absolute bit position of `buffer[0]` in the message.
    pub fn new(buffer: &'a [u8], length: usize, offset: usize) -> Self {
        BitReader {
            buffer,
            length: length.min(buffer.len() * OCTET),
            position: 0,
            offset,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Cursor position counted from the start of the message.
    #[inline]
    pub fn absolute_position(&self) -> usize {
        self.offset + self.position
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    #[inline]
    pub fn remaining_bits(&self) -> usize {
        self.length.saturating_sub(self.position)
    }

    fn ensure(&self, bits: usize) -> Result<()> {
        if self.position + bits > self.length {
            return Err(Error::BitReaderOverrun {
                position: self.position,
                bits,
                length: self.length,
            });
        }
        Ok(())
    }

    pub fn skip_bits(&mut self, bits: usize) -> Result<()> {
        self.ensure(bits)?;
        self.position += bits;
        Ok(())
    }

    pub fn get_int(&mut self, bits: usize) -> Result<u32> {
        if bits == 0 || bits > 32 {
            return Err(Error::InvalidArgument(format!(
                "get_int takes 1..=32 bits, got {}",
                bits
            )));
        }
        self.ensure(bits)?;

        let mut octet = self.position / OCTET;
        let start = self.position % OCTET;
        let buf = self.buffer;

        let value = if start + bits <= OCTET {
            (buf[octet] as u32 >> (OCTET - bits - start)) & mask(bits)
        } else {
            // tail of the first octet
            let mut taken = OCTET - start;
            let mut value = buf[octet] as u32 & mask(taken);
            octet += 1;
            while bits - taken >= OCTET {
                value = (value << OCTET) | buf[octet] as u32;
                octet += 1;
                taken += OCTET;
            }
            // head of the last octet
            let last = bits - taken;
            if last > 0 {
                value = (value << last) | ((buf[octet] as u32 >> (OCTET - last)) & mask(last));
            }
            value
        };

        self.position += bits;
        Ok(value)
    }

    pub fn get_string(&mut self, bits: usize) -> Result<String> {
        if bits == 0 || bits % OCTET != 0 {
            return Err(Error::InvalidArgument(format!(
                "get_string takes a positive multiple of 8 bits, got {}",
                bits
            )));
        }
        self.ensure(bits)?;

        let octet = self.position / OCTET;
        let lshift = self.position % OCTET;
        let len = bits / OCTET;
        let buf = self.buffer;

        let raw: Vec<u8> = if lshift == 0 {
            buf[octet..octet + len].to_vec()
        } else {
            let rshift = OCTET - lshift;
            (0..len)
                .map(|i| {
                    let next = buf.get(octet + i + 1).copied().unwrap_or(0);
                    (buf[octet + i] << lshift) | (next >> rshift)
                })
                .collect()
        };

        self.position += bits;

        if raw.iter().all(|&b| b == 0xFF) {
            return Ok(MISSING_STRING.to_string());
        }

        Ok(match String::from_utf8(raw) {
            Ok(s) => s,
            Err(e) => WINDOWS_1252.decode(e.as_bytes()).0.into_owned(),
        })
    }
}

/// True when the low `bits` bits of `value` are all set.
#[inline]
pub fn is_all_ones(value: u32, bits: usize) -> bool {
    bits > 0 && value & mask(bits) == mask(bits)
}
