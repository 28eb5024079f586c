use crate::errors::{Error, Result};
use nom::{
    IResult,
    bytes::complete::{tag, take},
    number::complete::{be_u8, be_u16, be_u24},
};
use tablelib::FXY;

pub mod bit;
pub(crate) mod tools;
pub mod versions;

pub const SECTION0_LENGTH: usize = 8;
pub const SECTION5_LENGTH: usize = 4;

#[inline]
pub fn skip(n: usize) -> impl Fn(&[u8]) -> IResult<&[u8], ()> {
    move |input: &[u8]| {
        let (input, _) = take(n)(input)?;
        Ok((input, ()))
    }
}

#[inline]
pub fn skip1(input: &[u8]) -> IResult<&[u8], ()> {
    skip(1)(input)
}

fn be_u24_at(input: &[u8], at: usize) -> Result<usize> {
    input
        .get(at..at + 3)
        .map(|b| u32::from_be_bytes([0, b[0], b[1], b[2]]) as usize)
        .ok_or_else(|| Error::MalformedMessage(format!("section length at octet {} is truncated", at)))
}

/// Offsets and lengths of sections 0 to 5 within one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLayout {
    pub total_length: usize,
    pub edition: u8,
    pub offsets: [usize; 6],
    pub lengths: [usize; 6],
}

impl SectionLayout {
    /// Walk the six sections, checking that each starts inside the message,
    /// that the lengths add up to the declared total and that the message
    /// ends with "7777".
    pub fn scan(input: &[u8]) -> Result<Self> {
        let (_, (total_length, edition)) = parse_section0(input)?;
        let total_length = total_length as usize;
        if input.len() < total_length {
            return Err(Error::MalformedMessage(format!(
                "declared length {} exceeds the {} bytes available",
                total_length,
                input.len()
            )));
        }

        let mut offsets = [0usize; 6];
        let mut lengths = [0usize; 6];
        lengths[0] = SECTION0_LENGTH;

        let check = |section: usize, offset: usize| -> Result<usize> {
            if offset >= total_length {
                return Err(Error::MalformedMessage(format!(
                    "section {} starts at {} past message length {}",
                    section, offset, total_length
                )));
            }
            Ok(offset)
        };

        offsets[1] = check(1, SECTION0_LENGTH)?;
        lengths[1] = be_u24_at(input, offsets[1])?;

        offsets[2] = check(2, offsets[1] + lengths[1])?;
        let flag_octet = match edition {
            4 => 9,
            _ => 7,
        };
        let flags = input.get(offsets[1] + flag_octet).copied().unwrap_or(0);
        if flags & 0x80 != 0 {
            lengths[2] = be_u24_at(input, offsets[2])?;
        }

        offsets[3] = check(3, offsets[2] + lengths[2])?;
        lengths[3] = be_u24_at(input, offsets[3])?;

        offsets[4] = check(4, offsets[3] + lengths[3])?;
        lengths[4] = be_u24_at(input, offsets[4])?;

        offsets[5] = check(5, offsets[4] + lengths[4])?;
        lengths[5] = SECTION5_LENGTH;

        let sum: usize = lengths.iter().sum();
        if sum != total_length {
            return Err(Error::MalformedMessage(format!(
                "message length {} != sum of section lengths {}",
                total_length, sum
            )));
        }

        if &input[offsets[5]..offsets[5] + SECTION5_LENGTH] != b"7777" {
            return Err(Error::MalformedMessage("7777 not found at end of message".to_string()));
        }

        Ok(SectionLayout {
            total_length,
            edition,
            offsets,
            lengths,
        })
    }

    #[inline]
    pub fn section(&self, n: usize) -> std::ops::Range<usize> {
        self.offsets[n]..self.offsets[n] + self.lengths[n]
    }
}

pub(crate) fn parse_section0(input: &[u8]) -> IResult<&[u8], (u32, u8)> {
    let (input, _) = tag("BUFR")(input)?;
    let (input, total_length) = be_u24(input)?;
    let (input, edition) = be_u8(input)?;
    Ok((input, (total_length, edition)))
}

/// Section 1 fields, independent of edition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    pub master_table: u8,
    pub centre: u16,
    pub subcentre: u16,
    pub update_sequence_number: u8,
    pub optional_section_present: bool,
    pub data_category: u8,
    pub international_subcategory: u8,
    pub local_subcategory: u8,
    pub master_table_version: u8,
    pub local_table_version: u8,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

#[derive(Debug, Clone)]
pub struct Section2 {
    pub length: usize,
    pub data: Vec<u8>,
}

pub(crate) fn parse_section2(input: &[u8]) -> IResult<&[u8], Section2> {
    let (input, length) = be_u24(input)?;
    let (input, _) = skip1(input)?;
    let (input, data) = take((length as usize).saturating_sub(4))(input)?;
    Ok((
        input,
        Section2 {
            length: length as usize,
            data: data.to_vec(),
        },
    ))
}

/// Section 3.
#[derive(Debug, Clone)]
pub struct DataDescription {
    pub length: usize,
    pub number_of_subsets: u16,
    pub is_observation: bool,
    pub is_compressed: bool,
    pub descriptors: Vec<FXY>,
}

pub(crate) fn parse_section3(input: &[u8]) -> IResult<&[u8], (usize, u16, u8, &[u8])> {
    let (input, length) = be_u24(input)?;
    let (input, _) = skip1(input)?;
    let (input, number_of_subsets) = be_u16(input)?;
    let (input, flags) = be_u8(input)?;
    let (input, data) = take((length as usize).saturating_sub(7))(input)?;
    Ok((input, (length as usize, number_of_subsets, flags, data)))
}

impl DataDescription {
    pub(crate) fn parse(input: &[u8]) -> Result<Self> {
        let (_, (length, number_of_subsets, flags, data)) = parse_section3(input)?;
        Ok(DataDescription {
            length,
            number_of_subsets,
            is_observation: flags & 0b1000_0000 != 0,
            is_compressed: flags & 0b0100_0000 != 0,
            descriptors: tools::parse_descriptors(data)?,
        })
    }
}

/// Section 4 payload without its 4-octet header.
#[derive(Debug, Clone)]
pub struct DataSection {
    pub length: usize,
    pub data: Vec<u8>,
    /// Absolute bit position of `data[0]` in the message.
    pub bit_offset: usize,
}

impl DataSection {
    pub(crate) fn parse(input: &[u8], section_offset: usize) -> Result<Self> {
        let (input, length) = be_u24::<_, nom::error::Error<&[u8]>>(input)?;
        let (input, _) = skip1(input)?;
        let (_, data) = take::<_, _, nom::error::Error<&[u8]>>((length as usize).saturating_sub(4))(input)?;
        Ok(DataSection {
            length: length as usize,
            data: data.to_vec(),
            bit_offset: (section_offset + 4) * 8,
        })
    }

    pub fn reader(&self) -> bit::BitReader<'_> {
        bit::BitReader::new(&self.data, self.data.len() * 8, self.bit_offset)
    }
}
