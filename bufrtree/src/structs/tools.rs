use crate::errors::{Error, Result};
use nom::{IResult, bits::complete::take};
use tablelib::FXY;

type BitInput<'a> = (&'a [u8], usize);

/// Descriptors of section 3, two octets each. A trailing odd octet is
/// padding and is ignored.
pub(crate) fn parse_descriptors(input: &[u8]) -> Result<Vec<FXY>> {
    parse_descriptors_inner(input)
        .map(|(_, v)| v)
        .map_err(|_| Error::MalformedMessage("Can't parse descriptors from section 3".to_string()))
}

fn parse_descriptors_inner(mut input: &[u8]) -> IResult<BitInput<'_>, Vec<FXY>> {
    let mut results = Vec::with_capacity(input.len() / 2);
    while input.len() > 1 {
        let ((rest, _), fxy) = take_fxy((input, 0))?;
        results.push(fxy);
        input = rest;
    }

    Ok(((input, 0), results))
}

fn take_fxy(bit_input: BitInput) -> IResult<BitInput, FXY> {
    let (bit_input, f): (_, u8) = take(2usize)(bit_input)?;
    let (bit_input, x): (_, u8) = take(6usize)(bit_input)?;
    let (bit_input, y): (_, u8) = take(8usize)(bit_input)?;

    Ok((bit_input, FXY::new(f, x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpacks_descriptor_pairs() {
        // 3-01-001, 0-12-101, 1-01-000 and one padding octet
        let data = [0xC1, 0x01, 0x0C, 0x65, 0x41, 0x00, 0x00];
        let descs = parse_descriptors(&data).unwrap();
        assert_eq!(
            descs,
            vec![FXY::new(3, 1, 1), FXY::new(0, 12, 101), FXY::new(1, 1, 0)]
        );
    }
}
