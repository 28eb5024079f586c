use nom::{
    IResult,
    bytes::complete::take,
    error::{Error, ErrorKind},
    number::complete::{be_u8, be_u24},
};

use super::{MessageVersion, describe_common, parse_common};
use crate::errors::Result;
use crate::structs::{DataDescription, DataSection, Identification, Section2, SectionLayout};

/// Editions 2 and 3 share the section 1 layout.
#[derive(Clone, Debug)]
pub struct BUFRMessageV3 {
    pub layout: SectionLayout,
    pub section1: Section1,
    pub section2: Option<Section2>,
    pub section3: DataDescription,
    pub section4: DataSection,
}

impl MessageVersion for BUFRMessageV3 {
    fn parse(input: &[u8]) -> Result<Self> {
        let layout = SectionLayout::scan(input)?;
        let (_, section1) = parse_section1(&input[layout.section(1)])?;
        let (section2, section3, section4) = parse_common(input, &layout)?;

        Ok(BUFRMessageV3 {
            layout,
            section1,
            section2,
            section3,
            section4,
        })
    }

    fn description(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "BUFR Message V{}:", self.layout.edition)?;
        writeln!(f, "Section 0:")?;
        writeln!(f, "  Length of message: {} bytes", self.layout.total_length)?;
        writeln!(f)?;
        writeln!(f, "{}", self.section1)?;
        writeln!(f)?;
        describe_common(f, &self.layout, &self.section3)
    }

    fn edition(&self) -> u8 {
        self.layout.edition
    }

    fn layout(&self) -> &SectionLayout {
        &self.layout
    }

    fn identification(&self) -> Identification {
        let s = &self.section1;
        let year_of_century = s.year_of_century as u16;
        Identification {
            master_table: s.master_table,
            centre: s.centre as u16,
            subcentre: s.subcentre as u16,
            update_sequence_number: s.update_sequence_number,
            optional_section_present: s.optional_section_present,
            data_category: s.data_category,
            international_subcategory: 0,
            local_subcategory: s.local_subcategory,
            master_table_version: s.master_table_version,
            local_table_version: s.local_table_version,
            year: if year_of_century <= 50 {
                2000 + year_of_century
            } else {
                1900 + year_of_century
            },
            month: s.month,
            day: s.day,
            hour: s.hour,
            minute: s.minute,
            second: 0,
        }
    }

    fn optional_section(&self) -> Option<&Section2> {
        self.section2.as_ref()
    }

    fn data_description(&self) -> &DataDescription {
        &self.section3
    }

    fn data_section(&self) -> &DataSection {
        &self.section4
    }
}

#[derive(Clone, Debug)]
pub struct Section1 {
    pub length: usize,
    pub master_table: u8,               // octet 4
    pub subcentre: u8,                  // octet 5
    pub centre: u8,                     // octet 6
    pub update_sequence_number: u8,     // octet 7
    pub optional_section_present: bool, // octet 8 bit1 (MSB)
    pub data_category: u8,              // octet 9
    pub local_subcategory: u8,          // octet 10
    pub master_table_version: u8,       // octet 11
    pub local_table_version: u8,        // octet 12
    pub year_of_century: u8,            // octet 13
    pub month: u8,                      // octet 14
    pub day: u8,                        // octet 15
    pub hour: u8,                       // octet 16
    pub minute: u8,                     // octet 17
    pub local_use: Vec<u8>,             // octet 18-
}

fn parse_section1(input: &[u8]) -> IResult<&[u8], Section1> {
    let (input, length_u24) = be_u24(input)?;
    let length = length_u24 as usize;

    const FIXED_LEN: usize = 17;
    if length < FIXED_LEN {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::LengthValue)));
    }

    let (input, master_table) = be_u8(input)?;
    let (input, subcentre) = be_u8(input)?;
    let (input, centre) = be_u8(input)?;
    let (input, update_sequence_number) = be_u8(input)?;
    let (input, flags) = be_u8(input)?;
    let optional_section_present = (flags & 0x80) != 0;

    let (input, data_category) = be_u8(input)?;
    let (input, local_subcategory) = be_u8(input)?;
    let (input, master_table_version) = be_u8(input)?;
    let (input, local_table_version) = be_u8(input)?;

    let (input, year_of_century) = be_u8(input)?;
    let (input, month) = be_u8(input)?;
    let (input, day) = be_u8(input)?;
    let (input, hour) = be_u8(input)?;
    let (input, minute) = be_u8(input)?;

    let (input, local_bytes) = take(length - FIXED_LEN)(input)?;

    Ok((
        input,
        Section1 {
            length,
            master_table,
            subcentre,
            centre,
            update_sequence_number,
            optional_section_present,
            data_category,
            local_subcategory,
            master_table_version,
            local_table_version,
            year_of_century,
            month,
            day,
            hour,
            minute,
            local_use: local_bytes.to_vec(),
        },
    ))
}

impl std::fmt::Display for Section1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Section 1:")?;
        writeln!(f, "  Length: {} bytes", self.length)?;
        writeln!(f)?;
        writeln!(f, "  Organization:")?;
        writeln!(f, "    Centre:              {:<5} (0x{:02X})", self.centre, self.centre)?;
        writeln!(
            f,
            "    Sub-centre:          {:<5} (0x{:02X})",
            self.subcentre, self.subcentre
        )?;
        writeln!(f, "    Update Sequence:     {}", self.update_sequence_number)?;
        writeln!(f)?;
        writeln!(f, "  Data Classification:")?;
        writeln!(f, "    Category:            {}", self.data_category)?;
        writeln!(f, "    Local Sub:           {}", self.local_subcategory)?;
        writeln!(f)?;
        writeln!(f, "  Table Versions:")?;
        writeln!(
            f,
            "    Master Table:        {} (v{})",
            self.master_table, self.master_table_version
        )?;
        writeln!(f, "    Local Table:         v{}", self.local_table_version)?;
        writeln!(f)?;
        writeln!(f, "  Observation Time:")?;
        writeln!(
            f,
            "    DateTime:            {:02}-{:02}-{:02} {:02}:{:02} (year of century)",
            self.year_of_century, self.month, self.day, self.hour, self.minute
        )?;
        writeln!(f)?;
        writeln!(f, "  Optional Data:")?;
        writeln!(
            f,
            "    Section 2 Present:   {}",
            if self.optional_section_present { "Yes" } else { "No" }
        )?;
        write!(f, "    Local Use Data:      {} bytes", self.local_use.len())
    }
}
