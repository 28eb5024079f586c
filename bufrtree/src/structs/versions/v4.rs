use nom::{
    IResult,
    bytes::complete::take,
    error::{Error, ErrorKind},
    number::complete::{be_u8, be_u16, be_u24},
};

use super::{MessageVersion, describe_common, parse_common};
use crate::errors::Result;
use crate::structs::{DataDescription, DataSection, Identification, Section2, SectionLayout};

#[derive(Clone, Debug)]
pub struct BUFRMessageV4 {
    pub layout: SectionLayout,
    pub section1: Section1,
    pub section2: Option<Section2>,
    pub section3: DataDescription,
    pub section4: DataSection,
}

impl MessageVersion for BUFRMessageV4 {
    fn parse(input: &[u8]) -> Result<Self> {
        let layout = SectionLayout::scan(input)?;
        let (_, section1) = parse_section1(&input[layout.section(1)])?;
        let (section2, section3, section4) = parse_common(input, &layout)?;

        Ok(BUFRMessageV4 {
            layout,
            section1,
            section2,
            section3,
            section4,
        })
    }

    fn description(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "BUFR Message V4:")?;
        writeln!(f, "Section 0:")?;
        writeln!(f, "  Length of message: {} bytes", self.layout.total_length)?;
        writeln!(f)?;
        writeln!(f, "{}", self.section1)?;
        writeln!(f)?;
        describe_common(f, &self.layout, &self.section3)
    }

    fn edition(&self) -> u8 {
        4
    }

    fn layout(&self) -> &SectionLayout {
        &self.layout
    }

    fn identification(&self) -> Identification {
        let s = &self.section1;
        Identification {
            master_table: s.master_table,
            centre: s.centre,
            subcentre: s.subcentre,
            update_sequence_number: s.update_sequence_number,
            optional_section_present: s.optional_section_present,
            data_category: s.data_category,
            international_subcategory: s.international_data_subcategory,
            local_subcategory: s.local_subcategory,
            master_table_version: s.master_table_version,
            local_table_version: s.local_table_version,
            year: s.year,
            month: s.month,
            day: s.day,
            hour: s.hour,
            minute: s.minute,
            second: s.second,
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
    pub length: usize,                      // octet 1-3
    pub master_table: u8,                   // octet 4
    pub centre: u16,                        // octet 5-6
    pub subcentre: u16,                     // octet 7-8
    pub update_sequence_number: u8,         // octet 9
    pub optional_section_present: bool,     // octet 10 bit1
    pub data_category: u8,                  // octet 11
    pub international_data_subcategory: u8, // octet 12
    pub local_subcategory: u8,              // octet 13
    pub master_table_version: u8,           // octet 14
    pub local_table_version: u8,            // octet 15
    pub year: u16,                          // octet 16-17
    pub month: u8,                          // octet 18
    pub day: u8,                            // octet 19
    pub hour: u8,                           // octet 20
    pub minute: u8,                         // octet 21
    pub second: u8,                         // octet 22
    pub local_use: Vec<u8>,                 // octet 23-
}

fn parse_section1(input: &[u8]) -> IResult<&[u8], Section1> {
    let (input, length_u24) = be_u24(input)?;
    let length = length_u24 as usize;

    const FIXED_LEN: usize = 22;
    if length < FIXED_LEN {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::LengthValue)));
    }

    let (input, master_table) = be_u8(input)?;
    let (input, centre) = be_u16(input)?;
    let (input, subcentre) = be_u16(input)?;
    let (input, update_sequence_number) = be_u8(input)?;

    let (input, flags) = be_u8(input)?;
    let optional_section_present = (flags & 0x80) != 0;

    let (input, data_category) = be_u8(input)?;
    let (input, international_data_subcategory) = be_u8(input)?;
    let (input, local_subcategory) = be_u8(input)?;
    let (input, master_table_version) = be_u8(input)?;
    let (input, local_table_version) = be_u8(input)?;

    let (input, year) = be_u16(input)?;
    let (input, month) = be_u8(input)?;
    let (input, day) = be_u8(input)?;
    let (input, hour) = be_u8(input)?;
    let (input, minute) = be_u8(input)?;
    let (input, second) = be_u8(input)?;

    let (input, local_bytes) = take(length - FIXED_LEN)(input)?;

    Ok((
        input,
        Section1 {
            length,
            master_table,
            centre,
            subcentre,
            update_sequence_number,
            optional_section_present,
            data_category,
            international_data_subcategory,
            local_subcategory,
            master_table_version,
            local_table_version,
            year,
            month,
            day,
            hour,
            minute,
            second,
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
        writeln!(f, "    Centre:              {:<5} (0x{:04X})", self.centre, self.centre)?;
        writeln!(
            f,
            "    Sub-centre:          {:<5} (0x{:04X})",
            self.subcentre, self.subcentre
        )?;
        writeln!(f, "    Update Sequence:     {}", self.update_sequence_number)?;
        writeln!(f)?;
        writeln!(f, "  Data Classification:")?;
        writeln!(f, "    Category:            {}", self.data_category)?;
        writeln!(
            f,
            "    International Sub:   {}",
            self.international_data_subcategory
        )?;
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
            "    DateTime:            {:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
            self.year, self.month, self.day, self.hour, self.minute, self.second
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
