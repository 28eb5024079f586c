pub mod v3;
pub mod v4;

use super::{DataDescription, DataSection, Identification, Section2, SectionLayout, parse_section2};
use crate::errors::{Error, Result};

macro_rules! message {
    ($(($version:ident, $t: ty, $($v: literal)|+)),+$(,)?) => {
        #[derive(Clone, Debug)]
        pub enum BUFRMessage {
            $(
                $version($t),
            )+
        }

        impl MessageVersion for BUFRMessage {
            fn parse(input: &[u8]) -> Result<Self> {
                let layout = SectionLayout::scan(input)?;
                match layout.edition {
                    $(
                        $($v)|+ => {
                            let msg = <$t as MessageVersion>::parse(input)?;
                            Ok(BUFRMessage::$version(msg))
                        }
                    )+
                    _ => Err(Error::UnsupportedVersion(layout.edition)),
                }
            }

            fn description(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        BUFRMessage::$version(msg) => msg.description(f),
                    )+
                }
            }

            fn edition(&self) -> u8 {
                match self {
                    $(
                        BUFRMessage::$version(msg) => msg.edition(),
                    )+
                }
            }

            fn layout(&self) -> &SectionLayout {
                match self {
                    $(
                        BUFRMessage::$version(msg) => msg.layout(),
                    )+
                }
            }

            fn identification(&self) -> Identification {
                match self {
                    $(
                        BUFRMessage::$version(msg) => msg.identification(),
                    )+
                }
            }

            fn optional_section(&self) -> Option<&Section2> {
                match self {
                    $(
                        BUFRMessage::$version(msg) => msg.optional_section(),
                    )+
                }
            }

            fn data_description(&self) -> &DataDescription {
                match self {
                    $(
                        BUFRMessage::$version(msg) => msg.data_description(),
                    )+
                }
            }

            fn data_section(&self) -> &DataSection {
                match self {
                    $(
                        BUFRMessage::$version(msg) => msg.data_section(),
                    )+
                }
            }
        }
    };
}

message!((V3, v3::BUFRMessageV3, 2 | 3), (V4, v4::BUFRMessageV4, 4));

impl std::fmt::Display for BUFRMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.description(f)
    }
}

pub trait MessageVersion: Sized {
    fn parse(input: &[u8]) -> Result<Self>;

    fn description(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result;

    fn edition(&self) -> u8;

    fn layout(&self) -> &SectionLayout;

    fn identification(&self) -> Identification;

    fn optional_section(&self) -> Option<&Section2>;

    fn data_description(&self) -> &DataDescription;

    fn data_section(&self) -> &DataSection;

    fn center_id(&self) -> u16 {
        self.identification().centre
    }

    fn data_category(&self) -> u8 {
        self.identification().data_category
    }

    fn master_table_version(&self) -> u8 {
        self.identification().master_table_version
    }

    fn subsets_count(&self) -> u16 {
        self.data_description().number_of_subsets
    }

    fn is_compressed(&self) -> bool {
        self.data_description().is_compressed
    }

    fn descriptors(&self) -> &[tablelib::FXY] {
        &self.data_description().descriptors
    }
}

/// Sections 2 to 4, shared by every edition once section 1 is parsed.
pub(crate) fn parse_common(
    input: &[u8],
    layout: &SectionLayout,
) -> Result<(Option<Section2>, DataDescription, DataSection)> {
    let section2 = if layout.lengths[2] > 0 {
        let (_, sec2) = parse_section2(&input[layout.section(2)])?;
        Some(sec2)
    } else {
        None
    };
    let section3 = DataDescription::parse(&input[layout.section(3)])?;
    let section4 = DataSection::parse(&input[layout.section(4)], layout.offsets[4])?;
    Ok((section2, section3, section4))
}

/// Shared tail of the section dumps.
pub(crate) fn describe_common(
    f: &mut std::fmt::Formatter<'_>,
    layout: &SectionLayout,
    section3: &DataDescription,
) -> std::fmt::Result {
    writeln!(f, "Section 2:")?;
    writeln!(f, "  Length: {} bytes", layout.lengths[2])?;
    writeln!(f)?;
    writeln!(f, "Section 3:")?;
    writeln!(f, "  Length: {} bytes", section3.length)?;
    writeln!(f, "    Subsets:             {}", section3.number_of_subsets)?;
    writeln!(
        f,
        "    Observed:            {}",
        if section3.is_observation { "Yes" } else { "No" }
    )?;
    writeln!(
        f,
        "    Compressed:          {}",
        if section3.is_compressed { "Yes" } else { "No" }
    )?;
    writeln!(f, "    Descriptors:         {}", section3.descriptors.len())?;
    for (i, d) in section3.descriptors.iter().enumerate() {
        writeln!(f, "    {:>3} {}", i + 1, d)?;
    }
    writeln!(f)?;
    writeln!(f, "Section 4:")?;
    writeln!(f, "  Length: {} bytes", layout.lengths[4])?;
    writeln!(f)?;
    writeln!(f, "Section 5:")?;
    write!(f, "  Length: {} bytes", layout.lengths[5])
}
