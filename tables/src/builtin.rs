//! Class 00 elements needed to read table-definition messages (data
//! category 11) before any other table is available.

use crate::FXY;
use crate::tables::{BTableEntry, BUFRTableB};

const IA5: &str = "CCITT_IA5";

// (y, mnemonic, description, bit width)
const CLASS_00: &[(u8, &str, &str, u32)] = &[
    (1, "TABLAE", "Table A: entry", 24),
    (2, "TABLAD1", "Table A: data category description, line 1", 256),
    (3, "TABLAD2", "Table A: data category description, line 2", 256),
    (4, "MTABL", "BUFR/CREX Master table", 16),
    (5, "BUFREDN", "BUFR/CREX edition number", 24),
    (6, "BMTVN", "BUFR Master table version number", 16),
    (7, "CMTVN", "CREX Master table version number", 16),
    (8, "BLTVN", "BUFR Local table version number", 16),
    (10, "FDESC", "F descriptor to be added or defined", 8),
    (11, "XDESC", "X descriptor to be added or defined", 16),
    (12, "YDESC", "Y descriptor to be added or defined", 24),
    (13, "ELEMNA1", "Element name, line 1", 256),
    (14, "ELEMNA2", "Element name, line 2", 256),
    (15, "UNITSNA", "Units name", 192),
    (16, "SCALESG", "Units scale sign", 8),
    (17, "SCALEU", "Units scale", 24),
    (18, "REFERSG", "Units reference sign", 8),
    (19, "REFERVA", "Units reference value", 80),
    (20, "ELEMDWD", "Element data width", 24),
    (24, "CODFIG", "Code figure", 64),
    (25, "CODFIGM", "Code figure meaning", 496),
    (26, "BITNUM", "Bit number", 48),
    (27, "BITNUMM", "Bit number meaning", 496),
    (30, "DDSEQ", "Descriptor defining sequence", 48),
];

pub fn bootstrap_entries() -> Vec<BTableEntry> {
    let mut entries: Vec<BTableEntry> = CLASS_00
        .iter()
        .map(|&(y, mnemonic, description, width)| {
            BTableEntry::new(FXY::new(0, 0, y), mnemonic, description, IA5, 0, 0, width)
        })
        .collect();

    entries.push(BTableEntry::new(
        FXY::new(0, 31, 1),
        "DRF8BIT",
        "Delayed descriptor replication factor",
        "Numeric",
        0,
        0,
        8,
    ));
    entries.push(BTableEntry::new(
        FXY::new(0, 31, 2),
        "DRF16BIT",
        "Extended delayed descriptor replication factor",
        "Numeric",
        0,
        0,
        16,
    ));
    entries
}

pub fn bootstrap_table_b() -> BUFRTableB {
    BUFRTableB::from_entries(bootstrap_entries())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_00_is_character_data() {
        let table = bootstrap_table_b();
        assert_eq!(table.len(), CLASS_00.len() + 2);

        let f = table.lookup(&FXY::new(0, 0, 10)).unwrap();
        assert_eq!(f.bit_width, 8);
        assert_eq!(f.mnemonic, "FDESC");
        assert!(!f.is_numeric());

        let seq = table.lookup(&FXY::new(0, 0, 30)).unwrap();
        assert_eq!(seq.bit_width, 48);
        assert!(table.lookup(&FXY::new(0, 0, 9)).is_none());
    }
}
