use super::{CENTRE_ECMWF, CENTRE_NCEP, Decoder};
use crate::errors::{Error, Result};
use crate::item::Item;
use crate::structs::bit::BitReader;
use tablelib::{AEntry, FXY};
use tracing::debug;

const TABLE_A_ENTRY: FXY = FXY::new(0, 0, 1);
const TABLE_A_LINE1: FXY = FXY::new(0, 0, 2);
const TABLE_A_LINE2: FXY = FXY::new(0, 0, 3);
const NCEP_REPLICATION: FXY = FXY::new(1, 3, 0);

impl Decoder<'_> {
    /// Read the Table A entries leading a table-definition message and
    /// return how many descriptors they used. Nothing is added to the tree.
    pub(crate) fn read_table_a(&mut self, br: &mut BitReader, list: &[FXY]) -> Result<usize> {
        match self.params.centre {
            CENTRE_NCEP => self.read_table_a_ncep(br, list),
            CENTRE_ECMWF => self.read_table_a_ecmwf(br, list),
            centre => Err(Error::Unsupported(format!(
                "Table A definitions from originating centre {}",
                centre
            ))),
        }
    }

    fn expect_descriptor(list: &[FXY], idx: usize, expected: FXY) -> Result<()> {
        match list.get(idx) {
            Some(&fxy) if fxy == expected => Ok(()),
            found => Err(Error::StructuralMismatch(format!(
                "Table A definition expects {} at position {}, found {}",
                expected.dashed(),
                idx,
                found.map(|f| f.dashed()).unwrap_or_else(|| "nothing".into())
            ))),
        }
    }

    fn read_detached(&mut self, br: &mut BitReader, fxy: FXY) -> Result<String> {
        let mut item = Item::default();
        self.read_element(br, fxy, &mut item, false)?;
        Ok(item.as_string().to_string())
    }

    fn read_a_entry(&mut self, br: &mut BitReader) -> Result<AEntry> {
        let entry = self.read_detached(br, TABLE_A_ENTRY)?;
        let line1 = self.read_detached(br, TABLE_A_LINE1)?;
        let line2 = self.read_detached(br, TABLE_A_LINE2)?;
        Ok(AEntry {
            entry,
            description: format!("{}{}", line1, line2),
        })
    }

    fn read_table_a_ncep(&mut self, br: &mut BitReader, list: &[FXY]) -> Result<usize> {
        Self::expect_descriptor(list, 0, NCEP_REPLICATION)?;
        let count = list
            .get(1)
            .copied()
            .filter(|f| f.f() == 0 && f.x() == 31)
            .ok_or_else(|| {
                Error::StructuralMismatch("Table A replication needs a 0-31-YYY factor".into())
            })?;
        let bits = match count.y() {
            0 => 1,
            1 => 8,
            2 => 16,
            _ => {
                return Err(Error::StructuralMismatch(format!(
                    "unknown Table A replication factor {}",
                    count.dashed()
                )));
            }
        };
        let niter = br.get_int(bits)?;

        for (idx, fxy) in [TABLE_A_ENTRY, TABLE_A_LINE1, TABLE_A_LINE2]
            .into_iter()
            .enumerate()
        {
            Self::expect_descriptor(list, idx + 2, fxy)?;
        }
        for _ in 0..niter {
            let entry = self.read_a_entry(br)?;
            self.definitions.a.push(entry);
        }
        debug!("Read {} Table A entries", niter);
        Ok(5)
    }

    fn read_table_a_ecmwf(&mut self, br: &mut BitReader, list: &[FXY]) -> Result<usize> {
        for (idx, fxy) in [TABLE_A_ENTRY, TABLE_A_LINE1, TABLE_A_LINE2]
            .into_iter()
            .enumerate()
        {
            Self::expect_descriptor(list, idx, fxy)?;
        }
        let entry = self.read_a_entry(br)?;
        self.definitions.a.push(entry);

        // master table, edition and table versions
        let versions = list.get(3..7).ok_or_else(|| {
            Error::StructuralMismatch("Table A definition is missing the version elements".into())
        })?;
        for &fxy in versions {
            let version = self.read_detached(br, fxy)?;
            debug!("{} = {}", fxy, version.trim());
        }
        Ok(7)
    }
}
