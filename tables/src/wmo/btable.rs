use super::EntryLoader;
use crate::{FXY, tables::BTableEntry};

#[derive(Default)]
pub struct BTableCsvLoader;

#[derive(Debug, serde::Deserialize)]
pub struct RawBTableEntry {
    #[serde(rename = "ClassNo")]
    pub class_no: Option<String>,
    #[serde(rename = "ClassName_en")]
    pub class_name_en: Option<String>,
    #[serde(rename = "FXY")]
    pub fxy: String,
    #[serde(rename = "ElementName_en")]
    pub element_name_en: String,
    #[serde(rename = "BUFR_Unit")]
    pub bufr_unit: String,
    #[serde(rename = "BUFR_Scale")]
    pub bufr_scale: i32,
    #[serde(rename = "BUFR_ReferenceValue")]
    pub bufr_reference_value: i32,
    #[serde(rename = "BUFR_DataWidth_Bits")]
    pub bufr_datawidth_bits: u32,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
}

impl EntryLoader for BTableCsvLoader {
    type RawEntry = RawBTableEntry;
    type Output = BTableEntry;

    fn process_entry(&mut self, raw: Self::RawEntry) -> anyhow::Result<Option<Self::Output>> {
        let fxy: FXY = raw.fxy.parse()?;

        Ok(Some(BTableEntry::new(
            fxy,
            "",
            raw.element_name_en,
            raw.bufr_unit,
            raw.bufr_scale,
            raw.bufr_reference_value,
            raw.bufr_datawidth_bits,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wmo::TableLoader;

    const CSV: &str = "\
ClassNo,ClassName_en,FXY,ElementName_en,BUFR_Unit,BUFR_Scale,BUFR_ReferenceValue,BUFR_DataWidth_Bits,CREX_Unit,CREX_Scale,CREX_DataWidth_Char,Note_en,noteIDs,Status
01,Identification,001001,WMO block number,Numeric,0,0,7,Numeric,0,2,,,Operational
12,Temperature,012101,Temperature/air temperature,K,2,0,16,Â°C,2,4,,,Operational
12,Temperature,01210x,Broken row,K,2,0,16,C,2,4,,,Operational
20,Observed phenomena,020003,Present weather,Code table,0,0,9,Code table,0,3,,,Operational
";

    #[test]
    fn loads_wmo_rows_and_skips_bad_ones() {
        let entries = TableLoader::<BTableCsvLoader>::default()
            .load_from_reader(CSV.as_bytes(), "inline", &mut BTableCsvLoader)
            .unwrap();

        assert_eq!(entries.len(), 3);
        let t = &entries[1];
        assert_eq!(t.fxy, FXY::new(0, 12, 101));
        assert_eq!(t.scale, 2);
        assert_eq!(t.bit_width, 16);
        assert_eq!(t.unit, "K");
        assert!(entries[2].is_code());
    }
}
