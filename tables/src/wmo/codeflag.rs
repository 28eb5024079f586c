use super::EntryLoader;
use crate::{FXY, tables::FTableEntry};
use anyhow::{Context, bail};

#[derive(Default)]
pub struct CodeFlagCsvLoader;

#[derive(Debug, serde::Deserialize)]
pub struct RawCodeFlagEntry {
    #[serde(rename = "FXY")]
    pub fxy: String,
    #[serde(rename = "ElementName_en")]
    pub element_name_en: Option<String>,
    #[serde(rename = "CodeFigure")]
    pub code_figure: String,
    #[serde(rename = "EntryName_en")]
    pub entry_name_en: Option<String>,
    #[serde(rename = "EntryName_sub1_en", default)]
    pub entry_name_sub1_en: Option<String>,
    #[serde(rename = "EntryName_sub2_en", default)]
    pub entry_name_sub2_en: Option<String>,
    #[serde(rename = "DependsOn_FXY", default)]
    pub depends_on_fxy: Option<String>,
    #[serde(rename = "DependsOn_Value", default)]
    pub depends_on_value: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
}

/// "12", "3-5" or "3–5" (en dash, as in the WMO distribution).
fn parse_code_figure(figure: &str) -> anyhow::Result<(u32, u32)> {
    let figure = figure.trim();
    if let Some((low, high)) = figure.split_once(['-', '–']) {
        let low: u32 = low.trim().parse().context("Bad range start")?;
        let high: u32 = high.trim().parse().context("Bad range end")?;
        if high < low {
            bail!("Inverted code range {}", figure);
        }
        return Ok((low, high));
    }
    let code = figure
        .parse()
        .with_context(|| format!("Not a code figure: {:?}", figure))?;
    Ok((code, code))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl EntryLoader for CodeFlagCsvLoader {
    type RawEntry = RawCodeFlagEntry;
    type Output = FTableEntry;

    fn process_entry(&mut self, raw: Self::RawEntry) -> anyhow::Result<Option<Self::Output>> {
        let fxy: FXY = raw.fxy.parse()?;

        // Notes and "All 0/All 1" rows carry no figure.
        let Ok((low, high)) = parse_code_figure(&raw.code_figure) else {
            return Ok(None);
        };

        let meaning = non_empty(raw.entry_name_en)
            .or_else(|| non_empty(raw.entry_name_sub1_en))
            .or_else(|| non_empty(raw.entry_name_sub2_en))
            .unwrap_or_default();

        let mut entry = FTableEntry::new(fxy, low, meaning);
        entry.high = high;

        if let (Some(dep_fxy), Some(dep_value)) = (
            non_empty(raw.depends_on_fxy),
            non_empty(raw.depends_on_value),
        ) {
            let dep_fxy: FXY = dep_fxy.parse()?;
            let dep_value: i64 = dep_value.parse().context("Bad dependency value")?;
            entry = entry.with_dependency(dep_fxy, dep_value);
        }

        Ok(Some(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tables::TableF, wmo::TableLoader};
    use rustc_hash::FxHashMap;

    const CSV: &str = "\
FXY,ElementName_en,CodeFigure,EntryName_en,EntryName_sub1_en,EntryName_sub2_en,Note_en,noteIDs,Status
001007,Satellite identifier,3,METOP-1,,,,,Operational
001007,Satellite identifier,4-5,Reserved,,,,,Operational
002001,Type of station,0,Automatic,,,,,Operational
002001,Type of station,,,,,(see Note 1),,Operational
020003,Present weather,510,,Sky not observed,,,,Operational
";

    #[test]
    fn parses_figures_and_ranges() {
        assert_eq!(parse_code_figure("12").unwrap(), (12, 12));
        assert_eq!(parse_code_figure("3-5").unwrap(), (3, 5));
        assert_eq!(parse_code_figure("3–5").unwrap(), (3, 5));
        assert!(parse_code_figure("All 1").is_err());
        assert!(parse_code_figure("9-2").is_err());
    }

    #[test]
    fn loads_code_tables() {
        let entries = TableLoader::<CodeFlagCsvLoader>::default()
            .load_from_reader(CSV.as_bytes(), "inline", &mut CodeFlagCsvLoader)
            .unwrap();
        assert_eq!(entries.len(), 4);

        let mut f = TableF::default();
        f.extend(entries);
        let ctx = FxHashMap::default();
        assert_eq!(f.resolve(FXY::new(0, 1, 7), 3, &ctx), "METOP-1");
        assert_eq!(f.resolve(FXY::new(0, 1, 7), 5, &ctx), "Reserved");
        assert_eq!(f.resolve(FXY::new(0, 20, 3), 510, &ctx), "Sky not observed");
        assert_eq!(f.resolve(FXY::new(0, 2, 1), 7, &ctx), "NOT FOUND");
    }

    #[test]
    fn reads_dependency_columns() {
        let csv = "\
FXY,CodeFigure,EntryName_en,DependsOn_FXY,DependsOn_Value
008050,1,Surface,001003,1
008050,1,Upper air,001003,2
";
        let entries = TableLoader::<CodeFlagCsvLoader>::default()
            .load_from_reader(csv.as_bytes(), "inline", &mut CodeFlagCsvLoader)
            .unwrap();
        let mut f = TableF::default();
        f.extend(entries);

        let mut ctx = FxHashMap::default();
        ctx.insert(FXY::new(0, 1, 3), 2.0);
        assert_eq!(f.resolve(FXY::new(0, 8, 50), 1, &ctx), "Upper air");
    }
}
