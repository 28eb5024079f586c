use super::EntryLoader;
use crate::{FXY, tables::DTableEntry};

/// Rows sharing FXY1 are folded into one sequence.
#[derive(Debug, Clone, Default)]
pub struct DTableCsvLoader {
    current_chain: Option<DTableEntry>,
}

#[derive(Debug, serde::Deserialize)]
pub struct RawDTableEntry {
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "CategoryOfSequences_en")]
    pub category_of_sequences_en: Option<String>,
    #[serde(rename = "FXY1")]
    pub fxy1: String,
    #[serde(rename = "Title_en")]
    pub title_en: Option<String>,
    #[serde(rename = "SubTitle_en")]
    pub subtitle_en: Option<String>,
    #[serde(rename = "FXY2")]
    pub fxy2: String,
    #[serde(rename = "ElementName_en")]
    pub _element_name_en: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
}

impl EntryLoader for DTableCsvLoader {
    type RawEntry = RawDTableEntry;
    type Output = DTableEntry;

    fn process_entry(&mut self, raw: Self::RawEntry) -> anyhow::Result<Option<Self::Output>> {
        let fxy: FXY = raw.fxy1.parse()?;
        let child: FXY = raw.fxy2.parse()?;

        if let Some(chain) = self.current_chain.as_mut() {
            if chain.fxy == fxy {
                chain.chain.push(child);
                return Ok(None);
            }
        }

        let description = raw
            .title_en
            .or(raw.subtitle_en)
            .unwrap_or_default()
            .trim()
            .to_string();
        let started = DTableEntry::new(fxy, "", description, vec![child]);

        Ok(self.current_chain.replace(started))
    }

    fn finish(&mut self) -> anyhow::Result<Option<Self::Output>> {
        Ok(self.current_chain.take())
    }
}
