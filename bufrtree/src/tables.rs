use crate::errors::Result;
use crate::table_path::resolve_tables_dir;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use tablelib::prelude::{TableScanner, TablesConfig, load_master_tables};
use tablelib::Tables;
use tracing::{debug, info};

/// Loads the CSV tables a message asks for, once per master table version.
pub struct TableLoader {
    base: PathBuf,
    scanner: TableScanner,
    cache: FxHashMap<u8, Tables>,
}

impl TableLoader {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self::with_scanner(base, TableScanner::new())
    }

    pub fn with_scanner<P: Into<PathBuf>>(base: P, scanner: TableScanner) -> Self {
        TableLoader {
            base: base.into(),
            scanner,
            cache: FxHashMap::default(),
        }
    }

    /// Directory from `explicit`, else the config file, the environment or
    /// `./tables`; file patterns from the config.
    pub fn from_config(config: Option<&TablesConfig>, explicit: Option<&Path>) -> Result<Self> {
        let configured = config.and_then(|c| c.tables_dir.as_deref());
        let base = resolve_tables_dir(explicit, configured);
        let scanner = match config {
            Some(config) => config.scanner()?,
            None => TableScanner::new(),
        };
        info!("Using tables from {}", base.display());
        Ok(Self::with_scanner(base, scanner))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn load(&mut self, master_version: u8) -> Result<&Tables> {
        match self.cache.entry(master_version) {
            Entry::Occupied(entry) => {
                debug!("Master table version {} already loaded", master_version);
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let tables = load_master_tables(&self.base, master_version as u32, &self.scanner)?;
                Ok(entry.insert(tables))
            }
        }
    }

    pub fn cached_versions(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tablelib::FXY;

    fn write_tables(dir: &Path) {
        fs::write(
            dir.join("BUFRCREX_TableB_en_00.csv"),
            "ClassNo,ClassName_en,FXY,ElementName_en,Note_en,BUFR_Unit,BUFR_Scale,BUFR_ReferenceValue,BUFR_DataWidth_Bits,CREX_Unit,CREX_Scale,CREX_DataWidth_Char,Status\n\
             12,Temperature,012101,Temperature/air temperature,,K,2,0,16,C,2,4,Operational\n",
        )
        .unwrap();
        fs::write(
            dir.join("BUFR_TableD_en_00.csv"),
            "Category,CategoryOfSequences_en,FXY1,Title_en,SubTitle_en,FXY2,ElementName_en,ElementDescription_en,Note_en,Status\n\
             01,Location,301001,WMO block and station numbers,,001001,WMO block number,,,Operational\n\
             01,Location,301001,WMO block and station numbers,,001002,WMO station number,,,Operational\n",
        )
        .unwrap();
    }

    #[test]
    fn loads_once_per_version() {
        let dir = std::env::temp_dir().join(format!("bufrtree-tables-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        write_tables(&dir);

        let mut loader = TableLoader::new(&dir);
        let tables = loader.load(38).unwrap();
        assert!(tables.lookup_b(&FXY::new(0, 12, 101)).is_some());
        assert_eq!(
            tables.lookup_d(&FXY::new(3, 1, 1)).unwrap().chain,
            vec![FXY::new(0, 1, 1), FXY::new(0, 1, 2)]
        );

        // older versions fall back to the same files and are cached apart
        assert!(loader.load(38).is_ok());
        assert!(loader.load(12).is_ok());
        assert_eq!(loader.cached_versions(), 2);

        // cached versions no longer touch the directory
        fs::remove_dir_all(&dir).unwrap();
        assert!(loader.load(38).unwrap().lookup_b(&FXY::new(0, 12, 101)).is_some());
        assert!(loader.load(20).is_err());
        assert_eq!(loader.cached_versions(), 2);
    }

    #[test]
    fn missing_tables_are_an_error() {
        let mut loader = TableLoader::new("/nonexistent/bufrtree/tables");
        assert!(loader.load(38).is_err());
    }
}
