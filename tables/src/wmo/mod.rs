pub mod btable;
pub mod codeflag;
pub mod dtable;

use crate::{
    TableConverter,
    pattern::{TableKind, TableScanner},
    tables::{BUFRTableB, BUFRTableD, TableF, Tables},
};
pub use btable::BTableCsvLoader as WMOBTableLoader;
pub use codeflag::CodeFlagCsvLoader as WMOCodeFlagLoader;
use csv::ReaderBuilder;
pub use dtable::DTableCsvLoader as WMODTableLoader;
use std::{fmt::Debug, io::Read, path::Path};
use tracing::{info, warn};

#[derive(Default)]
pub struct TableLoader<C: EntryLoader> {
    _marker: std::marker::PhantomData<C>,
}

impl<C: EntryLoader> TableLoader<C> {
    pub fn load_table<P: AsRef<Path>>(
        &self,
        path: P,
        loader: &mut C,
    ) -> anyhow::Result<Vec<C::Output>> {
        let file = std::fs::File::open(path.as_ref())?;
        self.load_from_reader(file, &path.as_ref().display().to_string(), loader)
    }

    /// `source` only names the input in log lines.
    pub fn load_from_reader<R: Read>(
        &self,
        reader: R,
        source: &str,
        loader: &mut C,
    ) -> anyhow::Result<Vec<C::Output>> {
        let mut entries = vec![];
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(b',')
            .flexible(true)
            .from_reader(reader);

        let mut line_num = 1;
        for result in rdr.deserialize() {
            line_num += 1;
            let record: C::RawEntry = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping line {} in {}: {}", line_num, source, e);
                    continue;
                }
            };
            match loader.process_entry(record) {
                Ok(Some(processed_entry)) => entries.push(processed_entry),
                Ok(None) => {}
                Err(e) => warn!("Skipping line {} in {}: {:#}", line_num, source, e),
            }
        }

        if let Some(processed_entry) = loader.finish()? {
            entries.push(processed_entry);
        }
        Ok(entries)
    }
}

pub trait EntryLoader: Default {
    type Output;
    type RawEntry: for<'de> serde::Deserialize<'de> + Debug;

    fn process_entry(&mut self, raw: Self::RawEntry) -> anyhow::Result<Option<Self::Output>>;

    fn finish(&mut self) -> anyhow::Result<Option<Self::Output>> {
        Ok(None)
    }
}

impl<T: EntryLoader> TableConverter for TableLoader<T> {
    type OutputEntry = T::Output;

    fn convert<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<Vec<Self::OutputEntry>> {
        let mut loader = T::default();
        self.load_table(path, &mut loader)
    }
}

/// Load Tables B, D and (when present) the code/flag table for `version`
/// from `dir`. B and D are required.
pub fn load_master_tables<P: AsRef<Path>>(
    dir: P,
    version: u32,
    scanner: &TableScanner,
) -> anyhow::Result<Tables> {
    let dir = dir.as_ref();

    let (b_path, _) = scanner
        .select(dir, TableKind::B, version)?
        .ok_or_else(|| anyhow::anyhow!("No Table B found in {}", dir.display()))?;
    let (d_path, _) = scanner
        .select(dir, TableKind::D, version)?
        .ok_or_else(|| anyhow::anyhow!("No Table D found in {}", dir.display()))?;

    let b = BUFRTableB::from_entries(TableLoader::<WMOBTableLoader>::default().convert(&b_path)?);
    let d = BUFRTableD::from_entries(TableLoader::<WMODTableLoader>::default().convert(&d_path)?);

    let mut f = TableF::default();
    match scanner.select(dir, TableKind::CodeFlag, version)? {
        Some((f_path, _)) => {
            f.extend(TableLoader::<WMOCodeFlagLoader>::default().convert(&f_path)?);
        }
        None => warn!("No code/flag table in {}, meanings will not be resolved", dir.display()),
    }

    info!(
        "Loaded {} B, {} D and {} code/flag entries from {}",
        b.len(),
        d.len(),
        f.len(),
        dir.display()
    );

    Ok(Tables::new(b, d, f))
}
