use crate::{FXY, TableType};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};

pub const NOT_FOUND: &str = "NOT FOUND";

#[derive(Debug, Clone, Default)]
pub struct BTable;
#[derive(Debug, Clone, Default)]
pub struct DTable;

pub trait TableTypeTrait {
    type EntryType: TableEntry;
    const TABLE_TYPE: TableType;
}

impl TableTypeTrait for BTable {
    type EntryType = BTableEntry;
    const TABLE_TYPE: TableType = TableType::B;
}

impl TableTypeTrait for DTable {
    type EntryType = DTableEntry;
    const TABLE_TYPE: TableType = TableType::D;
}

pub trait TableEntry: Display + Debug + Clone {
    fn fxy(&self) -> FXY;
}

/// Keyed table of B or D entries. Later inserts replace earlier ones.
#[derive(Debug, Clone)]
pub struct BUFRTable<T: TableTypeTrait> {
    entries: FxHashMap<FXY, T::EntryType>,
}

impl<T: TableTypeTrait> Default for BUFRTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TableTypeTrait> BUFRTable<T> {
    pub fn new() -> Self {
        BUFRTable {
            entries: FxHashMap::default(),
        }
    }

    pub fn from_entries<I: IntoIterator<Item = T::EntryType>>(entries: I) -> Self {
        let mut table = Self::new();
        table.extend(entries);
        table
    }

    pub fn insert(&mut self, entry: T::EntryType) -> Option<T::EntryType> {
        self.entries.insert(entry.fxy(), entry)
    }

    pub fn extend<I: IntoIterator<Item = T::EntryType>>(&mut self, entries: I) {
        for entry in entries {
            self.insert(entry);
        }
    }

    #[inline]
    pub fn lookup(&self, fxy: &FXY) -> Option<&T::EntryType> {
        self.entries.get(fxy)
    }

    pub fn contains(&self, fxy: &FXY) -> bool {
        self.entries.contains_key(fxy)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn table_type(&self) -> TableType {
        T::TABLE_TYPE
    }

    /// All entries sorted by descriptor.
    pub fn entries(&self) -> Vec<&T::EntryType> {
        let mut all: Vec<_> = self.entries.values().collect();
        all.sort_by_key(|e| e.fxy());
        all
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BTableEntry {
    pub fxy: FXY,
    pub mnemonic: String,
    pub description: String,
    pub unit: String,
    pub scale: i32,
    pub reference: i32,
    pub bit_width: u32,
}

impl BTableEntry {
    pub fn new(
        fxy: FXY,
        mnemonic: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        scale: i32,
        reference: i32,
        bit_width: u32,
    ) -> Self {
        BTableEntry {
            fxy,
            mnemonic: mnemonic.into().trim().to_string(),
            description: description.into().trim().to_string(),
            unit: unit.into().trim().to_string(),
            scale,
            reference,
            bit_width,
        }
    }

    /// Anything that is not CCITT IA5 character data.
    pub fn is_numeric(&self) -> bool {
        !matches!(self.unit.as_str(), "CCITT_IA5" | "CCITT IA5" | "CCITTIA5")
    }

    pub fn is_code(&self) -> bool {
        self.unit.to_uppercase().starts_with("CODE")
    }

    pub fn is_flag(&self) -> bool {
        self.unit.to_uppercase().starts_with("FLAG")
    }

    /// Numeric values that width, scale and reference operators may modify.
    pub fn is_data(&self) -> bool {
        !self.is_code() && !self.is_flag()
    }
}

impl TableEntry for BTableEntry {
    fn fxy(&self) -> FXY {
        self.fxy
    }
}

fn clipped(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

impl Display for BTableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | {:<8} | {:<40} | {:<15} | {:>5} | {:>11} | {:>5}",
            self.fxy,
            self.mnemonic,
            clipped(&self.description, 40),
            clipped(&self.unit, 15),
            self.scale,
            self.reference,
            self.bit_width,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DTableEntry {
    pub fxy: FXY,
    pub mnemonic: String,
    pub description: String,
    pub chain: Vec<FXY>,
}

impl DTableEntry {
    pub fn new(
        fxy: FXY,
        mnemonic: impl Into<String>,
        description: impl Into<String>,
        chain: Vec<FXY>,
    ) -> Self {
        DTableEntry {
            fxy,
            mnemonic: mnemonic.into(),
            description: description.into(),
            chain,
        }
    }
}

impl TableEntry for DTableEntry {
    fn fxy(&self) -> FXY {
        self.fxy
    }
}

impl Display for DTableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chain = self
            .chain
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        write!(
            f,
            "{} | {:<8} | {:<40} | {}",
            self.fxy,
            self.mnemonic,
            clipped(&self.description, 40),
            chain
        )
    }
}

/// Data category entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AEntry {
    pub entry: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct TableA {
    entries: Vec<AEntry>,
}

impl TableA {
    pub fn push(&mut self, entry: AEntry) {
        self.entries.push(entry);
    }

    pub fn lookup(&self, category: u8) -> Option<&AEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.entry.trim().parse::<u8>().ok() == Some(category))
    }

    pub fn entries(&self) -> &[AEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The code of another element that selects between alternative meanings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub fxy: FXY,
    pub value: i64,
}

/// One code figure (or inclusive range of figures) of a code or flag table.
/// For flag tables the figure is the bit number, counted from 1 at the MSB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FTableEntry {
    pub fxy: FXY,
    pub low: u32,
    pub high: u32,
    pub meaning: String,
    pub dependency: Option<Dependency>,
}

impl FTableEntry {
    pub fn new(fxy: FXY, code: u32, meaning: impl Into<String>) -> Self {
        FTableEntry {
            fxy,
            low: code,
            high: code,
            meaning: meaning.into(),
            dependency: None,
        }
    }

    pub fn with_dependency(mut self, fxy: FXY, value: i64) -> Self {
        self.dependency = Some(Dependency { fxy, value });
        self
    }

    pub fn covers(&self, code: u32) -> bool {
        self.low <= code && code <= self.high
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableF {
    entries: FxHashMap<FXY, Vec<FTableEntry>>,
}

impl TableF {
    pub fn insert(&mut self, entry: FTableEntry) {
        self.entries.entry(entry.fxy).or_default().push(entry);
    }

    pub fn extend<I: IntoIterator<Item = FTableEntry>>(&mut self, entries: I) {
        for entry in entries {
            self.insert(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn candidates(&self, fxy: FXY, code: u32) -> impl Iterator<Item = &FTableEntry> {
        self.entries
            .get(&fxy)
            .into_iter()
            .flatten()
            .filter(move |e| e.covers(code))
    }

    /// Meaning without dependency resolution, preferring unconditional rows.
    pub fn meaning(&self, fxy: FXY, code: u32) -> Option<&str> {
        self.candidates(fxy, code)
            .find(|e| e.dependency.is_none())
            .or_else(|| self.candidates(fxy, code).next())
            .map(|e| e.meaning.as_str())
    }

    pub fn resolve(&self, fxy: FXY, code: u32, context: &FxHashMap<FXY, f64>) -> &str {
        self.candidates(fxy, code)
            .find(|e| match e.dependency {
                None => true,
                Some(dep) => context
                    .get(&dep.fxy)
                    .is_some_and(|v| *v as i64 == dep.value),
            })
            .map(|e| e.meaning.as_str())
            .unwrap_or(NOT_FOUND)
    }

    pub fn resolve_batch<I>(
        &self,
        pairs: I,
        context: &FxHashMap<FXY, f64>,
    ) -> BTreeMap<(FXY, u32), String>
    where
        I: IntoIterator<Item = (FXY, u32)>,
    {
        pairs
            .into_iter()
            .map(|(fxy, code)| ((fxy, code), self.resolve(fxy, code, context).to_string()))
            .collect()
    }
}

pub type BUFRTableB = BUFRTable<BTable>;
pub type BUFRTableD = BUFRTable<DTable>;

/// Definitions carried by table-definition messages, kept apart from the
/// shared tables until the message has decoded successfully.
#[derive(Debug, Clone, Default)]
pub struct TableDefinitions {
    pub a: Vec<AEntry>,
    pub b: Vec<BTableEntry>,
    pub d: Vec<DTableEntry>,
}

impl TableDefinitions {
    pub fn is_empty(&self) -> bool {
        self.a.is_empty() && self.b.is_empty() && self.d.is_empty()
    }

    pub fn lookup_b(&self, fxy: &FXY) -> Option<&BTableEntry> {
        self.b.iter().rev().find(|e| &e.fxy == fxy)
    }

    pub fn lookup_d(&self, fxy: &FXY) -> Option<&DTableEntry> {
        self.d.iter().rev().find(|e| &e.fxy == fxy)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub a: TableA,
    pub b: BUFRTableB,
    pub d: BUFRTableD,
    pub f: TableF,
}

impl Tables {
    pub fn new(b: BUFRTableB, d: BUFRTableD, f: TableF) -> Self {
        Tables {
            a: TableA::default(),
            b,
            d,
            f,
        }
    }

    /// Tables able to decode table-definition messages and nothing else.
    pub fn bootstrap() -> Self {
        Tables {
            b: crate::builtin::bootstrap_table_b(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn lookup_b(&self, fxy: &FXY) -> Option<&BTableEntry> {
        self.b.lookup(fxy)
    }

    #[inline]
    pub fn lookup_d(&self, fxy: &FXY) -> Option<&DTableEntry> {
        self.d.lookup(fxy)
    }

    pub fn merge(&mut self, definitions: TableDefinitions) {
        for a in definitions.a {
            self.a.push(a);
        }
        self.b.extend(definitions.b);
        self.d.extend(definitions.d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(unit: &str) -> BTableEntry {
        BTableEntry::new(FXY::new(0, 20, 3), "", "test", unit, 0, 0, 9)
    }

    #[test]
    fn classifies_units() {
        assert!(!entry("CCITT IA5").is_numeric());
        assert!(!entry("CCITT_IA5").is_numeric());
        assert!(entry("Code table").is_code());
        assert!(entry("FLAG TABLE").is_flag());
        assert!(entry("K").is_data());

        assert!(entry("Code table").is_numeric());
        assert!(!entry("Code table").is_data());
        assert!(entry("m s-1").is_data());
    }

    #[test]
    fn keyed_table_replaces_and_sorts() {
        let mut table = BUFRTableB::new();
        table.insert(BTableEntry::new(FXY::new(0, 12, 101), "", "T", "K", 2, 0, 16));
        table.insert(BTableEntry::new(FXY::new(0, 1, 1), "", "WMO", "Numeric", 0, 0, 7));
        table.insert(BTableEntry::new(FXY::new(0, 12, 101), "", "T2", "K", 2, 0, 16));

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.lookup(&FXY::new(0, 12, 101)).map(|e| e.description.as_str()),
            Some("T2")
        );
        let order: Vec<_> = table.entries().iter().map(|e| e.fxy).collect();
        assert_eq!(order, vec![FXY::new(0, 1, 1), FXY::new(0, 12, 101)]);
    }

    #[test]
    fn resolves_dependent_meanings() {
        let code = FXY::new(0, 2, 3);
        let selector = FXY::new(0, 2, 1);
        let mut f = TableF::default();
        f.insert(FTableEntry::new(code, 1, "with selector 5").with_dependency(selector, 5));
        f.insert(FTableEntry::new(code, 1, "with selector 6").with_dependency(selector, 6));
        f.insert(FTableEntry::new(FXY::new(0, 20, 12), 7, "Cumulonimbus"));

        let mut context = FxHashMap::default();
        context.insert(selector, 6.0);

        let resolved = f.resolve_batch(
            [(code, 1), (FXY::new(0, 20, 12), 7), (code, 2)],
            &context,
        );
        assert_eq!(resolved[&(code, 1)], "with selector 6");
        assert_eq!(resolved[&(FXY::new(0, 20, 12), 7)], "Cumulonimbus");
        assert_eq!(resolved[&(code, 2)], NOT_FOUND);

        context.clear();
        assert_eq!(f.resolve(code, 1, &context), NOT_FOUND);
        assert_eq!(f.meaning(code, 1), Some("with selector 5"));
    }

    #[test]
    fn ranges_cover_codes() {
        let mut f = TableF::default();
        let mut reserved = FTableEntry::new(FXY::new(0, 8, 21), 0, "Reserved");
        reserved.low = 10;
        reserved.high = 20;
        f.insert(reserved);
        assert_eq!(f.meaning(FXY::new(0, 8, 21), 15), Some("Reserved"));
        assert_eq!(f.meaning(FXY::new(0, 8, 21), 21), None);
    }

    #[test]
    fn merge_adds_definitions() {
        let mut tables = Tables::bootstrap();
        let defs = TableDefinitions {
            a: vec![AEntry {
                entry: "  0".to_string(),
                description: "Surface data - land".to_string(),
            }],
            b: vec![BTableEntry::new(FXY::new(0, 12, 101), "TMDB", "T", "K", 2, 0, 16)],
            d: vec![DTableEntry::new(
                FXY::new(3, 1, 1),
                "WMOBLKST",
                "Block and station",
                vec![FXY::new(0, 1, 1), FXY::new(0, 1, 2)],
            )],
        };
        tables.merge(defs);

        assert!(tables.lookup_b(&FXY::new(0, 12, 101)).is_some());
        assert!(tables.lookup_b(&FXY::new(0, 0, 10)).is_some());
        assert_eq!(tables.lookup_d(&FXY::new(3, 1, 1)).map(|d| d.chain.len()), Some(2));
        assert_eq!(
            tables.a.lookup(0).map(|a| a.description.as_str()),
            Some("Surface data - land")
        );
    }
}
