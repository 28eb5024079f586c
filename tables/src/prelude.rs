pub use crate::tables::{BUFRTableB, BUFRTableD};
pub use crate::wmo::{self, TableLoader, load_master_tables};
pub use crate::{
    AEntry, BTableEntry, DTableEntry, FTableEntry, FXY, TableDefinitions, TableF, TableType,
    Tables,
};
pub use crate::{config::TablesConfig, pattern::TableScanner};
