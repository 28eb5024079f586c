pub mod annotate;
pub mod block;
pub mod decoder;
pub mod errors;
pub mod item;
pub mod parser;
pub mod structs;
pub mod table_path;
pub mod tables;
pub mod tree;
pub mod values;

pub use crate::block::{BUFRFile, MessageBlock};
pub use crate::decoder::{DecodedMessage, Decoder, MessageParams};
pub use crate::item::{Item, ItemKind, Value};
pub use crate::parser::*;
pub use crate::table_path::{get_tables_base_path, set_tables_base_path};
pub use crate::tree::{NodeId, Tree};
pub use crate::values::ValueGrid;
