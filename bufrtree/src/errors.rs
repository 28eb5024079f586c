use tablelib::{FXY, TableType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Unsupported BUFR edition: {0}")]
    UnsupportedVersion(u8),

    #[error("Bit reader overrun: cursor {position} + {bits} bits exceeds {length} bits")]
    BitReaderOverrun {
        position: usize,
        bits: usize,
        length: usize,
    },

    #[error("Descriptor {fxy} not found in Table {table}")]
    UnknownDescriptor { fxy: FXY, table: TableType },

    #[error("Unsupported operator 2 {x:02} {y:03}")]
    UnsupportedOperator { x: u8, y: u8 },

    #[error("Structural mismatch: {0}")]
    StructuralMismatch(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Table Error: {0:#}")]
    Tables(#[from] anyhow::Error),
}

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for Error {
    fn from(value: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        let reason = match value {
            nom::Err::Incomplete(_) => "truncated section".to_string(),
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                format!("{:?} with {} bytes left", e.code, e.input.len())
            }
        };
        Self::MalformedMessage(reason)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
