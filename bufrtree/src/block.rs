use std::ops::Deref;

use crate::decoder::{DecodedMessage, Decoder, MessageParams, TABLE_DEFINITION_CATEGORY};
use crate::errors::Result;
use crate::structs::versions::{BUFRMessage, MessageVersion};
use tablelib::{TableDefinitions, Tables};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct MessageBlock {
    message: BUFRMessage,
    offset: usize,
}

impl std::fmt::Display for MessageBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Offset in file: {}", self.offset)?;
        write!(f, "{}", self.message)
    }
}

impl Deref for MessageBlock {
    type Target = BUFRMessage;

    fn deref(&self) -> &Self::Target {
        &self.message
    }
}

impl MessageBlock {
    pub fn new(message: BUFRMessage, offset: usize) -> Self {
        MessageBlock { message, offset }
    }

    /// Byte offset of "BUFR" in the file.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn params(&self) -> MessageParams {
        MessageParams {
            compressed: self.is_compressed(),
            subsets: self.subsets_count() as usize,
            centre: self.center_id(),
            data_category: self.data_category(),
        }
    }

    pub fn is_table_definition(&self) -> bool {
        self.data_category() == TABLE_DEFINITION_CATEGORY
    }

    /// Decode section 4 and annotate code and flag elements.
    pub fn decode(&self, tables: &Tables) -> Result<DecodedMessage> {
        let params = self.params();
        debug!(
            "Decoding message at offset {}: {} subsets, compressed {}",
            self.offset, params.subsets, params.compressed
        );
        let mut reader = self.data_section().reader();
        let mut decoded = Decoder::new(tables, params).decode(self.descriptors(), &mut reader)?;
        decoded.annotate(tables);
        Ok(decoded)
    }
}

#[derive(Default)]
pub struct BUFRFile {
    messages: Vec<MessageBlock>,
}

impl BUFRFile {
    pub fn new() -> Self {
        BUFRFile {
            messages: Vec::new(),
        }
    }

    pub(crate) fn push_message(&mut self, message: BUFRMessage, offset: usize) {
        self.messages.push(MessageBlock::new(message, offset));
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn message_at(&self, index: usize) -> Option<&MessageBlock> {
        self.messages.get(index)
    }

    pub fn messages(&self) -> &[MessageBlock] {
        &self.messages
    }

    /// Decode the table-definition messages leading the file with the
    /// bootstrap Table B and merge what they define into `tables`.
    /// Definitions of a message are only merged once it decodes cleanly.
    /// Returns the number of messages used.
    pub fn load_embedded_tables(&self, tables: &mut Tables) -> usize {
        let mut working = Tables::bootstrap();
        let mut collected = TableDefinitions::default();
        let mut used = 0;

        for block in self
            .messages
            .iter()
            .take_while(|b| b.is_table_definition())
        {
            match block.decode(&working) {
                Ok(decoded) => {
                    let definitions = decoded.definitions;
                    debug!(
                        "Message at offset {} defines {} A, {} B and {} D entries",
                        block.offset(),
                        definitions.a.len(),
                        definitions.b.len(),
                        definitions.d.len()
                    );
                    working.merge(definitions.clone());
                    collected.a.extend(definitions.a);
                    collected.b.extend(definitions.b);
                    collected.d.extend(definitions.d);
                    used += 1;
                }
                Err(e) => {
                    warn!(
                        "Table definition message at offset {} failed: {}",
                        block.offset(),
                        e
                    );
                }
            }
        }

        if used > 0 {
            info!(
                "Loaded {} A, {} B and {} D entries from {} table messages",
                collected.a.len(),
                collected.b.len(),
                collected.d.len(),
                used
            );
            tables.merge(collected);
        }
        used
    }
}
