use super::MessageParams;
use tablelib::prelude::{BUFRTableB, BUFRTableD};
use tablelib::{BTableEntry, DTableEntry, TableF, Tables};

/// MSB-first bit packer for hand-built data sections.
#[derive(Default)]
pub(crate) struct BitWriter {
    bytes: Vec<u8>,
    bits: usize,
}

impl BitWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn put(mut self, value: u64, bits: usize) -> Self {
        for i in (0..bits).rev() {
            if self.bits % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 0x80 >> (self.bits % 8);
            }
            self.bits += 1;
        }
        self
    }

    pub(crate) fn put_str(self, s: &str) -> Self {
        s.bytes().fold(self, |w, b| w.put(b as u64, 8))
    }

    pub(crate) fn finish(self) -> (Vec<u8>, usize) {
        (self.bytes, self.bits)
    }
}

pub(crate) fn params(compressed: bool, subsets: usize) -> MessageParams {
    MessageParams {
        compressed,
        subsets,
        centre: 98,
        data_category: 0,
    }
}

pub(crate) fn tables_with(b: Vec<BTableEntry>, d: Vec<DTableEntry>) -> Tables {
    Tables::new(
        BUFRTableB::from_entries(b),
        BUFRTableD::from_entries(d),
        TableF::default(),
    )
}
