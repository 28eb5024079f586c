#![allow(dead_code)]

use tablelib::prelude::{BUFRTableB, BUFRTableD};
use tablelib::{BTableEntry, DTableEntry, FTableEntry, FXY, TableF, Tables};

/// MSB-first bit packer for hand-built data sections.
#[derive(Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bits: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(mut self, value: u64, bits: usize) -> Self {
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

    pub fn put_str(self, s: &str) -> Self {
        s.bytes().fold(self, |w, b| w.put(b as u64, 8))
    }

    pub fn bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Sections 0 to 5 of one message, filled with plausible defaults.
#[derive(Clone)]
pub struct MessageBuilder {
    pub edition: u8,
    pub centre: u16,
    pub category: u8,
    pub master_version: u8,
    pub year: u16,
    pub subsets: u16,
    pub compressed: bool,
    pub section2: Option<Vec<u8>>,
    pub descriptors: Vec<FXY>,
    pub data: Vec<u8>,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        MessageBuilder {
            edition: 4,
            centre: 98,
            category: 0,
            master_version: 38,
            year: 2025,
            subsets: 1,
            compressed: false,
            section2: None,
            descriptors: vec![],
            data: vec![],
        }
    }
}

fn u24(n: usize) -> [u8; 3] {
    let b = (n as u32).to_be_bytes();
    [b[1], b[2], b[3]]
}

impl MessageBuilder {
    pub fn new(descriptors: Vec<FXY>, data: Vec<u8>) -> Self {
        MessageBuilder {
            descriptors,
            data,
            ..Default::default()
        }
    }

    fn section1(&self) -> Vec<u8> {
        let flags = if self.section2.is_some() { 0x80 } else { 0 };
        let mut s = vec![];
        if self.edition == 4 {
            s.extend(u24(22));
            s.push(0);
            s.extend(self.centre.to_be_bytes());
            s.extend([0, 0, 0, flags, self.category, 0, 0, self.master_version, 0]);
            s.extend(self.year.to_be_bytes());
            s.extend([1, 2, 3, 4, 5]);
        } else {
            s.extend(u24(17));
            s.extend([0, 0, self.centre as u8, 0, flags, self.category, 0]);
            s.extend([self.master_version, 0, (self.year % 100) as u8, 1, 2, 3, 4]);
        }
        s
    }

    fn section3(&self) -> Vec<u8> {
        let mut s = u24(7 + 2 * self.descriptors.len()).to_vec();
        s.push(0);
        s.extend(self.subsets.to_be_bytes());
        s.push(0x80 | if self.compressed { 0x40 } else { 0 });
        for fxy in &self.descriptors {
            let packed = ((fxy.f() as u16) << 14) | ((fxy.x() as u16) << 8) | fxy.y() as u16;
            s.extend(packed.to_be_bytes());
        }
        s
    }

    fn section4(&self) -> Vec<u8> {
        let mut data = self.data.clone();
        data.resize(data.len().max(4), 0);
        if data.len() % 2 != 0 {
            data.push(0);
        }
        let mut s = u24(4 + data.len()).to_vec();
        s.push(0);
        s.extend(data);
        s
    }

    pub fn build(&self) -> Vec<u8> {
        let mut body = self.section1();
        if let Some(payload) = &self.section2 {
            body.extend(u24(4 + payload.len()));
            body.push(0);
            body.extend(payload);
        }
        body.extend(self.section3());
        body.extend(self.section4());
        body.extend(b"7777");

        let mut m = b"BUFR".to_vec();
        m.extend(u24(8 + body.len()));
        m.push(self.edition);
        m.extend(body);
        m
    }
}

pub fn temperature() -> BTableEntry {
    BTableEntry::new(FXY::new(0, 12, 101), "TMDB", "Temperature/air temperature", "K", 1, 0, 12)
}

pub fn tables(b: Vec<BTableEntry>, d: Vec<DTableEntry>, f: Vec<FTableEntry>) -> Tables {
    let mut table_f = TableF::default();
    table_f.extend(f);
    Tables::new(BUFRTableB::from_entries(b), BUFRTableD::from_entries(d), table_f)
}
