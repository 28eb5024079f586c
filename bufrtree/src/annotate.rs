//! Code and flag table meanings for decoded elements.

use crate::decoder::DecodedMessage;
use crate::structs::bit::is_all_ones;
use crate::tree::NodeId;
use std::collections::BTreeMap;
use tablelib::{BTableEntry, FXY, Tables};
use tracing::debug;

const CODE_MISSING: &str = "CODE is missing";
const FLAG_MISSING: &str = "FLAG is missing";
const FLAG_WARNING: &str = "POTENTIAL BUG (double check)\n\n";

/// `value` as `width` binary digits, most significant first.
pub fn flag_bitstring(value: u32, width: u32) -> String {
    (0..width)
        .rev()
        .map(|i| {
            if i < 32 && (value >> i) & 1 == 1 {
                '1'
            } else {
                '0'
            }
        })
        .collect()
}

/// Set bits of a flag value, numbered from 1 (most significant) to `width`.
pub fn set_flag_bits(value: u32, width: u32) -> Vec<u32> {
    flag_bitstring(value, width)
        .chars()
        .enumerate()
        .filter(|(_, c)| *c == '1')
        .map(|(i, _)| i as u32 + 1)
        .collect()
}

/// The least significant bit may only be set when every bit is.
pub fn violates_flag_rule(value: u32, width: u32) -> bool {
    !is_all_ones(value, width as usize) && value % 2 != 0
}

enum Lookup {
    Code(u32),
    Flag(u32, u32),
    Missing(&'static str),
}

impl DecodedMessage {
    fn lookup_b<'t>(&'t self, tables: &'t Tables, fxy: &FXY) -> Option<&'t BTableEntry> {
        self.definitions
            .lookup_b(fxy)
            .or_else(|| tables.lookup_b(fxy))
    }

    fn classify(&self, tables: &Tables, id: NodeId) -> Option<(FXY, Lookup)> {
        let item = self.tree.item(id);
        if !item.is_element() {
            return None;
        }
        let fxy = item.fxy?;
        let b = self.lookup_b(tables, &fxy)?;

        let lookup = if b.is_code() {
            if item.missing {
                Lookup::Missing(CODE_MISSING)
            } else {
                Lookup::Code(item.as_f64()? as u32)
            }
        } else if b.is_flag() {
            if item.missing {
                Lookup::Missing(FLAG_MISSING)
            } else {
                Lookup::Flag(item.as_f64()? as u32, item.bits.unwrap_or(b.bit_width))
            }
        } else {
            return None;
        };
        Some((fxy, lookup))
    }

    /// Write code meanings and flag breakdowns into the element tooltips.
    /// Meanings are resolved in one batch against Table F, with the last
    /// decoded element values as context.
    pub fn annotate(&mut self, tables: &Tables) {
        let root = self.tree.root();
        let targets: Vec<(NodeId, FXY, Lookup)> = self
            .tree
            .preorder(root)
            .filter_map(|id| self.classify(tables, id).map(|(fxy, l)| (id, fxy, l)))
            .collect();

        let mut pairs = vec![];
        for (_, fxy, lookup) in &targets {
            match lookup {
                Lookup::Code(code) => pairs.push((*fxy, *code)),
                Lookup::Flag(value, width) => {
                    pairs.extend(set_flag_bits(*value, *width).into_iter().map(|bit| (*fxy, bit)))
                }
                Lookup::Missing(_) => {}
            }
        }
        let meanings: BTreeMap<(FXY, u32), String> = tables.f.resolve_batch(pairs, &self.loaded_b);
        debug!("Resolved {} code/flag meanings", meanings.len());

        let meaning = |fxy: FXY, code: u32| {
            meanings
                .get(&(fxy, code))
                .map(String::as_str)
                .unwrap_or_default()
        };

        for (id, fxy, lookup) in targets {
            let mut warning = false;
            let tooltip = match lookup {
                Lookup::Missing(text) => text.to_string(),
                Lookup::Code(code) => meaning(fxy, code).to_string(),
                Lookup::Flag(value, width) => {
                    let mut text = String::new();
                    if violates_flag_rule(value, width) {
                        warning = true;
                        text.push_str(FLAG_WARNING);
                    }
                    text.push_str(&format!("({}) {}", value, flag_bitstring(value, width)));
                    for bit in set_flag_bits(value, width) {
                        text.push_str(&format!("\n{} {}", bit, meaning(fxy, bit)));
                    }
                    text
                }
            };
            let item = self.tree.item_mut(id);
            item.tooltip = tooltip;
            item.warning |= warning;
        }
    }
}
