//! Descriptor-list decoder.
//!
//! Walks the section 3 descriptors against the data section, one subset at a
//! time (or once for compressed messages), and records every descriptor
//! instance as a node of a [`Tree`].

mod element;
mod operator;
mod replication;
mod sequence;
mod table_a;
#[cfg(test)]
mod testing;

use crate::errors::{Error, Result};
use crate::item::{Item, ItemKind};
use crate::structs::bit::BitReader;
use crate::tree::{NodeId, Tree};
use rustc_hash::FxHashMap;
use tablelib::{BTableEntry, DTableEntry, FXY, TableDefinitions, TableType, Tables};
use tracing::{debug, trace};

pub(crate) const FXY_ASSOCIATED_FIELD_SIGNIFICANCE: FXY = FXY::new(0, 31, 21);

pub const CENTRE_NCEP: u16 = 7;
pub const CENTRE_ECMWF: u16 = 98;
pub const TABLE_DEFINITION_CATEGORY: u8 = 11;

/// Descriptor class, chosen by F.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    Element(FXY),
    Replication { x: u8, y: u8 },
    Operator { x: u8, y: u8 },
    Sequence(FXY),
}

impl From<FXY> for Descriptor {
    fn from(fxy: FXY) -> Self {
        match fxy.f() {
            0 => Descriptor::Element(fxy),
            1 => Descriptor::Replication {
                x: fxy.x(),
                y: fxy.y(),
            },
            2 => Descriptor::Operator {
                x: fxy.x(),
                y: fxy.y(),
            },
            _ => Descriptor::Sequence(fxy),
        }
    }
}

impl Descriptor {
    pub fn kind(&self) -> ItemKind {
        match self {
            Descriptor::Element(_) => ItemKind::Element,
            Descriptor::Replication { .. } => ItemKind::Replicator,
            Descriptor::Operator { .. } => ItemKind::Operator,
            Descriptor::Sequence(_) => ItemKind::Sequence,
        }
    }
}

/// Message-level facts the decoder needs from sections 1 and 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageParams {
    pub compressed: bool,
    pub subsets: usize,
    pub centre: u16,
    pub data_category: u8,
}

/// Operator state. Every subset starts from a fresh copy.
#[derive(Debug, Clone, Default)]
pub struct Modifiers {
    /// 2-01: added to the width of data elements.
    pub data_width: i32,
    /// 2-02: added to the scale of data elements.
    pub scale: i32,
    /// 2-03: width of new reference values, 255 concludes the definitions.
    pub refval_bits: u32,
    pub new_references: FxHashMap<FXY, i64>,
    /// 2-04
    pub associated_bits: u32,
    /// 2-06, consumed by the next element.
    pub signify_width: u32,
    /// 2-07
    pub increase: i32,
    /// 2-08, in bits.
    pub ccitt_width: u32,

    pub bitmap_construction: bool,
    pub bitmap: Vec<i64>,
    pub bitmap_index: usize,
    pub backward_reference: Option<usize>,
    /// Element descriptors seen so far, the target of bitmap back references.
    pub expanded: Vec<FXY>,
}

/// Result of decoding one message.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    pub tree: Tree,
    /// Subset containers. A compressed message has the root as its only entry.
    pub subsets: Vec<NodeId>,
    pub compressed: bool,
    pub number_of_subsets: usize,
    /// Tables carried by a data category 11 message.
    pub definitions: TableDefinitions,
    /// Last numeric value of each element, the context for code meanings.
    pub loaded_b: FxHashMap<FXY, f64>,
}

pub struct Decoder<'a> {
    tables: &'a Tables,
    params: MessageParams,
    mods: Modifiers,
    definitions: TableDefinitions,
    loaded_b: FxHashMap<FXY, f64>,
    tree: Tree,
}

impl<'a> Decoder<'a> {
    pub fn new(tables: &'a Tables, params: MessageParams) -> Self {
        Decoder {
            tables,
            params,
            mods: Modifiers::default(),
            definitions: TableDefinitions::default(),
            loaded_b: FxHashMap::default(),
            tree: Tree::new(Item::new("Message", ItemKind::Unknown)),
        }
    }

    pub fn decode(mut self, descriptors: &[FXY], br: &mut BitReader) -> Result<DecodedMessage> {
        let root = self.tree.root();
        let mut subsets = vec![];

        if self.params.subsets > 0 {
            let mut descriptors = descriptors;
            if self.params.data_category == TABLE_DEFINITION_CATEGORY {
                let used = self.read_table_a(br, descriptors)?;
                descriptors = &descriptors[used..];
            }

            let passes = if self.params.compressed {
                1
            } else {
                self.params.subsets
            };

            for n in 0..passes {
                self.mods = Modifiers::default();

                let parent = if self.params.compressed {
                    root
                } else {
                    self.tree
                        .add_child(root, Item::new(format!("Subset: {}", n + 1), ItemKind::Unknown))
                };
                debug!("Decoding subset {} of {}", n + 1, passes);
                self.read_descriptor_list(br, descriptors, 1, 0, parent)?;
                subsets.push(parent);
            }

            debug!(
                "Decoded {} nodes, {} bits left in section 4",
                self.tree.len(),
                br.remaining_bits()
            );
        }

        Ok(DecodedMessage {
            tree: self.tree,
            subsets,
            compressed: self.params.compressed,
            number_of_subsets: self.params.subsets,
            definitions: self.definitions,
            loaded_b: self.loaded_b,
        })
    }

    /// Definitions from this message shadow the shared tables.
    pub(crate) fn lookup_b(&self, fxy: FXY) -> Result<BTableEntry> {
        self.definitions
            .lookup_b(&fxy)
            .or_else(|| self.tables.lookup_b(&fxy))
            .cloned()
            .ok_or(Error::UnknownDescriptor {
                fxy,
                table: TableType::B,
            })
    }

    pub(crate) fn lookup_d(&self, fxy: FXY) -> Result<DTableEntry> {
        self.definitions
            .lookup_d(&fxy)
            .or_else(|| self.tables.lookup_d(&fxy))
            .cloned()
            .ok_or(Error::UnknownDescriptor {
                fxy,
                table: TableType::D,
            })
    }

    #[inline]
    fn compressed_subsets(&self) -> Option<usize> {
        (self.params.compressed && self.params.subsets > 0).then_some(self.params.subsets)
    }

    /// Decode `list` `iterations` times, adding one node per descriptor
    /// under `parent`. Replication and sequence handlers move `desc` past the
    /// descriptors they consume.
    pub(crate) fn read_descriptor_list(
        &mut self,
        br: &mut BitReader,
        list: &[FXY],
        iterations: usize,
        indent: usize,
        parent: NodeId,
    ) -> Result<()> {
        for iter in 0..iterations {
            let mut desc = 0;
            while desc < list.len() {
                let fxy = list[desc];
                let descriptor = Descriptor::from(fxy);

                let mut item = Item::for_descriptor(fxy, descriptor.kind());
                if iterations > 1 {
                    item.name = format!("{} ({})", item.name, iter);
                }
                trace!("{:indent$}{}", "", fxy, indent = indent * 2);
                let node = self.tree.add_child(parent, item);

                match descriptor {
                    Descriptor::Element(fxy) => self.read_element_node(br, node, fxy, false)?,
                    Descriptor::Replication { x, y } => {
                        self.read_replication(br, node, parent, indent, list, &mut desc, x, y)?
                    }
                    Descriptor::Operator { x, y } => {
                        let next = list.get(desc + 1).copied();
                        self.read_operator(br, node, parent, x, y, next)?
                    }
                    Descriptor::Sequence(_) => {
                        self.read_sequence(br, node, indent, list, &mut desc)?
                    }
                }

                desc += 1;
            }
        }
        Ok(())
    }

    /// Decode an element into the item already stored at `node`.
    pub(crate) fn read_element_node(
        &mut self,
        br: &mut BitReader,
        node: NodeId,
        fxy: FXY,
        bit_width_plus_one: bool,
    ) -> Result<()> {
        let mut item = std::mem::take(self.tree.item_mut(node));
        let result = self.read_element(br, fxy, &mut item, bit_width_plus_one);
        *self.tree.item_mut(node) = item;
        result
    }

    /// Add an element child under `parent`, decode it and return its text.
    pub(crate) fn read_child_element(
        &mut self,
        br: &mut BitReader,
        parent: NodeId,
        fxy: FXY,
    ) -> Result<String> {
        let node = self
            .tree
            .add_child(parent, Item::for_descriptor(fxy, ItemKind::Element));
        self.read_element_node(br, node, fxy, false)?;
        Ok(self.tree.item(node).as_string().to_string())
    }
}
