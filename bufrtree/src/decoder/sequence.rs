use super::{CENTRE_NCEP, Decoder};
use crate::errors::{Error, Result};
use crate::item::{Item, ItemKind, Value};
use crate::structs::bit::BitReader;
use crate::tree::NodeId;
use std::str::FromStr;
use tablelib::{BTableEntry, DTableEntry, FXY};
use tracing::debug;

const TABLE_D_ENTRY: FXY = FXY::new(3, 0, 3);
const TABLE_B_ENTRY: FXY = FXY::new(3, 0, 4);
const NCEP_DRP: u8 = 60;

const NCEP_TEXT: FXY = FXY::new(2, 5, 64);
const DEFINITION_REPLICATION: FXY = FXY::new(1, 1, 0);
const DEFINITION_CHILD: FXY = FXY::new(0, 0, 30);

pub(crate) fn parse_int(text: &str, what: FXY) -> Result<i32> {
    text.trim().parse().map_err(|_| {
        Error::MalformedMessage(format!("{} holds {:?}, expected an integer", what, text))
    })
}

fn parse_fxy(f: i32, x: i32, y: i32) -> Result<FXY> {
    let part = |v: i32| {
        u8::try_from(v)
            .map_err(|_| Error::MalformedMessage(format!("descriptor part {} out of range", v)))
    };
    FXY::try_new(part(f)?, part(x)?, part(y)?)
        .map_err(|e| Error::MalformedMessage(format!("{:#}", e)))
}

/// Octets 1-8 of NCEP text are the mnemonic, 10-64 the description.
fn split_ncep_text(text: &str) -> (String, String) {
    let mnemonic: String = text.chars().take(8).collect();
    let description: String = text.chars().skip(9).take(55).collect();
    (mnemonic.trim().to_string(), description.trim().to_string())
}

impl Decoder<'_> {
    pub(crate) fn read_sequence(
        &mut self,
        br: &mut BitReader,
        node: NodeId,
        indent: usize,
        list: &[FXY],
        desc: &mut usize,
    ) -> Result<()> {
        let fxy = list[*desc];

        if fxy == TABLE_D_ENTRY {
            return self.read_table_d_entry(br, node, list, desc);
        }
        if fxy == TABLE_B_ENTRY {
            return self.read_table_b_entry(br, node);
        }
        if fxy.x() == NCEP_DRP && (1..=4).contains(&fxy.y()) {
            return self.read_ncep_drp(br, node, indent, list, desc);
        }

        let d = self.lookup_d(fxy)?;
        debug!("{} {} -->", fxy, d.mnemonic);
        let item = self.tree.item_mut(node);
        item.mnemonic = d.mnemonic.clone();
        item.description = d.description.clone();
        self.read_descriptor_list(br, &d.chain, 1, indent + 1, node)
    }

    /// The next descriptor of a table definition, which must be `expected`.
    fn next_definition_descriptor(
        list: &[FXY],
        desc: &mut usize,
        expected: impl Fn(FXY) -> bool,
        what: &str,
    ) -> Result<FXY> {
        *desc += 1;
        match list.get(*desc) {
            Some(&fxy) if expected(fxy) => Ok(fxy),
            Some(fxy) => Err(Error::StructuralMismatch(format!(
                "expected {} in a Table D definition, found {}",
                what,
                fxy.dashed()
            ))),
            None => Err(Error::StructuralMismatch(format!(
                "Table D definition ends before {}",
                what
            ))),
        }
    }

    fn read_table_d_entry(
        &mut self,
        br: &mut BitReader,
        node: NodeId,
        list: &[FXY],
        desc: &mut usize,
    ) -> Result<()> {
        let mut parts = [0i32; 3];
        for (part, y) in parts.iter_mut().zip(10..=12) {
            let what = FXY::new(0, 0, y);
            *part = parse_int(&self.read_child_element(br, node, what)?, what)?;
        }
        let defined = parse_fxy(parts[0], parts[1], parts[2])?;
        let mut mnemonic = defined.to_string();
        let mut description = defined.to_string();

        if self.params.centre == CENTRE_NCEP {
            let op = Self::next_definition_descriptor(list, desc, |f| f == NCEP_TEXT, "2-05-064")?;
            let op_node = self
                .tree
                .add_child(node, Item::for_descriptor(op, ItemKind::Operator));
            self.read_operator(br, op_node, node, op.x(), op.y(), None)?;
            (mnemonic, description) = split_ncep_text(self.tree.item(op_node).as_string());
        }

        let rep = Self::next_definition_descriptor(
            list,
            desc,
            |f| f == DEFINITION_REPLICATION,
            "1-01-000",
        )?;
        let mut rep_item = Item::for_descriptor(rep, ItemKind::Replicator);
        rep_item.description = "delayed replication operator 1 descriptors replicated ...".into();
        self.tree.add_child(node, rep_item);

        let count = Self::next_definition_descriptor(
            list,
            desc,
            |f| f.f() == 0 && f.x() == 31 && matches!(f.y(), 1 | 2),
            "0-31-001 or 0-31-002",
        )?;
        let bits = if count.y() == 1 { 8 } else { 16 };
        let mut count_item = Item::new(count.to_string(), ItemKind::Replicator);
        count_item.fxy = Some(count);
        count_item.bits_range.0 = br.absolute_position();
        let nchild = br.get_int(bits)? as usize;
        count_item.bits_range.1 = br.absolute_position().saturating_sub(1);
        count_item.values.push(Value::Number(nchild as f64));
        count_item.description = format!(
            "delayed ({}-bit delay) replication operator 1 descriptors replicated {} times",
            bits, nchild
        );
        self.tree.add_child(node, count_item);

        Self::next_definition_descriptor(list, desc, |f| f == DEFINITION_CHILD, "0-00-030")?;

        let mut chain = Vec::with_capacity(nchild);
        for _ in 0..nchild {
            let text = self.read_child_element(br, node, DEFINITION_CHILD)?;
            let child = FXY::from_str(text.trim()).map_err(|e| {
                Error::MalformedMessage(format!("bad descriptor {:?} in {}: {:#}", text, defined, e))
            })?;
            chain.push(child);
        }

        debug!("Table D definition {} with {} descriptors", defined, chain.len());
        self.definitions
            .d
            .push(DTableEntry::new(defined, mnemonic, description, chain));
        Ok(())
    }

    fn read_table_b_entry(&mut self, br: &mut BitReader, node: NodeId) -> Result<()> {
        let mut fields: Vec<String> = Vec::with_capacity(11);
        for y in 10..=20 {
            fields.push(self.read_child_element(br, node, FXY::new(0, 0, y))?);
        }
        let int = |i: usize| parse_int(&fields[i], FXY::new(0, 0, 10 + i as u8));

        let defined = parse_fxy(int(0)?, int(1)?, int(2)?)?;
        let (line1, line2, units) = (&fields[3], &fields[4], &fields[5]);
        let mut scale = int(7)?;
        if fields[6].trim() == "-" {
            scale = -scale;
        }
        let mut reference = int(9)?;
        if fields[8].trim() == "-" {
            reference = -reference;
        }
        let width = u32::try_from(int(10)?).map_err(|_| {
            Error::MalformedMessage(format!("negative data width for {}", defined))
        })?;

        let text = format!("{}{}", line1, line2);
        let (mnemonic, description) = if self.params.centre == CENTRE_NCEP {
            let (mnemonic, _) = split_ncep_text(line1);
            (mnemonic, split_ncep_text(&text).1)
        } else {
            (String::new(), text.trim().to_string())
        };

        debug!("Table B definition {} {}", defined, description);
        self.definitions.b.push(BTableEntry::new(
            defined,
            mnemonic,
            description,
            units.as_str(),
            scale,
            reference,
            width,
        ));
        Ok(())
    }

    /// NCEP 3-60-YYY: a counter followed by one replicated descriptor.
    fn read_ncep_drp(
        &mut self,
        br: &mut BitReader,
        node: NodeId,
        indent: usize,
        list: &[FXY],
        desc: &mut usize,
    ) -> Result<()> {
        let fxy = list[*desc];
        let (bits, label) = match fxy.y() {
            1 => (16, "DRP16BIT"),
            2 => (8, "DRP8BIT"),
            3 => (8, "DRPSTAK"),
            _ => (1, "DRP1BIT"),
        };

        let start = br.absolute_position();
        let niter = br.get_int(bits)? as usize;
        {
            let item = self.tree.item_mut(node);
            item.bits_range = (start, br.absolute_position().saturating_sub(1));
            item.description = format!("{} niter = {}", label, niter);
        }
        self.check_compressed_count(br, fxy)?;

        if niter > 0 {
            let next = *list.get(*desc + 1).ok_or_else(|| {
                Error::StructuralMismatch(format!("{} has no descriptor to replicate", fxy))
            })?;
            self.read_descriptor_list(br, &[next], niter, indent, node)?;
        }
        *desc += 1;
        Ok(())
    }
}
