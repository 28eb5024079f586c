use super::Decoder;
use crate::errors::{Error, Result};
use crate::item::{Item, ItemKind, Value};
use crate::structs::bit::BitReader;
use crate::tree::NodeId;
use tablelib::FXY;
use tracing::{debug, warn};

/// Width of the delayed replication factor announced by 0-31-YYY.
fn delayed_count_bits(next: FXY) -> Result<usize> {
    if next.f() != 0 || next.x() != 31 {
        return Err(Error::StructuralMismatch(format!(
            "descriptor after delayed replication is {}, expected 0-31-YYY",
            next.dashed()
        )));
    }
    match next.y() {
        0 => Ok(1),
        1 => Ok(8),
        2 => Ok(16),
        11 | 12 => Err(Error::Unsupported(format!(
            "data repetition factor {}",
            next.dashed()
        ))),
        _ => Err(Error::StructuralMismatch(format!(
            "unknown delayed replication factor {}",
            next.dashed()
        ))),
    }
}

impl Decoder<'_> {
    /// Compressed replication counts must be equal in every subset, so any
    /// increments that follow have to be zero.
    pub(crate) fn check_compressed_count(&mut self, br: &mut BitReader, what: FXY) -> Result<()> {
        let Some(nsub) = self.compressed_subsets() else {
            return Ok(());
        };
        let nbinc = br.get_int(6)? as usize;
        if nbinc == 0 {
            return Ok(());
        }
        for _ in 0..nsub {
            if br.get_int(nbinc)? != 0 {
                return Err(Error::StructuralMismatch(format!(
                    "replication count of {} differs between compressed subsets",
                    what
                )));
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn read_replication(
        &mut self,
        br: &mut BitReader,
        node: NodeId,
        parent: NodeId,
        indent: usize,
        list: &[FXY],
        desc: &mut usize,
        x: u8,
        y: u8,
    ) -> Result<()> {
        let fxy = list[*desc];
        let mut niter = y as usize;

        if y == 0 {
            let next = *list.get(*desc + 1).ok_or_else(|| {
                Error::StructuralMismatch(format!(
                    "delayed replication {} ends the descriptor list",
                    fxy
                ))
            })?;

            let mut counter = Item::new(next.to_string(), ItemKind::Replicator);
            counter.fxy = Some(next);
            counter.bits_range.0 = br.absolute_position();

            let bits = delayed_count_bits(next)?;
            niter = br.get_int(bits)? as usize;
            counter.values.push(Value::Number(niter as f64));
            counter.description = format!(
                "delayed ({}-bit delay) replication operator {} descriptors replicated {} times",
                bits, x, niter
            );
            counter.bits_range.1 = br.absolute_position().saturating_sub(1);
            self.tree.add_child(parent, counter);

            self.mods.expanded.push(next);
            *desc += 1;

            debug!("{} delayed replication of {} descriptors, {} times", fxy, x, niter);
            self.tree.item_mut(node).description =
                format!("delayed replication operator {} descriptors replicated ...", x);
        } else {
            self.tree.item_mut(node).description = format!(
                "standard replication operator {} descriptors replicated {} times",
                x, y
            );
        }

        let start = *desc + 1;
        let end = start + x as usize;
        let iter_list = if niter > 0 {
            list.get(start..end).ok_or_else(|| {
                Error::StructuralMismatch(format!(
                    "{} replicates {} descriptors but only {} follow",
                    fxy,
                    x,
                    list.len().saturating_sub(start)
                ))
            })?
        } else {
            &[]
        };
        *desc += x as usize;

        if self.mods.bitmap_construction {
            self.mods.bitmap.clear();
        }

        if y == 0 {
            self.check_compressed_count(br, fxy)?;
        }

        self.read_descriptor_list(br, iter_list, niter, indent, parent)?;

        if self.mods.bitmap_construction {
            if self.mods.bitmap.len() != niter {
                warn!(
                    "data present bitmap has {} entries, replication declared {}",
                    self.mods.bitmap.len(),
                    niter
                );
            }
            self.mods.bitmap_construction = false;
        }
        Ok(())
    }
}
