use super::{Decoder, FXY_ASSOCIATED_FIELD_SIGNIFICANCE};
use crate::errors::{Error, Result};
use crate::item::{Item, ItemKind, Value};
use crate::structs::bit::BitReader;
use crate::tree::NodeId;
use tablelib::FXY;
use tracing::debug;

const CANCEL: u8 = 255;

impl Decoder<'_> {
    /// Apply operator 2-XX-YYY. Operators 2-01 to 2-08 stay in force until
    /// cancelled or until the subset ends.
    pub(crate) fn read_operator(
        &mut self,
        br: &mut BitReader,
        node: NodeId,
        parent: NodeId,
        x: u8,
        y: u8,
        next: Option<FXY>,
    ) -> Result<()> {
        let description = match x {
            1 => {
                self.mods.data_width = if y == 0 { 0 } else { y as i32 - 128 };
                format!("operator 2 01 YYY - Change width of data field. y = {}", y)
            }
            2 => {
                self.mods.scale = if y == 0 { 0 } else { y as i32 - 128 };
                format!("operator 2 02 YYY - Change scale of data. y = {}", y)
            }
            3 => {
                self.mods.refval_bits = y as u32;
                if y == 0 {
                    self.mods.new_references.clear();
                }
                format!("operator 2 03 YYY - Change reference values. y = {}", y)
            }
            4 => {
                self.mods.associated_bits = y as u32;
                if y > 0 && next != Some(FXY_ASSOCIATED_FIELD_SIGNIFICANCE) {
                    return Err(Error::StructuralMismatch(format!(
                        "2-04-{:03} must be followed by 0-31-021, found {}",
                        y,
                        next.map(|n| n.dashed()).unwrap_or_else(|| "nothing".into())
                    )));
                }
                format!("operator 2 04 YYY - Add associated field. y = {}", y)
            }
            5 => {
                let start = br.absolute_position();
                let text = br.get_string(y as usize * 8)?;
                let item = self.tree.item_mut(node);
                item.bits_range = (start, br.absolute_position().saturating_sub(1));
                item.values.push(Value::String(text));
                format!(
                    "operator 2 05 YYY - Signify character operator YYY x 8 bits. y = {}",
                    y
                )
            }
            6 => {
                self.mods.signify_width = y as u32;
                format!(
                    "operator 2 06 YYY - Signify data width for the immediately following local descriptor y = {}",
                    y
                )
            }
            7 => {
                self.mods.increase = y as i32;
                format!(
                    "operator 2 07 YYY - Increase scale, reference value and data width. y = {}",
                    y
                )
            }
            8 => {
                self.mods.ccitt_width = y as u32 * 8;
                format!("operator 2 08 YYY - Change width of CCITT IA5 field. y = {}", y)
            }
            22 => {
                if y != 0 {
                    return Err(Error::UnsupportedOperator { x, y });
                }
                self.start_bitmap_reference();
                format!("operator 2 22 YYY quality information follows. y = {}", y)
            }
            23 | 24 | 25 | 32 => {
                match y {
                    0 => self.start_bitmap_reference(),
                    // 2-23-255 only marks the substituted value
                    CANCEL if x == 23 => {}
                    CANCEL => self.read_next_bitmap_element(br, parent, x == 25)?,
                    _ => return Err(Error::UnsupportedOperator { x, y }),
                }
                match x {
                    23 => format!("operator 2 23 YYY substituted values operator. y = {}", y),
                    24 => format!(
                        "operator 2 24 YYY first order statistical values marker operator. y = {}",
                        y
                    ),
                    25 => format!(
                        "operator 2 25 YYY Difference statistical values marker operator. y = {}",
                        y
                    ),
                    _ => format!(
                        "operator 2 32 YYY Replaced/retained values follow define data present bitmap. y = {}",
                        y
                    ),
                }
            }
            35 => {
                self.mods.expanded.clear();
                self.mods.backward_reference = None;
                "operator 2 35 YYY Cancel backward data reference".to_string()
            }
            36 => {
                if y != 0 {
                    return Err(Error::UnsupportedOperator { x, y });
                }
                match next {
                    Some(n) if n.f() == 1 && n.x() == 1 => {}
                    _ => {
                        return Err(Error::StructuralMismatch(
                            "2-36-000 must be followed by 1-01-YYY".to_string(),
                        ));
                    }
                }
                self.mods.bitmap_construction = true;
                "operator 2 36 YYY define data present bit-map".to_string()
            }
            37 => match y {
                0 => "operator 2 37 000 use defined data present bitmap".to_string(),
                CANCEL => "operator 2 37 255 cancel use defined data present bitmap".to_string(),
                _ => return Err(Error::UnsupportedOperator { x, y }),
            },
            _ => return Err(Error::UnsupportedOperator { x, y }),
        };

        debug!("{}", description);
        self.tree.item_mut(node).description = description;
        Ok(())
    }

    fn start_bitmap_reference(&mut self) {
        self.mods.bitmap_index = 0;
        if self.mods.backward_reference.is_none() {
            self.mods.backward_reference = Some(self.mods.expanded.len());
        }
    }

    /// Decode the element flagged by the next 0 in the bitmap. A bitmap with
    /// no further 0 entries reads nothing.
    pub(crate) fn read_next_bitmap_element(
        &mut self,
        br: &mut BitReader,
        parent: NodeId,
        bit_width_plus_one: bool,
    ) -> Result<()> {
        let start = self.mods.bitmap_index;
        let Some(i) = self
            .mods
            .bitmap
            .iter()
            .skip(start)
            .position(|&v| v == 0)
            .map(|p| p + start)
        else {
            return Ok(());
        };
        self.mods.bitmap_index = i + 1;

        let back_idx = self
            .mods
            .backward_reference
            .and_then(|r| (r + i).checked_sub(self.mods.bitmap.len()))
            .ok_or_else(|| {
                Error::StructuralMismatch(format!(
                    "bitmap entry {} points before the first data descriptor",
                    i
                ))
            })?;
        let fxy = *self.mods.expanded.get(back_idx).ok_or_else(|| {
            Error::StructuralMismatch(format!(
                "bitmap entry {} refers to descriptor {} of {}",
                i,
                back_idx,
                self.mods.expanded.len()
            ))
        })?;

        let mut item = Item::for_descriptor(fxy, ItemKind::Element);
        item.name = format!("{} -> [{}]", fxy, back_idx);
        let node = self.tree.add_child(parent, item);
        self.read_element_node(br, node, fxy, bit_width_plus_one)
    }
}
