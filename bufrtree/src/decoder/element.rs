use super::{Decoder, FXY_ASSOCIATED_FIELD_SIGNIFICANCE, TABLE_DEFINITION_CATEGORY};
use crate::errors::{Error, Result};
use crate::item::{Item, Value};
use crate::structs::bit::{BitReader, is_all_ones};
use std::iter::repeat_n;
use tablelib::{BTableEntry, FXY};
use tracing::trace;

const NBINC_BITS: usize = 6;

impl Decoder<'_> {
    pub(crate) fn read_element(
        &mut self,
        br: &mut BitReader,
        fxy: FXY,
        item: &mut Item,
        bit_width_plus_one: bool,
    ) -> Result<()> {
        let b = self.lookup_b(fxy)?;

        self.mods.expanded.push(fxy);
        if self.mods.backward_reference.is_none() {
            item.name = format!("{} [{}]", item.name, self.mods.expanded.len() - 1);
        }
        if !b.mnemonic.is_empty() {
            item.name = format!("{} {}", item.name, b.mnemonic);
        }

        item.fxy = Some(fxy);
        item.mnemonic = b.mnemonic.clone();
        item.unit = b.unit.clone();
        item.description = b.description.clone();
        item.bits_range.0 = br.absolute_position();

        let defines_reference = matches!(self.mods.refval_bits, 1..=254);
        if b.is_numeric() {
            self.read_numeric(br, &b, item, bit_width_plus_one)?;
        } else {
            self.read_character(br, &b, item)?;
        }
        item.bits_range.1 = br.absolute_position().saturating_sub(1);

        if self.params.data_category != TABLE_DEFINITION_CATEGORY
            && !item.missing
            && !defines_reference
            && b.is_numeric()
        {
            if let Some(v) = item.as_f64() {
                self.loaded_b.insert(fxy, v);
            }
        }
        Ok(())
    }

    /// Associated fields are read and dropped.
    fn skip_associated_field(&mut self, br: &mut BitReader, fxy: FXY) -> Result<()> {
        let bits = self.mods.associated_bits as usize;
        if bits == 0 || fxy == FXY_ASSOCIATED_FIELD_SIGNIFICANCE {
            return Ok(());
        }
        br.skip_bits(bits)?;
        if let Some(nsub) = self.compressed_subsets() {
            let nbinc = br.get_int(NBINC_BITS)? as usize;
            if nbinc > 0 {
                br.skip_bits(nbinc * nsub)?;
            }
        }
        Ok(())
    }

    fn read_character(&mut self, br: &mut BitReader, b: &BTableEntry, item: &mut Item) -> Result<()> {
        self.skip_associated_field(br, b.fxy)?;

        let width = if self.mods.ccitt_width > 0 {
            self.mods.ccitt_width
        } else {
            b.bit_width
        };
        item.bits = Some(width);
        let base = br.get_string(width as usize)?;

        match self.compressed_subsets() {
            Some(nsub) => {
                let octets = br.get_int(NBINC_BITS)? as usize;
                if octets > 0 {
                    for _ in 0..nsub {
                        item.values.push(Value::String(br.get_string(octets * 8)?));
                    }
                } else {
                    item.values
                        .extend(repeat_n(Value::String(base), nsub));
                }
            }
            None => item.values.push(Value::String(base)),
        }
        trace!("{} = {:?}", b.fxy, item.as_string());
        Ok(())
    }

    fn read_numeric(
        &mut self,
        br: &mut BitReader,
        b: &BTableEntry,
        item: &mut Item,
        bit_width_plus_one: bool,
    ) -> Result<()> {
        let fxy = b.fxy;
        self.skip_associated_field(br, fxy)?;

        let mut scale = b.scale;
        let mut reference = b.reference as i64;
        let mut width = b.bit_width as i32;

        if b.is_data() {
            scale += self.mods.scale;
            width += self.mods.data_width;
            item.new_scale = self.mods.scale != 0;
            item.new_bits = self.mods.data_width != 0;

            if bit_width_plus_one {
                reference = -(1i64 << width.clamp(0, 62));
                width += 1;
            }
        }

        if matches!(self.mods.refval_bits, 1..=254) {
            item.bits_range.0 = br.absolute_position();
            let bits = self.mods.refval_bits as usize;
            let raw = br.get_int(bits)?;
            let top = 1u32 << (bits - 1);
            let new_ref = if raw & top != 0 {
                -((raw & !top) as i64)
            } else {
                raw as i64
            };
            self.mods.new_references.insert(fxy, new_ref);

            item.description = format!(
                "reference value for this descriptor ({}) changed to {}",
                fxy, new_ref
            );
            let n = self.compressed_subsets().unwrap_or(1);
            item.values
                .extend(repeat_n(Value::Number(new_ref as f64), n));
            return Ok(());
        }

        if let Some(&r) = self.mods.new_references.get(&fxy) {
            reference = r;
            item.new_ref_value = true;
        }

        let increase = self.mods.increase;
        if increase > 0 && b.is_data() {
            scale += increase;
            reference = reference.saturating_mul(10i64.saturating_pow(increase as u32));
            width += (10 * increase + 2) / 3;
            item.new_scale = true;
            item.new_ref_value = true;
            item.new_bits = true;
        }

        let dscale = 10f64.powi(-scale);

        if self.mods.signify_width > 0 {
            width = self.mods.signify_width as i32;
            self.mods.signify_width = 0;
            item.new_bits = true;
        }

        let width = usize::try_from(width).map_err(|_| {
            Error::InvalidArgument(format!("negative data width {} for {}", width, fxy))
        })?;

        item.scale = Some(scale);
        item.ref_value = Some(reference);
        item.bits = Some(width as u32);

        let base = br.get_int(width)?;
        let base_missing = is_all_ones(base, width);

        match self.compressed_subsets() {
            Some(nsub) => {
                let nbinc = br.get_int(NBINC_BITS)? as usize;
                if nbinc > 0 && base_missing {
                    return Err(Error::MalformedMessage(format!(
                        "{} increments of {} bits for a missing base value",
                        fxy, nbinc
                    )));
                }
                for n in 0..nsub {
                    let increment = if nbinc > 0 { br.get_int(nbinc)? } else { 0 };
                    let record_bitmap = self.mods.bitmap_construction && (nbinc > 0 || n == 0);
                    if base_missing {
                        item.missing = true;
                        if record_bitmap {
                            self.mods.bitmap.push(base as i64);
                        }
                    } else {
                        let v = (base as i64 + reference + increment as i64) as f64 * dscale;
                        item.values.push(Value::Number(v));
                        if record_bitmap {
                            self.mods.bitmap.push(v as i64);
                        }
                    }
                }
            }
            None => {
                if base_missing {
                    item.missing = true;
                    if self.mods.bitmap_construction {
                        self.mods.bitmap.push(base as i64);
                    }
                } else {
                    let v = (base as i64 + reference) as f64 * dscale;
                    item.values.push(Value::Number(v));
                    if self.mods.bitmap_construction {
                        self.mods.bitmap.push(v as i64);
                    }
                }
            }
        }

        trace!(
            "{} = {} {}",
            fxy,
            item.first_value().map(|v| v.to_string()).unwrap_or_else(|| "MISSING".into()),
            b.unit
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{BitWriter, params, tables_with};
    use super::super::{Decoder, Modifiers};
    use crate::item::{Item, ItemKind, Value};
    use tablelib::{BTableEntry, FXY};

    const TEMPERATURE: FXY = FXY::new(0, 12, 101);
    const STATION: FXY = FXY::new(0, 1, 15);

    fn b_entries() -> Vec<BTableEntry> {
        vec![
            BTableEntry::new(TEMPERATURE, "TMDB", "Temperature", "K", 2, 0, 16),
            BTableEntry::new(STATION, "", "Station name", "CCITT IA5", 0, 0, 24),
        ]
    }

    fn approx(values: &[Value], expected: &[f64]) -> bool {
        values.len() == expected.len()
            && values
                .iter()
                .zip(expected)
                .all(|(v, e)| v.as_f64().is_some_and(|v| (v - e).abs() < 1e-9))
    }

    fn read(decoder: &mut Decoder, data: &[u8], bits: usize, fxy: FXY) -> Item {
        let mut br = crate::structs::bit::BitReader::new(data, bits, 0);
        let mut item = Item::for_descriptor(fxy, ItemKind::Element);
        decoder.read_element(&mut br, fxy, &mut item, false).unwrap();
        item
    }

    #[test]
    fn numeric_value_applies_scale() {
        let tables = tables_with(b_entries(), vec![]);
        let mut decoder = Decoder::new(&tables, params(false, 1));
        let (data, bits) = BitWriter::new().put(27315, 16).finish();

        let item = read(&mut decoder, &data, bits, TEMPERATURE);
        assert!(approx(&item.values, &[273.15]));
        assert_eq!(item.name, "012101 [0] TMDB");
        assert_eq!(item.bits_range, (0, 15));
        assert!(!item.missing);
        assert!((decoder.loaded_b[&TEMPERATURE] - 273.15).abs() < 1e-9);
    }

    #[test]
    fn all_ones_is_missing() {
        let tables = tables_with(b_entries(), vec![]);
        let mut decoder = Decoder::new(&tables, params(false, 1));
        let (data, bits) = BitWriter::new().put(0xFFFF, 16).finish();

        let item = read(&mut decoder, &data, bits, TEMPERATURE);
        assert!(item.missing);
        assert!(item.values.is_empty());
        assert!(decoder.loaded_b.is_empty());
    }

    #[test]
    fn modifiers_change_width_scale_and_reference() {
        let tables = tables_with(b_entries(), vec![]);
        let mut decoder = Decoder::new(&tables, params(false, 1));
        decoder.mods = Modifiers {
            data_width: 4,
            scale: 1,
            ..Default::default()
        };
        decoder.mods.new_references.insert(TEMPERATURE, -100);
        let (data, bits) = BitWriter::new().put(283150, 20).finish();

        let item = read(&mut decoder, &data, bits, TEMPERATURE);
        assert_eq!(item.bits, Some(20));
        assert_eq!(item.scale, Some(3));
        assert_eq!(item.ref_value, Some(-100));
        assert!(item.new_bits && item.new_scale && item.new_ref_value);
        assert!(approx(&item.values, &[283.05]));
    }

    #[test]
    fn signify_width_is_consumed_once() {
        let tables = tables_with(b_entries(), vec![]);
        let mut decoder = Decoder::new(&tables, params(false, 1));
        decoder.mods.signify_width = 8;
        let (data, bits) = BitWriter::new().put(5, 8).put(100, 16).finish();

        let mut br = crate::structs::bit::BitReader::new(&data, bits, 0);
        let mut first = Item::for_descriptor(TEMPERATURE, ItemKind::Element);
        decoder.read_element(&mut br, TEMPERATURE, &mut first, false).unwrap();
        let mut second = Item::for_descriptor(TEMPERATURE, ItemKind::Element);
        decoder.read_element(&mut br, TEMPERATURE, &mut second, false).unwrap();

        assert!(approx(&first.values, &[0.05]));
        assert!(approx(&second.values, &[1.0]));
        assert_eq!(decoder.mods.signify_width, 0);
    }

    #[test]
    fn compressed_numeric_reads_increments() {
        let tables = tables_with(b_entries(), vec![]);
        let mut decoder = Decoder::new(&tables, params(true, 3));
        let (data, bits) = BitWriter::new()
            .put(27000, 16)
            .put(4, 6)
            .put(0, 4)
            .put(5, 4)
            .put(15, 4)
            .finish();

        let item = read(&mut decoder, &data, bits, TEMPERATURE);
        assert!(approx(&item.values, &[270.0, 270.05, 270.15]));
    }

    #[test]
    fn compressed_missing_base_with_increments_is_an_error() {
        let tables = tables_with(b_entries(), vec![]);
        let mut decoder = Decoder::new(&tables, params(true, 2));
        let (data, bits) = BitWriter::new().put(0xFFFF, 16).put(3, 6).put(0, 6).finish();

        let mut br = crate::structs::bit::BitReader::new(&data, bits, 0);
        let mut item = Item::for_descriptor(TEMPERATURE, ItemKind::Element);
        let err = decoder
            .read_element(&mut br, TEMPERATURE, &mut item, false)
            .unwrap_err();
        assert!(matches!(err, crate::errors::Error::MalformedMessage(_)));
    }

    #[test]
    fn compressed_strings_share_or_repeat() {
        let tables = tables_with(b_entries(), vec![]);

        let mut decoder = Decoder::new(&tables, params(true, 2));
        let (data, bits) = BitWriter::new().put_str("OSL").put(0, 6).finish();
        let item = read(&mut decoder, &data, bits, STATION);
        assert_eq!(
            item.values,
            vec![Value::String("OSL".into()), Value::String("OSL".into())]
        );
        assert_eq!(item.name, "001015 [0]");

        let mut decoder = Decoder::new(&tables, params(true, 2));
        let (data, bits) = BitWriter::new()
            .put(0, 24)
            .put(2, 6)
            .put_str("AB")
            .put_str("CD")
            .finish();
        let item = read(&mut decoder, &data, bits, STATION);
        assert_eq!(
            item.values,
            vec![Value::String("AB".into()), Value::String("CD".into())]
        );
    }

    #[test]
    fn unknown_element_is_reported() {
        let tables = tables_with(vec![], vec![]);
        let mut decoder = Decoder::new(&tables, params(false, 1));
        let data = [0u8; 4];
        let mut br = crate::structs::bit::BitReader::new(&data, 32, 0);
        let mut item = Item::default();
        let err = decoder
            .read_element(&mut br, TEMPERATURE, &mut item, false)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::errors::Error::UnknownDescriptor { fxy, .. } if fxy == TEMPERATURE
        ));
    }
}
