use std::fmt::Display;
use tablelib::FXY;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Number(_) => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemKind {
    #[default]
    Unknown,
    Element,
    Replicator,
    Operator,
    Sequence,
}

/// One decoded descriptor instance, or a synthetic message/subset container.
#[derive(Debug, Clone, Default)]
pub struct Item {
    pub fxy: Option<FXY>,
    pub name: String,
    pub mnemonic: String,
    /// One value, or one per subset in compressed messages.
    pub values: Vec<Value>,
    pub tooltip: String,
    pub unit: String,
    pub description: String,

    pub scale: Option<i32>,
    pub ref_value: Option<i64>,
    pub bits: Option<u32>,

    pub new_scale: bool,
    pub new_ref_value: bool,
    pub new_bits: bool,

    pub warning: bool,
    pub missing: bool,

    /// Absolute bit positions, inclusive.
    pub bits_range: (usize, usize),

    pub kind: ItemKind,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Item {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn for_descriptor(fxy: FXY, kind: ItemKind) -> Self {
        Item {
            fxy: Some(fxy),
            name: fxy.to_string(),
            kind,
            ..Default::default()
        }
    }

    pub fn is_element(&self) -> bool {
        self.kind == ItemKind::Element
    }

    pub fn first_value(&self) -> Option<&Value> {
        self.values.first()
    }

    /// The single string value, or "" when the item holds none.
    pub fn as_string(&self) -> &str {
        self.values.first().and_then(Value::as_str).unwrap_or("")
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.values.first().and_then(Value::as_f64)
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() && self.unit.is_empty() && self.description.is_empty() {
            return Ok(());
        }
        write!(f, "{} ", self.name)?;
        if self.missing {
            write!(f, "MISSING ")?;
        } else if let Some(value) = self.values.first() {
            write!(f, "{} ", value)?;
        }
        write!(f, "{} {}", self.unit, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_first_value_or_missing() {
        let mut item = Item::for_descriptor(FXY::new(0, 12, 101), ItemKind::Element);
        item.unit = "K".to_string();
        item.description = "Temperature".to_string();
        item.values.push(Value::Number(273.15));
        assert_eq!(item.to_string(), "012101 273.15 K Temperature");

        item.missing = true;
        item.values.clear();
        assert_eq!(item.to_string(), "012101 MISSING K Temperature");

        assert_eq!(Item::default().to_string(), "");
    }
}
