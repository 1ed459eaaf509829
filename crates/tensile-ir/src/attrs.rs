//! Attribute values carried by call nodes and by the operator registry.

use std::collections::BTreeMap;
use std::fmt;

use smallvec::SmallVec;

use crate::symbol::Symbol;
use crate::types::DType;

/// Attribute bag keyed by interned names. Ordered so printing is stable.
pub type Attrs = BTreeMap<Symbol, Attribute>;

/// IR attribute values.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Unit/nil value.
    Unit,
    Bool(bool),
    Int(i64),
    /// Float constant stored as raw bits.
    FloatBits(u64),
    String(String),
    /// Single interned symbol.
    Symbol(Symbol),
    DType(DType),
    /// List of attributes.
    List(Vec<Attribute>),
}

impl Attribute {
    /// Build a list of integer attributes.
    pub fn int_list(values: impl IntoIterator<Item = i64>) -> Self {
        Attribute::List(values.into_iter().map(Attribute::Int).collect())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Attribute::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Text of a string or symbol attribute.
    pub fn as_str(&self) -> Option<String> {
        match self {
            Attribute::String(s) => Some(s.clone()),
            Attribute::Symbol(s) => Some(s.to_string()),
            _ => None,
        }
    }

    /// Elements of a list made only of integers.
    pub fn as_int_list(&self) -> Option<SmallVec<[i64; 4]>> {
        match self {
            Attribute::List(items) => items.iter().map(Attribute::as_int).collect(),
            _ => None,
        }
    }
}

impl From<i64> for Attribute {
    fn from(value: i64) -> Self {
        Attribute::Int(value)
    }
}

impl From<bool> for Attribute {
    fn from(value: bool) -> Self {
        Attribute::Bool(value)
    }
}

impl From<Vec<Attribute>> for Attribute {
    fn from(value: Vec<Attribute>) -> Self {
        Attribute::List(value)
    }
}

impl From<Symbol> for Attribute {
    fn from(value: Symbol) -> Self {
        Attribute::Symbol(value)
    }
}

impl From<String> for Attribute {
    fn from(value: String) -> Self {
        Attribute::String(value)
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Attribute::String(value.to_string())
    }
}

impl From<DType> for Attribute {
    fn from(value: DType) -> Self {
        Attribute::DType(value)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Unit => write!(f, "()"),
            Attribute::Bool(b) => write!(f, "{b}"),
            Attribute::Int(v) => write!(f, "{v}"),
            Attribute::FloatBits(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            Attribute::String(s) => write!(f, "{s:?}"),
            Attribute::Symbol(s) => write!(f, "@{s}"),
            Attribute::DType(d) => write!(f, "{d}"),
            Attribute::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}
