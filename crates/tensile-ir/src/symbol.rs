//! Interned names for operators, attribute keys and variables.

use std::fmt;
use std::sync::LazyLock;

use lasso::{Rodeo, Spur};
use parking_lot::RwLock;

static NAMES: LazyLock<RwLock<Rodeo>> = LazyLock::new(|| RwLock::new(Rodeo::default()));

/// A name stored once in a process-wide table. Copying and comparing a
/// symbol never touches the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Spur);

impl Symbol {
    pub fn new(text: &'static str) -> Self {
        // Most lookups hit names that are already interned.
        if let Some(key) = NAMES.read().get(text) {
            return Symbol(key);
        }
        Symbol(NAMES.write().get_or_intern_static(text))
    }
}

impl From<&'static str> for Symbol {
    fn from(text: &'static str) -> Self {
        Symbol::new(text)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = NAMES.read_recursive();
        f.write_str(names.resolve(&self.0))
    }
}

/// Define functions returning well-known symbols.
///
/// ```
/// use tensile_ir::{Symbol, symbols};
///
/// symbols! {
///     ATTR_AXES => "axes",
/// }
///
/// assert_eq!(ATTR_AXES(), Symbol::new("axes"));
/// assert_eq!(ATTR_AXES().to_string(), "axes");
/// ```
#[macro_export]
macro_rules! symbols {
    ($($(#[$attr:meta])* $name:ident => $text:literal),* $(,)?) => {
        $(
            $(#[$attr])*
            #[allow(non_snake_case)]
            #[inline]
            pub fn $name() -> $crate::Symbol {
                $crate::Symbol::new($text)
            }
        )*
    };
}
