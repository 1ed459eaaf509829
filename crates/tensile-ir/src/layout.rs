//! Layout descriptors: per-axis labels such as `NCHW` or `NCHW4c`.
//!
//! A primal axis is an upper-case letter. A subordinate axis is a split of a
//! primal axis and is written as its factor followed by the lower-case letter
//! (`4c` is a split of `C` into blocks of four).

use std::fmt;

use smallvec::SmallVec;

use crate::errors::{IrError, IrResult};

/// A single labelled axis of a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutAxis {
    /// Split factor for subordinate axes, `None` for primal axes.
    pub factor: Option<u32>,
    pub name: char,
}

impl LayoutAxis {
    pub fn is_primal(&self) -> bool {
        self.factor.is_none()
    }
}

impl fmt::Display for LayoutAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.factor {
            Some(factor) => write!(f, "{factor}{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Parsed layout string with axis lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    name: String,
    axes: SmallVec<[LayoutAxis; 6]>,
}

impl Layout {
    pub fn parse(text: &str) -> IrResult<Self> {
        let invalid = |reason: String| IrError::InvalidLayout {
            layout: text.to_owned(),
            reason,
        };

        let mut axes: SmallVec<[LayoutAxis; 6]> = SmallVec::new();
        let mut factor: Option<u32> = None;
        for c in text.chars() {
            if let Some(digit) = c.to_digit(10) {
                let current = factor.unwrap_or(0);
                factor = Some(
                    current
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(digit))
                        .ok_or_else(|| invalid(format!("split factor overflow at `{c}`")))?,
                );
            } else if c.is_ascii_uppercase() {
                if factor.is_some() {
                    return Err(invalid(format!("primal axis `{c}` cannot have a factor")));
                }
                axes.push(LayoutAxis { factor: None, name: c });
            } else if c.is_ascii_lowercase() {
                match factor.take() {
                    Some(f) if f > 0 => axes.push(LayoutAxis {
                        factor: Some(f),
                        name: c,
                    }),
                    _ => {
                        return Err(invalid(format!(
                            "subordinate axis `{c}` needs a positive factor"
                        )));
                    }
                }
            } else {
                return Err(invalid(format!("unexpected character `{c}`")));
            }
        }
        if factor.is_some() {
            return Err(invalid("dangling split factor".to_owned()));
        }
        for (i, axis) in axes.iter().enumerate() {
            if axes[..i].iter().any(|prev| prev.name == axis.name) {
                return Err(invalid(format!("axis `{}` appears twice", axis.name)));
            }
        }
        Ok(Self {
            name: text.to_owned(),
            axes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of axes (not characters): `NCHW4c` has five.
    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    pub fn axes(&self) -> &[LayoutAxis] {
        &self.axes
    }

    /// Position of the axis with the same letter as `axis`.
    pub fn index_of(&self, axis: &LayoutAxis) -> Option<usize> {
        self.axes.iter().position(|a| a.name == axis.name)
    }

    /// Layout whose axis `i` is this layout's axis `order[i]`.
    pub fn permute(&self, order: &[usize]) -> IrResult<Self> {
        let mut name = String::new();
        let mut axes = SmallVec::new();
        for &i in order {
            let axis = self.axes.get(i).ok_or_else(|| IrError::InvalidLayout {
                layout: self.name.clone(),
                reason: format!("permutation index {i} out of range"),
            })?;
            name.push_str(&axis.to_string());
            axes.push(*axis);
        }
        Ok(Self { name, axes })
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
