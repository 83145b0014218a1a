//! Ordered knob vector.

use crate::error::KnobError;

/// Ordered mapping from knob name to amplitude, with unique names.
///
/// Created per optimizer iteration and consumed immediately by the
/// transform engine; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnobVector {
    pairs: Vec<(String, f64)>,
}

impl KnobVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pairs, rejecting duplicate names.
    pub fn from_pairs(pairs: Vec<(String, f64)>) -> Result<Self, KnobError> {
        let mut v = Self::new();
        for (name, amplitude) in pairs {
            v.push(name, amplitude)?;
        }
        Ok(v)
    }

    pub fn push(&mut self, name: impl Into<String>, amplitude: f64) -> Result<(), KnobError> {
        let name = name.into();
        if self.pairs.iter().any(|(n, _)| *n == name) {
            return Err(KnobError::DuplicateKnob(name));
        }
        self.pairs.push((name, amplitude));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.pairs.iter().map(|(n, a)| (n.as_str(), *a))
    }

    pub fn amplitude(&self, name: &str) -> Option<f64> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| *a)
    }
}
