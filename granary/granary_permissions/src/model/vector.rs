use serde::{Deserialize, Serialize};
use std::fmt;

/// A set of permissions, indexed like a grain's permission catalog.
///
/// Vectors built from catalogs of different ages may differ in length. Every
/// operation treats positions past the end of a vector as `false`, and
/// equality ignores trailing `false` entries, so `[true]` equals
/// `[true, false, false]`.
///
/// The combining operations mutate in place and report whether anything
/// changed, which is what the propagation worklist needs to detect progress.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionVector {
    bits: Vec<bool>,
}

impl PermissionVector {
    /// Wrap a raw bit array.
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// The vector with no permissions.
    pub fn empty() -> Self {
        Self { bits: Vec::new() }
    }

    /// A vector holding every one of `len` permissions.
    pub fn all(len: usize) -> Self {
        Self {
            bits: vec![true; len],
        }
    }

    /// Build a vector with exactly the given positions set.
    pub fn from_indices(len: usize, indices: &[usize]) -> Self {
        let mut bits = vec![false; len];
        for &index in indices {
            if index >= bits.len() {
                bits.resize(index + 1, false);
            }
            bits[index] = true;
        }
        Self { bits }
    }

    /// Stored length. Positions beyond it read as `false`.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether no bits are stored at all.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Whether no permission is held.
    pub fn is_none_held(&self) -> bool {
        self.bits.iter().all(|bit| !bit)
    }

    /// Read one position.
    pub fn get(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    /// The raw bits.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Add every permission in `other`, growing if `other` is longer.
    pub fn union_with(&mut self, other: &PermissionVector) -> bool {
        if other.bits.len() > self.bits.len() {
            self.bits.resize(other.bits.len(), false);
        }

        let mut changed = false;
        for (bit, &theirs) in self.bits.iter_mut().zip(other.bits.iter()) {
            if theirs && !*bit {
                *bit = true;
                changed = true;
            }
        }
        changed
    }

    /// Keep only permissions also held by `other`.
    pub fn intersect_with(&mut self, other: &PermissionVector) -> bool {
        let mut changed = false;
        for (index, bit) in self.bits.iter_mut().enumerate() {
            if *bit && !other.get(index) {
                *bit = false;
                changed = true;
            }
        }
        changed
    }

    /// Drop every permission held by `other`.
    pub fn subtract(&mut self, other: &PermissionVector) -> bool {
        let mut changed = false;
        for (bit, &theirs) in self.bits.iter_mut().zip(other.bits.iter()) {
            if theirs && *bit {
                *bit = false;
                changed = true;
            }
        }
        changed
    }

    /// Non-mutating union.
    pub fn union(&self, other: &PermissionVector) -> (PermissionVector, bool) {
        let mut result = self.clone();
        let changed = result.union_with(other);
        (result, changed)
    }

    /// Non-mutating intersection.
    pub fn intersect(&self, other: &PermissionVector) -> (PermissionVector, bool) {
        let mut result = self.clone();
        let changed = result.intersect_with(other);
        (result, changed)
    }

    /// Non-mutating subtraction.
    pub fn difference(&self, other: &PermissionVector) -> (PermissionVector, bool) {
        let mut result = self.clone();
        let changed = result.subtract(other);
        (result, changed)
    }

    /// Whether every permission held here is also held by `other`.
    pub fn is_subset_of(&self, other: &PermissionVector) -> bool {
        self.bits
            .iter()
            .enumerate()
            .all(|(index, &bit)| !bit || other.get(index))
    }

    /// Copy of this vector padded or truncated to `len` positions.
    pub fn resized(&self, len: usize) -> PermissionVector {
        let mut bits = self.bits.clone();
        bits.resize(len, false);
        Self { bits }
    }
}

impl PartialEq for PermissionVector {
    fn eq(&self, other: &Self) -> bool {
        let len = self.bits.len().max(other.bits.len());
        (0..len).all(|index| self.get(index) == other.get(index))
    }
}

impl Eq for PermissionVector {}

impl From<Vec<bool>> for PermissionVector {
    fn from(bits: Vec<bool>) -> Self {
        Self::new(bits)
    }
}

impl fmt::Display for PermissionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, bit) in self.bits.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", bit)?;
        }
        write!(f, "]")
    }
}
