//! Constant pool for compiled procs.
//!
//! The pool stores numeric literals and strings, including the proc and
//! field names that reference operands point at.

use std::fmt;

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

/// Values stored in the constant pool.
///
/// Numbers are wrapped in [`OrderedFloat`] so constants can be hashed for
/// deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Number(OrderedFloat<f32>),
    String(String),
}

impl Constant {
    pub fn number(value: f32) -> Self {
        Constant::Number(OrderedFloat(value))
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            Constant::Number(n) => Some(n.into_inner()),
            Constant::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::String(s) => Some(s),
            Constant::Number(_) => None,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Number(n) => write!(f, "{n}"),
            Constant::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// Per-proc constant pool with deduplication.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    constants: Vec<Constant>,
    index: FxHashMap<Constant, u32>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or get an existing constant, returning its index.
    pub fn add(&mut self, constant: Constant) -> u32 {
        if let Some(&idx) = self.index.get(&constant) {
            return idx;
        }

        let idx = self.constants.len() as u32;
        self.constants.push(constant.clone());
        self.index.insert(constant, idx);
        idx
    }

    pub fn add_number(&mut self, value: f32) -> u32 {
        self.add(Constant::number(value))
    }

    pub fn add_string(&mut self, value: &str) -> u32 {
        self.add(Constant::String(value.to_string()))
    }

    pub fn get(&self, index: u32) -> Option<&Constant> {
        self.constants.get(index as usize)
    }

    /// The string at `index`, if that constant is a string.
    pub fn string(&self, index: u32) -> Option<&str> {
        self.get(index).and_then(Constant::as_str)
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pool_is_empty() {
        let pool = ConstantPool::new();
        assert!(pool.is_empty());
        assert_eq!(pool.get(0), None);
    }

    #[test]
    fn deduplicates() {
        let mut pool = ConstantPool::new();
        let a = pool.add_number(4.0);
        let b = pool.add_string("New");
        let c = pool.add_number(4.0);
        let d = pool.add_string("New");

        assert_eq!(a, c);
        assert_eq!(b, d);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn number_and_string_do_not_collide() {
        let mut pool = ConstantPool::new();
        let n = pool.add_number(1.0);
        let s = pool.add_string("1");
        assert_ne!(n, s);
        assert_eq!(pool.get(n).and_then(Constant::as_number), Some(1.0));
        assert_eq!(pool.string(s), Some("1"));
        assert_eq!(pool.string(n), None);
    }
}
