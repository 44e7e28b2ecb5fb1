use crate::eval::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Word-addressed storage seen by the evaluator.
pub trait Bus {
    fn load(&self, addr: i64) -> Result<i64>;
    fn store(&mut self, addr: i64, value: i64) -> Result<()>;
}

/// Sparse, zero-defaulting program memory.
///
/// The loaded program stays in a dense image; writes past its end land in an
/// address-keyed map, so any non-negative address is usable without
/// allocating the gap below it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    #[serde(default)]
    image: Vec<i64>,
    #[serde(default)]
    sparse: BTreeMap<u64, i64>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `program` at addresses `0..program.len()`.
    pub fn from_program(program: impl Into<Vec<i64>>) -> Self {
        Self {
            image: program.into(),
            sparse: BTreeMap::new(),
        }
    }

    pub fn read(&self, address: i64) -> Result<i64> {
        let addr = index(address)?;
        match self.image_slot(addr) {
            Some(slot) => Ok(self.image[slot]),
            None => Ok(self.sparse.get(&addr).copied().unwrap_or(0)),
        }
    }

    pub fn write(&mut self, address: i64, value: i64) -> Result<()> {
        let addr = index(address)?;
        match self.image_slot(addr) {
            Some(slot) => self.image[slot] = value,
            // An absent entry already reads as zero.
            None if value == 0 => {
                self.sparse.remove(&addr);
            }
            None => {
                self.sparse.insert(addr, value);
            }
        }
        Ok(())
    }

    /// Number of materialised words: the program image plus non-zero writes past it.
    pub fn len(&self) -> usize {
        self.image.len() + self.sparse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty() && self.sparse.is_empty()
    }

    /// The program image, updated in place by writes inside it.
    pub fn image(&self) -> &[i64] {
        &self.image
    }

    /// Non-zero words as `(address, value)` pairs, in address order.
    pub fn snapshot(&self) -> Vec<(u64, i64)> {
        self.image
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0)
            .map(|(addr, value)| (addr as u64, *value))
            .chain(self.sparse.iter().map(|(addr, value)| (*addr, *value)))
            .collect()
    }

    fn image_slot(&self, addr: u64) -> Option<usize> {
        usize::try_from(addr)
            .ok()
            .filter(|slot| *slot < self.image.len())
    }
}

impl Bus for Memory {
    fn load(&self, addr: i64) -> Result<i64> {
        self.read(addr)
    }

    fn store(&mut self, addr: i64, value: i64) -> Result<()> {
        self.write(addr, value)
    }
}

impl From<Vec<i64>> for Memory {
    fn from(words: Vec<i64>) -> Self {
        Self::from_program(words)
    }
}

fn index(address: i64) -> Result<u64> {
    u64::try_from(address).map_err(|_| Error::InvalidAddress(address))
}
