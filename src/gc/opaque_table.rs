//! Generational side table for native state reachable from script objects.
//!
//! A script object's opaque slot stores an [`OpaqueKey`] rather than a
//! pointer. The key packs a slot index with the slot's generation; removing
//! an entry bumps the generation, so a key that outlived its entry (a
//! duplicate finalization, a handle copied before teardown) resolves to
//! nothing instead of to whatever reused the slot.

use std::fmt;

/// Key into an [`OpaqueTable`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpaqueKey {
    index: u32,
    generation: u32,
}

impl OpaqueKey {
    /// Pack into a single integer, for hosts whose opaque slot is a plain word.
    pub fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Debug for OpaqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueKey({}v{})", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slab of native states addressed by generational keys.
pub struct OpaqueTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for OpaqueTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OpaqueTable<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Store `value` and return the key that reaches it.
    pub fn insert(&mut self, value: T) -> OpaqueKey {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return OpaqueKey {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });

        OpaqueKey {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, key: OpaqueKey) -> Option<&T> {
        self.slots
            .get(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, key: OpaqueKey) -> Option<&mut T> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Take the entry out. Stale keys return `None` and change nothing.
    pub fn remove(&mut self, key: OpaqueKey) -> Option<T> {
        let slot = self.slots.get_mut(key.index as usize)?;

        if slot.generation != key.generation {
            return None;
        }

        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        self.len -= 1;

        Some(value)
    }

    pub fn contains(&self, key: OpaqueKey) -> bool {
        self.get(key).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every entry, returning them in slot order.
    pub fn drain(&mut self) -> Vec<T> {
        let mut drained = Vec::with_capacity(self.len);

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                drained.push(value);
            }
        }

        self.len = 0;
        drained
    }
}

impl<T> fmt::Debug for OpaqueTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueTable")
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .finish()
    }
}
