//! Slot storage with generational indices.
//!
//! Removing an entry bumps its slot's generation, so an [`Index`] handed
//! out before the removal can never resolve to whatever reuses the slot.

use std::fmt;

/// Stable handle into an [`Arena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Index {
    slot: u32,
    generation: u32,
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> Arena<T> {
    pub(crate) fn insert(&mut self, value: T) -> Index {
        self.len += 1;
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.value = Some(value);
            return Index {
                slot,
                generation: entry.generation,
            };
        }

        let slot = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Index {
            slot,
            generation: 0,
        }
    }

    pub(crate) fn remove(&mut self, index: Index) -> Option<T> {
        let entry = self.slots.get_mut(index.slot as usize)?;
        if entry.generation != index.generation {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(index.slot);
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn get(&self, index: Index) -> Option<&T> {
        self.slots
            .get(index.slot as usize)
            .filter(|entry| entry.generation == index.generation)
            .and_then(|entry| entry.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, index: Index) -> Option<&mut T> {
        self.slots
            .get_mut(index.slot as usize)
            .filter(|entry| entry.generation == index.generation)
            .and_then(|entry| entry.value.as_mut())
    }

    pub(crate) fn contains(&self, index: Index) -> bool {
        self.get(index).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Index, &T)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry.value.as_ref().map(|value| {
                (
                    Index {
                        slot: slot as u32,
                        generation: entry.generation,
                    },
                    value,
                )
            })
        })
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (Index, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(slot, entry)| {
            let generation = entry.generation;
            entry.value.as_mut().map(|value| {
                (
                    Index {
                        slot: slot as u32,
                        generation,
                    },
                    value,
                )
            })
        })
    }
}
