//! Generational slot storage behind variable and constraint handles.
//!
//! Vacated slots are reused, but every removal bumps the slot generation, so
//! an old `(index, generation)` pair never resolves to a newer entry.
//! Creation order is tracked separately from slot order.

use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    entry: Option<(u64, T)>,
}

/// Position and generation of an arena entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotKey {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    order: BTreeMap<u64, u32>,
    next_sequence: u64,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: BTreeMap::new(),
            next_sequence: 0,
        }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Key the next `insert` will return.
    pub fn next_key(&self) -> SlotKey {
        match self.free.last() {
            Some(&index) => SlotKey {
                index,
                generation: self.slots[index as usize].generation,
            },
            None => SlotKey {
                index: self.slots.len() as u32,
                generation: 0,
            },
        }
    }

    pub fn insert(&mut self, value: T) -> SlotKey {
        let key = self.next_key();
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        match self.free.pop() {
            Some(index) => self.slots[index as usize].entry = Some((sequence, value)),
            None => self.slots.push(Slot {
                generation: 0,
                entry: Some((sequence, value)),
            }),
        }
        self.order.insert(sequence, key.index);
        key
    }

    fn slot(&self, key: SlotKey) -> Option<&Slot<T>> {
        self.slots
            .get(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
    }

    pub fn contains(&self, key: SlotKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: SlotKey) -> Option<&T> {
        self.slot(key)
            .and_then(|slot| slot.entry.as_ref())
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.entry.as_mut())
            .map(|(_, value)| value)
    }

    /// Creation sequence number of a live entry.
    pub fn sequence(&self, key: SlotKey) -> Option<u64> {
        self.slot(key)
            .and_then(|slot| slot.entry.as_ref())
            .map(|(sequence, _)| *sequence)
    }

    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        let slot = self
            .slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)?;
        let (sequence, value) = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.order.remove(&sequence);
        self.free.push(key.index);
        Some(value)
    }

    /// Live entries in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &T)> + '_ {
        self.order.values().filter_map(move |&index| {
            let slot = &self.slots[index as usize];
            slot.entry.as_ref().map(|(_, value)| {
                (
                    SlotKey {
                        index,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.get(b), Some(&"b"));
    }

    #[test]
    fn test_reused_slot_gets_new_generation() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.remove(a);
        let predicted = arena.next_key();
        let c = arena.insert(3);
        assert_eq!(predicted, c);
        assert_eq!(c.index, a.index);
        assert_ne!(c.generation, a.generation);
        assert!(!arena.contains(a));
        assert_eq!(arena.get(c), Some(&3));
    }

    #[test]
    fn test_iteration_follows_creation_order() {
        let mut arena = Arena::new();
        let a = arena.insert('a');
        arena.insert('b');
        arena.remove(a);
        arena.insert('c');
        let values: Vec<char> = arena.iter().map(|(_, value)| *value).collect();
        assert_eq!(values, vec!['b', 'c']);
    }
}
