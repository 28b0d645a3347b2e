//! Per-category depth queues.
//!
//! Each linked event lives in a slot arena and is keyed in its category's
//! `BTreeMap` by `(depth, sequence)`. Queues run in ascending depth; equal
//! depths run in link order, and a relinked entry takes a fresh sequence so
//! it goes behind everything already at its new depth. Relinking at the
//! same depth is a no-op.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Bound;

use thiserror::Error;

use crate::numeric::Real;
use crate::object::EventCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle {
    slot: u32,
    generation: u32,
}

impl fmt::Display for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("event handle {handle} is not linked (double unlink)")]
    DoubleUnlink { handle: EventHandle },
}

#[derive(Debug, Clone, Copy)]
struct DepthKey(Real);

impl PartialEq for DepthKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DepthKey {}

impl PartialOrd for DepthKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DepthKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ScheduleKey {
    depth: DepthKey,
    sequence: u64,
}

#[derive(Debug)]
struct Linked<E> {
    category: EventCategory,
    key: ScheduleKey,
    event: E,
}

#[derive(Debug)]
struct Slot<E> {
    generation: u32,
    linked: Option<Linked<E>>,
}

/// Read position inside one category queue.
///
/// The cursor remembers the key it last yielded rather than borrowing the
/// queue, so handlers may link, unlink and relink between steps. An entry
/// relinked behind the cursor is skipped for the rest of the pass; one
/// relinked ahead of it is visited (again).
#[derive(Debug, Clone, Copy)]
pub struct ScheduleCursor {
    category: EventCategory,
    last: Option<ScheduleKey>,
}

impl ScheduleCursor {
    pub fn category(&self) -> EventCategory {
        self.category
    }
}

#[derive(Debug)]
pub struct DepthScheduler<E> {
    slots: Vec<Slot<E>>,
    free_slots: Vec<u32>,
    queues: HashMap<EventCategory, BTreeMap<ScheduleKey, EventHandle>>,
    next_sequence: u64,
}

impl<E> Default for DepthScheduler<E> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            queues: HashMap::new(),
            next_sequence: 0,
        }
    }
}

impl<E> DepthScheduler<E> {
    pub fn link(&mut self, category: EventCategory, depth: Real, event: E) -> EventHandle {
        let key = self.next_key(depth);
        let handle = match self.free_slots.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                entry.linked = Some(Linked {
                    category,
                    key,
                    event,
                });
                EventHandle {
                    slot,
                    generation: entry.generation,
                }
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    linked: Some(Linked {
                        category,
                        key,
                        event,
                    }),
                });
                EventHandle {
                    slot,
                    generation: 0,
                }
            }
        };
        self.queues.entry(category).or_default().insert(key, handle);
        handle
    }

    /// Removes a linked entry and hands back its event. The handle is dead
    /// afterwards; passing it again reports [`SchedulerError::DoubleUnlink`].
    pub fn unlink(&mut self, handle: EventHandle) -> Result<E, SchedulerError> {
        let slot = self
            .slots
            .get_mut(handle.slot as usize)
            .filter(|slot| slot.generation == handle.generation && slot.linked.is_some())
            .ok_or(SchedulerError::DoubleUnlink { handle })?;
        let Some(linked) = slot.linked.take() else {
            return Err(SchedulerError::DoubleUnlink { handle });
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(handle.slot);

        if let Some(queue) = self.queues.get_mut(&linked.category) {
            queue.remove(&linked.key);
        }
        Ok(linked.event)
    }

    /// Moves a linked entry to `depth` in one step; the handle stays valid.
    /// Relinking at the entry's current depth keeps its place.
    pub fn relink(&mut self, handle: EventHandle, depth: Real) -> Result<(), SchedulerError> {
        let current = self
            .depth_of(handle)
            .ok_or(SchedulerError::DoubleUnlink { handle })?;
        if current.total_cmp(&depth) == Ordering::Equal {
            return Ok(());
        }
        let key = self.next_key(depth);
        let linked = self
            .linked_mut(handle)
            .ok_or(SchedulerError::DoubleUnlink { handle })?;
        let old_key = std::mem::replace(&mut linked.key, key);
        let category = linked.category;

        let queue = self.queues.entry(category).or_default();
        queue.remove(&old_key);
        queue.insert(key, handle);
        Ok(())
    }

    pub fn is_linked(&self, handle: EventHandle) -> bool {
        self.linked(handle).is_some()
    }

    pub fn event(&self, handle: EventHandle) -> Option<&E> {
        self.linked(handle).map(|linked| &linked.event)
    }

    pub fn depth_of(&self, handle: EventHandle) -> Option<Real> {
        self.linked(handle).map(|linked| linked.key.depth.0)
    }

    pub fn len(&self, category: EventCategory) -> usize {
        self.queues.get(&category).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, category: EventCategory) -> bool {
        self.len(category) == 0
    }

    /// True when no category holds a linked entry.
    pub fn has_no_links(&self) -> bool {
        self.queues.values().all(BTreeMap::is_empty)
    }

    /// Events of one category in run order.
    pub fn iter(&self, category: EventCategory) -> impl Iterator<Item = &E> + '_ {
        self.queues
            .get(&category)
            .into_iter()
            .flat_map(|queue| queue.values())
            .filter_map(|handle| self.event(*handle))
    }

    pub fn cursor(&self, category: EventCategory) -> ScheduleCursor {
        ScheduleCursor {
            category,
            last: None,
        }
    }

    /// Steps the cursor to the next entry past its last position.
    pub fn advance(&self, cursor: &mut ScheduleCursor) -> Option<(EventHandle, &E)> {
        let queue = self.queues.get(&cursor.category)?;
        let lower = match cursor.last {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        let (key, handle) = queue.range((lower, Bound::Unbounded)).next()?;
        cursor.last = Some(*key);
        let event = self.event(*handle)?;
        Some((*handle, event))
    }

    fn next_key(&mut self, depth: Real) -> ScheduleKey {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        ScheduleKey {
            depth: DepthKey(depth),
            sequence,
        }
    }

    fn linked(&self, handle: EventHandle) -> Option<&Linked<E>> {
        self.slots
            .get(handle.slot as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.linked.as_ref())
    }

    fn linked_mut(&mut self, handle: EventHandle) -> Option<&mut Linked<E>> {
        self.slots
            .get_mut(handle.slot as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.linked.as_mut())
    }
}
