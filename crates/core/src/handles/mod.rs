//! Generation-checked slots for native resources.
//!
//! Each slot carries a generation counter that is bumped on release, so a
//! [`HandleId`] issued before the release no longer matches and is reported
//! as a double release or a use after release instead of reaching native
//! code. A slot whose generation is exhausted is retired rather than reused.
//! Handles also carry the identity of the arena that issued them, so a handle
//! from one context is never resolved against another.

use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use serde::{Deserialize, Serialize};

use crate::{Result, SdlError};

/// Index plus generation of a tracked resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId {
    arena: u32,
    index: u32,
    generation: u32,
}

static NEXT_ARENA: AtomicU32 = AtomicU32::new(0);

impl HandleId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Bookkeeping totals for one resource type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCounts {
    pub created: u64,
    pub released: u64,
    pub live: usize,
}

impl ResourceCounts {
    pub fn combine(self, other: ResourceCounts) -> ResourceCounts {
        ResourceCounts {
            created: self.created + other.created,
            released: self.released + other.released,
            live: self.live + other.live,
        }
    }
}

/// What to do when calling code misuses a handle's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifetimePolicy {
    /// Panic with the error. Default for debug builds.
    Panic,
    /// Return the error without touching native state. Default for release
    /// builds.
    ReturnError,
}

impl Default for LifetimePolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Panic
        } else {
            Self::ReturnError
        }
    }
}

impl LifetimePolicy {
    /// Escalates lifetime defects according to the policy; other errors pass
    /// through untouched.
    pub fn enforce(self, err: SdlError) -> SdlError {
        if self == Self::Panic && err.is_lifetime_defect() {
            panic!("{err}");
        }
        err
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena handing out [`HandleId`]s for the values it owns.
#[derive(Debug)]
pub struct Arena<T> {
    id: u32,
    resource: &'static str,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
    created: u64,
    released: u64,
}

impl<T> Arena<T> {
    /// `resource` names the tracked type in error messages.
    pub fn new(resource: &'static str) -> Self {
        Self {
            id: NEXT_ARENA.fetch_add(1, Ordering::Relaxed),
            resource,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            created: 0,
            released: 0,
        }
    }

    pub fn insert(&mut self, value: T) -> HandleId {
        self.created += 1;
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            let generation = slot.generation;
            return self.handle(index, generation);
        }

        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        self.handle(index, 0)
    }

    pub fn get(&self, id: HandleId) -> Result<&T> {
        let slot = self.issued_slot(id)?;
        match slot.value.as_ref() {
            Some(value) if slot.generation == id.generation => Ok(value),
            _ => Err(SdlError::use_after_release(self.resource, id)),
        }
    }

    pub fn get_mut(&mut self, id: HandleId) -> Result<&mut T> {
        let resource = self.resource;
        self.issued_slot(id)?;
        let slot = &mut self.slots[id.index as usize];
        match slot.value.as_mut() {
            Some(value) if slot.generation == id.generation => Ok(value),
            _ => Err(SdlError::use_after_release(resource, id)),
        }
    }

    pub fn contains(&self, id: HandleId) -> bool {
        self.get(id).is_ok()
    }

    /// Removes the value behind `id`, invalidating every copy of the handle.
    pub fn release(&mut self, id: HandleId) -> Result<T> {
        self.issued_slot(id)?;
        let slot = &mut self.slots[id.index as usize];
        if slot.generation != id.generation || slot.value.is_none() {
            return Err(SdlError::double_release(self.resource, id));
        }

        let value = slot.value.take();
        // An exhausted slot stays empty forever; its last handle keeps
        // reporting as released.
        if let Some(next) = slot.generation.checked_add(1) {
            slot.generation = next;
            self.free.push(id.index);
        }
        self.live -= 1;
        self.released += 1;
        value.ok_or_else(|| SdlError::double_release(self.resource, id))
    }

    /// Live handles, oldest slot first.
    pub fn live_ids(&self) -> Vec<HandleId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.value.is_some())
            .map(|(index, slot)| self.handle(index as u32, slot.generation))
            .collect()
    }

    /// Releases every live value.
    pub fn drain(&mut self) -> Vec<(HandleId, T)> {
        self.live_ids()
            .into_iter()
            .filter_map(|id| self.release(id).ok().map(|value| (id, value)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> ResourceCounts {
        ResourceCounts {
            created: self.created,
            released: self.released,
            live: self.len(),
        }
    }

    fn handle(&self, index: u32, generation: u32) -> HandleId {
        HandleId {
            arena: self.id,
            index,
            generation,
        }
    }

    /// Rejects handles this arena never issued.
    fn issued_slot(&self, id: HandleId) -> Result<&Slot<T>> {
        if id.arena != self.id {
            return Err(SdlError::invalid(
                "handle",
                format!("{} handle {id} belongs to another context", self.resource),
            ));
        }
        match self.slots.get(id.index as usize) {
            Some(slot) if id.generation <= slot.generation => Ok(slot),
            _ => Err(SdlError::invalid(
                "handle",
                format!("{} handle {id} was never issued", self.resource),
            )),
        }
    }
}
