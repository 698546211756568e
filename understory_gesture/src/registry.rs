// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered gesture registry.
//!
//! Registration order is significant: the matcher walks gestures in the
//! order they were registered and the first full match wins. Removing a
//! gesture never reorders the others.
//!
//! Gestures are stored in generational slots. A removed gesture's
//! [`GestureId`] goes stale; a gesture registered later into the same slot
//! gets a new generation and a distinct id.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::diag::{LogCategories, diag};
use crate::error::RegistrationError;
use crate::gesture::{Gesture, GestureDefinition, GestureRuntime};
use crate::permutation::Permutation;
use crate::types::{GestureId, TargetId};

/// Marker that asks for a unique name suffix.
pub const AUTO_UNIQUE_MARKER: char = '*';

/// Ordered, name-indexed gesture storage.
#[derive(Debug, Default)]
pub struct GestureRegistry {
    slots: Vec<Option<Gesture>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    order: Vec<GestureId>,
    names: BTreeMap<String, GestureId>,
    next_suffix: u64,
    pub(crate) diagnostics: LogCategories,
}

impl GestureRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a definition.
    ///
    /// `target_exists` reports whether a target handle was issued by the owning coordinator.
    pub fn register(
        &mut self,
        mut def: GestureDefinition,
        target_exists: impl Fn(TargetId) -> bool,
    ) -> Result<GestureId, RegistrationError> {
        let (name, base) = match def.name.strip_suffix(AUTO_UNIQUE_MARKER) {
            Some(base) => {
                let base = String::from(base);
                (self.unique_name(&base), base)
            }
            None => {
                if self.names.contains_key(&def.name) {
                    return Err(RegistrationError::DuplicateName(def.name));
                }
                (def.name.clone(), def.name.clone())
            }
        };

        let Some(target) = def.target else {
            return Err(RegistrationError::MissingTarget(name));
        };
        if !target_exists(target) {
            return Err(RegistrationError::UnknownTarget { name, target });
        }
        if def.pointer_types.is_empty() {
            return Err(RegistrationError::MissingPointerRequirement(name));
        }
        let mut permutations = Vec::with_capacity(def.pointer_types.len());
        for text in &def.pointer_types {
            let p: Permutation =
                text.parse()
                    .map_err(|source| RegistrationError::InvalidPermutation {
                        name: name.clone(),
                        permutation: text.clone(),
                        source,
                    })?;
            permutations.push(p);
        }
        if def.recognition_timeout_ms == 0 && permutations.iter().any(|p| p.total() > 1) {
            return Err(RegistrationError::ZeroRecognitionTimeout(name));
        }

        def.repeat_count = def.repeat_count.max(1);
        def.name = name.clone();
        let group = def.group.clone().unwrap_or(base);
        let gesture = Gesture {
            def,
            target,
            group,
            permutations,
            runtime: GestureRuntime::default(),
        };

        let id = self.alloc(gesture);
        self.order.push(id);
        self.names.insert(name, id);

        if let Some((later, earlier)) = self.repeat_order_conflicts(target).into_iter().last() {
            diag!(
                self.diagnostics,
                REGISTRY,
                later = ?later,
                earlier = ?earlier,
                "repeat gesture registered after an overlapping simpler gesture; it cannot win"
            );
        }
        diag!(self.diagnostics, REGISTRY, gesture = ?id, %target, "registered");
        Ok(id)
    }

    /// Remove a gesture by name and return it.
    pub fn remove(&mut self, name: &str) -> Result<Gesture, RegistrationError> {
        let id = self
            .names
            .remove(name)
            .ok_or_else(|| RegistrationError::UnknownGesture(String::from(name)))?;
        self.order.retain(|g| *g != id);
        let gesture = self.slots[id.idx()]
            .take()
            .ok_or_else(|| RegistrationError::UnknownGesture(String::from(name)))?;
        self.free_list.push(id.idx());
        diag!(self.diagnostics, REGISTRY, gesture = ?id, "removed");
        Ok(gesture)
    }

    /// Look up a live gesture.
    pub fn get(&self, id: GestureId) -> Option<&Gesture> {
        self.slots
            .get(id.idx())
            .and_then(|s| s.as_ref())
            .filter(|_| self.generations[id.idx()] == id.generation())
    }

    pub(crate) fn get_mut(&mut self, id: GestureId) -> Option<&mut Gesture> {
        if self.generations.get(id.idx()) != Some(&id.generation()) {
            return None;
        }
        self.slots.get_mut(id.idx()).and_then(|s| s.as_mut())
    }

    /// Look up a gesture id by registered name.
    pub fn id_of(&self, name: &str) -> Option<GestureId> {
        self.names.get(name).copied()
    }

    /// Gesture ids in registration order.
    pub fn ids(&self) -> &[GestureId] {
        &self.order
    }

    /// Gesture ids registered on `target`, in registration order.
    pub fn ids_on(&self, target: TargetId) -> Vec<GestureId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.get(*id).is_some_and(|g| g.target == target))
            .collect()
    }

    /// Iterate gestures on `target` in registration order.
    pub fn on_target(&self, target: TargetId) -> impl Iterator<Item = &Gesture> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.get(*id))
            .filter(move |g| g.target == target)
    }

    /// Whether any gesture is registered on `target`.
    pub fn has_gestures(&self, target: TargetId) -> bool {
        self.on_target(target).next().is_some()
    }

    /// Number of running gestures on `target`.
    pub fn active_count(&self, target: TargetId) -> usize {
        self.on_target(target)
            .filter(|g| g.runtime.is_active())
            .count()
    }

    /// Enable or disable one gesture. Returns false for a stale id.
    pub fn set_enabled(&mut self, id: GestureId, enabled: bool) -> bool {
        let diagnostics = self.diagnostics;
        match self.get_mut(id) {
            Some(g) => {
                g.def.is_enabled = enabled;
                diag!(diagnostics, REGISTRY, gesture = ?id, enabled, "enablement changed");
                true
            }
            None => false,
        }
    }

    /// Enable or disable every gesture in `group`. Returns how many were changed.
    pub fn set_group_enabled(&mut self, group: &str, enabled: bool) -> usize {
        let mut changed = 0;
        for slot in self.slots.iter_mut().flatten() {
            if slot.group == group && slot.def.is_enabled != enabled {
                slot.def.is_enabled = enabled;
                changed += 1;
            }
        }
        diag!(self.diagnostics, REGISTRY, group, enabled, changed, "group enablement changed");
        changed
    }

    /// Pairs `(repeat, simpler)` on `target` where a repeat-count gesture is
    /// registered after a non-repeat gesture with an overlapping permutation.
    ///
    /// The matcher stops at the first provisional repeat match, so a repeat
    /// gesture must precede simpler gestures it competes with.
    pub fn repeat_order_conflicts(&self, target: TargetId) -> Vec<(GestureId, GestureId)> {
        let ids = self.ids_on(target);
        let mut out = Vec::new();
        for (i, later) in ids.iter().enumerate() {
            let Some(lg) = self.get(*later) else { continue };
            if lg.def.repeat_count <= 1 {
                continue;
            }
            for earlier in &ids[..i] {
                let Some(eg) = self.get(*earlier) else { continue };
                if eg.def.repeat_count > 1 {
                    continue;
                }
                let overlaps = lg
                    .permutations
                    .iter()
                    .any(|p| eg.permutations.contains(p));
                if overlaps {
                    out.push((*later, *earlier));
                }
            }
        }
        out
    }

    fn unique_name(&mut self, base: &str) -> String {
        loop {
            self.next_suffix += 1;
            let candidate = format!("{base}#{}", self.next_suffix);
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn alloc(&mut self, gesture: Gesture) -> GestureId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(gesture);
            (idx, generation)
        } else {
            self.slots.push(Some(gesture));
            self.generations.push(1);
            (self.slots.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "GestureId uses 32-bit indices by design."
        )]
        let idx = idx as u32;
        GestureId::new(idx, generation)
    }
}
