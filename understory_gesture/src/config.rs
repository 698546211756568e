// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration and the settings lookup.

use alloc::collections::BTreeMap;

use crate::diag::LogCategories;
use crate::types::TargetId;

/// Timeouts and diagnostics for a [`Coordinator`](crate::coordinator::Coordinator).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Hover settle time used when the settings lookup has no override (default: 150ms).
    pub default_hover_timeout_ms: u64,
    /// Delay before re-running recognition on pointers left down after a gesture ends (default: 30ms).
    pub post_gesture_recheck_ms: u64,
    /// Diagnostic categories to emit (default: all).
    pub diagnostics: LogCategories,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_hover_timeout_ms: 150,
            post_gesture_recheck_ms: 30,
            diagnostics: LogCategories::default(),
        }
    }
}

/// Read-only access to persisted per-target settings.
pub trait SettingsLookup {
    /// Hover settle time for `target`, or `None` to use the engine default.
    fn hover_timeout_override(&self, target: TargetId) -> Option<u64>;
}

/// A settings provider with no overrides.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoOverrides;

impl SettingsLookup for NoOverrides {
    #[inline]
    fn hover_timeout_override(&self, _target: TargetId) -> Option<u64> {
        None
    }
}

/// Per-target hover timeout overrides held in memory.
#[derive(Clone, Debug, Default)]
pub struct HoverOverrides {
    map: BTreeMap<TargetId, u64>,
}

impl HoverOverrides {
    /// Create an empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the override for `target`.
    pub fn set(&mut self, target: TargetId, timeout_ms: Option<u64>) {
        match timeout_ms {
            Some(ms) => {
                self.map.insert(target, ms);
            }
            None => {
                self.map.remove(&target);
            }
        }
    }
}

impl SettingsLookup for HoverOverrides {
    fn hover_timeout_override(&self, target: TargetId) -> Option<u64> {
        self.map.get(&target).copied()
    }
}

/// Resolve the hover settle time for `target`.
pub(crate) fn hover_timeout_for(
    config: &EngineConfig,
    settings: &impl SettingsLookup,
    target: TargetId,
) -> u64 {
    settings
        .hover_timeout_override(target)
        .unwrap_or(config.default_hover_timeout_ms)
}
