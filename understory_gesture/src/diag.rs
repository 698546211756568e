// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics channel.
//!
//! All engine diagnostics go through the crate-internal `diag!` macro. With the
//! `tracing` feature enabled, a message is emitted as a `tracing` debug event
//! (target `understory_gesture`, field `category`) when its category is set in
//! [`EngineConfig::diagnostics`](crate::config::EngineConfig::diagnostics).
//! Without the feature the macro expands to nothing.

bitflags::bitflags! {
    /// Diagnostic categories.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LogCategories: u32 {
        /// Pointer bookkeeping and effective timeouts.
        const TRACKER  = 1 << 0;
        /// Hover arming, confirmation, and cancellation.
        const HOVER    = 1 << 1;
        /// Target state machine transitions and timers.
        const STATE    = 1 << 2;
        /// Matcher decisions and soft failures.
        const MATCHER  = 1 << 3;
        /// Postponement and replay.
        const RELAY    = 1 << 4;
        /// Registration and enablement changes.
        const REGISTRY = 1 << 5;
    }
}

impl Default for LogCategories {
    fn default() -> Self {
        Self::all()
    }
}

macro_rules! diag {
    ($mask:expr, $cat:ident, $($arg:tt)+) => {{
        #[cfg(feature = "tracing")]
        {
            if $mask.contains($crate::diag::LogCategories::$cat) {
                ::tracing::debug!(
                    target: "understory_gesture",
                    category = stringify!($cat),
                    $($arg)+
                );
            }
        }
        #[cfg(not(feature = "tracing"))]
        {
            let _ = &$mask;
        }
    }};
}

pub(crate) use diag;
