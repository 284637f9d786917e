//! Configuration for the grammar engine.

/// Sizing of the per-parse scratch arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Bytes per arena page. A single slice request larger than this fails.
    pub page_size: usize,

    /// Pages kept allocated across resets; pages above this are freed.
    pub retained_pages: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            page_size: 16 * 1024,
            retained_pages: 4,
        }
    }
}

impl ArenaConfig {
    /// Builder method to set the page size.
    #[must_use]
    pub fn with_page_size(mut self, bytes: usize) -> Self {
        self.page_size = bytes;
        self
    }

    /// Builder method to set the number of retained pages.
    #[must_use]
    pub fn with_retained_pages(mut self, pages: usize) -> Self {
        self.retained_pages = pages;
        self
    }
}

/// Configuration for a [`Grammar`](crate::Grammar).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Arena sizing.
    pub arena: ArenaConfig,

    /// Emit a trace event for every parse state processed.
    pub trace_states: bool,
}

impl EngineConfig {
    /// Creates a configuration for debugging: per-state tracing on.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            trace_states: true,
            ..Self::default()
        }
    }

    /// Creates a configuration that keeps no pages between parses.
    #[must_use]
    pub fn compact() -> Self {
        Self {
            arena: ArenaConfig::default().with_retained_pages(0),
            ..Self::default()
        }
    }

    /// Builder method to set the arena configuration.
    #[must_use]
    pub fn with_arena(mut self, arena: ArenaConfig) -> Self {
        self.arena = arena;
        self
    }

    /// Builder method to enable/disable per-state tracing.
    #[must_use]
    pub fn with_trace_states(mut self, trace: bool) -> Self {
        self.trace_states = trace;
        self
    }
}
