//! Default constants for runtime configuration.

/// Default number of tracked allocations between automatic collection
/// passes.
pub const DEFAULT_GC_INTERVAL: u32 = 4096;

/// Default heap object limit. 0 disables the limit.
pub const DEFAULT_MAX_HEAP_OBJECTS: usize = 0;
