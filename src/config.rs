use std::sync::atomic::{AtomicU32, Ordering};

/// Number of fractional digits kept by floating point arithmetic built-ins,
/// unless changed with [`set_decimal_scale`].
pub const DEFAULT_DECIMAL_SCALE: u32 = 6;

/// Default bound on parser recursion.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default bound on nested calls in a compiled expression. Operator chains
/// such as `1+2+3+...` nest one call per operator without any parser
/// recursion, so this is looser than [`DEFAULT_MAX_DEPTH`]. Compiling and
/// evaluating at this depth fits a 2 MiB thread stack in debug builds.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

static DECIMAL_SCALE: AtomicU32 = AtomicU32::new(DEFAULT_DECIMAL_SCALE);

/// Set the number of fractional digits that `add`, `sub`, `multi` and `div`
/// round their floating point results to. This is process-wide and affects
/// every evaluation started afterwards.
pub fn set_decimal_scale(scale: u32) {
    log::debug!("decimal scale set to {}", scale);
    DECIMAL_SCALE.store(scale, Ordering::Relaxed);
}

/// The current process-wide decimal scale
#[must_use]
pub fn decimal_scale() -> u32 {
    DECIMAL_SCALE.load(Ordering::Relaxed)
}

/// Compilation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum recursion depth of the infix and call notation parsers.
    /// Expressions nesting deeper fail to compile with `Error::TooDeep`.
    pub max_depth: usize,
    /// Maximum nesting of calls in the call notation, which also bounds the
    /// recursion of evaluation.
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl Config {
    /// Default configuration with another parser recursion limit
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    /// Change the limit on nested calls
    #[must_use]
    pub fn max_call_depth(self, max_call_depth: usize) -> Self {
        Self {
            max_call_depth,
            ..self
        }
    }
}
