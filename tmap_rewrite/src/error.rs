use std::fmt;

/// Errors raised by the rewrite layer. Same shape as `tmap_map::MapError`
/// (spec §7; grounded on `awint_dag::EvalError`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RewriteError {
    /// The LUT graph contains a cycle, so no topological order exists.
    CyclicGraph,
    /// A cell reference used by one part of the graph does not resolve in
    /// the arena (a structural invariant violation, spec §7).
    DanglingCell,
    /// A user-supplied target depth is smaller than the attainable depth
    /// (spec §7 "User configuration mistake"): logged as a warning by the
    /// caller, which falls back to the attainable depth. Kept as a
    /// constructible variant so callers that want to surface it can.
    TargetBelowAttainable { target: u32, attainable: u32 },
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteError::CyclicGraph => write!(f, "LUT graph is not acyclic"),
            RewriteError::DanglingCell => write!(f, "cell reference does not resolve in the arena"),
            RewriteError::TargetBelowAttainable { target, attainable } => write!(
                f,
                "target depth {target} is below the attainable depth {attainable}; falling back to {attainable}"
            ),
        }
    }
}

impl std::error::Error for RewriteError {}
