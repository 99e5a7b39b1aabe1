use std::fmt;

/// Errors raised by the facade layer: either forwarded from one of the
/// three algorithmic crates, or a flag-parsing mistake at the pass
/// dispatch boundary (spec §6). Same shape as the crates it wraps (spec
/// §7; grounded on `awint_dag::EvalError`): a plain `Debug + Clone` enum
/// with a hand-written `Display`, no `thiserror`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TmapError {
    Graph(tmap_aig::GraphError),
    Map(tmap_map::MapError),
    Rewrite(tmap_rewrite::RewriteError),
    /// A pass was invoked on a module with a `Foreign` cell reachable from
    /// an AIG input and the pass requires a pure module (spec §7).
    ImpureModule,
    /// A command-line argument was not recognized by the invoked pass.
    UnknownFlag(String),
    /// A flag that takes a value (e.g. `-target N`) was given none.
    MissingArgument(String),
    /// A command was invoked out of order (e.g. `-emit_luts` before any
    /// cut-selecting command has run).
    PassPrecondition(String),
}

impl fmt::Display for TmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TmapError::Graph(e) => write!(f, "graph layer error: {e}"),
            TmapError::Map(e) => write!(f, "mapping layer error: {e}"),
            TmapError::Rewrite(e) => write!(f, "rewrite layer error: {e}"),
            TmapError::ImpureModule => write!(f, "module contains unrecognized primitive cells"),
            TmapError::UnknownFlag(flag) => write!(f, "unknown flag: {flag}"),
            TmapError::MissingArgument(flag) => write!(f, "flag {flag} requires an argument"),
            TmapError::PassPrecondition(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for TmapError {}

impl From<tmap_aig::GraphError> for TmapError {
    fn from(e: tmap_aig::GraphError) -> Self {
        TmapError::Graph(e)
    }
}

impl From<tmap_map::MapError> for TmapError {
    fn from(e: tmap_map::MapError) -> Self {
        TmapError::Map(e)
    }
}

impl From<tmap_rewrite::RewriteError> for TmapError {
    fn from(e: tmap_rewrite::RewriteError) -> Self {
        TmapError::Rewrite(e)
    }
}
