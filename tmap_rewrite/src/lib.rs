//! The LUT-network rewrite layer: a host-agnostic `LutGraph`, depth and
//! envelope analysis, bound-set decomposition search, local cut
//! enumeration, NOT-absorption, and the `lutrewrite`/`lutrewrite_once`
//! fixpoint orchestration (spec §4.7–§4.9).

mod error;
mod graph;
mod lutdepth;
mod lutnot;
mod patmatch;
mod rewrite;
mod varchoice;

pub use error::RewriteError;
pub use graph::{CellPtr, Input, LutCell, LutGraph};
pub use lutdepth::compute_depth;
pub use lutnot::absorb_nots;
pub use patmatch::{enumerate_cuts, LocalCut};
pub use rewrite::{lutrewrite, lutrewrite_once, opt_lut_trivial, RewriteOptions};
pub use varchoice::{explore_varchoices, find_fragments, find_shared_variable, implement_varchoices, min_nluts, Fragment, VarPlan};
