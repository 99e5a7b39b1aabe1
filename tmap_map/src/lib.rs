//! The mapping layer: priority-cut enumeration, the five-stage cut
//! evaluator pipeline, mapping reference counts, and LUT/gate2 emission
//! (spec §3.3–§3.4, §4.4–§4.6).

mod cut;
mod emit;
mod error;
mod eval;
mod mapping;
mod pipeline;
mod scratch;

pub use cut::{Cut, CUT_MAXIMUM, NPRIORITY_CUTS};
pub use emit::{dump_cuts, emit_luts, emit_node, EmittedCell, Gate2Kind};
pub use error::MapError;
pub use eval::{AreaFlowEval, CutEval, CutMetrics, DepthEvalInitial, DepthEvalInitial2, ExactAreaEval, FanoutMode};
pub use mapping::{deref_cut, ref_cut, walk_mapping};
pub use pipeline::{depth_cuts, run_exact_area_stage, run_stage, spread_depth_limit, trivial_cuts};
pub use scratch::MappingState;
