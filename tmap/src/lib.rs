//! The facade crate: a minimal host [`Module`] model standing in for "the
//! host synthesis framework" (spec §1), import/export between it and the
//! graph/mapping/rewrite layers, and the five named passes of spec §6
//! (`toymap`, `lutdepth`, `lutnot`, `lutrewrite_once`, `lutrewrite`).
//!
//! Everything upstream of this crate — `tmap_aig`, `tmap_map`,
//! `tmap_lut`, `tmap_rewrite` — is host-agnostic; this is the only layer
//! that knows what a "wire" or "cell" looks like from the outside.

pub mod error;
pub mod export;
pub mod host;
pub mod import;
pub mod pass;

pub use error::TmapError;
pub use export::{export_aig, export_lutgraph, export_mapped};
pub use host::{Cell, Module, WireId};
pub use import::{import_aig, import_lutgraph};
pub use pass::{lutdepth, lutnot, lutrewrite_once, lutrewrite_pass, toymap};
