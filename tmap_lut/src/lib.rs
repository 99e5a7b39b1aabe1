//! Ternary truth tables, small LUT networks, and the target LUT library
//! model shared by the mapping and rewrite layers.

mod library;
mod lut;
mod truth_table;

pub use library::{LutLibrary, LutVariety};
pub use lut::{Leaf, LutNetwork, LutNode, LutPtr};
pub use truth_table::{adjust, matches, Trit, TruthTable};
