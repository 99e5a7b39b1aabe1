//! The minimal in-memory module model that stands in for "the host
//! synthesis framework" (spec §1: out of scope, touched only through
//! documented interfaces). Sufficient to round-trip through `toymap`'s
//! import/export and to drive every scenario of spec §8.4.
//!
//! Wires are plain integer ids; a [`Cell`] names the wire it drives (`y` or
//! `q`) and the wires it reads. This mirrors the cell/wire shape of spec §6
//! directly rather than inventing a richer netlist model: one cell kind per
//! row of the "Cell interface" table, plus `Const` (a constant-driven wire,
//! needed to state spec §8.3-14 "constant-driven outputs emit direct wire
//! connections" without inventing a zero-input LUT) and `Foreign` (spec §7:
//! "the node is flagged impure_module, non-recognized cells remain in
//! place").

use std::collections::HashMap;

use tmap_lut::{Trit, TruthTable};
use tmap_map::Gate2Kind;

pub type WireId = u32;

/// One primitive cell of the host module. `And`/`Not`/`Reg` are the AIG
/// input cells of spec §6; `Lut`/`Gate2` are its output cells; `Const` and
/// `Foreign` are the two additions noted above.
#[derive(Debug, Clone)]
pub enum Cell {
    And { a: WireId, b: WireId, y: WireId },
    Not { a: WireId, y: WireId },
    /// A unit-delay register (spec §6: "optional unit register with WIDTH
    /// and init attribute"); `WIDTH` is always 1 here since every wire in
    /// this model is a single bit.
    Reg { d: WireId, q: WireId, init: Trit },
    Const { value: bool, y: WireId },
    Lut {
        inputs: Vec<WireId>,
        table: TruthTable,
        y: WireId,
        depth: Option<u32>,
        depth_envelope: Option<u32>,
        critical: bool,
    },
    Gate2 { kind: Gate2Kind, a: WireId, b: WireId, y: WireId },
    /// An unrecognized primitive, kept verbatim (spec §7).
    Foreign { kind: String, inputs: Vec<WireId>, y: WireId },
}

impl Cell {
    /// The single wire this cell drives.
    pub fn output(&self) -> WireId {
        match self {
            Cell::And { y, .. }
            | Cell::Not { y, .. }
            | Cell::Const { y, .. }
            | Cell::Lut { y, .. }
            | Cell::Gate2 { y, .. }
            | Cell::Foreign { y, .. } => *y,
            Cell::Reg { q, .. } => *q,
        }
    }

    pub fn is_lut(&self) -> bool {
        matches!(self, Cell::Lut { .. })
    }

    pub fn is_not(&self) -> bool {
        matches!(self, Cell::Not { .. })
    }
}

/// A module: an unordered bag of cells plus a named set of outputs. Inputs
/// are not declared explicitly; per spec §4.1 import, any wire with no
/// driving cell in the module is implicitly a primary input.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub cells: Vec<Cell>,
    /// `(name, driving wire)` pairs, in declaration order.
    pub outputs: Vec<(String, WireId)>,
    name_to_wire: HashMap<String, WireId>,
    wire_to_name: HashMap<WireId, String>,
    next_wire: WireId,
}

impl Module {
    pub fn new() -> Module {
        Module::default()
    }

    /// Allocates a fresh, optionally-named wire.
    pub fn fresh_wire(&mut self, name: Option<String>) -> WireId {
        let w = self.next_wire;
        self.next_wire += 1;
        if let Some(n) = name {
            self.wire_to_name.insert(w, n.clone());
            self.name_to_wire.entry(n).or_insert(w);
        }
        w
    }

    /// Looks up a wire by name, allocating a fresh one on first mention
    /// (used by the textual netlist parser, where a wire may be referenced
    /// before the cell that drives it is parsed).
    pub fn wire(&mut self, name: &str) -> WireId {
        if let Some(&w) = self.name_to_wire.get(name) {
            return w
        }
        self.fresh_wire(Some(name.to_string()))
    }

    pub fn name_of(&self, w: WireId) -> Option<&str> {
        self.wire_to_name.get(&w).map(String::as_str)
    }

    pub fn add_and(&mut self, a: WireId, b: WireId, y: WireId) {
        self.cells.push(Cell::And { a, b, y });
    }

    pub fn add_not(&mut self, a: WireId, y: WireId) {
        self.cells.push(Cell::Not { a, y });
    }

    pub fn add_reg(&mut self, d: WireId, q: WireId, init: Trit) {
        self.cells.push(Cell::Reg { d, q, init });
    }

    pub fn add_const(&mut self, value: bool, y: WireId) {
        self.cells.push(Cell::Const { value, y });
    }

    pub fn add_output(&mut self, name: impl Into<String>, wire: WireId) {
        self.outputs.push((name.into(), wire));
    }

    /// Index from a driven wire to the cell that drives it. A wire is not
    /// necessarily driven (true primary inputs have no entry).
    pub fn driver_index(&self) -> HashMap<WireId, usize> {
        let mut index = HashMap::new();
        for (i, cell) in self.cells.iter().enumerate() {
            index.insert(cell.output(), i);
        }
        index
    }

    /// `true` if any cell in the module is [`Cell::Foreign`] (spec §7:
    /// "the node is flagged impure_module").
    pub fn is_impure(&self) -> bool {
        self.cells.iter().any(|c| matches!(c, Cell::Foreign { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_wire_lookup_is_stable() {
        let mut m = Module::new();
        let a = m.wire("a");
        let a2 = m.wire("a");
        assert_eq!(a, a2);
        assert_eq!(m.name_of(a), Some("a"));
    }

    #[test]
    fn driver_index_finds_cell_by_output() {
        let mut m = Module::new();
        let a = m.wire("a");
        let b = m.wire("b");
        let y = m.wire("y");
        m.add_and(a, b, y);
        let idx = m.driver_index();
        assert!(matches!(m.cells[idx[&y]], Cell::And { .. }));
    }
}
