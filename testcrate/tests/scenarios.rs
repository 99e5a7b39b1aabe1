//! Integration tests exercising the full `tmap` facade end to end: host
//! `Module` in, through `toymap`/`lutdepth`/`lutnot`/`lutrewrite_once`/
//! `lutrewrite`, host `Module` out. These cover spec.md §8's properties
//! that only the facade can exercise; `-trivial_cuts -emit_luts` on a pure
//! AND chain (§8.2-12) is already covered by `tmap_map`'s own unit tests
//! and isn't repeated here.

use tmap::{lutdepth, lutnot, lutrewrite_pass, toymap, Cell, Module};
use tmap_lut::{Trit, TruthTable};
use tmap_map::Gate2Kind;

fn flags(strs: &[&str]) -> Vec<String> {
    strs.iter().map(|s| s.to_string()).collect()
}

fn and2_table() -> TruthTable {
    TruthTable::new(vec![0, 1], vec![false, false, false, true], vec![false; 4])
}

/// Scenario B (spec.md §8.4): `y = (a∧b)∧(c∧d)`, K=4. A single 4-input LUT
/// should cover the whole cone, at depth 1.
#[test]
fn scenario_b_four_input_and_tree_maps_to_one_lut_at_depth_one() {
    let mut m = Module::new();
    let a = m.wire("a");
    let b = m.wire("b");
    let c = m.wire("c");
    let d = m.wire("d");
    let t1 = m.wire("t1");
    let t2 = m.wire("t2");
    let y = m.wire("y");
    m.add_and(a, b, t1);
    m.add_and(c, d, t2);
    m.add_and(t1, t2, y);
    m.add_output("y", y);

    let (mut out, dump) = toymap(&m, &flags(&["-lut", "4", "-depth_cuts", "-emit_luts"])).unwrap();
    assert!(dump.is_none());
    let luts: Vec<&Cell> = out.cells.iter().filter(|c| c.is_lut()).collect();
    assert_eq!(luts.len(), 1);
    if let Cell::Lut { inputs, .. } = luts[0] {
        assert_eq!(inputs.len(), 4);
    }

    let report = lutdepth(&mut out, &flags(&[])).unwrap();
    assert_eq!(report, "Maximum depth: 1");
}

/// Scenario C (spec.md §8.4): a 5-input AND chain at K=4 cannot collapse
/// into one LUT; depth mapping should land at depth 2 with at least two
/// LUTs.
#[test]
fn scenario_c_five_input_and_chain_needs_depth_two() {
    let mut m = Module::new();
    let names = ["a", "b", "c", "d", "e"];
    let wires: Vec<u32> = names.iter().map(|n| m.wire(n)).collect();
    let t1 = m.wire("t1");
    let t2 = m.wire("t2");
    let t3 = m.wire("t3");
    let y = m.wire("y");
    m.add_and(wires[0], wires[1], t1);
    m.add_and(t1, wires[2], t2);
    m.add_and(t2, wires[3], t3);
    m.add_and(t3, wires[4], y);
    m.add_output("y", y);

    let (mut out, _) = toymap(&m, &flags(&["-lut", "4", "-depth_cuts", "-emit_luts"])).unwrap();
    let lut_count = out.cells.iter().filter(|c| c.is_lut()).count();
    assert!(lut_count >= 2, "expected at least 2 LUTs, got {lut_count}");

    let report = lutdepth(&mut out, &flags(&[])).unwrap();
    assert_eq!(report, "Maximum depth: 2");
}

/// Scenario D (spec.md §8.4): a register surviving plain import/export
/// keeps its init value and unit delay.
#[test]
fn scenario_d_register_round_trips_with_its_init_value() {
    let mut m = Module::new();
    let d = m.wire("d");
    let q = m.wire("q");
    m.add_reg(d, q, Trit::One);
    m.add_output("q", q);

    let (out, dump) = toymap(&m, &flags(&[])).unwrap();
    assert!(dump.is_none());
    let regs: Vec<&Cell> = out.cells.iter().filter(|c| matches!(c, Cell::Reg { .. })).collect();
    assert_eq!(regs.len(), 1);
    assert!(matches!(regs[0], Cell::Reg { init: Trit::One, .. }));
}

/// Scenario F (spec.md §8.4): a 3-level chain of four 2-input AND LUTs
/// computing a 5-variable AND rewrites to a 2-LUT network at K=4.
#[test]
fn scenario_f_rewrite_collapses_four_lut_and_chain_to_two() {
    let mut m = Module::new();
    let names = ["a", "b", "c", "d", "e"];
    let wires: Vec<u32> = names.iter().map(|n| m.wire(n)).collect();
    let l1 = m.wire("l1");
    let l2 = m.wire("l2");
    let l3 = m.wire("l3");
    let y = m.wire("y");
    m.cells.push(Cell::Lut { inputs: vec![wires[0], wires[1]], table: and2_table(), y: l1, depth: None, depth_envelope: None, critical: false });
    m.cells.push(Cell::Lut { inputs: vec![wires[2], wires[3]], table: and2_table(), y: l2, depth: None, depth_envelope: None, critical: false });
    m.cells.push(Cell::Lut { inputs: vec![l1, l2], table: and2_table(), y: l3, depth: None, depth_envelope: None, critical: false });
    m.cells.push(Cell::Lut { inputs: vec![l3, wires[4]], table: and2_table(), y, depth: None, depth_envelope: None, critical: false });
    m.add_output("y", y);
    assert_eq!(m.cells.iter().filter(|c| c.is_lut()).count(), 4);

    lutrewrite_pass(&mut m, &flags(&[])).unwrap();
    assert_eq!(m.cells.iter().filter(|c| c.is_lut()).count(), 2);
}

/// Boundary (spec.md §8.3-13): an empty module passes through every pass
/// with no panics and no spurious cells.
#[test]
fn boundary_empty_module_passes_through_unchanged() {
    let m = Module::new();
    let (out, dump) = toymap(&m, &flags(&["-lut", "4", "-depth_cuts", "-emit_luts"])).unwrap();
    assert!(dump.is_none());
    assert!(out.cells.is_empty());
    assert!(out.outputs.is_empty());
}

/// Boundary (spec.md §8.3-14): a constant-driven output comes out as a
/// direct `Const` cell, never a zero-input LUT.
#[test]
fn boundary_constant_output_is_a_wire_not_a_zero_input_lut() {
    let mut m = Module::new();
    let y = m.wire("y");
    m.add_const(true, y);
    m.add_output("y", y);

    let (out, _) = toymap(&m, &flags(&[])).unwrap();
    assert!(out.cells.iter().all(|c| !matches!(c, Cell::Lut { inputs, .. } if inputs.is_empty())));
    assert!(out.cells.iter().any(|c| matches!(c, Cell::Const { value: true, .. })));
}

/// Boundary (spec.md §8.3-15): at K=2 with `-emit_gate2`, a plain AND cone
/// comes out as a pattern-matched `Gate2` cell rather than a `$lut`.
#[test]
fn boundary_emit_gate2_at_k_two_yields_and_gate_not_lut() {
    let mut m = Module::new();
    let a = m.wire("a");
    let b = m.wire("b");
    let y = m.wire("y");
    m.add_and(a, b, y);
    m.add_output("y", y);

    let (out, _) = toymap(&m, &flags(&["-lut", "2", "-depth_cuts", "-emit_gate2"])).unwrap();
    assert_eq!(out.cells.iter().filter(|c| c.is_lut()).count(), 0);
    let gate2s: Vec<&Cell> = out.cells.iter().filter(|c| matches!(c, Cell::Gate2 { .. })).collect();
    assert_eq!(gate2s.len(), 1);
    assert!(matches!(gate2s[0], Cell::Gate2 { kind: Gate2Kind::And, .. }));
}

/// Round-trip (spec.md §8.2-11): `lutnot` never changes a module's Boolean
/// function, even when there's nothing for it to absorb.
#[test]
fn round_trip_lutnot_is_a_no_op_absent_any_not_cell() {
    let mut m = Module::new();
    let a = m.wire("a");
    let b = m.wire("b");
    let y = m.wire("y");
    m.cells.push(Cell::Lut { inputs: vec![a, b], table: and2_table(), y, depth: None, depth_envelope: None, critical: false });
    m.add_output("y", y);

    let absorbed = lutnot(&mut m).unwrap();
    assert_eq!(absorbed, 0);
    assert_eq!(m.cells.iter().filter(|c| c.is_lut()).count(), 1);
    assert_eq!(m.outputs, vec![("y".to_string(), y)]);
}
