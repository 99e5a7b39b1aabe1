//! A small, line-oriented textual netlist format: one statement per line,
//! `and`/`not`/`reg`/`input`/`output`/`const`. This format is new — the
//! teacher has no netlist surface of its own, and "the host synthesis
//! framework" that would normally supply one is out of scope (spec.md §1)
//! — so it exists only to give `toymap` something to read and write
//! end to end.
//!
//! ```text
//! input a
//! input b
//! and y a b
//! output y y
//! ```
//!
//! Every statement names its own output wire first, then its inputs, so a
//! wire may be referenced before the line that drives it without any
//! forward-declaration step: [`tmap::Module::wire`] allocates on first
//! mention.

use std::fmt::Write as _;

use tmap::{Cell, Module};
use tmap_lut::Trit;

fn parse_trit(s: &str) -> Result<Trit, String> {
    match s {
        "0" => Ok(Trit::Zero),
        "1" => Ok(Trit::One),
        "x" | "X" => Ok(Trit::X),
        other => Err(format!("expected 0, 1, or x for a register init value, got {other:?}")),
    }
}

/// Parses `text` into a [`Module`]. Blank lines and lines starting with
/// `#` are ignored.
pub fn parse(text: &str) -> Result<Module, String> {
    let mut m = Module::new();
    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let ctx = |msg: &str| format!("line {}: {msg}", lineno + 1);
        match tokens.as_slice() {
            ["input", name] => {
                m.wire(name);
            }
            ["and", y, a, b] => {
                let (a, b, y) = (m.wire(a), m.wire(b), m.wire(y));
                m.add_and(a, b, y);
            }
            ["not", y, a] => {
                let (a, y) = (m.wire(a), m.wire(y));
                m.add_not(a, y);
            }
            ["reg", q, d, init] => {
                let init = parse_trit(init).map_err(|e| ctx(&e))?;
                let (d, q) = (m.wire(d), m.wire(q));
                m.add_reg(d, q, init);
            }
            ["const", y, value] => {
                let value = match *value {
                    "0" => false,
                    "1" => true,
                    other => return Err(ctx(&format!("expected 0 or 1 for a constant, got {other:?}"))),
                };
                let y = m.wire(y);
                m.add_const(value, y);
            }
            ["output", name, wire] => {
                let w = m.wire(wire);
                m.add_output(*name, w);
            }
            _ => return Err(ctx(&format!("unrecognized statement: {line:?}"))),
        }
    }
    Ok(m)
}

/// Writes `module` back out in the same format, naming every wire either
/// by its original name (if any) or a synthetic `w<N>`.
pub fn write(module: &Module) -> String {
    let mut out = String::new();
    let name_of = |w: u32| module.name_of(w).map(str::to_string).unwrap_or_else(|| format!("w{w}"));

    for cell in &module.cells {
        match cell {
            Cell::And { a, b, y } => {
                let _ = writeln!(out, "and {} {} {}", name_of(*y), name_of(*a), name_of(*b));
            }
            Cell::Not { a, y } => {
                let _ = writeln!(out, "not {} {}", name_of(*y), name_of(*a));
            }
            Cell::Reg { d, q, init } => {
                let init = match init {
                    Trit::Zero => "0",
                    Trit::One => "1",
                    Trit::X => "x",
                };
                let _ = writeln!(out, "reg {} {} {}", name_of(*q), name_of(*d), init);
            }
            Cell::Const { value, y } => {
                let _ = writeln!(out, "const {} {}", name_of(*y), *value as u8);
            }
            Cell::Lut { inputs, table, y, .. } => {
                let ins: Vec<String> = inputs.iter().map(|&w| name_of(w)).collect();
                let _ = writeln!(out, "# lut {} ({}) table={:?}", name_of(*y), ins.join(" "), table.values);
            }
            Cell::Gate2 { kind, a, b, y } => {
                let _ = writeln!(out, "# gate2 {:?} {} {} {}", kind, name_of(*y), name_of(*a), name_of(*b));
            }
            Cell::Foreign { kind, inputs, y } => {
                let ins: Vec<String> = inputs.iter().map(|&w| name_of(w)).collect();
                let _ = writeln!(out, "# foreign {kind} {} ({})", name_of(*y), ins.join(" "));
            }
        }
    }
    for (name, wire) in &module.outputs {
        let _ = writeln!(out, "output {name} {}", name_of(*wire));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_simple_and_gate() {
        let text = "input a\ninput b\nand y a b\noutput y y\n";
        let m = parse(text).unwrap();
        assert_eq!(m.cells.len(), 1);
        assert_eq!(m.outputs.len(), 1);
        assert_eq!(m.outputs[0].0, "y");
    }

    #[test]
    fn rejects_unrecognized_statement() {
        assert!(parse("frobnicate a b\n").is_err());
    }
}
