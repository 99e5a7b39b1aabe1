//! The five named passes and their flags (spec §6 table), dispatched over
//! the host [`Module`] model. `toymap` drives the AIG/mapping layers;
//! `lutdepth`/`lutnot`/`lutrewrite_once`/`lutrewrite` drive the rewrite
//! layer over an already-LUT-mapped module. Grounded on `ToymapPass`,
//! `LutdepthPass`, `LutnotPass`, `LutrewriteOncePass`/`LutrewritePass`
//! (`toymap.cc`/`post.cc`).

use rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use tmap_aig::Network;
use tmap_lut::LutLibrary;
use tmap_map::{
    depth_cuts, run_stage, spread_depth_limit, trivial_cuts, walk_mapping, AreaFlowEval, DepthEvalInitial,
    DepthEvalInitial2, MappingState, CUT_MAXIMUM,
};
use tmap_rewrite::{absorb_nots, compute_depth, lutrewrite, lutrewrite_once as lutrewrite_once_sweep, RewriteOptions};

use crate::error::TmapError;
use crate::export::{export_aig, export_mapped};
use crate::host::{Module, WireId};
use crate::import::{import_aig, import_lutgraph};

/// A minimal flag-token cursor, shared by every pass below (spec §6: each
/// pass recognizes a fixed, small vocabulary of flags and rejects anything
/// else with `UnknownFlag`).
struct Args<'a> {
    tokens: &'a [String],
    pos: usize,
}

impl<'a> Args<'a> {
    fn new(tokens: &'a [String]) -> Self {
        Args { tokens, pos: 0 }
    }

    fn next_flag(&mut self) -> Option<&'a str> {
        let t = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(t.as_str())
    }

    fn take_u32(&mut self, flag: &str) -> Result<u32, TmapError> {
        let t = self.tokens.get(self.pos).ok_or_else(|| TmapError::MissingArgument(flag.to_string()))?;
        self.pos += 1;
        t.parse().map_err(|_| TmapError::MissingArgument(flag.to_string()))
    }

    fn take_usize(&mut self, flag: &str) -> Result<usize, TmapError> {
        Ok(self.take_u32(flag)? as usize)
    }

    fn take_f64(&mut self, flag: &str) -> Result<f64, TmapError> {
        let t = self.tokens.get(self.pos).ok_or_else(|| TmapError::MissingArgument(flag.to_string()))?;
        self.pos += 1;
        t.parse().map_err(|_| TmapError::MissingArgument(flag.to_string()))
    }
}

/// The `-depth_cuts` orchestration with its two trailing exact-area
/// refinement stages dropped (`-no_exact_area`): depth-minimal cuts, then
/// one area-flow pass bounded by the depth envelope, matching the first
/// three stages of [`tmap_map::depth_cuts`] with the rest omitted.
fn depth_cuts_no_exact_area(net: &Network, state: &mut MappingState, lib: &LutLibrary, max_cut: usize) -> f64 {
    let order = net.tsort().expect("depth_cuts requires an acyclic zero-lag projection");
    for &pi in net.pis() {
        state.set_cut(pi, tmap_map::Cut::trivial(pi));
        state.set_depth(pi, 0);
    }

    run_stage::<DepthEvalInitial>(net, state, lib, &order, max_cut, false);
    walk_mapping(net, state, lib);
    run_stage::<DepthEvalInitial2>(net, state, lib, &order, max_cut, true);

    let target_depth = net
        .pos()
        .iter()
        .map(|&po| net.node(po).ins[0].target.map(|driver| state.depth(driver)).unwrap_or(0))
        .max()
        .unwrap_or(0);
    walk_mapping(net, state, lib);

    spread_depth_limit(net, state, &order, target_depth);
    run_stage::<AreaFlowEval>(net, state, lib, &order, max_cut, true);
    walk_mapping(net, state, lib)
}

/// Runs `toymap`'s listed commands over `module` in order (spec §6: "Import
/// module into AIG, apply the listed commands in order, export LUTs or
/// AIG. Flag order is significant."). Recognized flags:
///
/// - `-ff`: accepted for compatibility; register import/export already
///   always runs (spec §1 scopes the register-initial-value tracker out,
///   so this flag has no further effect here — see `DESIGN.md`).
/// - `-lut N`: sets the LUT width `K` for subsequent cut-based commands.
/// - `-depth_cuts`: runs the depth/area-flow cut pipeline.
/// - `-no_exact_area`: drops the two exact-area refinement stages from a
///   following `-depth_cuts`.
/// - `-trivial_cuts`: installs the identity mapping (spec §8.2-12).
/// - `-emit_luts` / `-emit_gate2`: exports the current mapping as `$lut`
///   cells, or as two-input gate cells where the cut width allows it.
/// - `-scramble_lag`: redistributes register lag (debug tool, spec §9),
///   seeded so results are reproducible across runs.
/// - `-dump_cuts`: returns the plain-text cut dump alongside the module.
/// - `-unique`, `-balance`, `-hash`: the corresponding `Network` passes.
pub fn toymap(module: &Module, args: &[String]) -> Result<(Module, Option<String>), TmapError> {
    let (mut net, impure) = import_aig(module);
    if impure {
        log::debug!("module has a foreign-cell-driven wire reachable from an AIG input; treating it as a primary input");
    }
    let mut lib = LutLibrary::academic_luts(6);
    let mut max_cut: usize = 6;
    let mut state: Option<MappingState> = None;
    let mut dump: Option<String> = None;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
    let mut out_module: Option<Module> = None;

    let mut a = Args::new(args);
    while let Some(flag) = a.next_flag() {
        match flag {
            "-ff" => {}
            "-lut" => {
                let k = a.take_usize(flag)?;
                if k > CUT_MAXIMUM as usize {
                    return Err(TmapError::Map(tmap_map::MapError::CutTooWide(k as u32)))
                }
                max_cut = k;
                lib = LutLibrary::academic_luts(k as u32);
            }
            "-depth_cuts" => {
                let mut s = MappingState::new(&net)?;
                depth_cuts(&net, &mut s, &lib, max_cut);
                state = Some(s);
            }
            "-no_exact_area" => {
                let mut s = match state.take() {
                    Some(s) => s,
                    None => MappingState::new(&net)?,
                };
                depth_cuts_no_exact_area(&net, &mut s, &lib, max_cut);
                state = Some(s);
            }
            "-trivial_cuts" => {
                let mut s = MappingState::new(&net)?;
                let order = net.tsort()?;
                trivial_cuts(&net, &mut s, &order);
                walk_mapping(&net, &mut s, &lib);
                state = Some(s);
            }
            "-emit_luts" => {
                let s = state.as_ref().ok_or_else(|| TmapError::PassPrecondition("-emit_luts requires a prior cut-selecting command".into()))?;
                out_module = Some(export_mapped(&net, s, false));
            }
            "-emit_gate2" => {
                let s = state.as_ref().ok_or_else(|| TmapError::PassPrecondition("-emit_gate2 requires a prior cut-selecting command".into()))?;
                out_module = Some(export_mapped(&net, s, true));
            }
            "-scramble_lag" => net.scramble_lag(&mut rng),
            "-dump_cuts" => {
                let s = state.as_ref().ok_or_else(|| TmapError::PassPrecondition("-dump_cuts requires a prior cut-selecting command".into()))?;
                dump = Some(tmap_map::dump_cuts(&net, s));
            }
            "-unique" => net.dedup_labels(),
            "-balance" => net.balance(),
            "-hash" => {
                net.hash_cons();
            }
            other => return Err(TmapError::UnknownFlag(other.to_string())),
        }
    }

    let result = out_module.unwrap_or_else(|| export_aig(&net));
    Ok((result, dump))
}

/// `lutdepth`: imports `module`'s LUT cells, runs [`compute_depth`], and
/// writes the attributes back (spec §6: `depth`/`depth_envelope`/
/// `critical`). `-quiet` suppresses the returned report string; `-target
/// T` sets the requested module depth; `-write_attrs` is accepted as a
/// no-op since this implementation always writes the attributes back (the
/// host has no separate "read-only" mode to distinguish from).
pub fn lutdepth(module: &mut Module, args: &[String]) -> Result<String, TmapError> {
    let mut quiet = false;
    let mut target: Option<u32> = None;

    let mut a = Args::new(args);
    while let Some(flag) = a.next_flag() {
        match flag {
            "-quiet" => quiet = true,
            "-target" => target = Some(a.take_u32(flag)?),
            "-write_attrs" => {}
            other => return Err(TmapError::UnknownFlag(other.to_string())),
        }
    }

    let mut graph = import_lutgraph(module);
    compute_depth(&mut graph, target);
    crate::export::export_lutgraph(&graph, module);

    if quiet {
        return Ok(String::new())
    }
    let max_depth = graph.toposort().iter().filter_map(|&p| graph.cells[tmap_arena::Ptr::from(p)].depth).max().unwrap_or(0);
    Ok(format!("Maximum depth: {max_depth}"))
}

/// `lutnot`: absorbs every eligible inverter into its driving LUT's truth
/// table (spec §4.9). Takes no flags.
pub fn lutnot(module: &mut Module) -> Result<usize, TmapError> {
    let mut graph = import_lutgraph(module);
    let n = absorb_nots(&mut graph);
    crate::export::export_lutgraph(&graph, module);
    Ok(n)
}

fn parse_rewrite_options(args: &[String]) -> Result<(RewriteOptions, Option<u32>), TmapError> {
    let mut opts = RewriteOptions::default();
    let mut target: Option<u32> = None;

    let mut a = Args::new(args);
    while let Some(flag) = a.next_flag() {
        match flag {
            "-lut" => opts.lut_size = a.take_usize(flag)?,
            "-luts" => opts.max_nluts = a.take_usize(flag)?,
            "-outerfans" => opts.max_nouterfans = a.take_usize(flag)?,
            "-leaves" => opts.max_nleaves = a.take_usize(flag)?,
            "-w" => opts.w_cutoff = a.take_f64(flag)?,
            "-shared" => opts.search_shared = true,
            "-root" => {}
            "-target" => target = Some(a.take_u32(flag)?),
            other => return Err(TmapError::UnknownFlag(other.to_string())),
        }
    }
    Ok((opts, target))
}

/// `lutrewrite_once`: one sweep of local cut rewriting (spec §4.8). `-root`
/// is accepted as a no-op: this implementation already only ever
/// considers cuts rooted at each live cell in topological order, which is
/// the behavior `-root` names.
pub fn lutrewrite_once(module: &mut Module, args: &[String]) -> Result<usize, TmapError> {
    let (opts, _target) = parse_rewrite_options(args)?;
    let mut graph = import_lutgraph(module);
    let n = lutrewrite_once_sweep(&mut graph, &opts);
    crate::export::export_lutgraph(&graph, module);
    Ok(n)
}

/// `lutrewrite`: the fixpoint loop interleaving `opt_lut_trivial`,
/// `lutnot`, `lutdepth`, and `lutrewrite_once` (spec §5, §6; grounded on
/// [`tmap_rewrite::lutrewrite`]).
pub fn lutrewrite_pass(module: &mut Module, args: &[String]) -> Result<(), TmapError> {
    let (opts, target) = parse_rewrite_options(args)?;
    let mut graph = import_lutgraph(module);
    lutrewrite(&mut graph, &opts, target);
    crate::export::export_lutgraph(&graph, module);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Cell;

    fn and_module(names: &[&str], out: &str) -> Module {
        let mut m = Module::new();
        let wires: Vec<WireId> = names.iter().map(|n| m.wire(n)).collect();
        let y = m.wire(out);
        m.add_and(wires[0], wires[1], y);
        m.add_output(out, y);
        m
    }

    #[test]
    fn toymap_trivial_cuts_emit_luts_yields_one_lut() {
        let m = and_module(&["a", "b"], "y");
        let args: Vec<String> = ["-trivial_cuts", "-emit_luts"].iter().map(|s| s.to_string()).collect();
        let (out, dump) = toymap(&m, &args).unwrap();
        assert!(dump.is_none());
        assert_eq!(out.cells.iter().filter(|c| c.is_lut()).count(), 1);
    }

    #[test]
    fn toymap_rejects_unknown_flag() {
        let m = and_module(&["a", "b"], "y");
        let args: Vec<String> = vec!["-bogus".to_string()];
        assert!(matches!(toymap(&m, &args), Err(TmapError::UnknownFlag(_))));
    }

    #[test]
    fn lutnot_absorbs_inverter_through_facade() {
        let mut m = Module::new();
        let a = m.wire("a");
        let b = m.wire("b");
        let y1 = m.wire("y1");
        let y2 = m.wire("y2");
        m.cells.push(Cell::Lut {
            inputs: vec![a, b],
            table: tmap_lut::TruthTable::new(vec![0, 1], vec![false, false, false, true], vec![false; 4]),
            y: y1,
            depth: None,
            depth_envelope: None,
            critical: false,
        });
        m.add_not(y1, y2);
        m.add_output("y2", y2);

        let absorbed = lutnot(&mut m).unwrap();
        assert_eq!(absorbed, 1);
        assert_eq!(m.cells.iter().filter(|c| c.is_lut()).count(), 1);
        assert_eq!(m.cells.iter().filter(|c| c.is_not()).count(), 0);
    }
}
