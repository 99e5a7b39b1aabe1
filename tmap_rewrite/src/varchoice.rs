//! Bound-set decomposition search (spec §4.8.1–§4.8.4): fragment
//! enumeration, shared-variable detection, the recursive variable-ordering
//! search, and materializing the winning ordering into a fresh
//! [`tmap_lut::LutNetwork`]. Grounded on `post.cc:412-760`
//! (`Fragment`/`find_fragments`/`explore_varchoices`/`implement_varchoices`).

use tmap_lut::{adjust, matches, Leaf, LutNetwork, LutPtr, TruthTable};

/// The information-theoretic minimum number of `arity`-input LUTs needed to
/// realize an arbitrary `nvars`-input function (spec §4.8: `min_nluts(v, a)
/// = ceil((v - 1) / (a - 1))`).
pub fn min_nluts(nvars: usize, arity: usize) -> usize {
    if nvars == 0 {
        return 0
    }
    (nvars + arity - 3) / (arity - 1)
}

fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as u32
    }
}

/// One accumulated cofactor class over a bound-set of `bn` variables (spec
/// §4.8.2). `bs_high`/`bs_low` record which bound-set assignments (as a
/// bitmask over the `bn` bound variables) mapped to this fragment with that
/// variable set/clear, feeding the shared-variable search of §4.8.3.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub values: Vec<bool>,
    pub dontcares: Vec<bool>,
    pub bs_high: u32,
    pub bs_low: u32,
}

/// Splits `table`'s truth table into `2^bn` equal-length fragments (the low
/// `bn` variables form the bound set) and accumulates them under
/// don't-care-aware matching, tightening earlier fragments in place via
/// `adjust` (spec §4.8.2; grounded on `find_fragments`, `post.cc:424-455`).
pub fn find_fragments(table: &TruthTable, bn: usize) -> Vec<Fragment> {
    let nfrags = 1usize << bn;
    let fraglen = table.values.len() / nfrags;
    assert_eq!(nfrags * fraglen, table.values.len());
    let bs_mask = (1u32 << bn) - 1;

    let mut found: Vec<Fragment> = Vec::new();
    for i in 0..nfrags {
        let val = &table.values[i * fraglen..(i + 1) * fraglen];
        let dc = &table.dontcares[i * fraglen..(i + 1) * fraglen];

        let mut matched = None;
        for (j, other) in found.iter_mut().enumerate() {
            if matches(&other.values, &other.dontcares, val, dc) {
                adjust(&mut other.values, &mut other.dontcares, val, dc);
                other.bs_high |= i as u32;
                other.bs_low |= bs_mask & !(i as u32);
                matched = Some(j);
                break
            }
        }
        if matched.is_none() {
            found.push(Fragment {
                values: val.to_vec(),
                dontcares: dc.to_vec(),
                bs_high: i as u32,
                bs_low: bs_mask & !(i as u32),
            });
        }
    }
    found
}

/// Spec §4.8.3: a bound-set variable `s` is shared iff at most
/// `2^(nluts-1)` fragments have `bs_high` bit `s` set, and at most that many
/// have `bs_low` bit `s` set. Returns the lowest such `s`, if any.
pub fn find_shared_variable(fragments: &[Fragment], bn: usize, nluts: u32) -> Option<usize> {
    let cap = 1usize << nluts.saturating_sub(1);
    for s in 0..bn {
        let nhighs = fragments.iter().filter(|f| f.bs_high & (1 << s) != 0).count();
        let nlows = fragments.iter().filter(|f| f.bs_low & (1 << s) != 0).count();
        if nlows <= cap && nhighs <= cap {
            return Some(s)
        }
    }
    None
}

/// One level of the variable ordering produced by [`explore_varchoices`]:
/// `bn` bound-set variables drawn from the front of `order`, recursing on
/// the remainder. Mirrors `post.cc`'s flattened `vars` list (a bound-set
/// size followed by that many variable ids, a `-1` separator, then the next
/// level) as a proper recursive structure instead.
#[derive(Debug, Clone, PartialEq)]
pub enum VarPlan {
    /// `vars.len() <= lut_size`: a single terminal LUT over exactly these
    /// variables, in this order.
    Leaf(Vec<u32>),
    /// Push `bound` variables down as a bound set (optionally with one
    /// extra `shared` variable folded in), continue decomposing `rest`.
    Step { bound: Vec<u32>, shared: Option<u32>, rest: Box<VarPlan> },
}

fn cofactor_subtable(table: &TruthTable, bn: usize, shared: Option<usize>, sub_vars: Vec<u32>) -> TruthTable {
    let fn_vars = table.vars.len() - bn;
    let fraglen = 1usize << fn_vars;
    let mut fragments = find_fragments(table, bn);
    let nluts_before_shared = ceil_log2(fragments.len());
    let nluts = match shared {
        Some(_) => nluts_before_shared.saturating_sub(1),
        None => nluts_before_shared,
    };
    fragments.sort_by(|a, b| (&a.values, &a.dontcares).partial_cmp(&(&b.values, &b.dontcares)).unwrap());

    let mut values = Vec::new();
    let mut dontcares = Vec::new();
    if let Some(s) = shared {
        let mut pad = 0u32;
        for frag in &fragments {
            if frag.bs_low & (1 << s) == 0 {
                continue
            }
            values.extend_from_slice(&frag.values);
            dontcares.extend_from_slice(&frag.dontcares);
            pad += 1;
        }
        for _ in pad..(1 << nluts) {
            values.extend(std::iter::repeat(true).take(fraglen));
            dontcares.extend(std::iter::repeat(true).take(fraglen));
        }
        let mut pad = 0u32;
        for frag in &fragments {
            if frag.bs_high & (1 << s) == 0 {
                continue
            }
            values.extend_from_slice(&frag.values);
            dontcares.extend_from_slice(&frag.dontcares);
            pad += 1;
        }
        for _ in pad..(1 << nluts) {
            values.extend(std::iter::repeat(true).take(fraglen));
            dontcares.extend(std::iter::repeat(true).take(fraglen));
        }
    } else {
        for frag in &fragments {
            values.extend_from_slice(&frag.values);
            dontcares.extend_from_slice(&frag.dontcares);
        }
        for _ in fragments.len()..(1usize << nluts) {
            values.extend(std::iter::repeat(true).take(fraglen));
            dontcares.extend(std::iter::repeat(true).take(fraglen));
        }
    }

    TruthTable::new(sub_vars, values, dontcares)
}

/// Spec §4.8.1: `explore_varchoices(table, budget, bn)`. Returns the best
/// variable ordering plan plus its total LUT count, or `None` if no
/// decomposition fits within `budget`.
///
/// `varcounter` names fresh synthetic variables introduced for
/// decomposition-LUT outputs, matching `post.cc`'s `net.ninputs +
/// net.nodes.size()` numbering so [`implement_varchoices`] can recognize
/// them.
pub fn explore_varchoices(
    table: &TruthTable,
    budget: usize,
    bn: usize,
    lut_size: usize,
    lut_min: usize,
    search_shared: bool,
    varcounter: u32,
) -> Option<(VarPlan, usize)> {
    let nvars = table.vars.len();
    assert_eq!(1usize << nvars, table.values.len());

    if nvars <= lut_size {
        return Some((VarPlan::Leaf(table.vars.clone()), 1))
    }
    if budget <= 1 {
        return None
    }

    let fn_vars = nvars - bn;
    let mut best: Option<(VarPlan, usize)> = None;

    // Enumerate every way to choose `bn` of the `nvars` variables to push
    // to the bound set, by permuting a working copy of the table's
    // variable order and trying every placement (grounded on the swap-based
    // combination walk in `post.cc:638-757`).
    let mut work = table.clone();
    for_each_combination(fn_vars, bn, &mut work, |work| {
        let fragments = find_fragments(work, bn);
        let nluts_raw = ceil_log2(fragments.len());
        let shared = if search_shared { find_shared_variable(&fragments, bn, nluts_raw) } else { None };
        let nluts = if shared.is_some() { nluts_raw.saturating_sub(1) } else { nluts_raw };

        let nvars_remaining = fn_vars + nluts as usize + usize::from(shared.is_some());
        if nluts as usize + min_nluts(nvars_remaining, lut_size) > budget {
            return
        }

        let mut sub_vars: Vec<u32> = work.vars[..fn_vars].to_vec();
        for i in 0..nluts {
            sub_vars.push(varcounter + i);
        }
        if let Some(s) = shared {
            sub_vars.push(work.vars[fn_vars + s]);
        }
        let sub = cofactor_subtable(work, bn, shared, sub_vars);

        for bn_sub in lut_min..lut_size {
            let Some((sub_plan, sub_nluts)) = explore_varchoices(
                &sub,
                budget - nluts as usize,
                bn_sub,
                lut_size,
                lut_min,
                search_shared,
                varcounter + nluts,
            ) else { continue };
            let total = sub_nluts + nluts as usize;
            if best.as_ref().map(|(_, b)| total < *b).unwrap_or(true) {
                let bound: Vec<u32> = work.vars[fn_vars..fn_vars + bn].to_vec();
                let shared_var = shared.map(|s| work.vars[fn_vars + s]);
                best = Some((VarPlan::Step { bound, shared: shared_var, rest: Box::new(sub_plan) }, total));
            }
        }
    });

    best
}

/// Walks every `C(nvars, bn)`-sized placement of the upper `bn` variables by
/// repeatedly swapping a moving window into the high positions, calling
/// `f` with the table permuted to that placement each time (grounded on the
/// `p`/`level` swap counter of `post.cc:638-757`).
fn for_each_combination(fn_vars: usize, bn: usize, table: &mut TruthTable, mut f: impl FnMut(&TruthTable)) {
    if bn == 0 {
        f(table);
        return
    }
    let mut p = vec![0usize; bn];
    let mut level = bn as isize - 1;
    loop {
        f(table);
        if level < 0 {
            break
        }
        table.swap(fn_vars + level as usize, p[level as usize]);
        p[level as usize] += 1;
        if p[level as usize] == fn_vars {
            level -= 1;
        } else {
            let mut l = level as usize;
            while l < bn - 1 {
                p[l + 1] = p[l];
                l += 1;
            }
            level = bn as isize - 1;
        }
    }
}

/// Spec §4.8.4: materializes a [`VarPlan`] into `net`, emitting `nluts`
/// decomposition LUTs per `Step` before recursing, and a final LUT at the
/// `Leaf`. A table variable `v` names a network leaf the same way
/// `post.cc:472-478` resolves it: `v < ninputs` is primary input `v`,
/// otherwise it is the output of the `(v - ninputs)`-th LUT materialized so
/// far, tracked here via `node_order` (parallel to `net.nodes.size()`
/// growing one-for-one as decomposition LUTs are pushed).
pub fn implement_varchoices(table: &TruthTable, plan: &VarPlan, net: &mut LutNetwork, ninputs: usize) {
    let mut node_order: Vec<LutPtr> = Vec::new();
    implement_varchoices_rec(table, plan, net, ninputs, &mut node_order);
}

fn leaf_of(v: u32, ninputs: usize, node_order: &[LutPtr]) -> Leaf {
    let v = v as usize;
    if v < ninputs {
        Leaf::Input(v as u32)
    } else {
        Leaf::Lut(node_order[v - ninputs])
    }
}

fn implement_varchoices_rec(
    table: &TruthTable,
    plan: &VarPlan,
    net: &mut LutNetwork,
    ninputs: usize,
    node_order: &mut Vec<LutPtr>,
) {
    match plan {
        VarPlan::Leaf(vars) => {
            let mut reordered = table.clone();
            reordered.change_vars(vars.clone());
            let inputs: Vec<Leaf> = vars.iter().map(|&v| leaf_of(v, ninputs, node_order)).collect();
            let node = net.add_node(reordered, inputs);
            net.outputs.push(Leaf::Lut(node));
        }
        VarPlan::Step { bound, shared, rest } => {
            let fn_vars = table.vars.len() - bound.len();
            let mut order: Vec<u32> = table.vars[..fn_vars].to_vec();
            order.extend(bound.iter().copied());
            let mut work = table.clone();
            work.change_vars(order);

            let bn = bound.len();
            let mut fragments = find_fragments(&work, bn);
            fragments.sort_by(|a, b| (&a.values, &a.dontcares).partial_cmp(&(&b.values, &b.dontcares)).unwrap());
            let nluts_raw = ceil_log2(fragments.len());
            let shared_idx = shared.as_ref().map(|sv| bound.iter().position(|v| v == sv).unwrap());
            let nluts = if shared_idx.is_some() { nluts_raw.saturating_sub(1) } else { nluts_raw };

            let lut_inputs: Vec<Leaf> = bound.iter().map(|&v| leaf_of(v, ninputs, node_order)).collect();

            let fraglen = 1usize << fn_vars;
            let mut f_indices = Vec::with_capacity(1 << bn);
            for i in 0..(1usize << bn) {
                let f = &work.values[i * fraglen..(i + 1) * fraglen];
                let f_dc = &work.dontcares[i * fraglen..(i + 1) * fraglen];
                let mut found = None;
                for (j, frag) in fragments.iter().enumerate() {
                    if let Some(s) = shared_idx {
                        let mask = if i & (1 << s) != 0 { frag.bs_high } else { frag.bs_low };
                        if mask & (1 << s) == 0 {
                            continue
                        }
                    }
                    if matches(&frag.values, &frag.dontcares, f, f_dc) {
                        found = Some(j);
                        break
                    }
                }
                f_indices.push(found.expect("every fragment slot must resolve to an accumulated fragment"));
            }

            for bit in 0..nluts {
                let values: Vec<bool> = f_indices.iter().map(|&fi| fi & (1 << bit) != 0).collect();
                let dontcares = vec![false; values.len()];
                let lut_vars: Vec<u32> = (0..bound.len() as u32).collect();
                let lut_table = TruthTable::new(lut_vars, values, dontcares);
                let node = net.add_node(lut_table, lut_inputs.clone());
                node_order.push(node);
            }

            let shared_var = shared_idx.map(|s| bound[s]);
            let sub = rest_table(&work, bound, shared_var, bn, fn_vars, ninputs, node_order);
            implement_varchoices_rec(&sub, rest, net, ninputs, node_order);
        }
    }
}

/// Recomputes the sub-table `rest` was searched against, mirroring
/// [`cofactor_subtable`] so materialization walks the identical reduced
/// table the search already validated, with synthetic variable ids
/// continuing from `node_order`'s current length so `leaf_of` resolves
/// them to the LUTs just emitted.
fn rest_table(
    work: &TruthTable,
    bound: &[u32],
    shared_var: Option<u32>,
    bn: usize,
    fn_vars: usize,
    ninputs: usize,
    node_order: &[LutPtr],
) -> TruthTable {
    let shared_idx = shared_var.map(|sv| bound.iter().position(|v| *v == sv).unwrap());
    let mut sub_vars: Vec<u32> = work.vars[..fn_vars].to_vec();
    let fragments = find_fragments(work, bn);
    let nluts_raw = ceil_log2(fragments.len());
    let nluts = if shared_idx.is_some() { nluts_raw.saturating_sub(1) } else { nluts_raw };
    let base = node_order.len() - nluts as usize;
    for i in 0..nluts {
        sub_vars.push(ninputs as u32 + base as u32 + i);
    }
    if let Some(sv) = shared_var {
        sub_vars.push(sv);
    }
    cofactor_subtable(work, bn, shared_idx, sub_vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_nluts_matches_information_bound() {
        assert_eq!(min_nluts(6, 4), 2);
        assert_eq!(min_nluts(4, 4), 1);
        assert_eq!(min_nluts(0, 4), 0);
    }

    #[test]
    fn find_fragments_groups_identical_cofactors() {
        // f(a,b,c) = a (independent of b, c): splitting on the low 2 bits
        // (b, c) should yield exactly 2 fragments (one per value of a).
        let table = TruthTable::new(
            vec![0, 1, 2],
            vec![false, false, false, false, true, true, true, true],
            vec![false; 8],
        );
        let fragments = find_fragments(&table, 2);
        assert_eq!(fragments.len(), 2);
    }

    #[test]
    fn leaf_plan_for_small_function() {
        let table = TruthTable::new(vec![0, 1], vec![false, false, false, true], vec![false; 4]);
        let (plan, nluts) = explore_varchoices(&table, 10, 2, 4, 3, false, 100).unwrap();
        assert_eq!(nluts, 1);
        assert!(matches!(plan, VarPlan::Leaf(_)));
    }
}
