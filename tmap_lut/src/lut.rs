//! In-memory LUT networks: the small DAGs of `k`-input lookup tables that
//! the rewriter materializes out of a decomposition and that the final
//! emission step lowers into host cells (spec §3.5, §4.8.4).

use smallvec::SmallVec;
use tmap_arena::{ptr_struct, Arena};

use crate::truth_table::TruthTable;

ptr_struct!(LutPtr);

/// One input to a [`LutNode`]: either a leaf of the region being
/// decomposed, or the output of another node in the same network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    Input(u32),
    Lut(LutPtr),
}

/// A single LUT: its function plus the ordered list of what feeds each of
/// its inputs. `table.vars` holds `0..inputs.len()` in the order `inputs`
/// is indexed by (grounded on `Lut`, `post.cc:230-236`). Inputs are kept
/// inline for the common case of a library-sized LUT (`<=6` inputs).
#[derive(Debug, Clone)]
pub struct LutNode {
    pub table: TruthTable,
    pub inputs: SmallVec<[Leaf; 6]>,
}

impl LutNode {
    pub fn arity(&self) -> usize {
        self.inputs.len()
    }
}

/// A small network of LUTs over `ninputs` primary leaves, with a chosen set
/// of output leaves. Built by the decomposition materializer and consumed
/// by emission and by round-trip truth-table verification (grounded on
/// `LutNetwork`, `post.cc:238-330`).
#[derive(Debug, Clone)]
pub struct LutNetwork {
    pub nodes: Arena<LutNode>,
    pub outputs: Vec<Leaf>,
    pub ninputs: usize,
}

impl LutNetwork {
    pub fn new(ninputs: usize) -> Self {
        LutNetwork {
            nodes: Arena::new(),
            outputs: Vec::new(),
            ninputs,
        }
    }

    pub fn add_node(&mut self, table: TruthTable, inputs: impl Into<SmallVec<[Leaf; 6]>>) -> LutPtr {
        log::trace!("materializing lut node with {} inputs", table.nvars());
        self.nodes
            .insert(LutNode { table, inputs: inputs.into() })
            .into()
    }

    /// Topologically orders the nodes reachable from `outputs`, leaves
    /// first (grounded on the backward BFS in `LutNetwork::import`,
    /// `post.cc:242-278`).
    pub fn toposort(&self) -> Vec<LutPtr> {
        let mut order = Vec::new();
        let mut visited = std::collections::HashSet::new();
        let mut stack: Vec<(LutPtr, bool)> = self
            .outputs
            .iter()
            .filter_map(|leaf| match leaf {
                Leaf::Lut(p) => Some((*p, false)),
                Leaf::Input(_) => None,
            })
            .collect();
        while let Some((ptr, expanded)) = stack.pop() {
            if expanded {
                order.push(ptr);
                continue
            }
            if !visited.insert(ptr) {
                continue
            }
            stack.push((ptr, true));
            for leaf in &self.nodes[tmap_arena::Ptr::from(ptr)].inputs {
                if let Leaf::Lut(p) = leaf {
                    stack.push((*p, false));
                }
            }
        }
        order
    }

    /// Brute-force simulates this network over every one of the
    /// `2^ninputs` input assignments and returns the resulting truth table
    /// over `outputs` (grounded on `LutNetwork::thruth_table`,
    /// `post.cc:332-360`). Intended for small `ninputs` (cut-sized, `<=6`
    /// in practice): used to assert that a decomposition preserves
    /// function, not as a hot path.
    pub fn truth_table(&self, out_vars: Vec<u32>) -> TruthTable {
        assert_eq!(out_vars.len(), self.outputs.len());
        let order = self.toposort();
        let npoints = 1usize << self.ninputs;
        let mut values = vec![false; npoints];
        let dontcares = vec![false; npoints];

        // single-output case is overwhelmingly common; support it directly
        // and leave multi-output encoding to the caller via repeated calls
        assert_eq!(self.outputs.len(), 1, "multi-output simulation not needed by this workspace");

        for assignment in 0..npoints {
            let mut state: std::collections::HashMap<LutPtr, bool> = std::collections::HashMap::new();
            for &ptr in &order {
                let node = &self.nodes[tmap_arena::Ptr::from(ptr)];
                let mut index = 0usize;
                for (j, leaf) in node.inputs.iter().enumerate() {
                    let bit = match leaf {
                        Leaf::Input(i) => (assignment >> i) & 1 != 0,
                        Leaf::Lut(p) => state[p],
                    };
                    if bit {
                        index |= 1 << j;
                    }
                }
                state.insert(ptr, node.table.values[index]);
            }
            let out = match self.outputs[0] {
                Leaf::Input(i) => (assignment >> i) & 1 != 0,
                Leaf::Lut(p) => state[&p],
            };
            values[assignment] = out;
        }

        TruthTable::new(out_vars, values, dontcares)
    }

    pub fn num_luts(&self) -> usize {
        self.nodes.len()
    }

    /// Renders the network as a nesting of `AND`/hex-LUT expressions for
    /// diagnostics (grounded on `LutNetwork::dump`, `post.cc:362-378`).
    pub fn dump(&self) -> String {
        let order = self.toposort();
        let mut out = String::new();
        for ptr in order {
            let node = &self.nodes[tmap_arena::Ptr::from(ptr)];
            out.push_str(&format!(
                "{} = lut({:?}) of [{}]\n",
                ptr,
                bits_to_hex(&node.table.values),
                node.inputs
                    .iter()
                    .map(|leaf| match leaf {
                        Leaf::Input(i) => format!("in{i}"),
                        Leaf::Lut(p) => format!("{p}"),
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        out
    }
}

fn bits_to_hex(bits: &[bool]) -> String {
    let mut out = String::new();
    for chunk in bits.rchunks(4) {
        let mut v = 0u8;
        for (i, &b) in chunk.iter().enumerate() {
            if b {
                v |= 1 << i;
            }
        }
        out.push(std::char::from_digit(v as u32, 16).unwrap());
    }
    out.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_input_and_simulates_correctly() {
        let mut net = LutNetwork::new(2);
        let table = TruthTable::new(vec![0, 1], vec![false, false, false, true], vec![false; 4]);
        let and_node = net.add_node(table, vec![Leaf::Input(0), Leaf::Input(1)]);
        net.outputs.push(Leaf::Lut(and_node));

        let result = net.truth_table(vec![7, 9]);
        assert_eq!(result.values, vec![false, false, false, true]);
    }

    #[test]
    fn toposort_orders_leaves_before_consumers() {
        let mut net = LutNetwork::new(2);
        let inv = net.add_node(
            TruthTable::new(vec![0], vec![true, false], vec![false; 2]),
            vec![Leaf::Input(0)],
        );
        let and_node = net.add_node(
            TruthTable::new(vec![0, 1], vec![false, false, false, true], vec![false; 4]),
            vec![Leaf::Lut(inv), Leaf::Input(1)],
        );
        net.outputs.push(Leaf::Lut(and_node));
        let order = net.toposort();
        assert_eq!(order, vec![inv, and_node]);
    }
}
