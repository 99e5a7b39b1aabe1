//! Target LUT libraries: the cost/delay model the mapper optimizes against
//! (spec §3.7, grounded on `library.h`).

/// One LUT size the target technology offers, with its area cost and the
/// per-input arrival-to-output delay (grounded on `LutLibrary::LutVariety`,
/// `library.h:9-15`).
#[derive(Debug, Clone)]
pub struct LutVariety {
    pub width: u32,
    pub cost: f64,
    /// `delays[i]` is the delay contribution of input `i`; all academic
    /// varieties use a single uniform delay for every input.
    pub delays: Vec<f64>,
}

impl LutVariety {
    pub fn delay(&self, input: usize) -> f64 {
        self.delays.get(input).copied().unwrap_or_else(|| *self.delays.last().unwrap_or(&1.0))
    }
}

/// A library of LUT varieties sorted by ascending cost, with a `by_width`
/// lookup table so the evaluators can answer "what's the cheapest variety
/// that can realize a cut of this size" in O(1) (grounded on `LutLibrary`,
/// `library.h:17-60`).
#[derive(Debug, Clone)]
pub struct LutLibrary {
    varieties: Vec<LutVariety>,
    by_width: Vec<Option<usize>>,
}

impl LutLibrary {
    pub fn new() -> Self {
        LutLibrary {
            varieties: Vec::new(),
            by_width: Vec::new(),
        }
    }

    /// The conventional academic library: a single `k`-LUT variety of unit
    /// cost and unit per-input delay, for `k` in `1..=k`. Matches the
    /// default target most synthesis papers (and this tool's own test
    /// suite) assume (grounded on `LutLibrary::academic_luts`,
    /// `library.h:24-32`).
    pub fn academic_luts(k: u32) -> Self {
        let mut lib = LutLibrary::new();
        for width in 1..=k {
            lib.add(LutVariety {
                width,
                cost: 1.0,
                delays: vec![1.0; width as usize],
            });
        }
        lib
    }

    pub fn add(&mut self, variety: LutVariety) {
        self.varieties.push(variety);
        self.varieties
            .sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap());
        self.reindex();
    }

    /// `by_width[w]` is populated for every width `0..=max_width` with the
    /// cheapest variety whose own width is `>= w` (spec §3.7: "For each
    /// width 1..max_width, a `lookup(w)` returns the cheapest variety
    /// whose width ≥ w"), not just the widths a variety was added at —
    /// a cut of width 3 must still find a 4-LUT variety if that's the
    /// smallest one the library offers.
    fn reindex(&mut self) {
        let max_width = self.max_width() as usize;
        self.by_width = vec![None; max_width + 1];
        // varieties is sorted by ascending cost; scanning widths downward
        // and carrying the best-so-far from the next width up gives each
        // slot the cheapest variety at or above it.
        let mut best_at_or_above: Option<usize> = None;
        for width in (0..=max_width).rev() {
            if let Some(i) = self
                .varieties
                .iter()
                .enumerate()
                .filter(|(_, v)| v.width as usize == width)
                .map(|(i, _)| i)
                .next()
            {
                best_at_or_above = Some(match best_at_or_above {
                    Some(j) if self.varieties[j].cost <= self.varieties[i].cost => j,
                    _ => i,
                });
            }
            self.by_width[width] = best_at_or_above;
        }
    }

    /// The cheapest variety whose width is `>= width`, if the library has
    /// one (spec §3.7; grounded on `LutLibrary::lookup`, `library.h:34-44`).
    pub fn lookup(&self, width: u32) -> Option<&LutVariety> {
        self.by_width
            .get(width as usize)
            .copied()
            .flatten()
            .map(|i| &self.varieties[i])
    }

    pub fn max_width(&self) -> u32 {
        self.varieties.iter().map(|v| v.width).max().unwrap_or(0)
    }
}

impl Default for LutLibrary {
    fn default() -> Self {
        LutLibrary::academic_luts(6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn academic_library_covers_every_width_up_to_k() {
        let lib = LutLibrary::academic_luts(4);
        for w in 1..=4 {
            assert!(lib.lookup(w).is_some());
        }
        assert!(lib.lookup(5).is_none());
        assert_eq!(lib.max_width(), 4);
    }

    #[test]
    fn lookup_picks_the_cheapest_variety_at_a_width() {
        let mut lib = LutLibrary::new();
        lib.add(LutVariety { width: 4, cost: 2.0, delays: vec![1.0; 4] });
        lib.add(LutVariety { width: 4, cost: 1.0, delays: vec![1.2; 4] });
        let cheapest = lib.lookup(4).unwrap();
        assert_eq!(cheapest.cost, 1.0);
    }
}
