use crate::types::PackError;

/// Cutting plan for one material: the cuts assigned to each bar and the
/// unused remainder per bar. Immutable once returned by [`pack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packing {
    /// Cuts per bar, in placement order
    pub patterns: Vec<Vec<u32>>,
    /// `bar_length - used - kerf_overhead` per bar
    pub offcuts: Vec<u32>,
}

impl Packing {
    pub fn bars_used(&self) -> u32 {
        self.patterns.len() as u32
    }

    pub fn avg_offcut(&self) -> f64 {
        if self.offcuts.is_empty() {
            return 0.0;
        }
        let total: u64 = self.offcuts.iter().map(|&o| o as u64).sum();
        let avg = total as f64 / self.offcuts.len() as f64;
        (avg * 10.0).round() / 10.0
    }
}

struct Bar {
    cuts: Vec<u32>,
    remaining: u32,
}

/// Plan for a material sold pre-cut: one single-cut "bar" per cut, no offcut.
pub fn pack_cut_to_length(cuts: &[u32]) -> Packing {
    Packing {
        patterns: cuts.iter().map(|&c| vec![c]).collect(),
        offcuts: vec![0; cuts.len()],
    }
}

/// Assigns cuts to stock bars using decreasing-order first-fit.
///
/// Cuts are stable-sorted descending, then each cut is placed in the first
/// open bar (in creation order) with enough remaining capacity; a new bar is
/// opened when none fits. Kerf is charged between adjacent cuts on a bar,
/// never for the first cut. Deterministic for identical input.
///
/// `bar_length == None` means the material is sold cut to length: every cut
/// becomes its own single-cut bar with zero offcut, and nothing can fail.
pub fn pack(cuts: &[u32], bar_length: Option<u32>, kerf_mm: u32) -> Result<Packing, PackError> {
    let Some(bar_mm) = bar_length else {
        return Ok(pack_cut_to_length(cuts));
    };

    if let Some(&cut) = cuts.iter().find(|&&c| c > bar_mm) {
        return Err(PackError::OversizeCut {
            cut_mm: cut,
            bar_mm,
        });
    }

    let mut sorted = cuts.to_vec();
    sorted.sort_by(|a, b| b.cmp(a));

    let mut bars: Vec<Bar> = Vec::new();
    for cut in sorted {
        // Open bars are never empty, so a fit always costs cut + kerf
        let needed = cut.saturating_add(kerf_mm);
        match bars.iter_mut().find(|bar| bar.remaining >= needed) {
            Some(bar) => {
                bar.cuts.push(cut);
                bar.remaining -= needed;
            }
            None => bars.push(Bar {
                cuts: vec![cut],
                remaining: bar_mm - cut,
            }),
        }
    }

    let (patterns, offcuts) = bars.into_iter().map(|bar| (bar.cuts, bar.remaining)).unzip();
    Ok(Packing { patterns, offcuts })
}
