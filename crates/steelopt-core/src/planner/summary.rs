use super::*;

impl Planner {
    /// Computes run totals and the utilisation of purchased standard bars.
    /// Cut-to-length lines count toward cuts and bar counts but carry no
    /// stock material, so they are excluded from utilisation.
    pub(super) fn calculate_summary(&self, buy: &[BuyLine], check: &[CheckLine]) -> PlanSummary {
        let kerf = self.request.kerf_mm as u64;

        let mut bars_to_buy: u32 = 0;
        let mut total_cut_mm: u64 = 0;
        let mut used_std_mm: u64 = 0;
        let mut purchased_std_mm: u64 = 0;

        for line in buy {
            bars_to_buy += line.bars_required;
            let used: u64 = line
                .patterns
                .iter()
                .flat_map(|pattern| pattern.iter())
                .map(|&cut| cut as u64)
                .sum();
            total_cut_mm += used;

            if let StockLength::Mm(bar_mm) = line.bar_length {
                used_std_mm += used;
                purchased_std_mm += bar_mm as u64 * line.bars_required as u64;
            }
        }

        let kerf_std_mm: u64 = buy
            .iter()
            .filter(|line| matches!(line.bar_length, StockLength::Mm(_)))
            .map(|line| kerf * (line.total_cuts.saturating_sub(line.bars_required)) as u64)
            .sum();

        let total_offcut_mm = purchased_std_mm - used_std_mm - kerf_std_mm;
        let utilisation_pct = if purchased_std_mm > 0 {
            (used_std_mm as f64 / purchased_std_mm as f64) * 100.0
        } else {
            0.0
        };

        PlanSummary {
            buy_materials: buy.len() as u32,
            check_materials: check.len() as u32,
            bars_to_buy,
            total_cut_mm,
            total_offcut_mm,
            utilisation_pct,
        }
    }
}
