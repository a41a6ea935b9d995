//! Post-hoc KPI computation from tick reports.

use std::fmt;

use serde::Serialize;

use super::types::TickReport;

/// Aggregate indicators derived from a complete run.
///
/// Computed from `&[TickReport]` so the report always agrees with the
/// per-tick data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    /// Ticks executed.
    pub ticks: usize,
    /// Calendar day of the last tick.
    pub days: u32,
    pub final_money: i64,
    pub min_happiness: i32,
    pub max_happiness: i32,
    pub final_happiness: i32,
    pub total_revenue: i64,
    pub total_taxes: i64,
    pub total_maintenance: i64,
    /// Ticks where maintenance could not be paid.
    pub unpaid_maintenance_ticks: usize,
    /// Ticks where demand exceeded production.
    pub shortage_ticks: usize,
    /// Mean of `min(production / demand, 1)` across ticks.
    pub average_supply_ratio: f64,
    pub peak_population: usize,
}

impl KpiReport {
    /// Computes all KPIs from a run's tick reports.
    ///
    /// # Arguments
    ///
    /// * `reports` - Tick reports in execution order
    ///
    /// # Returns
    ///
    /// A `KpiReport` with all fields populated; zeros for an empty run.
    pub fn from_reports(reports: &[TickReport]) -> Self {
        let Some(last) = reports.last() else {
            return Self {
                ticks: 0,
                days: 0,
                final_money: 0,
                min_happiness: 0,
                max_happiness: 0,
                final_happiness: 0,
                total_revenue: 0,
                total_taxes: 0,
                total_maintenance: 0,
                unpaid_maintenance_ticks: 0,
                shortage_ticks: 0,
                average_supply_ratio: 0.0,
                peak_population: 0,
            };
        };

        let mut min_happiness = i32::MAX;
        let mut max_happiness = i32::MIN;
        let mut total_revenue = 0;
        let mut total_taxes = 0;
        let mut total_maintenance = 0;
        let mut unpaid = 0;
        let mut shortages = 0;
        let mut ratio_sum = 0.0;
        let mut peak_population = 0;

        for r in reports {
            min_happiness = min_happiness.min(r.happiness);
            max_happiness = max_happiness.max(r.happiness);
            total_revenue += r.revenue;
            total_taxes += r.taxes;
            if r.maintenance_paid {
                total_maintenance += r.maintenance;
            } else {
                unpaid += 1;
            }
            if r.is_shortage() {
                shortages += 1;
            }
            ratio_sum += r.supply_ratio().min(1.0);
            peak_population = peak_population.max(r.population);
        }

        Self {
            ticks: reports.len(),
            days: last.day,
            final_money: last.money,
            min_happiness,
            max_happiness,
            final_happiness: last.happiness,
            total_revenue,
            total_taxes,
            total_maintenance,
            unpaid_maintenance_ticks: unpaid,
            shortage_ticks: shortages,
            average_supply_ratio: ratio_sum / reports.len() as f64,
            peak_population,
        }
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "Ticks:                 {} ({} days)", self.ticks, self.days)?;
        writeln!(f, "Final money:           {}", self.final_money)?;
        writeln!(
            f,
            "Happiness:             {} (min {}, max {})",
            self.final_happiness, self.min_happiness, self.max_happiness
        )?;
        writeln!(f, "Energy revenue:        {}", self.total_revenue)?;
        writeln!(f, "Taxes collected:       {}", self.total_taxes)?;
        writeln!(
            f,
            "Maintenance paid:      {} ({} ticks unpaid)",
            self.total_maintenance, self.unpaid_maintenance_ticks
        )?;
        writeln!(f, "Shortage ticks:        {}", self.shortage_ticks)?;
        writeln!(f, "Avg supply ratio:      {:.1}%", self.average_supply_ratio * 100.0)?;
        write!(f, "Peak population:       {}", self.peak_population)
    }
}
