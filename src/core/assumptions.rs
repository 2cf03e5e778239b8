use serde::{Deserialize, Serialize};

/// Tunable constants that shape the variant rules. Passed explicitly with each
/// calculation; callers override individual fields and keep the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Assumptions {
    pub lean_annual_spending_ceiling: f64,
    pub regular_annual_spending: f64,
    pub fat_annual_spending_floor: f64,
    pub max_geo_discount_pct: f64,
    pub tail_years: u32,
    pub round_milestones: Vec<f64>,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            lean_annual_spending_ceiling: 40_000.0,
            regular_annual_spending: 70_000.0,
            fat_annual_spending_floor: 100_000.0,
            max_geo_discount_pct: 60.0,
            tail_years: 20,
            round_milestones: vec![100_000.0, 250_000.0, 500_000.0, 1_000_000.0, 2_000_000.0],
        }
    }
}

impl Assumptions {
    pub fn lean_monthly_ceiling(&self) -> f64 {
        self.lean_annual_spending_ceiling / 12.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let parsed: Assumptions =
            serde_json::from_str(r#"{"tailYears": 35, "maxGeoDiscountPct": 40}"#)
                .expect("assumptions should parse");
        assert_eq!(parsed.tail_years, 35);
        assert_eq!(parsed.max_geo_discount_pct, 40.0);
        assert_eq!(parsed.lean_annual_spending_ceiling, 40_000.0);
        assert_eq!(parsed.round_milestones.len(), 5);
    }

    #[test]
    fn lean_monthly_ceiling_is_annual_over_twelve() {
        let assumptions = Assumptions::default();
        assert!((assumptions.lean_monthly_ceiling() - 3_333.333_333).abs() < 1e-3);
    }
}
