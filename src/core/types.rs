use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    Standard,
    Lean,
    Fat,
    Coast,
    Barista,
    Couples,
}

impl Variant {
    pub const ALL: [Variant; 6] = [
        Variant::Standard,
        Variant::Lean,
        Variant::Fat,
        Variant::Coast,
        Variant::Barista,
        Variant::Couples,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::Lean => "lean",
            Variant::Fat => "fat",
            Variant::Coast => "coast",
            Variant::Barista => "barista",
            Variant::Couples => "couples",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategory {
    pub name: String,
    pub monthly_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerInputs {
    #[serde(default)]
    pub name: String,
    pub age: u32,
    pub retirement_age: u32,
    pub current_assets: f64,
    pub monthly_income: f64,
    pub monthly_contribution: f64,
}

/// Form-level inputs as the presentation layer collects them: monthly figures,
/// percentages, and the optional fields each variant reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawInputs {
    pub current_age: u32,
    pub retirement_age: u32,
    pub current_assets: f64,
    pub monthly_income: f64,
    pub monthly_contribution: f64,
    pub monthly_spending: f64,
    pub expected_return_pct: f64,
    pub inflation_pct: f64,
    pub withdrawal_rate_pct: f64,

    pub geo_arbitrage: bool,
    pub geo_discount_pct: f64,
    pub lifestyle_budget: Vec<BudgetCategory>,
    pub coast_stop_age: Option<u32>,
    pub part_time_monthly_income: f64,
    pub barista_age: Option<u32>,
    pub partner1: Option<PartnerInputs>,
    pub partner2: Option<PartnerInputs>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeanProfile {
    pub requested_annual_spending: f64,
    pub annual_spending_ceiling: f64,
    pub geo_arbitrage: bool,
    pub geo_discount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FatProfile {
    pub budget: Vec<BudgetCategory>,
    pub lean_annual_spending: f64,
    pub regular_annual_spending: f64,
    pub fat_annual_spending_floor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoastProfile {
    pub stop_age: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaristaProfile {
    pub part_time_annual_income: f64,
    pub switch_age: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerProfile {
    pub name: String,
    pub age: u32,
    pub retirement_age: u32,
    pub current_assets: f64,
    pub annual_income: f64,
    pub annual_contribution: f64,
}

impl PartnerProfile {
    pub fn years_to_retirement(&self) -> u32 {
        self.retirement_age.saturating_sub(self.age)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouplesProfile {
    pub partner1: PartnerProfile,
    pub partner2: PartnerProfile,
    /// Age (on partner 1's axis) at which the first partner stops working.
    pub first_retirement_age: u32,
}

impl CouplesProfile {
    pub fn staggered(&self) -> bool {
        self.partner1.years_to_retirement() != self.partner2.years_to_retirement()
    }

    /// The partner who keeps working after the first retirement.
    pub fn later_retiree(&self) -> &PartnerProfile {
        if self.partner2.years_to_retirement() > self.partner1.years_to_retirement() {
            &self.partner2
        } else {
            &self.partner1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "kebab-case")]
pub enum VariantExtension {
    Standard,
    Lean(LeanProfile),
    Fat(FatProfile),
    Coast(CoastProfile),
    Barista(BaristaProfile),
    Couples(CouplesProfile),
}

impl VariantExtension {
    pub fn variant(&self) -> Variant {
        match self {
            VariantExtension::Standard => Variant::Standard,
            VariantExtension::Lean(_) => Variant::Lean,
            VariantExtension::Fat(_) => Variant::Fat,
            VariantExtension::Coast(_) => Variant::Coast,
            VariantExtension::Barista(_) => Variant::Barista,
            VariantExtension::Couples(_) => Variant::Couples,
        }
    }
}

/// Canonical annual-cadence parameters. Only the normalizer builds these, so
/// every field has already been range-checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioInputs {
    pub current_age: u32,
    pub retirement_age: u32,
    pub current_assets: f64,
    pub annual_income: f64,
    pub annual_contribution: f64,
    pub annual_spending: f64,
    pub expected_return: f64,
    pub inflation_rate: f64,
    pub withdrawal_rate: f64,
    pub tail_years: u32,
    pub round_milestones: Vec<f64>,
    pub extension: VariantExtension,
}

impl ScenarioInputs {
    pub fn variant(&self) -> Variant {
        self.extension.variant()
    }

    pub fn years_to_retirement(&self) -> u32 {
        self.retirement_age - self.current_age
    }

    pub fn horizon_periods(&self) -> u32 {
        self.years_to_retirement() + self.tail_years
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Accumulation,
    Coast,
    PartialRetirement,
    FullRetirement,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub period: u32,
    pub age: u32,
    pub balance: f64,
    pub passive_income: f64,
    pub target_spending: f64,
    pub contribution: f64,
    pub withdrawal: f64,
    pub phase: Phase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneTarget {
    pub name: String,
    pub amount: f64,
}

impl MilestoneTarget {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub name: String,
    pub amount: f64,
    pub achieved: bool,
    pub achieved_age: Option<u32>,
    /// Zero when already met, `INFINITY` when out of reach within the horizon.
    pub years_to_reach: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeasibilityBand {
    Easy,
    Moderate,
    Challenging,
    VeryChallenging,
}

/// Output of the static success heuristic. Not a simulated probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feasibility {
    pub band: FeasibilityBand,
    pub success_likelihood_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeanMetrics {
    pub lean_goal: f64,
    pub regular_goal: f64,
    pub requested_monthly_spending: f64,
    pub lean_monthly_spending: f64,
    pub spending_capped: bool,
    pub geo_arbitrage_monthly_savings: f64,
    pub years_vs_regular_fire: f64,
    pub amount_vs_regular_fire: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FatMetrics {
    pub monthly_budget_total: f64,
    pub lean_goal: f64,
    pub regular_goal: f64,
    pub fat_goal: f64,
    pub fat_lifestyle: bool,
    pub years_to_lean: f64,
    pub years_to_regular: f64,
    pub years_to_fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoastMetrics {
    pub coast_number_today: f64,
    pub coast_reached: bool,
    pub coast_age: Option<u32>,
    pub years_to_coast: f64,
    pub balance_at_retirement_if_stopped_today: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaristaMetrics {
    pub barista_number: f64,
    pub full_fire_number: f64,
    pub part_time_annual_income: f64,
    pub switch_age: Option<u32>,
    pub years_to_barista: f64,
    pub part_time_income_needed_now: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerAttribution {
    pub name: String,
    pub income_share_pct: f64,
    pub attributed_annual_contribution: f64,
    pub projected_balance_at_household_retirement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouplesMetrics {
    pub partner1: PartnerAttribution,
    pub partner2: PartnerAttribution,
    pub years_to_fire_partner1_only: f64,
    pub years_to_fire_partner2_only: f64,
    pub gap_years: u32,
    pub bridge_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "kebab-case")]
pub enum VariantMetrics {
    Standard,
    Lean(LeanMetrics),
    Fat(FatMetrics),
    Coast(CoastMetrics),
    Barista(BaristaMetrics),
    Couples(CouplesMetrics),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResults {
    pub variant: Variant,
    pub goals: Vec<MilestoneTarget>,
    pub primary_goal: f64,
    pub years_to_goal: f64,
    pub goal_age: f64,
    pub current_progress: f64,
    pub current_savings_rate: f64,
    pub required_savings_rate: f64,
    pub feasibility: Feasibility,
    pub projected_balance_at_retirement: f64,
    /// First age in full retirement; later than the target age when the goal
    /// is not yet covered there.
    pub full_retirement_age: Option<u32>,
    pub safety_buffer: f64,
    pub projection: Vec<ProjectionPoint>,
    pub milestones: Vec<Milestone>,
    pub variant_metrics: VariantMetrics,
}
