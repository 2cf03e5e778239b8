//! Per-strategy rules layered on the shared simulator, detector and aggregator.
//!
//! Every hook is an exhaustive `match` over [`VariantExtension`].

use super::engine::simulate;
use super::milestones::detect_milestones;
use super::solver::{future_value, years_to_target};
use super::types::{
    BaristaMetrics, CoastMetrics, CouplesMetrics, CouplesProfile, FatMetrics, LeanMetrics,
    Milestone, MilestoneTarget, PartnerAttribution, PartnerProfile, Phase, ProjectionPoint,
    ScenarioInputs, VariantExtension, VariantMetrics,
};

pub const FIRE: &str = "FIRE";
pub const HALF_FI: &str = "Half FI";
pub const LEAN_FIRE: &str = "Lean FIRE";
pub const REGULAR_FIRE: &str = "Regular FIRE";
pub const FAT_FIRE: &str = "Fat FIRE";
pub const COAST_FIRE: &str = "Coast FIRE";
pub const BARISTA_FIRE: &str = "Barista FIRE";

/// How the simulator leaves the accumulation phase before full retirement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum EarlyExit {
    Coast {
        stop_age: Option<u32>,
        fire_number: f64,
    },
    Barista {
        switch_age: Option<u32>,
        barista_number: f64,
        part_time_income: f64,
    },
    Staggered {
        first_retirement_age: u32,
        remaining_contribution: f64,
    },
}

/// Full retirement starts at `retirement_age`, or later once the balance first
/// covers `retirement_goal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PhasePlan {
    pub retirement_age: u32,
    pub retirement_goal: f64,
    pub early_exit: Option<EarlyExit>,
}

pub(crate) fn phase_plan(inputs: &ScenarioInputs) -> PhasePlan {
    let early_exit = match &inputs.extension {
        VariantExtension::Standard | VariantExtension::Lean(_) | VariantExtension::Fat(_) => None,
        VariantExtension::Coast(profile) => Some(EarlyExit::Coast {
            stop_age: profile.stop_age,
            fire_number: fire_number(inputs),
        }),
        VariantExtension::Barista(profile) => Some(EarlyExit::Barista {
            switch_age: profile.switch_age,
            barista_number: barista_number(inputs, profile.part_time_annual_income),
            part_time_income: profile.part_time_annual_income,
        }),
        VariantExtension::Couples(couples) => {
            if couples.staggered() {
                Some(EarlyExit::Staggered {
                    first_retirement_age: couples.first_retirement_age,
                    remaining_contribution: couples.later_retiree().annual_contribution,
                })
            } else {
                None
            }
        }
    };

    PhasePlan {
        retirement_age: inputs.retirement_age,
        retirement_goal: primary_goal(inputs),
        early_exit,
    }
}

pub fn fire_number(inputs: &ScenarioInputs) -> f64 {
    inputs.annual_spending / inputs.withdrawal_rate
}

pub fn barista_number(inputs: &ScenarioInputs, part_time_annual_income: f64) -> f64 {
    (inputs.annual_spending - part_time_annual_income).max(0.0) / inputs.withdrawal_rate
}

/// Balance that, left alone, compounds into `fire_number` after `years`.
pub fn coast_number(fire_number: f64, rate: f64, years: u32) -> f64 {
    fire_number / (1.0 + rate).powi(years as i32)
}

/// The goal the headline metrics (years to goal, progress, savings rates) track.
pub fn primary_goal(inputs: &ScenarioInputs) -> f64 {
    match &inputs.extension {
        VariantExtension::Barista(profile) => {
            barista_number(inputs, profile.part_time_annual_income)
        }
        VariantExtension::Standard
        | VariantExtension::Lean(_)
        | VariantExtension::Fat(_)
        | VariantExtension::Coast(_)
        | VariantExtension::Couples(_) => fire_number(inputs),
    }
}

/// Named goal numbers reported alongside the results, smallest first.
pub fn goal_targets(inputs: &ScenarioInputs) -> Vec<MilestoneTarget> {
    let fire = fire_number(inputs);
    match &inputs.extension {
        VariantExtension::Standard | VariantExtension::Couples(_) => {
            vec![MilestoneTarget::new(FIRE, fire)]
        }
        VariantExtension::Lean(profile) => vec![
            MilestoneTarget::new(LEAN_FIRE, fire),
            MilestoneTarget::new(
                REGULAR_FIRE,
                profile.requested_annual_spending / inputs.withdrawal_rate,
            ),
        ],
        VariantExtension::Fat(profile) => vec![
            MilestoneTarget::new(
                LEAN_FIRE,
                profile.lean_annual_spending / inputs.withdrawal_rate,
            ),
            MilestoneTarget::new(
                REGULAR_FIRE,
                profile.regular_annual_spending / inputs.withdrawal_rate,
            ),
            MilestoneTarget::new(FAT_FIRE, fire),
        ],
        VariantExtension::Coast(_) => vec![
            MilestoneTarget::new(
                COAST_FIRE,
                coast_number(fire, inputs.expected_return, inputs.years_to_retirement()),
            ),
            MilestoneTarget::new(FIRE, fire),
        ],
        VariantExtension::Barista(profile) => vec![
            MilestoneTarget::new(
                BARISTA_FIRE,
                barista_number(inputs, profile.part_time_annual_income),
            ),
            MilestoneTarget::new(FIRE, fire),
        ],
    }
}

/// Thresholds scanned against the trajectory: the variant's goals plus the
/// round-number markers that fall below twice the largest goal.
pub fn milestone_targets(inputs: &ScenarioInputs) -> Vec<MilestoneTarget> {
    let fire = fire_number(inputs);
    let mut targets = match &inputs.extension {
        VariantExtension::Standard | VariantExtension::Couples(_) => vec![
            MilestoneTarget::new(HALF_FI, fire / 2.0),
            MilestoneTarget::new(FIRE, fire),
        ],
        // Coast FIRE depends on age, so it is derived directly in `extend_milestones`.
        VariantExtension::Coast(_) => vec![MilestoneTarget::new(FIRE, fire)],
        VariantExtension::Lean(_) | VariantExtension::Fat(_) | VariantExtension::Barista(_) => {
            goal_targets(inputs)
        }
    };

    let ceiling = targets.iter().map(|t| t.amount).fold(0.0, f64::max) * 2.0;
    for amount in &inputs.round_milestones {
        if *amount > 0.0 && *amount <= ceiling {
            targets.push(MilestoneTarget::new(format_round_amount(*amount), *amount));
        }
    }
    targets.sort_by(|a, b| a.amount.total_cmp(&b.amount));
    targets
}

/// Adds milestones that cannot be expressed as a fixed balance threshold.
pub(crate) fn extend_milestones(
    inputs: &ScenarioInputs,
    points: &[ProjectionPoint],
    milestones: &mut Vec<Milestone>,
) {
    if let VariantExtension::Coast(_) = &inputs.extension {
        milestones.push(coast_milestone(inputs, points));
        milestones.sort_by(|a, b| a.amount.total_cmp(&b.amount));
    }
}

fn coast_milestone(inputs: &ScenarioInputs, points: &[ProjectionPoint]) -> Milestone {
    let fire = fire_number(inputs);
    let crossing = points
        .iter()
        .take_while(|p| p.age < inputs.retirement_age)
        .find(|p| {
            p.balance
                >= coast_number(
                    fire,
                    inputs.expected_return,
                    inputs.retirement_age - p.age,
                )
        });

    match crossing {
        Some(point) => Milestone {
            name: COAST_FIRE.to_string(),
            amount: coast_number(
                fire,
                inputs.expected_return,
                inputs.retirement_age - point.age,
            ),
            achieved: true,
            achieved_age: Some(point.age),
            years_to_reach: (point.age - inputs.current_age) as f64,
        },
        None => Milestone {
            name: COAST_FIRE.to_string(),
            amount: coast_number(fire, inputs.expected_return, inputs.years_to_retirement()),
            achieved: false,
            achieved_age: None,
            years_to_reach: f64::INFINITY,
        },
    }
}

pub(crate) fn variant_metrics(
    inputs: &ScenarioInputs,
    points: &[ProjectionPoint],
    milestones: &[Milestone],
) -> VariantMetrics {
    match &inputs.extension {
        VariantExtension::Standard => VariantMetrics::Standard,
        VariantExtension::Lean(profile) => {
            let lean_goal = fire_number(inputs);
            let regular_goal = profile.requested_annual_spending / inputs.withdrawal_rate;
            let years_lean = keep_saving_years(inputs, lean_goal);
            let years_regular = keep_saving_years(inputs, regular_goal);
            let capped = profile
                .requested_annual_spending
                .min(profile.annual_spending_ceiling);

            VariantMetrics::Lean(LeanMetrics {
                lean_goal,
                regular_goal,
                requested_monthly_spending: profile.requested_annual_spending / 12.0,
                lean_monthly_spending: inputs.annual_spending / 12.0,
                spending_capped: profile.requested_annual_spending
                    > profile.annual_spending_ceiling,
                geo_arbitrage_monthly_savings: (capped - inputs.annual_spending) / 12.0,
                years_vs_regular_fire: if years_regular.is_finite() {
                    years_regular - years_lean
                } else {
                    f64::INFINITY
                },
                amount_vs_regular_fire: regular_goal - lean_goal,
            })
        }
        VariantExtension::Fat(profile) => VariantMetrics::Fat(FatMetrics {
            monthly_budget_total: inputs.annual_spending / 12.0,
            lean_goal: profile.lean_annual_spending / inputs.withdrawal_rate,
            regular_goal: profile.regular_annual_spending / inputs.withdrawal_rate,
            fat_goal: fire_number(inputs),
            fat_lifestyle: inputs.annual_spending >= profile.fat_annual_spending_floor,
            years_to_lean: milestone_years(milestones, LEAN_FIRE),
            years_to_regular: milestone_years(milestones, REGULAR_FIRE),
            years_to_fat: milestone_years(milestones, FAT_FIRE),
        }),
        VariantExtension::Coast(_) => {
            let fire = fire_number(inputs);
            let years = inputs.years_to_retirement();
            let coast_today = coast_number(fire, inputs.expected_return, years);
            VariantMetrics::Coast(CoastMetrics {
                coast_number_today: coast_today,
                coast_reached: inputs.current_assets >= coast_today,
                coast_age: first_age_in_phase(points, Phase::Coast),
                years_to_coast: milestone_years(milestones, COAST_FIRE),
                balance_at_retirement_if_stopped_today: future_value(
                    inputs.current_assets,
                    0.0,
                    inputs.expected_return,
                    years as f64,
                ),
            })
        }
        VariantExtension::Barista(profile) => {
            let number = barista_number(inputs, profile.part_time_annual_income);
            VariantMetrics::Barista(BaristaMetrics {
                barista_number: number,
                full_fire_number: fire_number(inputs),
                part_time_annual_income: profile.part_time_annual_income,
                switch_age: first_age_in_phase(points, Phase::PartialRetirement),
                years_to_barista: keep_saving_years(inputs, number),
                part_time_income_needed_now: (inputs.annual_spending
                    - inputs.current_assets * inputs.withdrawal_rate)
                    .max(0.0),
            })
        }
        VariantExtension::Couples(couples) => {
            VariantMetrics::Couples(couples_metrics(inputs, couples))
        }
    }
}

fn couples_metrics(inputs: &ScenarioInputs, couples: &CouplesProfile) -> CouplesMetrics {
    let partner1 = &couples.partner1;
    let partner2 = &couples.partner2;
    let household_years = inputs.years_to_retirement();
    let total_income = partner1.annual_income + partner2.annual_income;
    let partner1_share = if total_income > 0.0 {
        partner1.annual_income / total_income
    } else {
        0.5
    };

    let gap_years = partner1
        .years_to_retirement()
        .abs_diff(partner2.years_to_retirement());

    CouplesMetrics {
        partner1: attribution(inputs, partner1, partner1_share, household_years),
        partner2: attribution(inputs, partner2, 1.0 - partner1_share, household_years),
        years_to_fire_partner1_only: single_income_years(inputs, partner1),
        years_to_fire_partner2_only: single_income_years(inputs, partner2),
        gap_years,
        bridge_amount: gap_years as f64 * inputs.annual_spending,
    }
}

fn attribution(
    inputs: &ScenarioInputs,
    partner: &PartnerProfile,
    share: f64,
    household_years: u32,
) -> PartnerAttribution {
    let working_years = partner.years_to_retirement().min(household_years);
    let at_own_retirement = future_value(
        partner.current_assets,
        partner.annual_contribution,
        inputs.expected_return,
        working_years as f64,
    );
    PartnerAttribution {
        name: partner.name.clone(),
        income_share_pct: share * 100.0,
        attributed_annual_contribution: inputs.annual_contribution * share,
        projected_balance_at_household_retirement: future_value(
            at_own_retirement,
            0.0,
            inputs.expected_return,
            (household_years - working_years) as f64,
        ),
    }
}

/// Re-runs the simulator as if only `partner` kept earning and saving, with the
/// household's assets, over the same horizon.
fn single_income_years(inputs: &ScenarioInputs, partner: &PartnerProfile) -> f64 {
    let solo = ScenarioInputs {
        retirement_age: inputs.current_age + inputs.horizon_periods(),
        annual_income: partner.annual_income,
        annual_contribution: partner.annual_contribution,
        tail_years: 0,
        extension: VariantExtension::Standard,
        ..inputs.clone()
    };
    let points = simulate(&solo);
    let target = [MilestoneTarget::new(FIRE, fire_number(inputs))];
    detect_milestones(&points, &target, inputs.tail_years)
        .first()
        .map(|m| m.years_to_reach)
        .unwrap_or(f64::INFINITY)
}

fn keep_saving_years(inputs: &ScenarioInputs, target: f64) -> f64 {
    years_to_target(
        inputs.current_assets,
        inputs.annual_contribution,
        inputs.expected_return,
        target,
    )
}

fn milestone_years(milestones: &[Milestone], name: &str) -> f64 {
    milestones
        .iter()
        .find(|m| m.name == name)
        .map(|m| m.years_to_reach)
        .unwrap_or(f64::INFINITY)
}

fn first_age_in_phase(points: &[ProjectionPoint], phase: Phase) -> Option<u32> {
    points.iter().find(|p| p.phase == phase).map(|p| p.age)
}

/// "$1,000,000"-style label for round-number milestones.
fn format_round_amount(amount: f64) -> String {
    let digits = format!("{:.0}", amount.round());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assumptions::Assumptions;
    use crate::core::normalize::normalize;
    use crate::core::normalize::tests::{sample_couple, sample_raw};
    use crate::core::types::Variant;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn inputs_for(variant: Variant) -> ScenarioInputs {
        let raw = if variant == Variant::Couples {
            sample_couple()
        } else {
            sample_raw()
        };
        normalize(&raw, variant, &Assumptions::default()).expect("valid")
    }

    #[test]
    fn format_round_amount_groups_thousands() {
        assert_eq!(format_round_amount(1_000_000.0), "$1,000,000");
        assert_eq!(format_round_amount(250_000.0), "$250,000");
        assert_eq!(format_round_amount(999.0), "$999");
    }

    #[test]
    fn standard_primary_goal_is_spending_over_withdrawal_rate() {
        let inputs = inputs_for(Variant::Standard);
        assert_eq!(primary_goal(&inputs), 48_000.0 / 0.04);
    }

    #[test]
    fn barista_primary_goal_nets_out_part_time_income() {
        let mut raw = sample_raw();
        raw.part_time_monthly_income = 1_500.0;
        let inputs = normalize(&raw, Variant::Barista, &Assumptions::default()).expect("valid");
        assert_approx(primary_goal(&inputs), (48_000.0 - 18_000.0) / 0.04);
    }

    #[test]
    fn coast_number_discounts_by_remaining_growth() {
        assert_approx(coast_number(1_000.0, 0.10, 2), 1_000.0 / 1.21);
        assert_approx(coast_number(1_000.0, 0.0, 10), 1_000.0);
    }

    #[test]
    fn milestone_targets_are_sorted_and_bounded() {
        let inputs = inputs_for(Variant::Standard);
        let targets = milestone_targets(&inputs);
        let names = targets.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "$100,000",
                "$250,000",
                "$500,000",
                "Half FI",
                "$1,000,000",
                "FIRE",
                "$2,000,000"
            ]
        );
        assert!(targets.windows(2).all(|w| w[0].amount <= w[1].amount));
    }

    #[test]
    fn fat_targets_include_all_three_thresholds_in_order() {
        let mut raw = sample_raw();
        raw.monthly_spending = 10_000.0;
        let inputs = normalize(&raw, Variant::Fat, &Assumptions::default()).expect("valid");
        let goals = goal_targets(&inputs);
        assert_eq!(goals[0].name, LEAN_FIRE);
        assert_eq!(goals[1].name, REGULAR_FIRE);
        assert_eq!(goals[2].name, FAT_FIRE);
        assert_approx(goals[0].amount, 1_000_000.0);
        assert_approx(goals[1].amount, 1_750_000.0);
        assert_approx(goals[2].amount, 3_000_000.0);
    }

    #[test]
    fn phase_plans_follow_variant() {
        assert_eq!(phase_plan(&inputs_for(Variant::Standard)).early_exit, None);
        assert!(matches!(
            phase_plan(&inputs_for(Variant::Coast)).early_exit,
            Some(EarlyExit::Coast { .. })
        ));
        assert!(matches!(
            phase_plan(&inputs_for(Variant::Barista)).early_exit,
            Some(EarlyExit::Barista { .. })
        ));
        let Some(EarlyExit::Staggered {
            first_retirement_age,
            remaining_contribution,
        }) = phase_plan(&inputs_for(Variant::Couples)).early_exit
        else {
            panic!("expected staggered plan");
        };
        assert_eq!(first_retirement_age, 55);
        assert_approx(remaining_contribution, 18_000.0);
    }

    #[test]
    fn couples_attribution_splits_contribution_by_income() {
        let inputs = inputs_for(Variant::Couples);
        let VariantExtension::Couples(couples) = &inputs.extension else {
            panic!("expected couples");
        };
        let metrics = couples_metrics(&inputs, couples);
        assert_approx(metrics.partner1.income_share_pct, 60.0);
        assert_approx(metrics.partner2.income_share_pct, 40.0);
        assert_approx(metrics.partner1.attributed_annual_contribution, 48_000.0 * 0.6);
        assert_approx(
            metrics.partner1.attributed_annual_contribution
                + metrics.partner2.attributed_annual_contribution,
            inputs.annual_contribution,
        );
        assert_eq!(metrics.gap_years, 5);
        assert_approx(metrics.bridge_amount, 5.0 * 72_000.0);
    }
}
