use super::solver::{required_annual_contribution, years_to_target};
use super::types::{
    Feasibility, FeasibilityBand, Milestone, Phase, ProjectionPoint, ScenarioInputs,
    ScenarioResults,
};
use super::variants::{goal_targets, primary_goal, variant_metrics};

const AGGRESSIVE_RETURN: f64 = 0.08;
const CONSERVATIVE_RETURN: f64 = 0.05;

/// Savings-rate gap (percentage points) upper bounds and the band each maps to.
const FEASIBILITY_TABLE: [(f64, FeasibilityBand, f64); 3] = [
    (0.0, FeasibilityBand::Easy, 90.0),
    (10.0, FeasibilityBand::Moderate, 75.0),
    (25.0, FeasibilityBand::Challenging, 50.0),
];

/// Folds a trajectory and its milestones into the result the presentation layer
/// renders.
pub fn aggregate(
    inputs: &ScenarioInputs,
    points: Vec<ProjectionPoint>,
    milestones: Vec<Milestone>,
) -> ScenarioResults {
    let goal = primary_goal(inputs);
    let years_to_goal =
        trajectory_years_to(&points, goal, inputs.expected_return, inputs.tail_years);
    let current_savings_rate = savings_rate(inputs.annual_contribution, inputs.annual_income);
    let required_contribution = required_annual_contribution(
        inputs.current_assets,
        goal,
        inputs.expected_return,
        inputs.years_to_retirement(),
    );
    let required_savings_rate = savings_rate(required_contribution, inputs.annual_income);

    let projected_balance_at_retirement = points
        .get(inputs.years_to_retirement() as usize)
        .map(|p| p.balance)
        .unwrap_or(inputs.current_assets);

    let variant_metrics = variant_metrics(inputs, &points, &milestones);
    let full_retirement_age = points
        .iter()
        .find(|p| p.phase == Phase::FullRetirement)
        .map(|p| p.age);

    ScenarioResults {
        variant: inputs.variant(),
        goals: goal_targets(inputs),
        primary_goal: goal,
        years_to_goal,
        goal_age: inputs.current_age as f64 + years_to_goal,
        current_progress: current_progress(inputs.current_assets, goal),
        current_savings_rate,
        required_savings_rate,
        feasibility: feasibility(
            required_savings_rate,
            current_savings_rate,
            inputs.expected_return,
        ),
        projected_balance_at_retirement,
        full_retirement_age,
        safety_buffer: projected_balance_at_retirement - goal,
        projection: points,
        milestones,
        variant_metrics,
    }
}

/// Fractional years until the trajectory first holds `goal`.
///
/// The crossing year is interpolated with that year's own net flow, so the
/// figure follows whatever contribution schedule the phases produced. When the
/// goal lies past the horizon the final year's flow is carried forward, at most
/// `max_extra_years` beyond the last point.
fn trajectory_years_to(
    points: &[ProjectionPoint],
    goal: f64,
    rate: f64,
    max_extra_years: u32,
) -> f64 {
    let Some(crossing) = points.iter().position(|p| p.balance >= goal) else {
        let [.., last] = points else {
            return f64::INFINITY;
        };
        let extra = years_to_target(last.balance, net_flow(last), rate, goal);
        return if extra <= max_extra_years as f64 {
            last.period as f64 + extra
        } else {
            f64::INFINITY
        };
    };
    if crossing == 0 {
        return 0.0;
    }

    let prev = &points[crossing - 1];
    let within = years_to_target(prev.balance, net_flow(&points[crossing]), rate, goal);
    prev.period as f64 + within.min(1.0)
}

fn net_flow(point: &ProjectionPoint) -> f64 {
    point.contribution - point.withdrawal
}

fn current_progress(balance: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 100.0;
    }
    (balance / goal * 100.0).min(100.0)
}

fn savings_rate(annual_amount: f64, annual_income: f64) -> f64 {
    if annual_amount <= 0.0 {
        return 0.0;
    }
    if annual_income <= 0.0 {
        return f64::INFINITY;
    }
    annual_amount / annual_income * 100.0
}

/// Static rule-of-thumb rating. It maps the savings-rate gap and the return
/// assumption onto a band; it is not a probability estimate.
pub fn feasibility(required_rate: f64, current_rate: f64, expected_return: f64) -> Feasibility {
    if !required_rate.is_finite() {
        return Feasibility {
            band: FeasibilityBand::VeryChallenging,
            success_likelihood_pct: 5.0,
        };
    }

    let gap = required_rate - current_rate;
    let (band, base) = FEASIBILITY_TABLE
        .iter()
        .find(|(bound, _, _)| gap <= *bound)
        .map(|(_, band, pct)| (*band, *pct))
        .unwrap_or((FeasibilityBand::VeryChallenging, 25.0));

    let adjustment = if expected_return > AGGRESSIVE_RETURN {
        -10.0
    } else if expected_return < CONSERVATIVE_RETURN {
        5.0
    } else {
        0.0
    };

    Feasibility {
        band,
        success_likelihood_pct: (base + adjustment).clamp(5.0, 95.0),
    }
}
