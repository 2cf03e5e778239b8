use tracing::{debug, trace};

use super::assumptions::Assumptions;
use super::error::ScenarioError;
use super::metrics::aggregate;
use super::milestones::detect_milestones;
use super::normalize::normalize;
use super::types::{Phase, ProjectionPoint, RawInputs, ScenarioInputs, ScenarioResults, Variant};
use super::variants::{
    EarlyExit, PhasePlan, coast_number, extend_milestones, milestone_targets, phase_plan,
};

#[derive(Debug, Clone, Copy, Default)]
struct YearFlow {
    contribution: f64,
    withdrawal: f64,
}

/// Full pipeline: normalize, simulate, detect milestones, aggregate.
pub fn calculate(
    raw: &RawInputs,
    variant: Variant,
    assumptions: &Assumptions,
) -> Result<ScenarioResults, ScenarioError> {
    let inputs = normalize(raw, variant, assumptions)?;
    Ok(run_scenario(&inputs))
}

/// Runs an already-normalized scenario. Infallible and deterministic.
pub fn run_scenario(inputs: &ScenarioInputs) -> ScenarioResults {
    let points = simulate(inputs);
    let targets = milestone_targets(inputs);
    let mut milestones = detect_milestones(&points, &targets, inputs.tail_years);
    extend_milestones(inputs, &points, &mut milestones);
    debug!(
        variant = inputs.variant().as_str(),
        periods = points.len(),
        milestones = milestones.len(),
        "scenario simulated"
    );
    aggregate(inputs, points, milestones)
}

/// Year-by-year trajectory from the current age through the target age plus the
/// configured tail. Point 0 is the untouched starting state.
pub fn simulate(inputs: &ScenarioInputs) -> Vec<ProjectionPoint> {
    let plan = phase_plan(inputs);
    simulate_with_plan(inputs, &plan)
}

fn simulate_with_plan(inputs: &ScenarioInputs, plan: &PhasePlan) -> Vec<ProjectionPoint> {
    let periods = inputs.horizon_periods();
    let mut points = Vec::with_capacity(periods as usize + 1);

    let mut balance = inputs.current_assets;
    let mut phase = next_phase(inputs, plan, Phase::Accumulation, inputs.current_age, balance);
    points.push(snapshot(inputs, 0, balance, phase, YearFlow::default()));

    for period in 1..=periods {
        let requested = year_flow(inputs, plan, phase, period);
        balance = apply_growth(balance, inputs.expected_return) + requested.contribution;
        let withdrawal = requested.withdrawal.min(balance);
        balance = (balance - withdrawal).max(0.0);
        let flow = YearFlow {
            contribution: requested.contribution,
            withdrawal,
        };

        let age = inputs.current_age + period;
        let next = next_phase(inputs, plan, phase, age, balance);
        if next != phase {
            trace!(age, from = ?phase, to = ?next, balance, "phase transition");
        }
        phase = next;
        points.push(snapshot(inputs, period, balance, phase, flow));
    }

    points
}

fn snapshot(
    inputs: &ScenarioInputs,
    period: u32,
    balance: f64,
    phase: Phase,
    flow: YearFlow,
) -> ProjectionPoint {
    ProjectionPoint {
        period,
        age: inputs.current_age + period,
        balance,
        passive_income: balance * inputs.withdrawal_rate,
        target_spending: inflated(inputs.annual_spending, inputs.inflation_rate, period),
        contribution: flow.contribution,
        withdrawal: flow.withdrawal,
        phase,
    }
}

fn apply_growth(balance: f64, rate: f64) -> f64 {
    (balance * (1.0 + rate)).max(0.0)
}

fn inflated(amount: f64, inflation_rate: f64, period: u32) -> f64 {
    amount * (1.0 + inflation_rate).powi(period as i32)
}

/// Cash flow for the year ending at `period`, governed by the phase in force at
/// the start of that year.
fn year_flow(inputs: &ScenarioInputs, plan: &PhasePlan, phase: Phase, period: u32) -> YearFlow {
    let spending = inflated(inputs.annual_spending, inputs.inflation_rate, period);
    match phase {
        Phase::Accumulation => YearFlow {
            contribution: inputs.annual_contribution,
            withdrawal: 0.0,
        },
        Phase::Coast => YearFlow::default(),
        Phase::PartialRetirement => match plan.early_exit {
            Some(EarlyExit::Barista {
                part_time_income, ..
            }) => YearFlow {
                contribution: 0.0,
                withdrawal: (spending
                    - inflated(part_time_income, inputs.inflation_rate, period))
                .max(0.0),
            },
            Some(EarlyExit::Staggered {
                remaining_contribution,
                ..
            }) => YearFlow {
                contribution: remaining_contribution,
                withdrawal: 0.0,
            },
            Some(EarlyExit::Coast { .. }) | None => YearFlow::default(),
        },
        Phase::FullRetirement => YearFlow {
            contribution: 0.0,
            withdrawal: spending,
        },
    }
}

/// One-way phase state machine:
/// `accumulation -> {coast | partial-retirement} -> full-retirement`.
///
/// Past the target age the current phase carries on until the balance covers
/// the retirement goal, so a late goal still shows up in the tail.
fn next_phase(
    inputs: &ScenarioInputs,
    plan: &PhasePlan,
    current: Phase,
    age: u32,
    balance: f64,
) -> Phase {
    if current == Phase::FullRetirement {
        return Phase::FullRetirement;
    }
    if age >= plan.retirement_age {
        if balance >= plan.retirement_goal {
            return Phase::FullRetirement;
        }
        return current;
    }
    if current != Phase::Accumulation {
        return current;
    }

    match plan.early_exit {
        None => Phase::Accumulation,
        Some(EarlyExit::Coast {
            stop_age,
            fire_number,
        }) => {
            let reached = match stop_age {
                Some(stop_age) => age >= stop_age,
                None => {
                    balance
                        >= coast_number(
                            fire_number,
                            inputs.expected_return,
                            plan.retirement_age - age,
                        )
                }
            };
            if reached { Phase::Coast } else { Phase::Accumulation }
        }
        Some(EarlyExit::Barista {
            switch_age,
            barista_number,
            ..
        }) => {
            let reached = match switch_age {
                Some(switch_age) => age >= switch_age,
                None => balance >= barista_number,
            };
            if reached {
                Phase::PartialRetirement
            } else {
                Phase::Accumulation
            }
        }
        Some(EarlyExit::Staggered {
            first_retirement_age,
            ..
        }) => {
            if age >= first_retirement_age {
                Phase::PartialRetirement
            } else {
                Phase::Accumulation
            }
        }
    }
}
