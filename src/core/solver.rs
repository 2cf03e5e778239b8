use serde::{Deserialize, Serialize};
use tracing::trace;

use super::engine::simulate;
use super::error::ScenarioError;
use super::types::ScenarioInputs;
use super::variants::primary_goal;

const RATE_EPS: f64 = 1e-12;

/// Balance after `years` of growth at `rate` with `annual_contribution` added at
/// the end of each year.
pub fn future_value(balance: f64, annual_contribution: f64, rate: f64, years: f64) -> f64 {
    if rate.abs() < RATE_EPS {
        return balance + annual_contribution * years;
    }
    let growth = (1.0 + rate).powf(years);
    balance * growth + annual_contribution * (growth - 1.0) / rate
}

/// Inverts [`future_value`] for the (fractional) number of years needed to reach
/// `target`. Returns 0 when already there and `INFINITY` when it never gets there.
pub fn years_to_target(balance: f64, annual_contribution: f64, rate: f64, target: f64) -> f64 {
    if balance >= target {
        return 0.0;
    }
    if rate.abs() < RATE_EPS {
        if annual_contribution <= 0.0 {
            return f64::INFINITY;
        }
        return (target - balance) / annual_contribution;
    }

    let start = balance * rate + annual_contribution;
    if start <= 0.0 {
        return f64::INFINITY;
    }
    let end = target * rate + annual_contribution;
    (end / start).ln() / (1.0 + rate).ln()
}

/// Constant end-of-year contribution that lifts `balance` to `target` in exactly
/// `years` years. Never negative.
pub fn required_annual_contribution(balance: f64, target: f64, rate: f64, years: u32) -> f64 {
    if balance >= target {
        return 0.0;
    }
    if years == 0 {
        return f64::INFINITY;
    }
    let n = years as f64;
    if rate.abs() < RATE_EPS {
        return ((target - balance) / n).max(0.0);
    }
    let growth = (1.0 + rate).powf(n);
    ((target - balance * growth) * rate / (growth - 1.0)).max(0.0)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalType {
    RequiredContribution,
    MaxSpending,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveConfig {
    pub goal_type: GoalType,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub balance_at_target: f64,
    pub goal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveResult {
    pub goal_type: GoalType,
    pub target_age: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    /// Annual amount (contribution or spending) in today's money.
    pub solved_value: Option<f64>,
    pub iterations: Vec<GoalSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
struct CandidateEval {
    balance_at_target: f64,
    goal: f64,
}

impl CandidateEval {
    fn meets_goal(self) -> bool {
        self.balance_at_target + 1e-9 >= self.goal
    }
}

/// Bisects over the deterministic simulator for the smallest annual contribution
/// (or largest annual spending) whose trajectory holds the primary goal at the
/// target retirement age.
pub fn solve_goal(
    inputs: &ScenarioInputs,
    config: GoalSolveConfig,
) -> Result<GoalSolveResult, ScenarioError> {
    validate_config(config)?;

    // RequiredContribution: feasibility rises with the candidate.
    // MaxSpending: feasibility falls with the candidate.
    let rising = config.goal_type == GoalType::RequiredContribution;
    let low_eval = evaluate_candidate(inputs, config.goal_type, config.search_min);
    let high_eval = evaluate_candidate(inputs, config.goal_type, config.search_max);

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let mut solved_value = None;
    let mut converged = false;
    let feasible;
    let message;

    let (edge_ok, edge_value, far_ok) = if rising {
        (low_eval.meets_goal(), config.search_min, high_eval.meets_goal())
    } else {
        (high_eval.meets_goal(), config.search_max, low_eval.meets_goal())
    };

    if edge_ok {
        solved_value = Some(edge_value);
        converged = true;
        feasible = true;
        message = if rising {
            "Already meets the goal at the lower contribution bound.".to_string()
        } else {
            "Upper spending bound is still funded; increase search max for a higher target."
                .to_string()
        };
    } else if !far_ok {
        feasible = false;
        message = if rising {
            "No contribution within the search bounds reaches the goal.".to_string()
        } else {
            "No spending level within the search bounds is funded.".to_string()
        };
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let eval = evaluate_candidate(inputs, config.goal_type, mid);
            trace!(iteration = it, candidate = mid, balance = eval.balance_at_target, "solver step");
            iterations.push(GoalSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_value: mid,
                balance_at_target: eval.balance_at_target,
                goal: eval.goal,
            });

            match (rising, eval.meets_goal()) {
                (true, true) | (false, false) => hi = mid,
                (true, false) | (false, true) => lo = mid,
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                break;
            }
        }
        solved_value = Some(if rising { hi } else { lo });
        feasible = true;
        message = if converged {
            if rising {
                "Solved required contribution.".to_string()
            } else {
                "Solved maximum fundable spending.".to_string()
            }
        } else {
            "Reached max iterations before tolerance was met; returning best estimate."
                .to_string()
        };
    }

    Ok(GoalSolveResult {
        goal_type: config.goal_type,
        target_age: inputs.retirement_age,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_value,
        iterations,
        converged,
        feasible,
        message,
    })
}

fn evaluate_candidate(base: &ScenarioInputs, goal_type: GoalType, value: f64) -> CandidateEval {
    let mut inputs = base.clone();
    match goal_type {
        GoalType::RequiredContribution => inputs.annual_contribution = value.max(0.0),
        GoalType::MaxSpending => inputs.annual_spending = value.max(0.0),
    }

    let goal = primary_goal(&inputs);
    let offset = inputs.years_to_retirement() as usize;
    let balance_at_target = simulate(&inputs)
        .get(offset)
        .map(|point| point.balance)
        .unwrap_or(0.0);
    CandidateEval {
        balance_at_target,
        goal,
    }
}

fn validate_config(config: GoalSolveConfig) -> Result<(), ScenarioError> {
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err(ScenarioError::InvalidSolveConfig(
            "search bounds must be finite".to_string(),
        ));
    }
    if config.search_min < 0.0 {
        return Err(ScenarioError::InvalidSolveConfig(
            "searchMin must be >= 0".to_string(),
        ));
    }
    if config.search_max <= config.search_min {
        return Err(ScenarioError::InvalidSolveConfig(
            "searchMax must be greater than searchMin".to_string(),
        ));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(ScenarioError::InvalidSolveConfig(
            "tolerance must be > 0".to_string(),
        ));
    }
    if config.max_iterations == 0 {
        return Err(ScenarioError::InvalidSolveConfig(
            "maxIterations must be > 0".to_string(),
        ));
    }
    Ok(())
}
