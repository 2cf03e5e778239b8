mod assumptions;
mod engine;
mod error;
mod metrics;
mod milestones;
mod normalize;
mod solver;
mod types;
mod variants;

pub use assumptions::Assumptions;
pub use engine::{calculate, run_scenario, simulate};
pub use error::ScenarioError;
pub use metrics::{aggregate, feasibility};
pub use milestones::detect_milestones;
pub use normalize::normalize;
pub use solver::{
    GoalSolveConfig, GoalSolveIteration, GoalSolveResult, GoalType, future_value,
    required_annual_contribution, solve_goal, years_to_target,
};
pub use types::{
    BaristaMetrics, BaristaProfile, BudgetCategory, CoastMetrics, CoastProfile, CouplesMetrics,
    CouplesProfile, FatMetrics, FatProfile, Feasibility, FeasibilityBand, LeanMetrics, LeanProfile,
    Milestone, MilestoneTarget, PartnerAttribution, PartnerInputs, PartnerProfile, Phase,
    ProjectionPoint, RawInputs, ScenarioInputs, ScenarioResults, Variant, VariantExtension,
    VariantMetrics,
};
pub use variants::{
    barista_number, coast_number, fire_number, goal_targets, milestone_targets, primary_goal,
};
