use super::types::{Milestone, MilestoneTarget, ProjectionPoint};

/// Scans a trajectory for the first period each target balance is met.
///
/// Targets the trajectory never reaches are extrapolated from the growth over
/// its last year, as long as the estimate lands within
/// `max_extrapolation_years` past the end. Anything further out, or a
/// trajectory that is flat or shrinking at the end, reports `INFINITY`.
pub fn detect_milestones(
    points: &[ProjectionPoint],
    targets: &[MilestoneTarget],
    max_extrapolation_years: u32,
) -> Vec<Milestone> {
    let mut milestones = targets
        .iter()
        .map(|target| detect_one(points, target, max_extrapolation_years))
        .collect::<Vec<_>>();
    milestones.sort_by(|a, b| a.amount.total_cmp(&b.amount));
    milestones
}

fn detect_one(
    points: &[ProjectionPoint],
    target: &MilestoneTarget,
    max_extrapolation_years: u32,
) -> Milestone {
    let crossing = points.iter().find(|p| p.balance >= target.amount);
    match crossing {
        Some(point) => Milestone {
            name: target.name.clone(),
            amount: target.amount,
            achieved: true,
            achieved_age: Some(point.age),
            years_to_reach: point.period as f64,
        },
        None => Milestone {
            name: target.name.clone(),
            amount: target.amount,
            achieved: false,
            achieved_age: None,
            years_to_reach: extrapolate(points, target.amount, max_extrapolation_years),
        },
    }
}

fn extrapolate(points: &[ProjectionPoint], amount: f64, max_extra_years: u32) -> f64 {
    let [.., prev, last] = points else {
        return f64::INFINITY;
    };
    if prev.balance <= 0.0 || last.balance <= prev.balance {
        return f64::INFINITY;
    }

    let growth = last.balance / prev.balance;
    let extra = (amount / last.balance).ln() / growth.ln();
    if extra.is_finite() && extra <= max_extra_years as f64 {
        last.period as f64 + extra
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Phase;
    use proptest::prelude::{prop_assert, proptest};

    fn point(period: u32, balance: f64) -> ProjectionPoint {
        ProjectionPoint {
            period,
            age: 30 + period,
            balance,
            passive_income: balance * 0.04,
            target_spending: 40_000.0,
            contribution: 0.0,
            withdrawal: 0.0,
            phase: Phase::Accumulation,
        }
    }

    fn path(balances: &[f64]) -> Vec<ProjectionPoint> {
        balances
            .iter()
            .enumerate()
            .map(|(idx, balance)| point(idx as u32, *balance))
            .collect()
    }

    #[test]
    fn already_met_target_reports_zero_years_at_current_age() {
        let points = path(&[500.0, 600.0]);
        let milestones = detect_milestones(&points, &[MilestoneTarget::new("small", 100.0)], 20);
        assert!(milestones[0].achieved);
        assert_eq!(milestones[0].achieved_age, Some(30));
        assert_eq!(milestones[0].years_to_reach, 0.0);
    }

    #[test]
    fn first_crossing_wins_even_if_balance_later_falls() {
        let points = path(&[100.0, 200.0, 400.0, 150.0]);
        let milestones = detect_milestones(&points, &[MilestoneTarget::new("peak", 300.0)], 20);
        assert_eq!(milestones[0].achieved_age, Some(32));
        assert_eq!(milestones[0].years_to_reach, 2.0);
    }

    #[test]
    fn unreached_target_is_extrapolated_from_final_growth() {
        let points = path(&[100.0, 110.0, 121.0]);
        let milestones = detect_milestones(&points, &[MilestoneTarget::new("far", 146.41)], 20);
        let milestone = &milestones[0];
        assert!(!milestone.achieved);
        assert_eq!(milestone.achieved_age, None);
        assert!((milestone.years_to_reach - 4.0).abs() < 1e-9);
    }

    #[test]
    fn extrapolation_beyond_cap_is_infinite() {
        let points = path(&[100.0, 110.0, 121.0]);
        let milestones =
            detect_milestones(&points, &[MilestoneTarget::new("far", 1_000_000.0)], 20);
        assert!(milestones[0].years_to_reach.is_infinite());
    }

    #[test]
    fn shrinking_or_empty_trajectory_never_extrapolates() {
        let target = [MilestoneTarget::new("goal", 1_000.0)];
        let falling = path(&[500.0, 400.0]);
        assert!(detect_milestones(&falling, &target, 20)[0].years_to_reach.is_infinite());
        assert!(detect_milestones(&[], &target, 20)[0].years_to_reach.is_infinite());
        let zero = path(&[0.0, 0.0]);
        assert!(detect_milestones(&zero, &target, 20)[0].years_to_reach.is_infinite());
    }

    #[test]
    fn output_is_sorted_by_amount() {
        let points = path(&[100.0, 200.0, 300.0]);
        let targets = [
            MilestoneTarget::new("c", 250.0),
            MilestoneTarget::new("a", 50.0),
            MilestoneTarget::new("b", 150.0),
        ];
        let names = detect_milestones(&points, &targets, 20)
            .into_iter()
            .map(|m| m.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_years_to_reach_non_decreasing_on_growing_path(
            start in 1u32..100_000,
            step in 1u32..50_000,
            len in 2usize..30,
            raw_targets in proptest::collection::vec(1u32..3_000_000, 1..8)
        ) {
            let balances = (0..len)
                .map(|idx| start as f64 + step as f64 * idx as f64)
                .collect::<Vec<_>>();
            let points = path(&balances);
            let targets = raw_targets
                .iter()
                .map(|amount| MilestoneTarget::new(amount.to_string(), *amount as f64))
                .collect::<Vec<_>>();
            let milestones = detect_milestones(&points, &targets, 20);
            prop_assert!(milestones.len() == targets.len());
            for pair in milestones.windows(2) {
                prop_assert!(pair[0].amount <= pair[1].amount);
                prop_assert!(pair[0].years_to_reach <= pair[1].years_to_reach);
            }
            for milestone in &milestones {
                prop_assert!(!milestone.years_to_reach.is_nan());
                prop_assert!(milestone.achieved == milestone.achieved_age.is_some());
            }
        }
    }
}
