use tracing::debug;

use super::assumptions::Assumptions;
use super::error::ScenarioError;
use super::types::{
    BaristaProfile, CoastProfile, CouplesProfile, FatProfile, LeanProfile, PartnerInputs,
    PartnerProfile, RawInputs, ScenarioInputs, Variant, VariantExtension,
};

const MAX_AGE: u32 = 120;

/// Converts form-level inputs into the canonical annual parameter set for `variant`.
///
/// All validation happens here; downstream stages assume the result is well formed.
pub fn normalize(
    raw: &RawInputs,
    variant: Variant,
    assumptions: &Assumptions,
) -> Result<ScenarioInputs, ScenarioError> {
    validate_assumptions(assumptions)?;
    validate_rates(raw)?;
    non_negative("monthlySpending", raw.monthly_spending)?;

    let expected_return = raw.expected_return_pct / 100.0;
    let inflation_rate = raw.inflation_pct / 100.0;
    let withdrawal_rate = raw.withdrawal_rate_pct / 100.0;
    let flat_annual_spending = raw.monthly_spending * 12.0;

    if variant != Variant::Couples {
        validate_individual(raw)?;
    }

    let extension = match variant {
        Variant::Standard => VariantExtension::Standard,
        Variant::Lean => VariantExtension::Lean(build_lean(raw, assumptions)?),
        Variant::Fat => VariantExtension::Fat(build_fat(raw, assumptions)?),
        Variant::Coast => VariantExtension::Coast(build_coast(raw)?),
        Variant::Barista => VariantExtension::Barista(build_barista(raw)?),
        Variant::Couples => VariantExtension::Couples(build_couples(raw)?),
    };

    let annual_spending = match &extension {
        VariantExtension::Lean(profile) => lean_spending(profile),
        VariantExtension::Fat(profile) => fat_spending(profile, flat_annual_spending),
        _ => flat_annual_spending,
    };

    let (current_age, retirement_age, current_assets, annual_income, annual_contribution) =
        match &extension {
            VariantExtension::Couples(couples) => {
                let partner1 = &couples.partner1;
                let partner2 = &couples.partner2;
                let household_years = partner1
                    .years_to_retirement()
                    .max(partner2.years_to_retirement());
                (
                    partner1.age,
                    partner1.age + household_years,
                    partner1.current_assets + partner2.current_assets,
                    partner1.annual_income + partner2.annual_income,
                    partner1.annual_contribution + partner2.annual_contribution,
                )
            }
            _ => (
                raw.current_age,
                raw.retirement_age,
                raw.current_assets,
                raw.monthly_income * 12.0,
                raw.monthly_contribution * 12.0,
            ),
        };

    let inputs = ScenarioInputs {
        current_age,
        retirement_age,
        current_assets,
        annual_income,
        annual_contribution,
        annual_spending,
        expected_return,
        inflation_rate,
        withdrawal_rate,
        tail_years: assumptions.tail_years,
        round_milestones: assumptions.round_milestones.clone(),
        extension,
    };

    debug!(
        variant = variant.as_str(),
        current_age = inputs.current_age,
        retirement_age = inputs.retirement_age,
        annual_spending = inputs.annual_spending,
        "normalized scenario"
    );
    Ok(inputs)
}

/// Spending after the lean ceiling and the (clamped) geo-arbitrage discount.
pub(crate) fn lean_spending(profile: &LeanProfile) -> f64 {
    let capped = profile
        .requested_annual_spending
        .min(profile.annual_spending_ceiling);
    if profile.geo_arbitrage {
        capped * (1.0 - profile.geo_discount)
    } else {
        capped
    }
}

fn fat_spending(profile: &FatProfile, flat_annual_spending: f64) -> f64 {
    if profile.budget.is_empty() {
        flat_annual_spending
    } else {
        profile.budget.iter().map(|c| c.monthly_amount).sum::<f64>() * 12.0
    }
}

fn build_lean(raw: &RawInputs, assumptions: &Assumptions) -> Result<LeanProfile, ScenarioError> {
    let geo_discount = if raw.geo_arbitrage {
        non_negative("geoDiscountPct", raw.geo_discount_pct)?;
        raw.geo_discount_pct.min(assumptions.max_geo_discount_pct) / 100.0
    } else {
        0.0
    };

    Ok(LeanProfile {
        requested_annual_spending: raw.monthly_spending * 12.0,
        annual_spending_ceiling: assumptions.lean_annual_spending_ceiling,
        geo_arbitrage: raw.geo_arbitrage,
        geo_discount,
    })
}

fn build_fat(raw: &RawInputs, assumptions: &Assumptions) -> Result<FatProfile, ScenarioError> {
    for category in &raw.lifestyle_budget {
        if !category.monthly_amount.is_finite() || category.monthly_amount < 0.0 {
            return Err(ScenarioError::invalid(format!(
                "lifestyleBudget entry '{}' must be >= 0",
                category.name
            )));
        }
    }

    let mut profile = FatProfile {
        budget: raw.lifestyle_budget.clone(),
        lean_annual_spending: 0.0,
        regular_annual_spending: 0.0,
        fat_annual_spending_floor: assumptions.fat_annual_spending_floor,
    };
    let fat = fat_spending(&profile, raw.monthly_spending * 12.0);
    let lean = assumptions.lean_annual_spending_ceiling.min(fat);
    profile.lean_annual_spending = lean;
    profile.regular_annual_spending = assumptions.regular_annual_spending.min(fat).max(lean);
    Ok(profile)
}

fn build_coast(raw: &RawInputs) -> Result<CoastProfile, ScenarioError> {
    if let Some(stop_age) = raw.coast_stop_age {
        if stop_age < raw.current_age || stop_age >= raw.retirement_age {
            return Err(ScenarioError::invalid(
                "coastStopAge must be >= currentAge and < retirementAge",
            ));
        }
    }
    Ok(CoastProfile {
        stop_age: raw.coast_stop_age,
    })
}

fn build_barista(raw: &RawInputs) -> Result<BaristaProfile, ScenarioError> {
    non_negative("partTimeMonthlyIncome", raw.part_time_monthly_income)?;
    if let Some(age) = raw.barista_age {
        if age < raw.current_age || age >= raw.retirement_age {
            return Err(ScenarioError::invalid(
                "baristaAge must be >= currentAge and < retirementAge",
            ));
        }
    }
    Ok(BaristaProfile {
        part_time_annual_income: raw.part_time_monthly_income * 12.0,
        switch_age: raw.barista_age,
    })
}

fn build_couples(raw: &RawInputs) -> Result<CouplesProfile, ScenarioError> {
    let (Some(p1), Some(p2)) = (raw.partner1.as_ref(), raw.partner2.as_ref()) else {
        return Err(ScenarioError::invalid(
            "couples scenarios require both partner1 and partner2",
        ));
    };
    let partner1 = build_partner("partner1", p1, "Partner 1")?;
    let partner2 = build_partner("partner2", p2, "Partner 2")?;
    let first_years = partner1
        .years_to_retirement()
        .min(partner2.years_to_retirement());

    Ok(CouplesProfile {
        first_retirement_age: partner1.age + first_years,
        partner1,
        partner2,
    })
}

fn build_partner(
    field: &str,
    partner: &PartnerInputs,
    default_name: &str,
) -> Result<PartnerProfile, ScenarioError> {
    if partner.age > MAX_AGE || partner.retirement_age > MAX_AGE {
        return Err(ScenarioError::invalid(format!(
            "{field} ages must be <= {MAX_AGE}"
        )));
    }
    if partner.retirement_age <= partner.age {
        return Err(ScenarioError::invalid(format!(
            "{field}.retirementAge must be > {field}.age"
        )));
    }
    non_negative(&format!("{field}.currentAssets"), partner.current_assets)?;
    non_negative(&format!("{field}.monthlyIncome"), partner.monthly_income)?;
    non_negative(
        &format!("{field}.monthlyContribution"),
        partner.monthly_contribution,
    )?;

    let name = if partner.name.trim().is_empty() {
        default_name.to_string()
    } else {
        partner.name.clone()
    };

    Ok(PartnerProfile {
        name,
        age: partner.age,
        retirement_age: partner.retirement_age,
        current_assets: partner.current_assets,
        annual_income: partner.monthly_income * 12.0,
        annual_contribution: partner.monthly_contribution * 12.0,
    })
}

fn validate_individual(raw: &RawInputs) -> Result<(), ScenarioError> {
    if raw.current_age > MAX_AGE || raw.retirement_age > MAX_AGE {
        return Err(ScenarioError::invalid(format!("ages must be <= {MAX_AGE}")));
    }
    if raw.retirement_age <= raw.current_age {
        return Err(ScenarioError::invalid(
            "retirementAge must be > currentAge",
        ));
    }
    non_negative("currentAssets", raw.current_assets)?;
    non_negative("monthlyIncome", raw.monthly_income)?;
    non_negative("monthlyContribution", raw.monthly_contribution)?;
    Ok(())
}

fn validate_rates(raw: &RawInputs) -> Result<(), ScenarioError> {
    non_negative("expectedReturnPct", raw.expected_return_pct)?;
    non_negative("inflationPct", raw.inflation_pct)?;
    let rate = raw.withdrawal_rate_pct;
    if !rate.is_finite() || rate <= 0.0 || rate >= 100.0 {
        return Err(ScenarioError::invalid(
            "withdrawalRatePct must be between 0 and 100 (exclusive)",
        ));
    }
    Ok(())
}

fn validate_assumptions(assumptions: &Assumptions) -> Result<(), ScenarioError> {
    non_negative(
        "leanAnnualSpendingCeiling",
        assumptions.lean_annual_spending_ceiling,
    )?;
    non_negative("regularAnnualSpending", assumptions.regular_annual_spending)?;
    non_negative(
        "fatAnnualSpendingFloor",
        assumptions.fat_annual_spending_floor,
    )?;
    if !(0.0..=100.0).contains(&assumptions.max_geo_discount_pct) {
        return Err(ScenarioError::invalid(
            "maxGeoDiscountPct must be between 0 and 100",
        ));
    }
    for amount in &assumptions.round_milestones {
        non_negative("roundMilestones", *amount)?;
    }
    Ok(())
}

fn non_negative(name: &str, value: f64) -> Result<(), ScenarioError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ScenarioError::invalid(format!("{name} must be >= 0")));
    }
    Ok(())
}
