use axum::{
    Router,
    extract::Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    Assumptions, GoalSolveConfig, GoalSolveResult, GoalType, RawInputs, ScenarioError,
    ScenarioResults, Variant, calculate, normalize, solve_goal,
};

const DEFAULT_SEARCH_MAX: f64 = 1_000_000.0;
const DEFAULT_TOLERANCE: f64 = 1.0;
const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Body of `POST /api/calculate`, and the file format read by the CLI.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    #[serde(default = "default_variant")]
    pub variant: Variant,
    #[serde(default)]
    pub inputs: RawInputs,
    #[serde(default)]
    pub assumptions: Option<Assumptions>,
}

impl CalculateRequest {
    pub fn run(&self) -> Result<ScenarioResults, ScenarioError> {
        let assumptions = self.assumptions.clone().unwrap_or_default();
        calculate(&self.inputs, self.variant, &assumptions)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolvePayload {
    #[serde(default = "default_variant")]
    variant: Variant,
    #[serde(default)]
    inputs: RawInputs,
    #[serde(default)]
    assumptions: Option<Assumptions>,
    goal_type: GoalType,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

impl SolvePayload {
    fn config(&self) -> GoalSolveConfig {
        GoalSolveConfig {
            goal_type: self.goal_type,
            search_min: self.search_min.unwrap_or(0.0),
            search_max: self.search_max.unwrap_or(DEFAULT_SEARCH_MAX),
            tolerance: self.tolerance.unwrap_or(DEFAULT_TOLERANCE),
            max_iterations: self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
        }
    }

    fn run(&self) -> Result<GoalSolveResult, ScenarioError> {
        let assumptions = self.assumptions.clone().unwrap_or_default();
        let inputs = normalize(&self.inputs, self.variant, &assumptions)?;
        solve_goal(&inputs, self.config())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn default_variant() -> Variant {
    Variant::Standard
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/calculate", post(calculate_handler))
        .route("/api/solve", post(solve_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "FIRE projection API listening");
    info!("Local access: http://127.0.0.1:{port}/health");

    axum::serve(listener, router()).await
}

async fn health_handler() -> impl IntoResponse {
    with_cache_control("ok")
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_handler(Json(request): Json<CalculateRequest>) -> Response {
    calculate_response(&request)
}

async fn solve_handler(Json(payload): Json<SolvePayload>) -> Response {
    solve_response(&payload)
}

fn calculate_response(request: &CalculateRequest) -> Response {
    match request.run() {
        Ok(results) => json_response(StatusCode::OK, results),
        Err(err) => rejected(request.variant, &err),
    }
}

fn solve_response(payload: &SolvePayload) -> Response {
    match payload.run() {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(err) => rejected(payload.variant, &err),
    }
}

fn rejected(variant: Variant, err: &ScenarioError) -> Response {
    warn!(variant = variant.as_str(), error = %err, "request rejected");
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FeasibilityBand, VariantMetrics};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn calculate_request_from_json(json: &str) -> CalculateRequest {
        serde_json::from_str(json).expect("json should parse")
    }

    fn scenario_a_json(variant: &str) -> String {
        format!(
            r#"{{
              "variant": "{variant}",
              "inputs": {{
                "currentAge": 30,
                "retirementAge": 50,
                "currentAssets": 50000,
                "monthlyIncome": 8000,
                "monthlyContribution": 2000,
                "monthlySpending": 4000,
                "expectedReturnPct": 7,
                "inflationPct": 3,
                "withdrawalRatePct": 4
              }}
            }}"#
        )
    }

    fn cache_control(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
    }

    #[test]
    fn calculate_request_parses_web_keys() {
        let request = calculate_request_from_json(
            r#"{
              "variant": "lean",
              "inputs": {
                "currentAge": 28,
                "retirementAge": 45,
                "monthlySpending": 3000,
                "withdrawalRatePct": 4,
                "geoArbitrage": true,
                "geoDiscountPct": 30
              },
              "assumptions": { "leanAnnualSpendingCeiling": 30000 }
            }"#,
        );
        assert_eq!(request.variant, Variant::Lean);
        assert_eq!(request.inputs.current_age, 28);
        assert!(request.inputs.geo_arbitrage);
        assert_approx(request.inputs.geo_discount_pct, 30.0);
        let assumptions = request.assumptions.expect("assumptions present");
        assert_approx(assumptions.lean_annual_spending_ceiling, 30_000.0);
        assert_eq!(assumptions.tail_years, 20);
    }

    #[test]
    fn calculate_request_defaults_to_standard_variant() {
        let request = calculate_request_from_json(r#"{ "inputs": { "currentAge": 40 } }"#);
        assert_eq!(request.variant, Variant::Standard);
        assert!(request.assumptions.is_none());
    }

    #[test]
    fn calculate_request_parses_partners() {
        let request = calculate_request_from_json(
            r#"{
              "variant": "couples",
              "inputs": {
                "monthlySpending": 6000,
                "expectedReturnPct": 7,
                "withdrawalRatePct": 4,
                "partner1": { "name": "Sam", "age": 35, "retirementAge": 55,
                  "currentAssets": 80000, "monthlyIncome": 9000, "monthlyContribution": 2500 },
                "partner2": { "age": 33, "retirementAge": 58,
                  "currentAssets": 40000, "monthlyIncome": 6000, "monthlyContribution": 1500 }
              }
            }"#,
        );
        let results = request.run().expect("valid couple");
        let VariantMetrics::Couples(couples) = &results.variant_metrics else {
            panic!("expected couples metrics");
        };
        assert_eq!(couples.partner1.name, "Sam");
        assert_eq!(couples.gap_years, 5);
    }

    #[test]
    fn calculate_response_serialization_contains_expected_fields() {
        let request = calculate_request_from_json(&scenario_a_json("standard"));
        let results = request.run().expect("valid scenario");
        let json = serde_json::to_string(&results).expect("results should serialize");
        for key in [
            "\"primaryGoal\"",
            "\"yearsToGoal\"",
            "\"goalAge\"",
            "\"currentProgress\"",
            "\"requiredSavingsRate\"",
            "\"currentSavingsRate\"",
            "\"feasibility\"",
            "\"safetyBuffer\"",
            "\"projection\"",
            "\"milestones\"",
            "\"passiveIncome\"",
            "\"variantMetrics\"",
        ] {
            assert!(json.contains(key), "missing {key}");
        }
        assert!(json.contains("\"phase\":\"full-retirement\""));
        assert!(json.contains("\"variant\":\"standard\""));
    }

    #[test]
    fn unreachable_goal_serializes_as_null() {
        let request = calculate_request_from_json(
            r#"{
              "inputs": {
                "currentAge": 30, "retirementAge": 40, "currentAssets": 0,
                "monthlyIncome": 0, "monthlyContribution": 0, "monthlySpending": 3000,
                "expectedReturnPct": 0, "inflationPct": 0, "withdrawalRatePct": 4
              }
            }"#,
        );
        let results = request.run().expect("valid scenario");
        assert!(results.years_to_goal.is_infinite());
        assert_eq!(results.feasibility.band, FeasibilityBand::VeryChallenging);
        let json = serde_json::to_value(&results).expect("results should serialize");
        assert!(json["yearsToGoal"].is_null());
        assert!(json["requiredSavingsRate"].is_null());
    }

    #[test]
    fn calculate_response_is_ok_with_no_store() {
        let response = calculate_response(&calculate_request_from_json(&scenario_a_json("fat")));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(cache_control(&response), Some("no-store"));
    }

    #[test]
    fn invalid_scenario_maps_to_bad_request() {
        let mut request = calculate_request_from_json(&scenario_a_json("coast"));
        request.inputs.retirement_age = 25;
        let response = calculate_response(&request);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(cache_control(&response), Some("no-store"));
    }

    #[test]
    fn solve_payload_fills_default_search_config() {
        let payload: SolvePayload = serde_json::from_str(
            r#"{ "variant": "standard", "goalType": "required-contribution",
                 "inputs": { "currentAge": 30, "retirementAge": 50, "monthlySpending": 4000,
                             "withdrawalRatePct": 4, "expectedReturnPct": 7 } }"#,
        )
        .expect("json should parse");
        let config = payload.config();
        assert_eq!(config.goal_type, GoalType::RequiredContribution);
        assert_approx(config.search_min, 0.0);
        assert_approx(config.search_max, DEFAULT_SEARCH_MAX);
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);

        let result = payload.run().expect("solver should run");
        assert!(result.feasible);
        assert!(result.solved_value.is_some_and(|v| v > 0.0));
    }

    #[test]
    fn solve_response_rejects_inverted_bounds() {
        let payload: SolvePayload = serde_json::from_str(
            r#"{ "goalType": "max-spending", "searchMin": 5000, "searchMax": 10,
                 "inputs": { "currentAge": 30, "retirementAge": 50, "withdrawalRatePct": 4 } }"#,
        )
        .expect("json should parse");
        let response = solve_response(&payload);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
