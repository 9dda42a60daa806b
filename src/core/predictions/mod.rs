//! At-risk predictions for students
//!
//! The risk model itself runs elsewhere; this module stores what it returned
//! together with the input features and the generated recommendations.

pub mod api;

use serde::{Deserialize, Serialize};

use crate::core::db::models::{PredictionOutcome, RiskLevel};
use crate::core::validation::{ValidationErrors, parse_enum};

pub use api::{PredictionApiState, prediction_api_router};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Highest page whose offset still fits in an `i64`
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Model output as posted by the client, checked before it is stored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutcomePayload {
    pub at_risk: bool,
    pub confidence: f64,
    pub risk_level: String,
    pub risk_probability: f64,
    pub risk_factors: Vec<String>,
}

pub fn validate_outcome(
    payload: OutcomePayload,
    errors: &mut ValidationErrors,
) -> Option<PredictionOutcome> {
    let risk_level = parse_enum::<RiskLevel>(&payload.risk_level);
    errors.check(
        risk_level.is_some(),
        "prediction.risk_level",
        "Risk level must be low, medium or high",
    );
    errors.check(
        (0.0..=1.0).contains(&payload.confidence),
        "prediction.confidence",
        "Confidence must be between 0 and 1",
    );
    errors.check(
        (0.0..=1.0).contains(&payload.risk_probability),
        "prediction.risk_probability",
        "Risk probability must be between 0 and 1",
    );

    Some(PredictionOutcome {
        at_risk: payload.at_risk,
        confidence: payload.confidence,
        risk_level: risk_level?,
        risk_probability: payload.risk_probability,
        risk_factors: payload.risk_factors,
    })
}

/// Page window requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1).min(MAX_PAGE),
            limit: limit
                .filter(|l| *l > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn pagination(&self, total: i64) -> Pagination {
        Pagination {
            total,
            page: self.page,
            limit: self.limit,
            total_pages: (total + self.limit - 1) / self.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> OutcomePayload {
        OutcomePayload {
            at_risk: true,
            confidence: 0.82,
            risk_level: "high".to_string(),
            risk_probability: 0.74,
            risk_factors: vec!["Low engagement".to_string()],
        }
    }

    #[test]
    fn test_validate_outcome() {
        let mut errors = ValidationErrors::new();
        let outcome = validate_outcome(payload(), &mut errors).unwrap();

        assert!(errors.is_empty());
        assert_eq!(outcome.risk_level, RiskLevel::High);
        assert_eq!(outcome.risk_factors.len(), 1);
    }

    #[test]
    fn test_validate_outcome_ranges() {
        let mut errors = ValidationErrors::new();
        let bad = OutcomePayload {
            confidence: 1.5,
            risk_probability: -0.1,
            ..payload()
        };

        validate_outcome(bad, &mut errors);

        assert!(errors.contains("prediction.confidence"));
        assert!(errors.contains("prediction.risk_probability"));
        assert!(!errors.contains("prediction.risk_level"));
    }

    #[test]
    fn test_validate_outcome_risk_level() {
        let mut errors = ValidationErrors::new();
        let bad = OutcomePayload {
            risk_level: "severe".to_string(),
            ..payload()
        };

        assert!(validate_outcome(bad, &mut errors).is_none());
        assert!(errors.contains("prediction.risk_level"));
    }

    #[test]
    fn test_page_request_defaults() {
        let page = PageRequest::new(None, None);
        assert_eq!(page, PageRequest { page: 1, limit: 10 });
        assert_eq!(page.offset(), 0);

        let clamped = PageRequest::new(Some(0), Some(1000));
        assert_eq!(clamped, PageRequest { page: 1, limit: MAX_PAGE_SIZE });
    }

    #[test]
    fn test_huge_page_is_clamped() {
        let page = PageRequest::new(Some(i64::MAX), Some(10));

        assert_eq!(page.page, MAX_PAGE);
        assert!(page.offset() >= 0);
        assert_eq!(page.offset(), (MAX_PAGE - 1) * 10);

        let widest = PageRequest::new(Some(i64::MAX), Some(i64::MAX));
        assert!(widest.offset() >= 0);
    }

    #[test]
    fn test_pagination_total_pages() {
        let page = PageRequest::new(Some(3), Some(10));
        assert_eq!(page.offset(), 20);

        assert_eq!(page.pagination(0).total_pages, 0);
        assert_eq!(page.pagination(10).total_pages, 1);
        assert_eq!(page.pagination(21).total_pages, 3);
    }
}
