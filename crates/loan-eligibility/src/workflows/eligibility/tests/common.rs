use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::workflows::eligibility::client::{SubmissionClient, SubmissionError};
use crate::workflows::eligibility::domain::{EligibilityResult, LoanOffer};
use crate::workflows::eligibility::form::SubmissionPayload;

pub(super) fn offer(bank: &str, loan_type: &str, rate: f64, link: &str) -> LoanOffer {
    LoanOffer {
        bank: bank.to_string(),
        loan_type: loan_type.to_string(),
        interest_rate: rate,
        apply_link: link.to_string(),
    }
}

pub(super) fn eligible_result() -> EligibilityResult {
    EligibilityResult {
        eligible: true,
        cibil_score: 750,
        predicted_amount: 200_000,
        reason: Some("Approved".to_string()),
        loans: vec![offer("X", "Home Loan", 8.5, "https://x")],
    }
}

pub(super) fn car_loan_result() -> EligibilityResult {
    EligibilityResult {
        eligible: true,
        cibil_score: 750,
        predicted_amount: 200_000,
        reason: Some("Approved".to_string()),
        loans: vec![
            offer("Axis Bank", "Car Loan", 9.2, "https://axis.example/car"),
            offer("HDFC Bank", "Car Loan", 8.9, "https://hdfc.example/car"),
        ],
    }
}

pub(super) fn rejected_result() -> EligibilityResult {
    EligibilityResult {
        eligible: false,
        cibil_score: 480,
        predicted_amount: 35_000,
        reason: Some("Rejected".to_string()),
        loans: Vec::new(),
    }
}

pub(super) fn transport_failure() -> SubmissionError {
    SubmissionError::Transport {
        message: "connection refused".to_string(),
    }
}

/// Replays queued outcomes in order and records every payload it receives.
#[derive(Default)]
pub(super) struct ScriptedClient {
    outcomes: Mutex<VecDeque<Result<EligibilityResult, SubmissionError>>>,
    payloads: Mutex<Vec<SubmissionPayload>>,
}

impl ScriptedClient {
    pub(super) fn new(
        outcomes: impl IntoIterator<Item = Result<EligibilityResult, SubmissionError>>,
    ) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn payloads(&self) -> Vec<SubmissionPayload> {
        self.payloads.lock().expect("payload mutex").clone()
    }
}

#[async_trait]
impl SubmissionClient for ScriptedClient {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<EligibilityResult, SubmissionError> {
        self.payloads
            .lock()
            .expect("payload mutex")
            .push(payload.clone());
        self.outcomes
            .lock()
            .expect("outcome mutex")
            .pop_front()
            .unwrap_or_else(|| Err(transport_failure()))
    }
}
