use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::client::{SubmissionClient, SubmissionError};
use super::domain::{EligibilityResult, FormOption, LoanType};
use super::form::{build_payload, FieldName, FormError, LoanApplication, SubmissionPayload};

/// Which request a ticket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    EligibilityCheck,
    LoanTypeRefinement,
}

impl SubmissionKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::EligibilityCheck => "eligibility check",
            Self::LoanTypeRefinement => "loan-type refinement",
        }
    }
}

/// Externally visible state of the two-phase flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    Idle,
    Submitting,
    NotEligible,
    Eligible,
    SubmittingRefined,
}

/// How responses of overlapping submissions are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseOrdering {
    /// Ignore a response once a newer submission's outcome is displayed.
    #[default]
    LatestIssued,
    /// Display whatever completes last, even if it was issued earlier.
    LatestCompleted,
}

impl fmt::Display for ResponseOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LatestIssued => write!(f, "latest-issued"),
            Self::LatestCompleted => write!(f, "latest-completed"),
        }
    }
}

impl FromStr for ResponseOrdering {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "latest-issued" | "latest_issued" | "issued" => Ok(Self::LatestIssued),
            "latest-completed" | "latest_completed" | "completed" => Ok(Self::LatestCompleted),
            other => Err(format!(
                "unknown response ordering '{other}' (expected latest-issued or latest-completed)"
            )),
        }
    }
}

/// An issued request awaiting its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionTicket {
    pub sequence: u64,
    pub kind: SubmissionKind,
    pub payload: SubmissionPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayedResult {
    pub sequence: u64,
    pub kind: SubmissionKind,
    pub received_at: DateTime<Utc>,
    pub result: EligibilityResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionFailure {
    pub sequence: u64,
    pub kind: SubmissionKind,
    pub occurred_at: DateTime<Utc>,
    pub message: String,
}

/// What `complete` did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Applied,
    Failed,
    DiscardedStale,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("loan-type selection is only available after an eligible result")]
    RefinementUnavailable,
    #[error(transparent)]
    Form(#[from] FormError),
}

/// Owns the session's form state and the single displayed result.
#[derive(Debug, Clone)]
pub struct FlowController {
    application: LoanApplication,
    loan_type: LoanType,
    ordering: ResponseOrdering,
    next_sequence: u64,
    pending: BTreeMap<u64, SubmissionKind>,
    displayed: Option<DisplayedResult>,
    last_failure: Option<SubmissionFailure>,
}

impl Default for FlowController {
    fn default() -> Self {
        Self::new(ResponseOrdering::default())
    }
}

impl FlowController {
    pub fn new(ordering: ResponseOrdering) -> Self {
        Self {
            application: LoanApplication::default(),
            loan_type: LoanType::default(),
            ordering,
            next_sequence: 1,
            pending: BTreeMap::new(),
            displayed: None,
            last_failure: None,
        }
    }

    pub fn application(&self) -> &LoanApplication {
        &self.application
    }

    pub fn loan_type(&self) -> LoanType {
        self.loan_type
    }

    pub fn displayed(&self) -> Option<&DisplayedResult> {
        self.displayed.as_ref()
    }

    pub fn last_failure(&self) -> Option<&SubmissionFailure> {
        self.last_failure.as_ref()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn update_field(&mut self, name: FieldName, raw: &str) -> Result<&LoanApplication, FormError> {
        self.application.update_field(name, raw)
    }

    /// Apply a batch of edits from one form post; nothing changes if any fails.
    pub fn apply_fields<'a, I>(&mut self, fields: I) -> Result<&LoanApplication, FormError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut draft = self.application.clone();
        for (name, raw) in fields {
            let field: FieldName = name.parse()?;
            draft.update_field(field, raw)?;
        }
        self.application = draft;
        Ok(&self.application)
    }

    pub fn select_loan_type(&mut self, raw: &str) -> Result<LoanType, FormError> {
        let loan_type = LoanType::parse_option(raw).ok_or_else(|| FormError::UnknownOption {
            field: "LoanType",
            value: raw.to_string(),
        })?;
        self.loan_type = loan_type;
        Ok(loan_type)
    }

    /// The selector follows the latest displayed result only.
    pub fn loan_type_form_visible(&self) -> bool {
        self.displayed
            .as_ref()
            .is_some_and(|displayed| displayed.result.eligible)
    }

    pub fn phase(&self) -> FlowPhase {
        if let Some((_, kind)) = self.pending.iter().next_back() {
            return match kind {
                SubmissionKind::EligibilityCheck => FlowPhase::Submitting,
                SubmissionKind::LoanTypeRefinement => FlowPhase::SubmittingRefined,
            };
        }

        match &self.displayed {
            Some(displayed) if displayed.result.eligible => FlowPhase::Eligible,
            Some(_) => FlowPhase::NotEligible,
            None => FlowPhase::Idle,
        }
    }

    pub fn begin_eligibility_check(&mut self) -> SubmissionTicket {
        let payload = build_payload(&self.application, None);
        self.issue(SubmissionKind::EligibilityCheck, payload)
    }

    pub fn begin_refinement(&mut self) -> Result<SubmissionTicket, FlowError> {
        if !self.loan_type_form_visible() {
            return Err(FlowError::RefinementUnavailable);
        }
        let payload = build_payload(&self.application, Some(self.loan_type));
        Ok(self.issue(SubmissionKind::LoanTypeRefinement, payload))
    }

    fn issue(&mut self, kind: SubmissionKind, payload: SubmissionPayload) -> SubmissionTicket {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.insert(sequence, kind);
        debug!(sequence, kind = kind.label(), "submission issued");
        SubmissionTicket {
            sequence,
            kind,
            payload,
        }
    }

    /// Apply the outcome of a previously issued ticket. A success replaces the
    /// displayed result wholesale; a failure leaves it untouched.
    pub fn complete(
        &mut self,
        ticket: &SubmissionTicket,
        outcome: Result<EligibilityResult, SubmissionError>,
    ) -> CompletionOutcome {
        self.pending.remove(&ticket.sequence);

        if self.is_stale(ticket.sequence) {
            debug!(
                sequence = ticket.sequence,
                kind = ticket.kind.label(),
                succeeded = outcome.is_ok(),
                "discarding stale response"
            );
            return CompletionOutcome::DiscardedStale;
        }

        match outcome {
            Ok(result) => {
                info!(
                    sequence = ticket.sequence,
                    kind = ticket.kind.label(),
                    eligible = result.eligible,
                    offers = result.loans.len(),
                    "eligibility result received"
                );
                self.displayed = Some(DisplayedResult {
                    sequence: ticket.sequence,
                    kind: ticket.kind,
                    received_at: Utc::now(),
                    result,
                });
                if self
                    .last_failure
                    .as_ref()
                    .is_some_and(|failure| self.supersedes(ticket.sequence, failure.sequence))
                {
                    self.last_failure = None;
                }
                CompletionOutcome::Applied
            }
            Err(err) => {
                warn!(
                    sequence = ticket.sequence,
                    kind = ticket.kind.label(),
                    error = %err,
                    "submission failed"
                );
                self.last_failure = Some(SubmissionFailure {
                    sequence: ticket.sequence,
                    kind: ticket.kind,
                    occurred_at: Utc::now(),
                    message: err.to_string(),
                });
                CompletionOutcome::Failed
            }
        }
    }

    /// Forget a ticket whose request will never complete, e.g. because the
    /// caller stopped waiting for it. Returns false if it was already resolved.
    pub fn abandon(&mut self, ticket: &SubmissionTicket) -> bool {
        let removed = self.pending.remove(&ticket.sequence).is_some();
        if removed {
            debug!(
                sequence = ticket.sequence,
                kind = ticket.kind.label(),
                "submission abandoned"
            );
        }
        removed
    }

    fn is_stale(&self, sequence: u64) -> bool {
        match self.ordering {
            ResponseOrdering::LatestCompleted => false,
            ResponseOrdering::LatestIssued => {
                let displayed = self.displayed.as_ref().map(|d| d.sequence);
                let failed = self.last_failure.as_ref().map(|f| f.sequence);
                displayed.max(failed).is_some_and(|newest| newest > sequence)
            }
        }
    }

    fn supersedes(&self, sequence: u64, other: u64) -> bool {
        match self.ordering {
            ResponseOrdering::LatestCompleted => true,
            ResponseOrdering::LatestIssued => sequence > other,
        }
    }

    pub async fn submit_eligibility_check<C>(&mut self, client: &C) -> CompletionOutcome
    where
        C: SubmissionClient + ?Sized,
    {
        let ticket = self.begin_eligibility_check();
        let outcome = client.submit(&ticket.payload).await;
        self.complete(&ticket, outcome)
    }

    pub async fn submit_refinement<C>(&mut self, client: &C) -> Result<CompletionOutcome, FlowError>
    where
        C: SubmissionClient + ?Sized,
    {
        let ticket = self.begin_refinement()?;
        let outcome = client.submit(&ticket.payload).await;
        Ok(self.complete(&ticket, outcome))
    }
}
