//! Two-phase loan eligibility workflow: applicant form state, the submission
//! boundary to the prediction service, the flow controller, and result views.

pub mod client;
pub mod domain;
pub mod flow;
pub mod form;
pub mod view;

#[cfg(test)]
mod tests;

pub use client::{HttpSubmissionClient, SubmissionClient, SubmissionError};
pub use domain::{
    CreditHistory, Dependents, Education, EligibilityResult, FormOption, Gender, LoanOffer,
    LoanType, PropertyArea, YesNo,
};
pub use flow::{
    CompletionOutcome, DisplayedResult, FlowController, FlowError, FlowPhase, ResponseOrdering,
    SubmissionFailure, SubmissionKind, SubmissionTicket,
};
pub use form::{build_payload, coerce_int, FieldName, FormError, LoanApplication, SubmissionPayload};
pub use view::{render_page, render_text, write_offers_csv, FlowView, OffersSection, ResultCard};
