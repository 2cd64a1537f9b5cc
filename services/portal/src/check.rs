use std::fs::File;
use std::path::PathBuf;

use clap::Args;
use loan_eligibility::config::{parse_endpoint, AppConfig};
use loan_eligibility::error::AppError;
use loan_eligibility::telemetry;
use loan_eligibility::workflows::eligibility::{
    render_text, write_offers_csv, CompletionOutcome, FieldName, FlowController, FlowView,
    HttpSubmissionClient, SubmissionClient, SubmissionTicket,
};
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    /// Applicant gender (Male, Female)
    #[arg(long, default_value = "Male")]
    pub(crate) gender: String,
    /// Marital status (Yes, No)
    #[arg(long, default_value = "No")]
    pub(crate) married: String,
    /// Number of dependents (0, 1, 2, 3+)
    #[arg(long, default_value = "0")]
    pub(crate) dependents: String,
    /// Education (Graduate, Not Graduate)
    #[arg(long, default_value = "Graduate")]
    pub(crate) education: String,
    /// Self employed (Yes, No)
    #[arg(long, default_value = "No")]
    pub(crate) self_employed: String,
    /// Property area (Urban, Rural, Semiurban)
    #[arg(long, default_value = "Urban")]
    pub(crate) property_area: String,
    /// Credit history meets guidelines (1) or not (0)
    #[arg(long, default_value = "1")]
    pub(crate) credit_history: String,
    /// Applicant income; non-numeric input is sent as 0
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub(crate) applicant_income: String,
    /// Co-applicant income; non-numeric input is sent as 0
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub(crate) coapplicant_income: String,
    /// Loan term in months; non-numeric input is sent as 360
    #[arg(long, default_value = "360", allow_hyphen_values = true)]
    pub(crate) loan_amount_term: String,
    /// Desired loan amount; non-numeric input is sent as 0
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub(crate) desired_loan_amount: String,
    /// Fetch offers for this loan type when the applicant is eligible
    #[arg(long)]
    pub(crate) loan_type: Option<String>,
    /// Override the prediction service endpoint
    #[arg(long)]
    pub(crate) endpoint: Option<String>,
    /// Write the displayed offers to a CSV file
    #[arg(long)]
    pub(crate) offers_csv: Option<PathBuf>,
    /// Print the session view as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

impl CheckArgs {
    fn fields(&self) -> [(FieldName, &str); 11] {
        [
            (FieldName::Gender, self.gender.as_str()),
            (FieldName::Married, self.married.as_str()),
            (FieldName::Dependents, self.dependents.as_str()),
            (FieldName::Education, self.education.as_str()),
            (FieldName::SelfEmployed, self.self_employed.as_str()),
            (FieldName::PropertyArea, self.property_area.as_str()),
            (FieldName::CreditHistory, self.credit_history.as_str()),
            (FieldName::ApplicantIncome, self.applicant_income.as_str()),
            (FieldName::CoapplicantIncome, self.coapplicant_income.as_str()),
            (FieldName::LoanAmountTerm, self.loan_amount_term.as_str()),
            (FieldName::DesiredLoanAmount, self.desired_loan_amount.as_str()),
        ]
    }
}

pub(crate) async fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(endpoint) = args.endpoint.as_deref() {
        config.prediction.endpoint = parse_endpoint(endpoint)?;
    }
    telemetry::init(&config.telemetry)?;

    let client = HttpSubmissionClient::new(config.prediction.endpoint.clone());
    let mut controller = FlowController::new(config.prediction.ordering);

    controller.apply_fields(
        args.fields()
            .into_iter()
            .map(|(field, value)| (field.wire_name(), value)),
    )?;
    if let Some(loan_type) = args.loan_type.as_deref() {
        controller.select_loan_type(loan_type)?;
    }

    let ticket = controller.begin_eligibility_check();
    submit(&mut controller, &client, ticket).await?;

    match args.loan_type.as_deref() {
        Some(loan_type) if controller.loan_type_form_visible() => {
            let ticket = controller.begin_refinement()?;
            submit(&mut controller, &client, ticket).await?;
            info!(loan_type, "loan-type offers fetched");
        }
        Some(loan_type) => {
            info!(loan_type, "applicant not eligible; skipping loan-type refinement");
        }
        None => {}
    }

    let view = FlowView::from_controller(&controller);
    if args.json {
        let json = serde_json::to_string_pretty(&view).map_err(std::io::Error::from)?;
        println!("{json}");
    } else {
        print!("{}", render_text(&view));
    }

    if let Some(path) = args.offers_csv.as_ref() {
        if let Some(displayed) = controller.displayed() {
            let file = File::create(path)?;
            write_offers_csv(&displayed.result, file)?;
            info!(path = %path.display(), offers = displayed.result.loans.len(), "offers exported");
        }
    }

    Ok(())
}

/// Run one ticket to completion, surfacing a failed request as an error so
/// the command exits non-zero.
async fn submit(
    controller: &mut FlowController,
    client: &HttpSubmissionClient,
    ticket: SubmissionTicket,
) -> Result<CompletionOutcome, AppError> {
    match client.submit(&ticket.payload).await {
        Ok(result) => Ok(controller.complete(&ticket, Ok(result))),
        Err(err) => {
            controller.complete(&ticket, Err(err.clone()));
            Err(err.into())
        }
    }
}
