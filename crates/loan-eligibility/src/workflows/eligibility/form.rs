use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::domain::{
    CreditHistory, Dependents, Education, FormOption, Gender, LoanType, PropertyArea, YesNo,
};

pub const DEFAULT_INCOME: i64 = 0;
pub const DEFAULT_LOAN_AMOUNT: i64 = 0;
pub const DEFAULT_LOAN_AMOUNT_TERM: i64 = 360;
pub const DEFAULT_CREDIT_HISTORY: i64 = 1;

/// Live applicant form state. Numeric inputs are kept exactly as typed and
/// only coerced when a payload is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub gender: Gender,
    pub married: YesNo,
    pub dependents: Dependents,
    pub education: Education,
    pub self_employed: YesNo,
    pub property_area: PropertyArea,
    pub credit_history: CreditHistory,
    pub applicant_income: String,
    pub coapplicant_income: String,
    pub loan_amount_term: String,
    pub desired_loan_amount: String,
}

impl Default for LoanApplication {
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            married: YesNo::No,
            dependents: Dependents::None,
            education: Education::Graduate,
            self_employed: YesNo::No,
            property_area: PropertyArea::Urban,
            credit_history: CreditHistory::MeetsGuidelines,
            applicant_income: String::new(),
            coapplicant_income: String::new(),
            loan_amount_term: DEFAULT_LOAN_AMOUNT_TERM.to_string(),
            desired_loan_amount: String::new(),
        }
    }
}

/// Form inputs, named by their wire field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    Gender,
    Married,
    Dependents,
    Education,
    SelfEmployed,
    PropertyArea,
    CreditHistory,
    ApplicantIncome,
    CoapplicantIncome,
    LoanAmountTerm,
    DesiredLoanAmount,
}

impl FieldName {
    pub const SELECTS: [FieldName; 7] = [
        FieldName::Gender,
        FieldName::Married,
        FieldName::Dependents,
        FieldName::Education,
        FieldName::SelfEmployed,
        FieldName::PropertyArea,
        FieldName::CreditHistory,
    ];

    pub const NUMERIC: [FieldName; 4] = [
        FieldName::ApplicantIncome,
        FieldName::CoapplicantIncome,
        FieldName::LoanAmountTerm,
        FieldName::DesiredLoanAmount,
    ];

    pub const fn wire_name(self) -> &'static str {
        match self {
            FieldName::Gender => "Gender",
            FieldName::Married => "Married",
            FieldName::Dependents => "Dependents",
            FieldName::Education => "Education",
            FieldName::SelfEmployed => "Self_Employed",
            FieldName::PropertyArea => "Property_Area",
            FieldName::CreditHistory => "Credit_History",
            FieldName::ApplicantIncome => "ApplicantIncome",
            FieldName::CoapplicantIncome => "CoapplicantIncome",
            FieldName::LoanAmountTerm => "Loan_Amount_Term",
            FieldName::DesiredLoanAmount => "DesiredLoanAmount",
        }
    }

    /// Human label shown next to the input.
    pub fn display_label(self) -> String {
        self.wire_name().replace('_', " ")
    }

    /// Option labels for select inputs; empty for numeric inputs.
    pub fn options(self) -> Vec<&'static str> {
        fn labels<T: FormOption>() -> Vec<&'static str> {
            T::ALL.iter().map(|option| option.label()).collect()
        }

        match self {
            FieldName::Gender => labels::<Gender>(),
            FieldName::Married | FieldName::SelfEmployed => labels::<YesNo>(),
            FieldName::Dependents => labels::<Dependents>(),
            FieldName::Education => labels::<Education>(),
            FieldName::PropertyArea => labels::<PropertyArea>(),
            FieldName::CreditHistory => labels::<CreditHistory>(),
            _ => Vec::new(),
        }
    }
}

impl FromStr for FieldName {
    type Err = FormError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [FieldName::SELECTS.as_slice(), FieldName::NUMERIC.as_slice()]
            .concat()
            .into_iter()
            .find(|field| field.wire_name() == value)
            .ok_or_else(|| FormError::UnknownField(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("unknown form field '{0}'")]
    UnknownField(String),
    #[error("'{value}' is not an option for {field}")]
    UnknownOption { field: &'static str, value: String },
}

fn option<T: FormOption>(field: FieldName, raw: &str) -> Result<T, FormError> {
    T::parse_option(raw).ok_or_else(|| FormError::UnknownOption {
        field: field.wire_name(),
        value: raw.to_string(),
    })
}

impl LoanApplication {
    /// Set a single field. Option fields reject values outside their option
    /// set and leave the application untouched.
    pub fn update_field(&mut self, name: FieldName, raw: &str) -> Result<&Self, FormError> {
        match name {
            FieldName::Gender => self.gender = option(name, raw)?,
            FieldName::Married => self.married = option(name, raw)?,
            FieldName::Dependents => self.dependents = option(name, raw)?,
            FieldName::Education => self.education = option(name, raw)?,
            FieldName::SelfEmployed => self.self_employed = option(name, raw)?,
            FieldName::PropertyArea => self.property_area = option(name, raw)?,
            FieldName::CreditHistory => self.credit_history = option(name, raw)?,
            FieldName::ApplicantIncome => self.applicant_income = raw.to_string(),
            FieldName::CoapplicantIncome => self.coapplicant_income = raw.to_string(),
            FieldName::LoanAmountTerm => self.loan_amount_term = raw.to_string(),
            FieldName::DesiredLoanAmount => self.desired_loan_amount = raw.to_string(),
        }
        Ok(self)
    }

    /// Current value of a field as it would appear in the form.
    pub fn field_value(&self, name: FieldName) -> &str {
        match name {
            FieldName::Gender => self.gender.label(),
            FieldName::Married => self.married.label(),
            FieldName::Dependents => self.dependents.label(),
            FieldName::Education => self.education.label(),
            FieldName::SelfEmployed => self.self_employed.label(),
            FieldName::PropertyArea => self.property_area.label(),
            FieldName::CreditHistory => self.credit_history.label(),
            FieldName::ApplicantIncome => &self.applicant_income,
            FieldName::CoapplicantIncome => &self.coapplicant_income,
            FieldName::LoanAmountTerm => &self.loan_amount_term,
            FieldName::DesiredLoanAmount => &self.desired_loan_amount,
        }
    }
}

/// Request body for both phases. `LoanType` is only present on refinement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "Married")]
    pub married: YesNo,
    #[serde(rename = "Dependents")]
    pub dependents: Dependents,
    #[serde(rename = "Education")]
    pub education: Education,
    #[serde(rename = "Self_Employed")]
    pub self_employed: YesNo,
    #[serde(rename = "Property_Area")]
    pub property_area: PropertyArea,
    #[serde(rename = "Credit_History")]
    pub credit_history: i64,
    #[serde(rename = "ApplicantIncome")]
    pub applicant_income: i64,
    #[serde(rename = "CoapplicantIncome")]
    pub coapplicant_income: i64,
    #[serde(rename = "Loan_Amount_Term")]
    pub loan_amount_term: i64,
    #[serde(rename = "DesiredLoanAmount")]
    pub desired_loan_amount: i64,
    #[serde(rename = "LoanType", default, skip_serializing_if = "Option::is_none")]
    pub loan_type: Option<LoanType>,
}

impl SubmissionPayload {
    pub fn is_refinement(&self) -> bool {
        self.loan_type.is_some()
    }
}

/// Build the wire payload, coercing every numeric input to an integer.
pub fn build_payload(application: &LoanApplication, loan_type: Option<LoanType>) -> SubmissionPayload {
    SubmissionPayload {
        gender: application.gender,
        married: application.married,
        dependents: application.dependents,
        education: application.education,
        self_employed: application.self_employed,
        property_area: application.property_area,
        credit_history: coerce_int(application.credit_history.label(), DEFAULT_CREDIT_HISTORY),
        applicant_income: coerce_int(&application.applicant_income, DEFAULT_INCOME),
        coapplicant_income: coerce_int(&application.coapplicant_income, DEFAULT_INCOME),
        loan_amount_term: coerce_int(&application.loan_amount_term, DEFAULT_LOAN_AMOUNT_TERM),
        desired_loan_amount: coerce_int(&application.desired_loan_amount, DEFAULT_LOAN_AMOUNT),
        loan_type,
    }
}

/// Leading-integer parse: optional sign, then the leading run of digits.
/// Anything without leading digits, or outside `i64`, yields `default`.
pub fn coerce_int(raw: &str, default: i64) -> i64 {
    let trimmed = raw.trim();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_end = rest
        .bytes()
        .position(|byte| !byte.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return default;
    }

    let digits = &rest[..digits_end];
    let parsed = if negative {
        format!("-{digits}").parse::<i64>()
    } else {
        digits.parse::<i64>()
    };
    parsed.unwrap_or(default)
}
