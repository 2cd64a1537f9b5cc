use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};

/// Fixed option list backing one `<select>` on the applicant form.
pub trait FormOption: Sized + Copy + 'static {
    /// Options in presentation order.
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    /// Accepts only one of the declared labels.
    fn parse_option(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|option| option.label() == trimmed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl FormOption for Gender {
    const ALL: &'static [Self] = &[Self::Male, Self::Female];

    fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

/// Answer set shared by the `Married` and `Self_Employed` selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YesNo {
    #[default]
    No,
    Yes,
}

impl FormOption for YesNo {
    const ALL: &'static [Self] = &[Self::No, Self::Yes];

    fn label(self) -> &'static str {
        match self {
            Self::No => "No",
            Self::Yes => "Yes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dependents {
    #[default]
    #[serde(rename = "0")]
    None,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3+")]
    ThreeOrMore,
}

impl FormOption for Dependents {
    const ALL: &'static [Self] = &[Self::None, Self::One, Self::Two, Self::ThreeOrMore];

    fn label(self) -> &'static str {
        match self {
            Self::None => "0",
            Self::One => "1",
            Self::Two => "2",
            Self::ThreeOrMore => "3+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Education {
    #[default]
    Graduate,
    #[serde(rename = "Not Graduate")]
    NotGraduate,
}

impl FormOption for Education {
    const ALL: &'static [Self] = &[Self::Graduate, Self::NotGraduate];

    fn label(self) -> &'static str {
        match self {
            Self::Graduate => "Graduate",
            Self::NotGraduate => "Not Graduate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PropertyArea {
    #[default]
    Urban,
    Semiurban,
    Rural,
}

impl FormOption for PropertyArea {
    const ALL: &'static [Self] = &[Self::Urban, Self::Semiurban, Self::Rural];

    fn label(self) -> &'static str {
        match self {
            Self::Urban => "Urban",
            Self::Semiurban => "Semiurban",
            Self::Rural => "Rural",
        }
    }
}

/// Whether the applicant's credit history meets lending guidelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CreditHistory {
    #[default]
    #[serde(rename = "1")]
    MeetsGuidelines,
    #[serde(rename = "0")]
    BelowGuidelines,
}

impl FormOption for CreditHistory {
    const ALL: &'static [Self] = &[Self::MeetsGuidelines, Self::BelowGuidelines];

    fn label(self) -> &'static str {
        match self {
            Self::MeetsGuidelines => "1",
            Self::BelowGuidelines => "0",
        }
    }
}

/// Product chosen on the refinement form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoanType {
    #[default]
    #[serde(rename = "Home Loan")]
    HomeLoan,
    #[serde(rename = "Car Loan")]
    CarLoan,
    #[serde(rename = "Personal Loan")]
    PersonalLoan,
}

impl FormOption for LoanType {
    const ALL: &'static [Self] = &[Self::HomeLoan, Self::CarLoan, Self::PersonalLoan];

    fn label(self) -> &'static str {
        match self {
            Self::HomeLoan => "Home Loan",
            Self::CarLoan => "Car Loan",
            Self::PersonalLoan => "Personal Loan",
        }
    }
}

/// Snapshot returned by the prediction service for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub eligible: bool,
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub cibil_score: i64,
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub predicted_amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loans")]
    pub loans: Vec<LoanOffer>,
}

/// One bank offer; field names follow the service's CSV-derived records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanOffer {
    #[serde(rename = "Bank")]
    pub bank: String,
    #[serde(rename = "Loan Type")]
    pub loan_type: String,
    #[serde(rename = "Interest Rate", deserialize_with = "deserialize_interest_rate")]
    pub interest_rate: f64,
    /// Kept exactly as sent; decoding only admits absolute http(s) links.
    #[serde(rename = "Link", deserialize_with = "deserialize_offer_link")]
    pub apply_link: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Integer(i64),
    Float(f64),
    Text(String),
}

fn deserialize_whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Integer(value) => Ok(value),
        NumberOrText::Float(value) if value.is_finite() && value.abs() < i64::MAX as f64 => {
            Ok(value.round() as i64)
        }
        NumberOrText::Float(value) => Err(serde::de::Error::custom(format!(
            "amount {value} is not representable as a whole number"
        ))),
        NumberOrText::Text(text) => Err(serde::de::Error::custom(format!(
            "expected a number, found string '{text}'"
        ))),
    }
}

fn deserialize_interest_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Integer(value) => Ok(value as f64),
        NumberOrText::Float(value) => Ok(value),
        NumberOrText::Text(text) => leading_decimal(&text).ok_or_else(|| {
            serde::de::Error::custom(format!("interest rate '{text}' has no numeric value"))
        }),
    }
}

fn deserialize_loans<'de, D>(deserializer: D) -> Result<Vec<LoanOffer>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<LoanOffer>>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_offer_link<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let link = raw.trim();
    let url = Url::parse(link)
        .map_err(|err| serde::de::Error::custom(format!("invalid offer link '{raw}': {err}")))?;

    match url.scheme() {
        "http" | "https" => Ok(link.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "offer link '{raw}' uses unsupported scheme '{other}'"
        ))),
    }
}

/// Reads the first decimal number from scraped text such as `"8.35% - 9.10%"`.
fn leading_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (index, ch) in trimmed.char_indices() {
        match ch {
            '0'..='9' => end = index + 1,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
    }
    if end == 0 {
        return None;
    }
    trimmed[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::leading_decimal;

    #[test]
    fn leading_decimal_reads_scraped_rates() {
        assert_eq!(leading_decimal("8.50%"), Some(8.5));
        assert_eq!(leading_decimal(" 8.35% - 9.10%"), Some(8.35));
        assert_eq!(leading_decimal("10"), Some(10.0));
        assert_eq!(leading_decimal("N/A"), None);
        assert_eq!(leading_decimal(".%"), None);
    }
}
