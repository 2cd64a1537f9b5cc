use serde_json::json;

use crate::workflows::eligibility::domain::EligibilityResult;

fn decode(value: serde_json::Value) -> Result<EligibilityResult, serde_json::Error> {
    serde_json::from_value(value)
}

#[test]
fn decodes_the_documented_response_shape() {
    let result = decode(json!({
        "eligible": true,
        "cibil_score": 750,
        "predicted_amount": 200000,
        "loans": [
            { "Bank": "X", "Loan Type": "Home Loan", "Interest Rate": 8.5, "Link": "https://x" }
        ]
    }))
    .expect("documented shape decodes");

    assert!(result.eligible);
    assert_eq!(result.cibil_score, 750);
    assert_eq!(result.predicted_amount, 200_000);
    assert_eq!(result.reason, None);
    assert_eq!(result.loans.len(), 1);
    assert_eq!(result.loans[0].bank, "X");
    assert_eq!(result.loans[0].interest_rate, 8.5);
    assert_eq!(result.loans[0].apply_link, "https://x");
}

#[test]
fn tolerates_float_amounts_and_scraped_rate_strings() {
    let result = decode(json!({
        "eligible": true,
        "cibil_score": 725,
        "predicted_amount": 148250.6,
        "reason": "Approved",
        "loans": [
            {
                "Bank": "State Bank of India",
                "Loan Type": "Home Loan",
                "Interest Rate": "8.50% - 9.65%",
                "Link": "https://www.bankbazaar.com/home-loan-interest-rate.html"
            }
        ]
    }))
    .expect("service-style payload decodes");

    assert_eq!(result.predicted_amount, 148_251);
    assert_eq!(result.reason.as_deref(), Some("Approved"));
    assert_eq!(result.loans[0].interest_rate, 8.5);
}

#[test]
fn missing_or_null_loans_decode_as_empty() {
    let missing = decode(json!({
        "eligible": false,
        "cibil_score": 540,
        "predicted_amount": 0
    }))
    .expect("loans optional");
    let null = decode(json!({
        "eligible": false,
        "cibil_score": 540,
        "predicted_amount": 0,
        "loans": null
    }))
    .expect("null loans accepted");

    assert!(missing.loans.is_empty());
    assert!(null.loans.is_empty());
}

#[test]
fn missing_required_fields_are_rejected() {
    assert!(decode(json!({ "cibil_score": 700, "predicted_amount": 1000, "loans": [] })).is_err());
    assert!(decode(json!({ "eligible": true, "predicted_amount": 1000 })).is_err());
    assert!(decode(json!({ "eligible": true, "cibil_score": 700 })).is_err());
    assert!(decode(json!({ "error": "bad input" })).is_err());
}

#[test]
fn offers_need_a_numeric_rate_and_an_absolute_link() {
    let bad_rate = decode(json!({
        "eligible": true,
        "cibil_score": 700,
        "predicted_amount": 1000,
        "loans": [{ "Bank": "X", "Loan Type": "Car Loan", "Interest Rate": "call us", "Link": "https://x" }]
    }));
    let bad_link = decode(json!({
        "eligible": true,
        "cibil_score": 700,
        "predicted_amount": 1000,
        "loans": [{ "Bank": "X", "Loan Type": "Car Loan", "Interest Rate": 9.1, "Link": "/apply" }]
    }));

    assert!(bad_rate.is_err());
    assert!(bad_link.is_err());

    for link in [
        "javascript:alert(document.cookie)",
        "data:text/html,<script>alert(1)</script>",
        "ftp://bank.example/apply",
    ] {
        let scripted = decode(json!({
            "eligible": true,
            "cibil_score": 700,
            "predicted_amount": 1000,
            "loans": [{ "Bank": "X", "Loan Type": "Car Loan", "Interest Rate": 9.1, "Link": link }]
        }));
        assert!(scripted.is_err(), "{link} must not decode");
    }
}

#[test]
fn offer_links_are_kept_as_sent() {
    let result = decode(json!({
        "eligible": true,
        "cibil_score": 700,
        "predicted_amount": 1000,
        "loans": [{
            "Bank": "X",
            "Loan Type": "Car Loan",
            "Interest Rate": 9.1,
            "Link": "  HTTPS://Bank.Example/Apply?Product=Car Loan "
        }]
    }))
    .expect("http(s) link decodes");

    assert_eq!(
        result.loans[0].apply_link,
        "HTTPS://Bank.Example/Apply?Product=Car Loan"
    );
}
