use serde_json::{json, Value};

use crate::workflows::eligibility::domain::{
    CreditHistory, Dependents, Education, FormOption, Gender, LoanType, PropertyArea, YesNo,
};
use crate::workflows::eligibility::form::{
    build_payload, coerce_int, FieldName, FormError, LoanApplication,
};

#[test]
fn empty_and_non_numeric_inputs_fall_back_to_defaults() {
    let mut application = LoanApplication::default();
    application
        .update_field(FieldName::ApplicantIncome, "")
        .expect("numeric field accepts text");
    application
        .update_field(FieldName::CoapplicantIncome, "abc")
        .expect("numeric field accepts text");
    application
        .update_field(FieldName::LoanAmountTerm, "  ")
        .expect("numeric field accepts text");
    application
        .update_field(FieldName::DesiredLoanAmount, "lots")
        .expect("numeric field accepts text");

    let payload = build_payload(&application, None);

    assert_eq!(payload.applicant_income, 0);
    assert_eq!(payload.coapplicant_income, 0);
    assert_eq!(payload.loan_amount_term, 360);
    assert_eq!(payload.desired_loan_amount, 0);
    assert_eq!(payload.credit_history, 1);
}

#[test]
fn coercion_reads_the_leading_integer() {
    assert_eq!(coerce_int("5000", 0), 5000);
    assert_eq!(coerce_int(" 42 ", 0), 42);
    assert_eq!(coerce_int("12abc", 0), 12);
    assert_eq!(coerce_int("7.9", 0), 7);
    assert_eq!(coerce_int("+15", 0), 15);
    assert_eq!(coerce_int("-40", 0), -40);
    assert_eq!(coerce_int("-", 360), 360);
    assert_eq!(coerce_int("abc12", 360), 360);
    assert_eq!(coerce_int("99999999999999999999999", 0), 0);
}

#[test]
fn negative_and_zero_values_pass_through_unmodified() {
    let mut application = LoanApplication::default();
    application
        .update_field(FieldName::ApplicantIncome, "-2500")
        .expect("numeric update");
    application
        .update_field(FieldName::LoanAmountTerm, "0")
        .expect("numeric update");
    application
        .update_field(FieldName::CreditHistory, "0")
        .expect("option update");

    let payload = build_payload(&application, None);

    assert_eq!(payload.applicant_income, -2500);
    assert_eq!(payload.loan_amount_term, 0);
    assert_eq!(payload.credit_history, 0);
}

#[test]
fn option_fields_reject_values_outside_their_option_set() {
    let mut application = LoanApplication::default();

    let err = application
        .update_field(FieldName::Dependents, "4")
        .expect_err("4 is not a dependents option");
    assert_eq!(
        err,
        FormError::UnknownOption {
            field: "Dependents",
            value: "4".to_string(),
        }
    );
    assert_eq!(application, LoanApplication::default());

    application
        .update_field(FieldName::Dependents, "3+")
        .expect("3+ is an option");
    assert_eq!(application.dependents, Dependents::ThreeOrMore);
}

#[test]
fn every_declared_option_is_accepted_verbatim() {
    let mut application = LoanApplication::default();
    for field in FieldName::SELECTS {
        for option in field.options() {
            application
                .update_field(field, option)
                .expect("declared option accepted");
            assert_eq!(application.field_value(field), option);
        }
    }
}

#[test]
fn field_names_parse_from_wire_names() {
    assert_eq!(
        "Self_Employed".parse::<FieldName>(),
        Ok(FieldName::SelfEmployed)
    );
    assert_eq!(
        "Loan_Amount_Term".parse::<FieldName>(),
        Ok(FieldName::LoanAmountTerm)
    );
    assert_eq!(
        "LoanType".parse::<FieldName>(),
        Err(FormError::UnknownField("LoanType".to_string()))
    );
    assert_eq!(FieldName::PropertyArea.display_label(), "Property Area");
    assert_eq!(FieldName::LoanAmountTerm.display_label(), "Loan Amount Term");
}

#[test]
fn primary_payload_serializes_with_fixed_wire_names() {
    let mut application = LoanApplication::default();
    application
        .update_field(FieldName::ApplicantIncome, "5000")
        .expect("numeric update");
    application
        .update_field(FieldName::Education, "Not Graduate")
        .expect("option update");

    let value = serde_json::to_value(build_payload(&application, None)).expect("serializes");

    assert_eq!(
        value,
        json!({
            "Gender": "Male",
            "Married": "No",
            "Dependents": "0",
            "Education": "Not Graduate",
            "Self_Employed": "No",
            "Property_Area": "Urban",
            "Credit_History": 1,
            "ApplicantIncome": 5000,
            "CoapplicantIncome": 0,
            "Loan_Amount_Term": 360,
            "DesiredLoanAmount": 0
        })
    );
}

#[test]
fn refinement_payload_adds_loan_type_alongside_primary_fields() {
    let application = LoanApplication::default();
    let payload = build_payload(&application, Some(LoanType::CarLoan));
    assert!(payload.is_refinement());

    let value = serde_json::to_value(&payload).expect("serializes");
    let object = value.as_object().expect("payload is an object");
    assert_eq!(object.get("LoanType"), Some(&Value::from("Car Loan")));
    assert_eq!(object.len(), 12);
}

#[test]
fn enum_payload_fields_always_use_declared_labels() {
    let payload = build_payload(&LoanApplication::default(), None);
    let value = serde_json::to_value(&payload).expect("serializes");

    let declared = [
        ("Gender", labels::<Gender>()),
        ("Married", labels::<YesNo>()),
        ("Dependents", labels::<Dependents>()),
        ("Education", labels::<Education>()),
        ("Self_Employed", labels::<YesNo>()),
        ("Property_Area", labels::<PropertyArea>()),
    ];
    for (field, options) in declared {
        let sent = value[field].as_str().expect("enum fields are strings");
        assert!(options.contains(&sent), "{field} sent '{sent}'");
    }
    assert!(labels::<CreditHistory>().contains(&"1"));
}

fn labels<T: FormOption>() -> Vec<&'static str> {
    T::ALL.iter().map(|option| option.label()).collect()
}
