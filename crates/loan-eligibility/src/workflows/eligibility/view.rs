use std::fmt::Write as _;
use std::io;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{EligibilityResult, FormOption, LoanType};
use super::flow::{FlowController, FlowPhase, SubmissionFailure};
use super::form::{FieldName, LoanApplication};

pub const NO_OFFERS_MESSAGE: &str = "No loan offers available.";
pub const ELIGIBLE_LABEL: &str = "✅ Eligible";
pub const NOT_ELIGIBLE_LABEL: &str = "❌ Not Eligible";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferRow {
    pub bank: String,
    pub loan_type: String,
    pub interest_rate: f64,
    pub apply_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OffersSection {
    Table { rows: Vec<OfferRow> },
    Empty { message: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultCard {
    pub eligible: bool,
    pub status_label: &'static str,
    pub cibil_score: i64,
    pub predicted_amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub offers: OffersSection,
    pub received_at: DateTime<Utc>,
}

impl ResultCard {
    pub fn new(result: &EligibilityResult, received_at: DateTime<Utc>) -> Self {
        let offers = if result.loans.is_empty() {
            OffersSection::Empty {
                message: NO_OFFERS_MESSAGE,
            }
        } else {
            OffersSection::Table {
                rows: result
                    .loans
                    .iter()
                    .map(|offer| OfferRow {
                        bank: offer.bank.clone(),
                        loan_type: offer.loan_type.clone(),
                        interest_rate: offer.interest_rate,
                        apply_link: offer.apply_link.clone(),
                    })
                    .collect(),
            }
        };

        Self {
            eligible: result.eligible,
            status_label: if result.eligible {
                ELIGIBLE_LABEL
            } else {
                NOT_ELIGIBLE_LABEL
            },
            cibil_score: result.cibil_score,
            predicted_amount: result.predicted_amount,
            reason: result.reason.clone(),
            offers,
            received_at,
        }
    }
}

/// Everything needed to draw the session at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowView {
    pub phase: FlowPhase,
    pub loan_type_form_visible: bool,
    pub selected_loan_type: LoanType,
    pub application: LoanApplication,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<ResultCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl FlowView {
    pub fn from_controller(controller: &FlowController) -> Self {
        let card = controller
            .displayed()
            .map(|displayed| ResultCard::new(&displayed.result, displayed.received_at));

        Self {
            phase: controller.phase(),
            loan_type_form_visible: controller.loan_type_form_visible(),
            selected_loan_type: controller.loan_type(),
            application: controller.application().clone(),
            notice: controller
                .last_failure()
                .map(|failure| failure_notice(failure, card.is_some())),
            card,
        }
    }
}

fn failure_notice(failure: &SubmissionFailure, showing_previous: bool) -> String {
    let tail = if showing_previous {
        " The result below is from an earlier submission."
    } else {
        ""
    };
    format!(
        "The {} failed at {}: {}.{}",
        failure.kind.label(),
        failure.occurred_at.format("%H:%M:%S UTC"),
        failure.message,
        tail
    )
}

pub fn render_text(view: &FlowView) -> String {
    let mut out = String::new();

    match view.phase {
        FlowPhase::Submitting => out.push_str("Checking eligibility...\n"),
        FlowPhase::SubmittingRefined => out.push_str("Fetching loan offers...\n"),
        _ => {}
    }
    if let Some(notice) = &view.notice {
        let _ = writeln!(out, "! {notice}");
    }

    let Some(card) = &view.card else {
        return out;
    };

    out.push_str("Loan Eligibility Result\n");
    let _ = writeln!(out, "Status: {}", card.status_label);
    let _ = writeln!(out, "CIBIL Score: {}", card.cibil_score);
    let _ = writeln!(out, "Predicted Max Loan: ₹{}", card.predicted_amount);
    if let Some(reason) = &card.reason {
        let _ = writeln!(out, "Reason: {reason}");
    }

    out.push_str("\nAvailable Loan Offers:\n");
    match &card.offers {
        OffersSection::Empty { message } => {
            let _ = writeln!(out, "{message}");
        }
        OffersSection::Table { rows } => {
            let headers = ["Bank", "Loan Type", "Interest Rate (%)", "Apply"];
            let cells: Vec<[String; 4]> = rows
                .iter()
                .map(|row| {
                    [
                        row.bank.clone(),
                        row.loan_type.clone(),
                        row.interest_rate.to_string(),
                        row.apply_link.clone(),
                    ]
                })
                .collect();

            let mut widths = headers.map(|header| header.chars().count());
            for row in &cells {
                for (width, cell) in widths.iter_mut().zip(row.iter()) {
                    *width = (*width).max(cell.chars().count());
                }
            }

            let header_cells = headers.map(str::to_string);
            push_text_row(&mut out, &header_cells, &widths);
            let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
            push_text_row(&mut out, &rule, &widths);
            for row in &cells {
                push_text_row(&mut out, row, &widths);
            }
        }
    }

    if view.loan_type_form_visible {
        let _ = writeln!(
            out,
            "\nLoan type selection available (current: {}).",
            view.selected_loan_type.label()
        );
    }

    out
}

fn push_text_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join(" | ");
    let _ = writeln!(out, "{}", line.trim_end());
}

/// Full page: primary form, the loan-type form when visible, then the card.
pub fn render_page(view: &FlowView) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Loan Eligibility Checker</title>\n</head>\n<body>\n");
    html.push_str("<h1>Loan Eligibility Checker</h1>\n");

    if let Some(notice) = &view.notice {
        let _ = writeln!(html, "<p class=\"notice\">{}</p>", escape_html(notice));
    }
    match view.phase {
        FlowPhase::Submitting => html.push_str("<p class=\"status\">Checking eligibility...</p>\n"),
        FlowPhase::SubmittingRefined => {
            html.push_str("<p class=\"status\">Fetching loan offers...</p>\n")
        }
        _ => {}
    }

    push_primary_form(&mut html, &view.application);
    if view.loan_type_form_visible {
        push_loan_type_form(&mut html, view.selected_loan_type);
    }
    if let Some(card) = &view.card {
        push_card(&mut html, card);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn push_primary_form(html: &mut String, application: &LoanApplication) {
    html.push_str("<form method=\"post\" action=\"/check\" class=\"loan-form\">\n");
    html.push_str("<h2>Check Your Loan Eligibility</h2>\n");

    for field in FieldName::SELECTS {
        let current = application.field_value(field);
        let _ = writeln!(
            html,
            "<label>{label}<select name=\"{name}\">",
            label = escape_html(&field.display_label()),
            name = field.wire_name()
        );
        for option in field.options() {
            let selected = if option == current { " selected" } else { "" };
            let _ = writeln!(
                html,
                "<option value=\"{value}\"{selected}>{value}</option>",
                value = escape_html(option)
            );
        }
        html.push_str("</select></label>\n");
    }

    for field in FieldName::NUMERIC {
        let _ = writeln!(
            html,
            "<label>{label}<input type=\"number\" name=\"{name}\" value=\"{value}\" placeholder=\"0\"></label>",
            label = escape_html(&field.display_label()),
            name = field.wire_name(),
            value = escape_html(application.field_value(field))
        );
    }

    html.push_str("<button type=\"submit\">Check Eligibility</button>\n</form>\n");
}

fn push_loan_type_form(html: &mut String, selected: LoanType) {
    html.push_str("<form method=\"post\" action=\"/offers\" class=\"loan-type-form\">\n");
    html.push_str("<select name=\"LoanType\">\n");
    for option in LoanType::ALL {
        let marker = if *option == selected { " selected" } else { "" };
        let _ = writeln!(
            html,
            "<option value=\"{label}\"{marker}>{label}</option>",
            label = option.label()
        );
    }
    html.push_str("</select>\n<button type=\"submit\">Get Loan Offers</button>\n</form>\n");
}

fn push_card(html: &mut String, card: &ResultCard) {
    html.push_str("<div class=\"result-card\">\n<h3>Loan Eligibility Result</h3>\n");
    let _ = writeln!(html, "<p><strong>Status:</strong> {}</p>", card.status_label);
    let _ = writeln!(html, "<p><strong>CIBIL Score:</strong> {}</p>", card.cibil_score);
    let _ = writeln!(
        html,
        "<p><strong>Predicted Max Loan:</strong> ₹{}</p>",
        card.predicted_amount
    );
    if let Some(reason) = &card.reason {
        let _ = writeln!(html, "<p><strong>Reason:</strong> {}</p>", escape_html(reason));
    }

    html.push_str("<h4>Available Loan Offers:</h4>\n");
    match &card.offers {
        OffersSection::Empty { message } => {
            let _ = writeln!(html, "<p>{message}</p>");
        }
        OffersSection::Table { rows } => {
            html.push_str("<table>\n<thead><tr><th>Bank</th><th>Loan Type</th><th>Interest Rate (%)</th><th>Apply</th></tr></thead>\n<tbody>\n");
            for row in rows {
                let _ = writeln!(
                    html,
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td><a href=\"{}\" target=\"_blank\" rel=\"noreferrer\">Apply</a></td></tr>",
                    escape_html(&row.bank),
                    escape_html(&row.loan_type),
                    row.interest_rate,
                    escape_html(&row.apply_link)
                );
            }
            html.push_str("</tbody>\n</table>\n");
        }
    }
    html.push_str("</div>\n");
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Export the offers of a result, in result order.
pub fn write_offers_csv<W: io::Write>(result: &EligibilityResult, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["Bank", "Loan Type", "Interest Rate", "Link"])?;
    for offer in &result.loans {
        let rate = offer.interest_rate.to_string();
        csv_writer.write_record([
            offer.bank.as_str(),
            offer.loan_type.as_str(),
            rate.as_str(),
            offer.apply_link.as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}
