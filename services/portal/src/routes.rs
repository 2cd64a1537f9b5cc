use crate::infra::{AppState, PortalSession};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Extension, Form, Json, Router};
use loan_eligibility::error::AppError;
use loan_eligibility::workflows::eligibility::{render_page, FlowView, SubmissionClient};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct LoanTypeForm {
    #[serde(rename = "LoanType")]
    pub(crate) loan_type: String,
}

/// Pages and form posts for the applicant session.
pub(crate) fn session_router<C>(session: Arc<PortalSession<C>>) -> Router
where
    C: SubmissionClient + 'static,
{
    Router::new()
        .route("/", get(page_handler::<C>))
        .route("/check", post(check_handler::<C>))
        .route("/offers", post(offers_handler::<C>))
        .route("/api/v1/session", get(session_handler::<C>))
        .with_state(session)
}

pub(crate) fn with_portal_routes<C>(session: Arc<PortalSession<C>>) -> Router
where
    C: SubmissionClient + 'static,
{
    session_router(session)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn page_handler<C>(State(session): State<Arc<PortalSession<C>>>) -> Html<String>
where
    C: SubmissionClient + 'static,
{
    let view = FlowView::from_controller(&session.controller());
    Html(render_page(&view))
}

pub(crate) async fn session_handler<C>(
    State(session): State<Arc<PortalSession<C>>>,
) -> Json<FlowView>
where
    C: SubmissionClient + 'static,
{
    Json(FlowView::from_controller(&session.controller()))
}

/// Primary form post: apply every field, then run the eligibility check.
pub(crate) async fn check_handler<C>(
    State(session): State<Arc<PortalSession<C>>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Redirect, AppError>
where
    C: SubmissionClient + 'static,
{
    let ticket = {
        let mut controller = session.controller();
        controller.apply_fields(
            fields
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )?;
        controller.begin_eligibility_check()
    };

    let outcome = session.resolve(ticket).await;
    info!(?outcome, "eligibility check resolved");
    Ok(Redirect::to("/"))
}

/// Secondary form post: only honored while the selector is visible.
pub(crate) async fn offers_handler<C>(
    State(session): State<Arc<PortalSession<C>>>,
    Form(form): Form<LoanTypeForm>,
) -> Result<Redirect, AppError>
where
    C: SubmissionClient + 'static,
{
    let ticket = {
        let mut controller = session.controller();
        controller.select_loan_type(&form.loan_type)?;
        controller.begin_refinement()?
    };

    let outcome = session.resolve(ticket).await;
    info!(?outcome, loan_type = %form.loan_type, "loan-type refinement resolved");
    Ok(Redirect::to("/"))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
