//! Handles GET and POST /account/create - Self-service account registration

use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_template::RenderHtml;
use minijinja::context;
use serde::Deserialize;

use super::context::AppState;
use crate::accounts::{CancelTarget, RegistrationForm, RegistrationOutcome, RegistrationPage};
use crate::errors::RegistrationError;

const TEMPLATE: &str = "account_create.html";

/// Query parameters for the registration page
#[derive(Debug, Deserialize)]
pub struct AccountCreateQuery {
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

/// Render the empty registration form
/// GET /account/create?returnUrl=...
pub async fn handle_account_create(
    State(state): State<AppState>,
    Query(query): Query<AccountCreateQuery>,
) -> impl IntoResponse {
    let page = state.registration.present(query.return_url);
    render_form(&state, page)
}

/// Handle a registration form submission
/// POST /account/create
pub async fn handle_account_create_submit(
    State(state): State<AppState>,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, RegistrationError> {
    let outcome = state.registration.submit(form).await?;
    tracing::debug!(state = ?outcome.state(), "registration request handled");

    let response = match outcome {
        RegistrationOutcome::Accepted { redirect_to } => Redirect::to(&redirect_to).into_response(),
        RegistrationOutcome::Cancelled(CancelTarget::Redirect(location)) => {
            Redirect::to(&location).into_response()
        }
        RegistrationOutcome::Cancelled(CancelTarget::LoadingPage(location)) => RenderHtml(
            "redirect.html",
            state.template_env.clone(),
            context! {
                redirect_url => location,
            },
        )
        .into_response(),
        RegistrationOutcome::Rejected { page, .. } | RegistrationOutcome::Presented(page) => {
            render_form(&state, page).into_response()
        }
    };
    Ok(response)
}

fn render_form(state: &AppState, page: RegistrationPage) -> impl IntoResponse + use<> {
    RenderHtml(
        TEMPLATE,
        state.template_env.clone(),
        context! {
            title => "Create Account",
            page => page,
        },
    )
}
