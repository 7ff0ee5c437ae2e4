//! Account registration flow.
//!
//! A submission moves the form from `Presented` to `Submitted` and then to
//! one of the terminal states: `Accepted`, `RejectedValidation`,
//! `RejectedDuplicate`, or `Cancelled`. Rejections return to a re-rendered
//! form carrying field errors; the caller may correct and resubmit.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::accounts::manager::UserManager;
use crate::errors::{RegistrationError, StorageError};
use crate::oauth::interaction::{AuthorizationError, InteractionService, is_local_url};

/// Provider root, the fallback redirect target
pub const PROVIDER_ROOT: &str = "/";

const USERNAME_EXTRA_CHARACTERS: &str = "-._@+";

/// Registration flow states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    Presented,
    Submitted,
    Accepted,
    RejectedValidation,
    RejectedDuplicate,
    Cancelled,
}

/// Submitted registration form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// `create` or `cancel`
    #[serde(default)]
    pub button: Option<String>,
    #[serde(default)]
    pub return_url: Option<String>,
}

/// Validation failure attached to a form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Template context for the registration form. The password is never echoed back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationPage {
    pub username: String,
    pub email: String,
    pub return_url: Option<String>,
    pub errors: Vec<FieldError>,
}

impl RegistrationPage {
    pub fn new(return_url: Option<String>) -> Self {
        Self {
            return_url,
            ..Default::default()
        }
    }

    pub fn has_errors_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn from_form(form: &RegistrationForm, errors: Vec<FieldError>) -> Self {
        Self {
            username: form.username.clone(),
            email: form.email.clone(),
            return_url: form.return_url.clone(),
            errors,
        }
    }
}

/// How a cancelled interaction hands control back to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelTarget {
    /// Plain HTTP redirect
    Redirect(String),
    /// Loading page that performs the redirect in the browser, used for native clients
    LoadingPage(String),
}

/// Result of handling a form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Accepted { redirect_to: String },
    Cancelled(CancelTarget),
    Rejected {
        state: RegistrationState,
        page: RegistrationPage,
    },
    /// Unrecognised action; the form is shown again unchanged
    Presented(RegistrationPage),
}

impl RegistrationOutcome {
    pub fn state(&self) -> RegistrationState {
        match self {
            RegistrationOutcome::Accepted { .. } => RegistrationState::Accepted,
            RegistrationOutcome::Cancelled(_) => RegistrationState::Cancelled,
            RegistrationOutcome::Rejected { state, .. } => *state,
            RegistrationOutcome::Presented(_) => RegistrationState::Presented,
        }
    }
}

/// Password strength rules
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
}

impl PasswordPolicy {
    pub fn new(min_length: usize) -> Self {
        Self {
            min_length,
            ..Default::default()
        }
    }

    /// Every rule the password breaks, in a stable order
    pub fn violations(&self, password: &str) -> Vec<String> {
        let mut violations = Vec::new();
        if password.chars().count() < self.min_length {
            violations.push(format!(
                "Passwords must be at least {} characters.",
                self.min_length
            ));
        }
        if self.require_non_alphanumeric && password.chars().all(|c| c.is_ascii_alphanumeric()) {
            violations.push("Passwords must have at least one non alphanumeric character.".to_string());
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push("Passwords must have at least one digit ('0'-'9').".to_string());
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            violations.push("Passwords must have at least one lowercase ('a'-'z').".to_string());
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            violations.push("Passwords must have at least one uppercase ('A'-'Z').".to_string());
        }
        violations
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
            require_non_alphanumeric: true,
        }
    }
}

/// Resolve where a completed registration redirects to.
///
/// Empty or absent return URLs go to the provider root, local URLs are used
/// as-is (`~/` is the application root), and anything else is rejected.
pub fn resolve_return_url(return_url: Option<&str>) -> Result<String, RegistrationError> {
    match return_url {
        None | Some("") => Ok(PROVIDER_ROOT.to_string()),
        Some(url) if is_local_url(url) => Ok(url.strip_prefix('~').unwrap_or(url).to_string()),
        Some(url) => Err(RegistrationError::InvalidReturnUrl(url.to_string())),
    }
}

fn is_valid_email(email: &str) -> bool {
    // Exactly one '@', not at either end.
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Check the fields of a new account: username characters, email shape,
/// and the password policy. Every failing field is reported.
pub fn validate_account_fields(
    username: &str,
    email: &str,
    password: &str,
    policy: &PasswordPolicy,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let username = username.trim();
    if username.is_empty() {
        errors.push(FieldError::new("username", "The Username field is required."));
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || USERNAME_EXTRA_CHARACTERS.contains(c))
    {
        errors.push(FieldError::new(
            "username",
            format!("Username '{username}' is invalid, can only contain letters or digits."),
        ));
    }

    let email = email.trim();
    if email.is_empty() {
        errors.push(FieldError::new("email", "The Email field is required."));
    } else if !is_valid_email(email) {
        errors.push(FieldError::new(
            "email",
            "The Email field is not a valid e-mail address.",
        ));
    }

    if password.is_empty() {
        errors.push(FieldError::new("password", "The Password field is required."));
    } else {
        errors.extend(
            policy
                .violations(password)
                .into_iter()
                .map(|message| FieldError::new("password", message)),
        );
    }

    errors
}

/// Orchestrates account creation against the user store
pub struct RegistrationFlow {
    users: UserManager,
    interaction: Arc<dyn InteractionService>,
    policy: PasswordPolicy,
}

impl RegistrationFlow {
    pub fn new(
        users: UserManager,
        interaction: Arc<dyn InteractionService>,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            users,
            interaction,
            policy,
        }
    }

    pub fn users(&self) -> &UserManager {
        &self.users
    }

    /// Initial form, carrying the return URL through unchanged
    pub fn present(&self, return_url: Option<String>) -> RegistrationPage {
        RegistrationPage::new(return_url)
    }

    /// Field-level validation; no store access
    pub fn validate(&self, form: &RegistrationForm) -> Vec<FieldError> {
        validate_account_fields(&form.username, &form.email, &form.password, &self.policy)
    }

    /// Handle a form submission
    pub async fn submit(
        &self,
        form: RegistrationForm,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        tracing::debug!(state = ?RegistrationState::Submitted, button = ?form.button, "registration form submitted");

        match form.button.as_deref() {
            Some("cancel") => self.cancel(&form).await,
            Some("create") => self.create(form).await,
            _ => Ok(RegistrationOutcome::Presented(RegistrationPage::from_form(
                &form,
                Vec::new(),
            ))),
        }
    }

    async fn cancel(&self, form: &RegistrationForm) -> Result<RegistrationOutcome, RegistrationError> {
        let Some(context) = self
            .interaction
            .authorization_context(form.return_url.as_deref())
            .await
        else {
            return Ok(RegistrationOutcome::Cancelled(CancelTarget::Redirect(
                PROVIDER_ROOT.to_string(),
            )));
        };

        let return_url = form
            .return_url
            .clone()
            .filter(|url| !url.is_empty())
            .ok_or(RegistrationError::MissingReturnUrl)?;

        self.interaction
            .deny_authorization(&context, AuthorizationError::AccessDenied)
            .await?;

        if context.is_native_client() {
            return Ok(RegistrationOutcome::Cancelled(CancelTarget::LoadingPage(
                return_url,
            )));
        }
        Ok(RegistrationOutcome::Cancelled(CancelTarget::Redirect(
            return_url,
        )))
    }

    async fn create(&self, form: RegistrationForm) -> Result<RegistrationOutcome, RegistrationError> {
        let errors = self.validate(&form);
        if !errors.is_empty() {
            tracing::debug!(count = errors.len(), "registration rejected by validation");
            return Ok(RegistrationOutcome::Rejected {
                state: RegistrationState::RejectedValidation,
                page: RegistrationPage::from_form(&form, errors),
            });
        }

        // A foreign return URL fails the request before any account is written.
        let redirect_to = resolve_return_url(form.return_url.as_deref())?;

        match self
            .users
            .create(&form.username, &form.email, &form.password)
            .await
        {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "user registered");
                Ok(RegistrationOutcome::Accepted { redirect_to })
            }
            Err(StorageError::DuplicateUsername(_)) => {
                tracing::debug!("registration rejected, username taken");
                let message = format!("Username '{}' is already taken.", form.username.trim());
                Ok(RegistrationOutcome::Rejected {
                    state: RegistrationState::RejectedDuplicate,
                    page: RegistrationPage::from_form(
                        &form,
                        vec![FieldError::new("username", message)],
                    ),
                })
            }
            Err(e) => {
                tracing::error!(error = ?e, "user store failure during registration");
                Err(RegistrationError::StoreUnavailable(e.to_string()))
            }
        }
    }
}
