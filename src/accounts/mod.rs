//! End-user accounts: password hashing, user management, and self-service registration.

pub mod manager;
pub mod password;
pub mod registration;

pub use manager::UserManager;
pub use password::{Argon2PasswordHasher, PasswordHasher};
pub use registration::{
    CancelTarget, FieldError, PasswordPolicy, RegistrationFlow, RegistrationForm,
    RegistrationOutcome, RegistrationPage, RegistrationState, resolve_return_url,
    validate_account_fields,
};
