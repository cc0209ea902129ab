//! Registration, login and bearer-token authentication.

use tokio::task;

use super::validation::{self, FieldErrors, MAX_STRING_LEN};
use super::{ensure_valid, ServiceError, ServiceResult};
use crate::auth::{
    generate_token, hash_password, token_digest, verify_password, verify_without_account,
};
use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::{Clock, IssuedToken, LoginDraft, NewUser, RegisterDraft, User};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const UNAUTHENTICATED: &str = "Unauthenticated.";

const EMAIL_TAKEN: &str = "The email has already been taken.";

/// Argon2 is deliberately slow; keep it off the async workers.
async fn run_blocking<T, F>(f: F) -> ServiceResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Internal(format!("Task join error: {}", e)))?
}

async fn issue_token<R>(repo: &R, clock: &dyn Clock, user: User) -> ServiceResult<IssuedToken>
where
    R: FullRepository + ?Sized,
{
    let token = generate_token();
    repo.store_token(user.id, &token_digest(&token), clock.now())
        .await?;
    Ok(IssuedToken { user, token })
}

/// Create an account and issue its first token.
pub async fn register<R>(
    repo: &R,
    clock: &dyn Clock,
    draft: RegisterDraft,
) -> ServiceResult<IssuedToken>
where
    R: FullRepository + ?Sized,
{
    let mut errors = FieldErrors::new();
    let name = validation::required_string(
        &mut errors,
        "name",
        draft.name.as_deref(),
        Some(MAX_STRING_LEN),
    );
    let email = validation::email(&mut errors, "email", draft.email.as_deref());
    let password = validation::password(&mut errors, "password", draft.password.as_deref());

    if let Some(email) = &email {
        if repo.find_user_by_email(email).await?.is_some() {
            errors.add("email", EMAIL_TAKEN);
        }
    }
    ensure_valid(errors, "Validation failed")?;

    let (Some(name), Some(email), Some(password)) = (name, email, password) else {
        return Err(ServiceError::Internal(
            "validated registration is missing fields".to_string(),
        ));
    };

    let password_hash = run_blocking(move || Ok(hash_password(&password)?)).await?;
    let new_user = NewUser {
        name,
        email,
        password_hash,
        created_at: clock.now(),
    };

    let user = match repo.create_user(&new_user).await {
        Ok(user) => user,
        // Lost a race with another registration for the same address.
        Err(RepositoryError::Conflict { .. }) => {
            let mut errors = FieldErrors::new();
            errors.add("email", EMAIL_TAKEN);
            return Err(ServiceError::validation("Validation failed", errors));
        }
        Err(e) => return Err(e.into()),
    };

    log::info!("Registered user {} <{}>", user.id, user.email);
    issue_token(repo, clock, user).await
}

/// Check credentials and issue a new token.
pub async fn login<R>(repo: &R, clock: &dyn Clock, draft: LoginDraft) -> ServiceResult<IssuedToken>
where
    R: FullRepository + ?Sized,
{
    let mut errors = FieldErrors::new();
    let email = validation::email(&mut errors, "email", draft.email.as_deref());
    let password = match draft.password.as_deref() {
        Some(p) if !p.is_empty() => Some(p.to_string()),
        _ => {
            errors.add("password", "The password field is required.");
            None
        }
    };
    ensure_valid(errors, "Validation failed")?;

    let (Some(email), Some(password)) = (email, password) else {
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let Some(user) = repo.find_user_by_email(&email).await? else {
        run_blocking(move || Ok(verify_without_account(&password)?)).await?;
        log::info!("Login failed for unknown email");
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let stored = user.password_hash.clone();
    let matches = run_blocking(move || Ok(verify_password(&password, &stored)?)).await?;
    if !matches {
        log::info!("Login failed for user {}", user.id);
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    issue_token(repo, clock, user).await
}

/// Resolve a bearer token to its user.
pub async fn authenticate<R>(repo: &R, clock: &dyn Clock, bearer: &str) -> ServiceResult<User>
where
    R: FullRepository + ?Sized,
{
    if bearer.is_empty() {
        return Err(ServiceError::Unauthorized(UNAUTHENTICATED.to_string()));
    }

    repo.find_user_by_token(&token_digest(bearer), clock.now())
        .await?
        .ok_or_else(|| ServiceError::Unauthorized(UNAUTHENTICATED.to_string()))
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
