//! Authentication gateway service: signup, login, and the verify
//! guard used by every protected operation.

use neurofetch_core::error::NeurofetchError;
use neurofetch_core::models::user::{CreateUser, User, UserProfile};
use neurofetch_core::repository::UserRepository;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::TokenService;

/// Input for the signup flow.
#[derive(Debug)]
pub struct SignupInput {
    pub email: String,
    pub secret: String,
}

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub secret: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed identity token.
    pub token: String,
    /// The authenticated user.
    pub user: UserProfile,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// Authentication service.
///
/// Generic over the credential store so that the auth layer has no
/// dependency on the database crate.
pub struct AuthService<U: UserRepository> {
    user_repo: U,
    tokens: TokenService,
    config: AuthConfig,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(user_repo: U, config: AuthConfig) -> Result<Self, AuthError> {
        let tokens = TokenService::new(&config)?;
        Ok(Self {
            user_repo,
            tokens,
            config,
        })
    }

    /// The token service backing this gateway.
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new user. No token is issued; the caller logs in
    /// separately.
    pub async fn signup(&self, input: SignupInput) -> Result<UserProfile, AuthError> {
        self.validate_signup(&input)?;

        let user = self
            .user_repo
            .create(CreateUser {
                email: input.email,
                secret: input.secret,
            })
            .await
            .map_err(|e| match e {
                NeurofetchError::AlreadyExists { .. } => AuthError::Conflict,
                other => AuthError::Store(other),
            })?;

        info!(user_id = %user.id, "user signed up");
        Ok(user.profile())
    }

    /// Authenticate with email + secret and issue a token.
    ///
    /// Unknown email and wrong secret are indistinguishable to the
    /// caller.
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutput, AuthError> {
        let user = match self.user_repo.get_by_email(&input.email).await {
            Ok(u) => u,
            Err(NeurofetchError::NotFound { .. }) => {
                debug!("login rejected: unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let valid = self.user_repo.verify_secret(&user, &input.secret).await?;
        if !valid {
            debug!(user_id = %user.id, "login rejected: secret mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        info!(user_id = %user.id, "user logged in");

        Ok(LoginOutput {
            token,
            user: user.profile(),
            expires_in: self.tokens.lifetime_secs(),
        })
    }

    /// Access-control guard: resolve a presented token to its user.
    pub async fn verify(&self, token: Option<&str>) -> Result<User, AuthError> {
        let token = match token {
            Some(t) if !t.trim().is_empty() => t.trim(),
            _ => return Err(AuthError::Unauthenticated),
        };

        let subject = self.tokens.verify(token)?;

        match self.user_repo.get_by_id(subject).await {
            Ok(user) => Ok(user),
            Err(NeurofetchError::NotFound { .. }) => Err(AuthError::UserNotFound),
            Err(e) => Err(e.into()),
        }
    }

    fn validate_signup(&self, input: &SignupInput) -> Result<(), AuthError> {
        let email = input.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Validation("a valid email is required".into()));
        }
        if input.secret.chars().count() < self.config.min_secret_length {
            return Err(AuthError::Validation(format!(
                "password must be at least {} characters",
                self.config.min_secret_length
            )));
        }
        Ok(())
    }
}
