//! Client side of the authentication gateway.

use std::future::Future;
use std::time::Duration;

use neurofetch_core::models::user::UserProfile;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SessionError;

/// Gateway message returned when an email is already registered.
const CONFLICT_MESSAGE: &str = "User already exists";

/// A successful login: the token to persist and who it identifies.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub token: String,
    pub user: UserProfile,
}

pub trait GatewayClient: Send + Sync {
    /// Register an account. Returns the gateway's confirmation message.
    fn signup(
        &self,
        email: &str,
        secret: &str,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;

    fn login(
        &self,
        email: &str,
        secret: &str,
    ) -> impl Future<Output = Result<LoginSession, SessionError>> + Send;

    /// Resolve a bearer token to the identity it names.
    fn verify(&self, token: &str)
    -> impl Future<Output = Result<UserProfile, SessionError>> + Send;
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    secret: &'a str,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Deserialize)]
struct LoginBody {
    token: String,
    user: UserProfile,
}

#[derive(Deserialize)]
struct VerifyBody {
    user: UserProfile,
}

/// Which call a non-success status came back from.
#[derive(Clone, Copy)]
enum Call {
    Signup,
    Login,
    Verify,
}

#[derive(Debug, Clone)]
pub struct HttpGatewayClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGatewayClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn reject(call: Call, response: reqwest::Response) -> SessionError {
        let status = response.status();
        let message = response
            .json::<MessageBody>()
            .await
            .map(|b| b.message)
            .unwrap_or_else(|_| status.to_string());

        debug!(%status, %message, "gateway rejected request");
        match (status, call) {
            (StatusCode::UNAUTHORIZED, Call::Login) => SessionError::InvalidCredentials,
            (StatusCode::UNAUTHORIZED, _) => SessionError::Unauthenticated,
            (StatusCode::BAD_REQUEST, Call::Signup) if message == CONFLICT_MESSAGE => {
                SessionError::Conflict
            }
            _ => SessionError::GatewayRejected(message),
        }
    }
}

fn transport(e: reqwest::Error) -> SessionError {
    if e.is_decode() {
        SessionError::MalformedResponse(e.to_string())
    } else {
        SessionError::GatewayUnavailable(e.to_string())
    }
}

impl GatewayClient for HttpGatewayClient {
    async fn signup(&self, email: &str, secret: &str) -> Result<String, SessionError> {
        let response = self
            .client
            .post(self.url("/auth/signup"))
            .json(&CredentialsBody { email, secret })
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(Self::reject(Call::Signup, response).await);
        }
        let body: MessageBody = response.json().await.map_err(transport)?;
        Ok(body.message)
    }

    async fn login(&self, email: &str, secret: &str) -> Result<LoginSession, SessionError> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&CredentialsBody { email, secret })
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(Self::reject(Call::Login, response).await);
        }
        let body: LoginBody = response.json().await.map_err(transport)?;
        Ok(LoginSession {
            token: body.token,
            user: body.user,
        })
    }

    async fn verify(&self, token: &str) -> Result<UserProfile, SessionError> {
        let response = self
            .client
            .get(self.url("/auth/verify"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(Self::reject(Call::Verify, response).await);
        }
        let body: VerifyBody = response.json().await.map_err(transport)?;
        Ok(body.user)
    }
}
