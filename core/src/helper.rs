//! Multi-step account workflows.
//!
//! # Design
//! `AccountHelper` chains the endpoint clients into the flows a scenario
//! needs: register and activate, log in, change password or email, log out.
//! Each stage is wrapped with `StepContext::step`, so a failed scenario reads
//! like "activation token not obtained: activation token for login ... not
//! found after 10 attempts". Mail delivery is awaited with the helper's
//! `RetryPolicy`; only "no matching mail yet" is retried.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ApiError, Result, StepContext, TokenKind};
use crate::http::{HttpResponse, Transport, UreqTransport};
use crate::login::Authenticated;
use crate::models::{ChangeEmail, ChangePassword, Credentials, LoginCredentials, Mailbox, ResetPassword, UserEnvelope};
use crate::retry::RetryPolicy;
use crate::services::{ApiMailhog, DmApiAccount};
use crate::session::Session;
use crate::token;

pub const STEP_CREATE: &str = "user not created";
pub const STEP_ACTIVATION_TOKEN: &str = "activation token not obtained";
pub const STEP_ACTIVATE: &str = "user not activated";
pub const STEP_LOGIN: &str = "user not logged in";
pub const STEP_RESET_REQUEST: &str = "password reset not requested";
pub const STEP_RESET_TOKEN: &str = "reset token not obtained";
pub const STEP_CHANGE_PASSWORD: &str = "password not changed";
pub const STEP_CHANGE_EMAIL: &str = "email not changed";
pub const STEP_LOGOUT: &str = "user not logged out";

pub struct AccountHelper {
    dm_account: DmApiAccount,
    mailhog: ApiMailhog,
    retry: RetryPolicy,
    mailbox_limit: u32,
}

impl AccountHelper {
    pub fn new(dm_account: DmApiAccount, mailhog: ApiMailhog, retry: RetryPolicy) -> Self {
        Self {
            dm_account,
            mailhog,
            retry,
            mailbox_limit: crate::mailhog::DEFAULT_LIMIT,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::from_config_with_transport(config, Arc::new(UreqTransport::new()))
    }

    pub fn from_config_with_transport(config: &Config, transport: Arc<dyn Transport>) -> Self {
        info!(
            environment = %config.environment,
            account_host = %config.account_host,
            mailhog_host = %config.mailhog_host,
            "account helper configured"
        );
        Self {
            dm_account: DmApiAccount::from_config(config, transport.clone()),
            mailhog: ApiMailhog::from_config(config, transport),
            retry: config.retry.policy(),
            mailbox_limit: config.mailbox_limit,
        }
    }

    pub fn with_mailbox_limit(mut self, limit: u32) -> Self {
        self.mailbox_limit = limit;
        self
    }

    pub fn dm_account(&self) -> &DmApiAccount {
        &self.dm_account
    }

    pub fn mailhog(&self) -> &ApiMailhog {
        &self.mailhog
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Register, wait for the activation mail and activate.
    pub fn register_new_user(&self, credentials: &Credentials) -> Result<UserEnvelope> {
        self.dm_account
            .account_api
            .register(&credentials.registration())
            .step(STEP_CREATE)?;

        let token = self
            .get_activation_token_by_login(&credentials.login)
            .step(STEP_ACTIVATION_TOKEN)?;

        self.activate_user(&token)
    }

    pub fn activate_user(&self, token: &str) -> Result<UserEnvelope> {
        self.dm_account.account_api.activate(token).step(STEP_ACTIVATE)
    }

    /// Poll the mailbox until an activation mail for `login` shows up.
    pub fn get_activation_token_by_login(&self, login: &str) -> Result<String> {
        self.poll_token(login, TokenKind::Activation, token::find_activation_token)
    }

    /// Poll the mailbox until a password-reset mail for `login` shows up.
    pub fn get_reset_token_by_login(&self, login: &str) -> Result<String> {
        self.poll_token(login, TokenKind::PasswordReset, token::find_reset_token)
    }

    fn poll_token(
        &self,
        login: &str,
        kind: TokenKind,
        find: fn(&Mailbox, &str) -> Option<String>,
    ) -> Result<String> {
        let found = self.retry.poll(|attempt| {
            let mailbox = self.mailhog.mailhog_api.list_messages(self.mailbox_limit)?;
            let token = find(&mailbox, login);
            debug!(%kind, login, attempt, found = token.is_some(), "scanned mailbox");
            Ok::<_, ApiError>(token)
        })?;

        found.ok_or_else(|| ApiError::TokenNotFound {
            kind,
            login: login.to_string(),
            attempts: self.retry.max_attempts,
        })
    }

    /// Raw login response; fails unless the service answers 200.
    pub fn user_login(&self, login: &str, password: &str, remember_me: bool) -> Result<HttpResponse> {
        let response = self
            .dm_account
            .login_api
            .login_raw(&login_credentials(login, password, remember_me))
            .step(STEP_LOGIN)?;
        crate::rest::check_status(&response, 200).step(STEP_LOGIN)?;
        Ok(response)
    }

    /// Validated login returning the session and the user envelope.
    pub fn user_login_validated(&self, login: &str, password: &str, remember_me: bool) -> Result<Authenticated> {
        self.dm_account
            .login_api
            .login(&login_credentials(login, password, remember_me))
            .step(STEP_LOGIN)
    }

    /// Log in and keep only the session.
    pub fn auth_user(&self, login: &str, password: &str) -> Result<Session> {
        Ok(self.user_login_validated(login, password, true)?.session)
    }

    /// Request a reset, wait for the reset mail and set `new_password`.
    pub fn change_password(
        &self,
        session: Option<&Session>,
        login: &str,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<UserEnvelope> {
        let account_api = &self.dm_account.account_api;
        account_api
            .request_password_reset(&ResetPassword {
                login: login.to_string(),
                email: email.to_string(),
            })
            .step(STEP_RESET_REQUEST)?;

        let token = self.get_reset_token_by_login(login).step(STEP_RESET_TOKEN)?;

        let data = ChangePassword {
            login: login.to_string(),
            token,
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        account_api
            .change_password(&data, session)
            .step(STEP_CHANGE_PASSWORD)
    }

    /// Move the account to `new_email`. The account stays inactive until the
    /// fresh activation token is consumed.
    pub fn change_email(&self, login: &str, password: &str, new_email: &str) -> Result<UserEnvelope> {
        let data = ChangeEmail {
            login: login.to_string(),
            password: password.to_string(),
            email: new_email.to_string(),
        };
        self.dm_account
            .account_api
            .change_email(&data)
            .step(STEP_CHANGE_EMAIL)
    }

    pub fn logout_user(&self, session: &Session) -> Result<()> {
        self.dm_account.login_api.logout(session).step(STEP_LOGOUT)
    }

    pub fn logout_all(&self, session: &Session) -> Result<()> {
        self.dm_account.login_api.logout_all(session).step(STEP_LOGOUT)
    }
}

fn login_credentials(login: &str, password: &str, remember_me: bool) -> LoginCredentials {
    LoginCredentials {
        login: login.to_string(),
        password: password.to_string(),
        remember_me,
    }
}
