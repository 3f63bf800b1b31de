//! Per-service client bundles built from a `Config`.

use std::sync::Arc;

use crate::account::AccountApi;
use crate::config::Config;
use crate::http::{Transport, UreqTransport};
use crate::login::LoginApi;
use crate::mailhog::MailhogApi;
use crate::rest::RestClient;

/// Clients of the account service.
#[derive(Clone)]
pub struct DmApiAccount {
    pub account_api: AccountApi,
    pub login_api: LoginApi,
}

impl DmApiAccount {
    pub fn new(rest: RestClient) -> Self {
        Self {
            account_api: AccountApi::new(rest.clone()),
            login_api: LoginApi::new(rest),
        }
    }

    pub fn from_config(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let rest = RestClient::with_transport(&config.account_host, transport)
            .log_enabled(config.account_log)
            .raise_for_status(config.raise_for_status)
            .default_header("accept", "application/json");
        Self::new(rest)
    }
}

/// Client of the MailHog instance receiving the service's mail.
#[derive(Clone)]
pub struct ApiMailhog {
    pub mailhog_api: MailhogApi,
}

impl ApiMailhog {
    pub fn new(rest: RestClient) -> Self {
        Self {
            mailhog_api: MailhogApi::new(rest),
        }
    }

    pub fn from_config(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let rest = RestClient::with_transport(&config.mailhog_host, transport)
            .log_enabled(config.mailhog_log)
            .raise_for_status(config.raise_for_status);
        Self::new(rest)
    }
}

/// Both service bundles sharing one blocking transport.
pub fn connect(config: &Config) -> (DmApiAccount, ApiMailhog) {
    let transport: Arc<dyn Transport> = Arc::new(UreqTransport::new());
    (
        DmApiAccount::from_config(config, transport.clone()),
        ApiMailhog::from_config(config, transport),
    )
}
