//! Shared setup for the end-to-end suites.
//!
//! When `DM_ACCOUNT_HOST` is set the suites run against the deployed service
//! and MailHog named by the `DM_*` variables. Otherwise a mock server is
//! started on a random port and serves both hosts.

use dm_account_core::config::{get_env, BackoffKind, RetrySettings};
use dm_account_core::{logging, AccountHelper, Config};

/// Start the mock server on a random port and return its base URL.
pub fn spawn_mock_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

pub fn config() -> Config {
    logging::init_for_tests();
    if get_env("DM_ACCOUNT_HOST").is_some() {
        return Config::from_env();
    }
    let host = spawn_mock_server();
    Config {
        account_host: host.clone(),
        mailhog_host: host,
        environment: "mock".to_string(),
        retry: RetrySettings {
            max_attempts: 5,
            base_delay_ms: 50,
            backoff: BackoffKind::Fixed,
        },
        ..Config::default()
    }
}

pub fn helper() -> AccountHelper {
    AccountHelper::from_config(&config())
}

