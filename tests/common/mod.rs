//! Shared helpers for integration tests

// Not every test binary uses every helper.
#![allow(dead_code)]

use parlance::client::ApiClient;
use parlance::config::Config;

/// Bearer token used by the authenticated test client
pub const TEST_TOKEN: &str = "test_token";

/// Config pointing at a mock server
pub fn config_for(uri: &str) -> Config {
    let mut config = Config::default();
    config.backend.base_url = uri.to_string();
    config.backend.timeout_seconds = 5;
    config
}

/// Client with a credential attached, pointing at a mock server
pub fn client_for(uri: &str) -> ApiClient {
    ApiClient::new(&config_for(uri))
        .unwrap()
        .with_credential(TEST_TOKEN)
}

/// Client with no credential, pointing at a mock server
pub fn anonymous_client_for(uri: &str) -> ApiClient {
    ApiClient::new(&config_for(uri)).unwrap()
}
