use aws_sdk_polly::config::{retry::RetryConfig, BehaviorVersion, Credentials, Region};
use aws_sdk_polly::Client as PollyClient;

/// Polly client pointed at an endpoint nothing listens on
pub fn create_unreachable_polly_client() -> PollyClient {
    let config = aws_sdk_polly::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("AKIDTEST", "test-secret", None, None, "e2e"))
        .retry_config(RetryConfig::disabled())
        .endpoint_url("http://127.0.0.1:9")
        .build();

    PollyClient::from_conf(config)
}
