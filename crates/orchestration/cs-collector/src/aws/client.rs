//! AWS client configuration and creation.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use cs_types::RegionSetting;
use serde::{Deserialize, Serialize};

/// Configuration for AWS access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsConfig {
    /// AWS region; the default provider chain decides when unset
    pub region: Option<String>,

    /// Custom endpoint URL (for LocalStack)
    pub endpoint: Option<String>,

    /// AWS profile name (optional)
    pub profile: Option<String>,
}

impl AwsConfig {
    /// Create a configuration that relies entirely on the default chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the AWS region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Use the region from the tool configuration file, if it names one.
    ///
    /// An explicit region set earlier wins.
    pub fn with_region_setting(mut self, setting: &RegionSetting) -> Self {
        if self.region.is_none() {
            self.region = setting.name().map(str::to_string);
        }
        self
    }

    /// Set a custom endpoint (for LocalStack).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the AWS profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

/// Load the shared SDK configuration.
pub async fn load_sdk_config(config: &AwsConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }

    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }

    loader.load().await
}

/// Create an S3 client, with path-style addressing when a custom endpoint is set.
pub fn s3_client(sdk_config: &SdkConfig, config: &AwsConfig) -> aws_sdk_s3::Client {
    let builder = aws_sdk_s3::config::Builder::from(sdk_config);

    let s3_config = if config.endpoint.is_some() {
        builder.force_path_style(true).build()
    } else {
        builder.build()
    };

    aws_sdk_s3::Client::from_conf(s3_config)
}
