//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};

use crate::share::DEFAULT_VIEW_WINDOW_SECS;

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Optional override for the display window in seconds
        view_window_override: Option<u64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => {
                let view_window_override = env::var("VIEW_WINDOW_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok());

                Self::Development {
                    view_window_override,
                }
            }
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Returns the S3 bucket name for uploaded images
    ///
    /// # Panics
    ///
    /// Panics if the `S3_BUCKET_NAME` environment variable is not set outside development
    #[must_use]
    pub fn s3_bucket(&self) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var("S3_BUCKET_NAME").expect("S3_BUCKET_NAME environment variable is not set")
            }
            Self::Development { .. } => {
                env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "peekonce-images".to_string())
            }
        }
    }

    /// Returns the `DynamoDB` table holding share records
    ///
    /// # Panics
    ///
    /// Panics if `DYNAMODB_SHARE_TABLE_NAME` is not set outside development
    #[must_use]
    pub fn share_table_name(&self) -> String {
        match self {
            Self::Production | Self::Staging => env::var("DYNAMODB_SHARE_TABLE_NAME")
                .expect("DYNAMODB_SHARE_TABLE_NAME environment variable is not set"),
            Self::Development { .. } => env::var("DYNAMODB_SHARE_TABLE_NAME")
                .unwrap_or_else(|_| "peekonce-share-records".to_string()),
        }
    }

    /// Origin prepended to `/view/<token>` in share links
    ///
    /// # Panics
    ///
    /// Panics if `SHARE_LINK_ORIGIN` is not set outside development
    #[must_use]
    pub fn share_link_origin(&self) -> String {
        match self {
            Self::Production | Self::Staging => env::var("SHARE_LINK_ORIGIN")
                .expect("SHARE_LINK_ORIGIN environment variable is not set"),
            Self::Development { .. } => env::var("SHARE_LINK_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        }
    }

    /// Base URL under which stored objects are publicly readable
    ///
    /// # Panics
    ///
    /// Panics if `PUBLIC_OBJECT_BASE_URL` is not set outside development
    #[must_use]
    pub fn public_object_base_url(&self) -> String {
        match self {
            Self::Production | Self::Staging => env::var("PUBLIC_OBJECT_BASE_URL")
                .expect("PUBLIC_OBJECT_BASE_URL environment variable is not set"),
            Self::Development { .. } => env::var("PUBLIC_OBJECT_BASE_URL").unwrap_or_else(|_| {
                format!("http://localhost:4566/{}", self.s3_bucket())
            }),
        }
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development { .. } | Self::Staging)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development { .. } => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // Override "force path style" to true for compatibility with LocalStack
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if matches!(self, Self::Development { .. }) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// How long a granted image stays on screen, in seconds
    #[must_use]
    pub fn view_window_secs(&self) -> u64 {
        match self {
            Self::Production | Self::Staging => DEFAULT_VIEW_WINDOW_SECS,
            Self::Development {
                view_window_override,
            } => view_window_override.unwrap_or(DEFAULT_VIEW_WINDOW_SECS),
        }
    }
}
