use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use backend_storage::share_record::ShareRecordStorage;
use peekonce_backend::{
    media_storage::MediaStorage,
    server,
    share::{TokenIssuer, TokenRedeemer, UploadService},
    types::Environment,
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // Use JSON format for staging/production, regular format for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt()
                .json()
                .with_env_filter(EnvFilter::from_default_env())
                .init();
        }
        Environment::Development { .. } => {
            fmt().with_env_filter(EnvFilter::from_default_env()).init();
        }
    }

    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let media_storage = Arc::new(MediaStorage::new(
        s3_client,
        environment.s3_bucket(),
        &environment.public_object_base_url(),
    ));

    let dynamodb_client = Arc::new(DynamoDbClient::new(&environment.aws_config().await));
    let share_records = Arc::new(ShareRecordStorage::new(
        dynamodb_client,
        environment.share_table_name(),
    ));

    tracing::info!("✅ Initialized storage clients");

    let issuer = TokenIssuer::new(share_records.clone(), &environment.share_link_origin());
    let upload_service = Arc::new(UploadService::new(media_storage, issuer));
    let redeemer = Arc::new(
        TokenRedeemer::new(share_records).with_display_secs(environment.view_window_secs()),
    );

    server::start(environment, upload_service, redeemer).await
}
