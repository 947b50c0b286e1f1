use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::ProvideCredentials;
use tracing::info;

use crate::adapters::s3::S3ObjectStore;
use crate::adapters::sqs::{resolve_queue_url, SqsInputQueue, SqsOutputQueue};
use crate::config::WorkerArgs;
use crate::drain::PairingDependencies;
use crate::error::ConfigError;

/// AWS-backed adapters, constructed once per process or invocation.
#[derive(Debug, Clone)]
pub struct RuntimeDependencies {
    pub object_store: S3ObjectStore,
    pub input_queue: SqsInputQueue,
    pub output_queue: SqsOutputQueue,
}

impl RuntimeDependencies {
    pub fn pairing(&self) -> PairingDependencies<'_> {
        PairingDependencies {
            object_store: &self.object_store,
            input_queue: &self.input_queue,
            output_queue: &self.output_queue,
        }
    }
}

pub async fn load_runtime_dependencies(
    args: &WorkerArgs,
) -> Result<RuntimeDependencies, ConfigError> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(endpoint_url) = &args.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }
    let aws_config = loader.load().await;
    ensure_credentials(&aws_config).await?;

    let s3_client = if args.endpoint_url.is_some() {
        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .force_path_style(true)
            .build();
        aws_sdk_s3::Client::from_conf(s3_config)
    } else {
        aws_sdk_s3::Client::new(&aws_config)
    };
    let sqs_client = aws_sdk_sqs::Client::new(&aws_config);

    let input_queue_url = queue_url(&sqs_client, &args.input_queue).await?;
    let output_queue_url = queue_url(&sqs_client, &args.output_queue).await?;
    info!(
        component = "runtime",
        event = "dependencies_loaded",
        bucket = %args.bucket,
        input_queue = %input_queue_url,
        output_queue = %output_queue_url,
        "aws clients ready"
    );

    Ok(RuntimeDependencies {
        object_store: S3ObjectStore::new(s3_client, args.bucket.clone()),
        input_queue: SqsInputQueue::new(sqs_client.clone(), input_queue_url)
            .with_visibility_timeout(args.visibility_timeout_secs)
            .with_wait_time(args.receive_wait_secs),
        output_queue: SqsOutputQueue::new(sqs_client, output_queue_url),
    })
}

/// Fails unless the default provider chain yields credentials.
pub async fn ensure_credentials(aws_config: &aws_config::SdkConfig) -> Result<(), ConfigError> {
    let provider = aws_config.credentials_provider().ok_or_else(|| {
        ConfigError::MissingCredentials("no credentials provider configured".to_string())
    })?;

    provider
        .provide_credentials()
        .await
        .map(|_| ())
        .map_err(|error| ConfigError::MissingCredentials(error.to_string()))
}

async fn queue_url(sqs_client: &aws_sdk_sqs::Client, queue: &str) -> Result<String, ConfigError> {
    resolve_queue_url(sqs_client, queue)
        .await
        .map_err(|message| ConfigError::QueueUrl {
            queue: queue.to_string(),
            message,
        })
}
