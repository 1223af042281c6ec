//! Amazon SQS queue
//!
//! Backed by `aws-sdk-sqs`. Credentials and region come from the standard
//! AWS provider chain, optionally pinned to a named shared-config profile.
//! The region is taken from the queue URL when it is an AWS host; any other
//! host (LocalStack, ElasticMQ) is used as the endpoint override.
//!
//! The SDK's own retry layer is disabled. Transport failures are retried
//! here with [`retry_async`]; service errors and partially failed batches
//! are returned to the caller as-is.

use crate::core::retry::{retry_async, RetryPolicy};
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::message::MessageRef;
use crate::queue::parser::{MessageParser, RawMessage};
use crate::queue::traits::{Queue, MAX_BATCH_SIZE};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::Region;
use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::types::{
    BatchResultErrorEntry, ChangeMessageVisibilityBatchRequestEntry,
    DeleteMessageBatchRequestEntry, SendMessageBatchRequestEntry,
};
use aws_sdk_sqs::Client;
use reqwest::Url;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Region assumed for non-AWS endpoints when the provider chain has none
const FALLBACK_REGION: &str = "us-east-1";

/// Connection settings for one SQS queue
#[derive(Debug, Clone)]
pub struct SqsQueueConfig {
    pub queue_url: String,
    /// Shared-config profile; the default provider chain when unset
    pub profile_name: Option<String>,
    /// Long-poll wait applied to every receive
    pub wait_time_seconds: u32,
    /// Visibility timeout applied to received messages, queue default if unset
    pub visibility_timeout_seconds: Option<u32>,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl SqsQueueConfig {
    pub fn new(queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            profile_name: None,
            wait_time_seconds: 1,
            visibility_timeout_seconds: None,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Where requests for a queue URL are sent
#[derive(Debug, Clone, PartialEq, Eq)]
enum QueueEndpoint {
    /// AWS-hosted queue; the region is read from the host when present
    Aws { region: Option<String> },
    /// Any other host, used verbatim as the endpoint
    Custom(String),
}

impl QueueEndpoint {
    fn from_url(url: &Url) -> Self {
        let host = url.host_str().unwrap_or_default();
        if !host.ends_with(".amazonaws.com") {
            return QueueEndpoint::Custom(url.origin().ascii_serialization());
        }

        // sqs.<region>.amazonaws.com or the legacy <region>.queue.amazonaws.com
        let labels: Vec<&str> = host.split('.').collect();
        let region = match labels.as_slice() {
            ["sqs", region, ..] => Some(region.to_string()),
            [region, "queue", ..] => Some(region.to_string()),
            _ => None,
        };
        QueueEndpoint::Aws { region }
    }
}

/// Network-backed [`Queue`] for one SQS queue URL
pub struct SqsQueue {
    name: String,
    config: SqsQueueConfig,
    client: Client,
    parser: Arc<dyn MessageParser>,
}

impl SqsQueue {
    /// Resolve credentials and region, then build the queue
    pub async fn connect(
        config: SqsQueueConfig,
        parser: Arc<dyn MessageParser>,
    ) -> QueueResult<Self> {
        let url = parse_queue_url(&config.queue_url)?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_attempt_timeout(config.request_timeout)
                    .build(),
            );
        if let Some(profile) = &config.profile_name {
            loader = loader.profile_name(profile);
        }
        loader = match QueueEndpoint::from_url(&url) {
            QueueEndpoint::Aws {
                region: Some(region),
            } => loader.region(Region::new(region)),
            QueueEndpoint::Aws { region: None } => loader,
            QueueEndpoint::Custom(endpoint) => loader
                .endpoint_url(endpoint)
                .region(RegionProviderChain::default_provider().or_else(FALLBACK_REGION)),
        };

        let sdk_config = loader.load().await;
        log::debug!(
            "SQS client for '{}' uses region {:?}",
            config.queue_url,
            sdk_config.region()
        );
        Self::with_client(Client::new(&sdk_config), config, parser)
    }

    /// Build the queue on an already configured client
    pub fn with_client(
        client: Client,
        config: SqsQueueConfig,
        parser: Arc<dyn MessageParser>,
    ) -> QueueResult<Self> {
        let url = parse_queue_url(&config.queue_url)?;
        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .unwrap_or(url.as_str())
            .to_string();

        Ok(Self {
            name,
            config,
            client,
            parser,
        })
    }

    pub fn queue_url(&self) -> &str {
        &self.config.queue_url
    }

    /// Send one SDK request, retrying transport failures
    async fn send<T, E, R, F, Fut>(&self, action: &str, request: F) -> QueueResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, SdkError<E, R>>>,
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: Debug,
    {
        retry_async(
            action,
            &self.config.retry,
            || {
                let pending = request();
                async move { pending.await.map_err(|e| self.sdk_error(action, e)) }
            },
            |error| matches!(error, QueueError::Transport { .. }),
        )
        .await
    }

    fn sdk_error<E, R>(&self, action: &str, error: SdkError<E, R>) -> QueueError
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: Debug,
    {
        match &error {
            SdkError::ServiceError(_) => QueueError::Api {
                code: error.code().unwrap_or("Unknown").to_string(),
                message: error
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{} was rejected", action)),
            },
            _ => QueueError::Transport {
                queue: self.name.clone(),
                message: format!("{}: {}", action, DisplayErrorContext(&error)),
            },
        }
    }

    fn check_batch_size(size: usize) -> QueueResult<()> {
        if size > MAX_BATCH_SIZE {
            return Err(QueueError::BatchTooLarge {
                size,
                max: MAX_BATCH_SIZE,
            });
        }
        Ok(())
    }

    fn check_failures(
        &self,
        action: &str,
        total: usize,
        failed: &[BatchResultErrorEntry],
    ) -> QueueResult<()> {
        if failed.is_empty() {
            return Ok(());
        }
        for failure in failed {
            log::debug!(
                "{} entry {} on '{}' failed ({}): {}",
                action,
                failure.id(),
                self.name,
                failure.code(),
                failure.message().unwrap_or("")
            );
        }
        Err(QueueError::PartialBatch {
            failed: failed.len(),
            total,
        })
    }
}

fn parse_queue_url(queue_url: &str) -> QueueResult<Url> {
    Url::parse(queue_url).map_err(|e| QueueError::OperationFailed {
        message: format!("Invalid queue URL '{}': {}", queue_url, e),
    })
}

fn build_error(error: impl std::fmt::Display) -> QueueError {
    QueueError::OperationFailed {
        message: format!("Invalid batch entry: {}", error),
    }
}

fn as_seconds(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[async_trait]
impl Queue for SqsQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn pull_batch(&self) -> QueueResult<Vec<MessageRef>> {
        let output = self
            .send("ReceiveMessage", || {
                let mut request = self
                    .client
                    .receive_message()
                    .queue_url(&self.config.queue_url)
                    .max_number_of_messages(MAX_BATCH_SIZE as i32)
                    .wait_time_seconds(as_seconds(self.config.wait_time_seconds));
                if let Some(timeout) = self.config.visibility_timeout_seconds {
                    request = request.visibility_timeout(as_seconds(timeout));
                }
                request.send()
            })
            .await?;

        let received = output.messages.unwrap_or_default();
        let mut messages = Vec::with_capacity(received.len());
        for wire in received {
            let raw = RawMessage {
                message_id: wire.message_id.unwrap_or_default(),
                receipt_handle: wire.receipt_handle.unwrap_or_default(),
                body: wire.body.unwrap_or_default(),
            };
            match self.parser.parse(raw) {
                Ok(message) => messages.push(message),
                Err(e) => log::warn!("Skipping unparseable message on '{}': {}", self.name, e),
            }
        }
        Ok(messages)
    }

    async fn delete_batch(&self, tokens: &[String]) -> QueueResult<()> {
        Self::check_batch_size(tokens.len())?;
        if tokens.is_empty() {
            return Ok(());
        }
        let entries = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| {
                DeleteMessageBatchRequestEntry::builder()
                    .id(i.to_string())
                    .receipt_handle(token)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(build_error)?;

        let output = self
            .send("DeleteMessageBatch", || {
                self.client
                    .delete_message_batch()
                    .queue_url(&self.config.queue_url)
                    .set_entries(Some(entries.clone()))
                    .send()
            })
            .await?;
        self.check_failures("DeleteMessageBatch", tokens.len(), output.failed())
    }

    async fn reset_visibility_batch(&self, tokens: &[String]) -> QueueResult<()> {
        Self::check_batch_size(tokens.len())?;
        if tokens.is_empty() {
            return Ok(());
        }
        let entries = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| {
                ChangeMessageVisibilityBatchRequestEntry::builder()
                    .id(i.to_string())
                    .receipt_handle(token)
                    .visibility_timeout(0)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(build_error)?;

        let output = self
            .send("ChangeMessageVisibilityBatch", || {
                self.client
                    .change_message_visibility_batch()
                    .queue_url(&self.config.queue_url)
                    .set_entries(Some(entries.clone()))
                    .send()
            })
            .await?;
        self.check_failures("ChangeMessageVisibilityBatch", tokens.len(), output.failed())
    }

    async fn put_batch(&self, messages: &[MessageRef]) -> QueueResult<()> {
        Self::check_batch_size(messages.len())?;
        if messages.is_empty() {
            return Ok(());
        }
        let entries = messages
            .iter()
            .enumerate()
            .map(|(i, message)| {
                SendMessageBatchRequestEntry::builder()
                    .id(i.to_string())
                    .message_body(message.raw_body())
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(build_error)?;

        let output = self
            .send("SendMessageBatch", || {
                self.client
                    .send_message_batch()
                    .queue_url(&self.config.queue_url)
                    .set_entries(Some(entries.clone()))
                    .send()
            })
            .await?;
        self.check_failures("SendMessageBatch", messages.len(), output.failed())
    }
}
