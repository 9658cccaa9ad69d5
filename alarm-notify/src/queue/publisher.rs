//! Async RabbitMQ publisher for verified alarms.

use std::sync::Arc;

use anyhow::{Context, Result};
use lapin::{
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::types::{AlarmMessage, ALARM_QUEUE};

/// Open connection plus the channel alarms are published on.
struct Link {
    connection: Connection,
    channel: Channel,
}

/// Shared RabbitMQ publisher.
///
/// Connects lazily on the first publish and again whenever the cached
/// channel has dropped.
#[derive(Clone)]
pub struct Publisher {
    url: Arc<str>,
    link: Arc<Mutex<Option<Link>>>,
}

impl Publisher {
    pub fn new(url: String) -> Self {
        Self {
            url: url.into(),
            link: Arc::new(Mutex::new(None)),
        }
    }

    async fn channel(&self) -> Result<Channel> {
        let mut link = self.link.lock().await;

        if let Some(current) = link.as_ref() {
            if current.channel.status().connected() {
                return Ok(current.channel.clone());
            }
            warn!("rabbitmq_alarm_channel_dropped");
        }

        let fresh = open_link(&self.url).await?;
        let channel = fresh.channel.clone();
        *link = Some(fresh);
        Ok(channel)
    }

    /// Publish a verified alarm as persistent JSON on [`ALARM_QUEUE`].
    pub async fn publish_alarm(&self, alarm: &AlarmMessage) -> Result<()> {
        let body = serde_json::to_vec(alarm).context("Failed to serialize alarm")?;
        let message_id = alarm.message_id();
        let properties = BasicProperties::default()
            .with_delivery_mode(2)
            .with_content_type("application/json".into())
            .with_message_id(message_id.clone().into());

        let channel = self.channel().await?;
        let confirm = channel
            .basic_publish("", ALARM_QUEUE, BasicPublishOptions::default(), &body, properties)
            .await
            .context("Failed to publish alarm")?;
        confirm.await.context("Alarm publish was not confirmed")?;

        info!(
            queue = ALARM_QUEUE,
            message_id = %message_id,
            body_length = body.len(),
            "rabbitmq_alarm_published"
        );

        Ok(())
    }

    /// Close the channel and connection, if open.
    pub async fn close(&self) {
        let Some(link) = self.link.lock().await.take() else {
            return;
        };

        if let Err(e) = link.channel.close(200, "Normal shutdown").await {
            warn!(error = %e, "rabbitmq_channel_close_error");
        }
        if let Err(e) = link.connection.close(200, "Normal shutdown").await {
            warn!(error = %e, "rabbitmq_connection_close_error");
        }

        info!("rabbitmq_publisher_closed");
    }
}

async fn open_link(url: &str) -> Result<Link> {
    let connection = Connection::connect(url, ConnectionProperties::default())
        .await
        .context("Failed to connect to RabbitMQ")?;
    let channel = connection
        .create_channel()
        .await
        .context("Failed to create channel")?;

    let durable = QueueDeclareOptions {
        durable: true,
        ..Default::default()
    };
    channel
        .queue_declare(ALARM_QUEUE, durable, FieldTable::default())
        .await
        .context("Failed to declare alarm queue")?;

    info!(queue = ALARM_QUEUE, "rabbitmq_alarm_link_opened");

    Ok(Link {
        connection,
        channel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing listens on port 1.
    const UNREACHABLE: &str = "amqp://127.0.0.1:1/%2f";

    fn message() -> AlarmMessage {
        AlarmMessage {
            app_id: "ID1".to_string(),
            error_type: Some("1001".to_string()),
            description: None,
            alarm_content: None,
            time_stamp: Some(1393860740),
            raw_xml: "<xml/>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_close_without_connection() {
        let publisher = Publisher::new(UNREACHABLE.to_string());
        publisher.close().await;
        assert!(publisher.link.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_publish_unreachable_broker_fails() {
        let publisher = Publisher::new(UNREACHABLE.to_string());

        let err = publisher.publish_alarm(&message()).await.unwrap_err();

        assert!(err.to_string().contains("connect"), "{err:#}");
        assert!(publisher.link.lock().await.is_none());
    }
}
