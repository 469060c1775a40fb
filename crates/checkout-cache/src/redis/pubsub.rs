//! Pattern subscriptions over a dedicated Redis pub/sub connection.

use futures::StreamExt;
use tracing::info;

use checkout_core::error::{AppError, ErrorKind};
use checkout_core::events::{ExpiryEvent, ExpiryStream};
use checkout_core::result::AppResult;

use super::client::RedisClient;

/// Open a pub/sub connection, `PSUBSCRIBE` to `pattern`, and expose the
/// messages as expiry events.
///
/// The stream ends when the connection drops; it does not reconnect.
pub async fn psubscribe(client: &RedisClient, pattern: &str) -> AppResult<ExpiryStream> {
    let mut pubsub = client.client().get_async_pubsub().await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Subscription,
            format!("Failed to open pub/sub connection: {e}"),
            e,
        )
    })?;

    pubsub.psubscribe(pattern).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Subscription,
            format!("PSUBSCRIBE '{pattern}' failed: {e}"),
            e,
        )
    })?;

    info!(pattern, "Subscribed to keyspace event pattern");

    let prefix = client.prefix().to_string();
    let stream = pubsub.into_on_message().map(move |msg| {
        let channel = msg.get_channel_name().to_string();
        let payload: String = msg.get_payload().map_err(|e| {
            AppError::with_source(
                ErrorKind::Subscription,
                format!("Malformed payload on '{channel}': {e}"),
                e,
            )
        })?;
        let key = payload
            .strip_prefix(prefix.as_str())
            .map(str::to_string)
            .unwrap_or(payload);
        Ok(ExpiryEvent::new(channel, key))
    });

    Ok(stream.boxed())
}
