//! Connection subscriber
//!
//! Inbound: every payload seen on the topic is decoded and accepted only if
//! it did not originate from this instance and its id has not been seen
//! before. Accepted messages go to the sink installed by `subscribe`.
//!
//! Outbound: `publish` copies the message, mints a fresh id, stamps `from`
//! with this instance id and records the destination connection id. Ids are
//! per hop, so a relay of a message that already had an id still gets a new
//! one.
//!
//! The subscription is opened once and stays open for the lifetime of the
//! process; closing connections never touches it.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::broker::{BrokerHandler, MessageBroker};
use crate::message::{JsonCodec, Message, TARGET_HEADER};
use crate::server::ServerIdentity;
use crate::subscribe::topic::{Protocol, topic_name};
use crate::utils::error::BrokerError;
use crate::verifier::MessageIdempotentVerifier;

/// Receives messages accepted from sibling instances.
pub type InboundSink = Arc<dyn Fn(Message) + Send + Sync>;

pub struct ConnectionSubscriber {
    topic: String,
    identity: Arc<ServerIdentity>,
    broker: Arc<dyn MessageBroker>,
    verifier: Arc<dyn MessageIdempotentVerifier>,
    codec: JsonCodec,
    subscription: Mutex<Option<String>>,
}

impl ConnectionSubscriber {
    pub fn new(
        protocol: &Protocol,
        identity: Arc<ServerIdentity>,
        broker: Arc<dyn MessageBroker>,
        verifier: Arc<dyn MessageIdempotentVerifier>,
    ) -> Self {
        Self {
            topic: topic_name(protocol, &identity),
            identity,
            broker,
            verifier,
            codec: JsonCodec,
            subscription: Mutex::new(None),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// Opens the topic subscription. Later calls keep the existing one.
    pub fn subscribe(&self, sink: InboundSink) -> Result<(), BrokerError> {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            debug!("Already subscribed to {}", self.topic);
            return Ok(());
        }

        let self_id = self.identity.instance_id().to_string();
        let verifier = self.verifier.clone();
        let codec = self.codec;
        let handler: BrokerHandler = Arc::new(move |bytes: &[u8]| {
            if let Some(message) = accept_inbound(bytes, &self_id, verifier.as_ref(), &codec) {
                sink(message);
            }
        });

        let id = self.broker.subscribe(&self.topic, handler)?;
        info!(
            "Instance {} subscribed to {}",
            self.identity.instance_id(),
            self.topic
        );
        *subscription = Some(id);
        Ok(())
    }

    /// Applies the inbound filters to one raw broker payload.
    pub fn accept(&self, bytes: &[u8]) -> Option<Message> {
        accept_inbound(
            bytes,
            self.identity.instance_id(),
            self.verifier.as_ref(),
            &self.codec,
        )
    }

    /// Publishes `message` for the sibling that owns `target`. Returns the
    /// id minted for the outbound envelope.
    pub fn publish(&self, message: &Message, target: &str) -> Result<String, BrokerError> {
        let mut envelope = message.clone();
        envelope.id = Uuid::new_v4().to_string();
        envelope.from = self.identity.instance_id().to_string();
        envelope
            .headers
            .insert(TARGET_HEADER.to_string(), target.to_string());

        let bytes = self.codec.to_bytes(&envelope)?;
        self.broker.publish(&self.topic, bytes)?;
        debug!("Relayed {} for {} on {}", envelope.id, target, self.topic);
        Ok(envelope.id)
    }
}

fn accept_inbound(
    bytes: &[u8],
    self_id: &str,
    verifier: &dyn MessageIdempotentVerifier,
    codec: &JsonCodec,
) -> Option<Message> {
    let message = match codec.from_bytes(bytes) {
        Ok(message) => message,
        Err(e) => {
            warn!("Dropping undecodable relay payload: {}", e);
            return None;
        }
    };

    if message.from == self_id {
        debug!("Dropping self-echo {}", message.id);
        return None;
    }

    if !verifier.verify(&message.id) {
        debug!("Dropping duplicate {}", message.id);
        return None;
    }

    Some(message)
}
