use super::{discovery, Incoming, Outgoing};
use crate::consts;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS, SubscribeFilter};
use rumqttc::{Event, Packet};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::{sync::Mutex, task};

use tracing::{debug, error, info, warn};

pub struct Initiator {
    client: AsyncClient,
    event_loop: EventLoop,
    bridge: String,
    subscriptions: Subscriptions,
}

/// Topics subscribed so far. The broker forgets them when the connection
/// drops, so they are subscribed again on every reconnect.
#[derive(Clone, Debug, Default)]
pub struct Subscriptions(Arc<Mutex<BTreeSet<String>>>);

impl Subscriptions {
    /// Returns false when the topic was already known.
    pub async fn add(&self, topic: &str) -> bool {
        self.0.lock().await.insert(topic.to_string())
    }

    pub async fn filters(&self) -> Vec<SubscribeFilter> {
        self.0
            .lock()
            .await
            .iter()
            .map(|topic| SubscribeFilter::new(topic.clone(), QoS::AtLeastOnce))
            .collect()
    }

    /// Subscribe to everything again in the background. The event loop must
    /// keep polling meanwhile, so nothing here waits for the client.
    async fn restore(&self, client: &AsyncClient) {
        let filters = self.filters().await;
        if filters.is_empty() {
            return;
        }
        info!("Restoring {} MQTT subscriptions", filters.len());
        let client = client.clone();
        task::spawn(async move {
            if let Err(err) = client.subscribe_many(filters).await {
                error!("Unable to restore subscriptions: {:?}", err);
            }
        });
    }
}

/// HA interfacing via MQTT
pub struct HomeAssistant {
    /// Outgoing event queue: things we sent to HA.
    outgoing: mpsc::Sender<Outgoing>,
    /// Incoming event queue: bridge events and helper changes from HA.
    incoming: Mutex<mpsc::Receiver<Incoming>>,
}

fn parse_json<T: serde::de::DeserializeOwned>(topic: &str, payload: &[u8]) -> Option<T> {
    match serde_json::from_slice(payload) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!("Invalid JSON on {}: {}", topic, err);
            None
        }
    }
}

/// Map a received publish to an incoming message. Unknown topics and
/// malformed payloads give None.
pub fn parse_incoming(bridge: &str, topic: &str, payload: &[u8]) -> Option<Incoming> {
    if let Some(event) = topic.strip_prefix(bridge).and_then(|t| t.strip_prefix('/')) {
        return match event {
            "announce" => parse_json(topic, payload).map(Incoming::Announce),
            "command" => parse_json(topic, payload).map(Incoming::Command),
            _ => {
                debug!("Unknown bridge event {} - ignoring", event);
                None
            }
        };
    }

    let parts: Vec<&str> = topic.split('/').collect();
    if parts.len() < 4 || parts[0] != consts::HA_CONTROL_TOPIC || parts[parts.len() - 1] != "set" {
        info!("Unknown topic {} - ignoring", topic);
        return None;
    }

    let device = parts[1].to_string();
    let object = parts[2].to_string();
    match &parts[3..] {
        ["set"] => {
            let value = match std::str::from_utf8(payload) {
                Ok(value) => value.to_string(),
                Err(_) => {
                    warn!("Non UTF-8 value on {}", topic);
                    return None;
                }
            };
            Some(Incoming::HelperSet {
                device,
                object,
                value,
            })
        }
        ["options", "set"] => parse_json(topic, payload).map(|options| Incoming::HelperOptions {
            device,
            object,
            options,
        }),
        _ => {
            info!("Unknown topic {} - ignoring", topic);
            None
        }
    }
}

impl Initiator {
    pub async fn new(
        id: &str,
        host: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> anyhow::Result<Self> {
        let mut mqttoptions = MqttOptions::new(id, host, port);
        mqttoptions.set_keep_alive(Duration::from_secs(5));
        if !username.is_empty() {
            mqttoptions.set_credentials(username, password);
        }

        let (client, mut event_loop) = AsyncClient::new(mqttoptions, 10);

        // Fail early if parameters are invalid.
        if let Err(err) = event_loop.poll().await {
            warn!("Initial connection to MQTT failed. Check connection parameters");
            anyhow::bail!("Unable to contact MQTT: {}", err);
        }

        Ok(Initiator {
            client,
            event_loop,
            bridge: consts::BRIDGE_TOPIC.into(),
            subscriptions: Subscriptions::default(),
        })
    }

    /// Configure the bridge topic prefix and subscribe to its events.
    pub async fn set_topics(&mut self, bridge: &str) -> anyhow::Result<()> {
        for event in ["announce", "command"] {
            let topic = format!("{}/{}", bridge, event);
            self.subscriptions.add(&topic).await;
            self.client.subscribe(topic, QoS::AtLeastOnce).await?;
        }
        self.bridge = bridge.to_string();
        Ok(())
    }

    async fn receiver(
        mut event_loop: EventLoop,
        client: AsyncClient,
        subscriptions: Subscriptions,
        bridge: String,
        queue: mpsc::Sender<Incoming>,
    ) {
        loop {
            let notification = event_loop.poll().await;
            let message = match notification {
                Ok(Event::Incoming(Packet::Publish(msg))) => {
                    debug!("RX message to {} with payload '{:?}'", msg.topic, msg.payload);
                    if let Some(message) = parse_incoming(&bridge, &msg.topic, &msg.payload) {
                        message
                    } else {
                        continue;
                    }
                }
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if !ack.session_present {
                        subscriptions.restore(&client).await;
                    }
                    continue;
                }
                Ok(Event::Outgoing(_))
                | Ok(Event::Incoming(Packet::PingResp))
                | Ok(Event::Incoming(Packet::SubAck(_)))
                | Ok(Event::Incoming(Packet::PubAck(_))) => {
                    // Silence common messages
                    continue;
                }
                Err(err) => {
                    // The event loop reconnects on the next poll.
                    warn!("MQTT connection error: {}", err);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
                _ => {
                    info!("Received other message = {:?}", notification);
                    continue;
                }
            };
            if let Err(err) = queue.send(message).await {
                error!(
                    "Error while sending received message to queue: {:?}. Quitting loop",
                    err
                );
                return;
            }
        }
    }

    async fn publish(client: &AsyncClient, topic: String, retain: bool, payload: String) {
        debug!("Publishing to {}: {}", topic, payload);
        if let Err(err) = client
            .publish(&topic, QoS::AtLeastOnce, retain, payload)
            .await
        {
            error!("Unable to publish to {}: {:?}", topic, err);
        }
    }

    async fn sender(
        client: AsyncClient,
        subscriptions: Subscriptions,
        mut queue: mpsc::Receiver<Outgoing>,
    ) {
        while let Some(command) = queue.recv().await {
            match command {
                Outgoing::Subscribe(topic) => {
                    if !subscriptions.add(&topic).await {
                        // Already subscribed, kept across reconnects.
                        continue;
                    }
                    if let Err(err) = client.subscribe(&topic, QoS::AtLeastOnce).await {
                        error!("Unable to subscribe to a topic {}: {:?}. Quitting", topic, err);
                        return;
                    }
                }
                Outgoing::Initial => {
                    let topic = format!("{}/status", consts::HA_CONTROL_TOPIC);
                    Self::publish(&client, topic, false, "daemon started".to_string()).await;
                }
                Outgoing::DiscoveryTrigger(msg) => {
                    let payload = msg.serialize();
                    Self::publish(&client, msg.config_topic, true, payload).await;
                }
                Outgoing::DiscoveryDevice(msg) => {
                    Self::publish(&client, msg.config_topic(), true, msg.serialize()).await;
                }
                Outgoing::State { topic, payload } => {
                    Self::publish(&client, topic, true, payload).await;
                }
                Outgoing::Action(action) => {
                    let action_topic = discovery::action_topic(&action.device_ieee);
                    for trigger in &action.triggers {
                        Self::publish(&client, action_topic.clone(), false, trigger.payload())
                            .await;
                    }
                    match serde_json::to_string(&action) {
                        Ok(payload) => {
                            let topic = discovery::event_topic(&action.device_ieee);
                            Self::publish(&client, topic, false, payload).await;
                        }
                        Err(err) => error!("Unable to serialize action {:?}: {}", action, err),
                    }
                }
            }
        }
        // Channel end closed - quit.
    }

    pub async fn start(self) -> HomeAssistant {
        let (out_sender, out_receiver) = mpsc::channel::<Outgoing>(100);
        let (in_sender, in_receiver) = mpsc::channel::<Incoming>(10);
        task::spawn(Self::receiver(
            self.event_loop,
            self.client.clone(),
            self.subscriptions.clone(),
            self.bridge,
            in_sender,
        ));
        task::spawn(Self::sender(self.client, self.subscriptions, out_receiver));

        HomeAssistant {
            outgoing: out_sender,
            incoming: Mutex::new(in_receiver),
        }
    }
}

impl HomeAssistant {
    /// Receive incoming message (from MQTT). None means the HA reading loop
    /// finished.
    pub async fn recv(&self) -> Option<Incoming> {
        let mut incoming = self.incoming.lock().await;
        incoming.recv().await
    }

    pub async fn send(&self, msg: Outgoing) -> anyhow::Result<()> {
        self.outgoing.send(msg).await?;
        Ok(())
    }
}
