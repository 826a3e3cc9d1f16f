use clap::Parser;
use eglo_gate::config::Config;
use eglo_gate::consts;
use eglo_gate::gate::Gate;
use eglo_gate::helpers::HelperManager;
use eglo_gate::homeassistant::{self, HomeAssistant};
use eglo_gate::quirks::QuirkRegistry;
use eglo_gate::store::RemoteStore;
use eglo_gate::trigger::TriggerCatalog;
use std::collections::BTreeMap;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "config.yaml")]
    config_path: String,

    /// Directory holding `.storage/`
    #[arg(long, default_value = ".")]
    storage_dir: String,

    // MQTT connection
    #[arg(long, default_value = "localhost")]
    mqtt_host: String,
    #[arg(long, default_value_t = 1883)]
    mqtt_port: u16,
    #[arg(long, default_value = "")]
    mqtt_username: String,
    #[arg(long, default_value = "")]
    mqtt_password: String,
    /// Topic prefix of the Zigbee bridge
    #[arg(long, default_value = consts::BRIDGE_TOPIC)]
    bridge_topic: String,

    // Other
    #[arg(long, default_value = "eglo-gate")]
    device_name: String,
    /// Print the trigger catalogs as JSON and exit.
    #[arg(long)]
    dump_triggers: bool,
}

fn init_log() -> anyhow::Result<()> {
    let timer = fmt::time::ChronoLocal::new("%H:%M:%S%.3f".to_string());

    // Configure a custom event formatter
    let format = fmt::format()
        .with_level(true)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_source_location(true)
        .with_timer(timer)
        .compact();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::DEBUG.into())
        .from_env()?
        .add_directive("rumqttc=info".parse()?);

    fmt().event_format(format).with_env_filter(filter).init();
    Ok(())
}

fn dump_triggers(registry: &QuirkRegistry) -> anyhow::Result<()> {
    let catalogs: BTreeMap<&str, &TriggerCatalog> = registry
        .iter()
        .map(|loaded| (loaded.quirk.name, &loaded.catalog))
        .collect();
    println!("{}", serde_json::to_string_pretty(&catalogs)?);
    Ok(())
}

/// Register remotes from the config file.
async fn init_config(config: &Config, gate: &mut Gate, ha: &HomeAssistant) -> anyhow::Result<()> {
    for device in config.remote_devices() {
        for message in gate.register_configured(device, chrono::Utc::now()) {
            ha.send(message).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_log()?;
    let args = Args::parse();

    let config = Config::from_file(&args.config_path)?;
    info!("Starting Eglo Gate. Args: {:?} Config: {:?}", args, config);

    let registry = QuirkRegistry::new(config.awox_variant)?;
    if args.dump_triggers {
        return dump_triggers(&registry);
    }

    let store = RemoteStore::open(&args.storage_dir).await?;
    info!("Using storage {:?}", store.path());
    let mut gate = Gate::new(registry, HelperManager::new(store));

    let mut ha_init = homeassistant::Initiator::new(
        &args.device_name,
        &args.mqtt_host,
        args.mqtt_port,
        &args.mqtt_username,
        &args.mqtt_password,
    )
    .await?;
    ha_init.set_topics(&args.bridge_topic).await?;
    let ha = ha_init.start().await;

    ha.send(homeassistant::Outgoing::Initial).await?;

    init_config(&config, &mut gate, &ha).await?;

    info!("eglo-gate initialized.");

    // MQTT -> Gate -> MQTT
    loop {
        let msg = if let Some(msg) = ha.recv().await {
            msg
        } else {
            // The other side died.
            break;
        };

        let messages = match gate.handle(msg, chrono::Utc::now()).await {
            Ok(messages) => messages,
            Err(err) => {
                error!("Unable to handle message: {:?}", err);
                continue;
            }
        };
        for message in messages {
            ha.send(message).await?;
        }
    }

    info!("MQTT receiver finished, quitting");
    Ok(())
}
