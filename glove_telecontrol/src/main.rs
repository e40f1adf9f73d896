use dora_node_api::{
    arrow::array::{Array, BinaryArray, Float64Array},
    dora_core::config::DataId,
    DoraNode, Event,
};
use eyre::Result;
use std::collections::HashMap;
use std::error::Error;
use std::sync::mpsc::Receiver;
use telecontrol_lib::{
    init_tracing, outbox, BodyPart, BodyPartController, DriverRegistry, EncoderFeedback,
    OutboundMessage, OutboundPayload, OutboxHandSink, TelecontrolAdapter, TelecontrolConfig,
    TelecontrolCommandWithMetadata, COMMAND_INPUT, ENCODERS_INPUT, GLOVE_SENSORS_INPUT,
    GLOVE_VIBRATION_OUTPUT, TELEMETRY_OUTPUT, TICK_INPUT, VIBRATION_INPUT,
};
use tracing::{debug, info, warn};

fn load_config() -> Result<TelecontrolConfig> {
    let config_path = std::env::var("TELECONTROL_CONFIG")
        .unwrap_or_else(|_| "config/telecontrol.toml".to_string());

    let config = TelecontrolConfig::load_from_file(&config_path)
        .map_err(|e| eyre::eyre!("Failed to load telecontrol config from {}: {}", config_path, e))?;
    config.validate()?;

    info!("Loaded telecontrol configuration for robot '{}'", config.robot_name);
    for part in BodyPart::ALL {
        if config.is_activated(part) {
            info!(
                "  {}: {} DOF, {} mode, {} -> {}",
                part,
                config.dof(part),
                if config.is_direct(part) { "direct" } else { "trajectory" },
                config.local_port(part),
                config.remote_port(part)
            );
        } else {
            info!("  {}: deactivated", part);
        }
    }

    Ok(config)
}

fn float_values(data: &dyn Array) -> Option<Vec<f64>> {
    data.as_any()
        .downcast_ref::<Float64Array>()
        .map(|array| array.values().to_vec())
}

fn first_binary(data: &dyn Array) -> Option<&[u8]> {
    data.as_any()
        .downcast_ref::<BinaryArray>()
        .filter(|array| array.len() > 0)
        .map(|array| array.value(0))
}

/// Send everything drivers and ports queued while handling the last event.
fn flush_outbox(node: &mut DoraNode, outbound: &Receiver<OutboundMessage>) {
    for message in outbound.try_iter() {
        let output_id = DataId::from(message.output.to_owned());
        let result = match message.payload {
            OutboundPayload::Values(values) => {
                node.send_output(output_id, Default::default(), Float64Array::from(values))
            }
            OutboundPayload::Json(bytes) => node.send_output(
                output_id,
                Default::default(),
                BinaryArray::from_vec(vec![bytes.as_slice()]),
            ),
        };

        if let Err(e) = result {
            warn!("Failed to send {}: {}", message.output, e);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let _guard = init_tracing();

    info!("Starting glove telecontrol node");

    let config = load_config()?;
    let (mut node, mut events) = DoraNode::init_from_env()?;

    let (outbox, outbound) = outbox();
    let mut registry = DriverRegistry::new(outbox.clone());
    let encoder_feed = registry.encoder_feed();

    let controller = BodyPartController::connect(config, &mut registry);
    let mut adapter =
        TelecontrolAdapter::new(controller, Box::new(OutboxHandSink::new(outbox.clone())));
    flush_outbox(&mut node, &outbound);

    info!("Glove telecontrol node ready");

    let mut event_count = 0;
    let mut input_stats: HashMap<String, usize> = HashMap::new();

    while let Some(event) = events.recv() {
        match event {
            Event::Input {
                id,
                metadata: _,
                data,
            } => {
                event_count += 1;
                *input_stats.entry(id.as_str().to_string()).or_insert(0) += 1;

                match id.as_str() {
                    TICK_INPUT => {
                        let sample = adapter.read_vibration_command();
                        if let Err(e) =
                            outbox.send_values(GLOVE_VIBRATION_OUTPUT, sample.values().to_vec())
                        {
                            warn!("Failed to queue vibration command: {}", e);
                        }

                        let telemetry = adapter.telemetry();
                        if let Err(e) = outbox.send_json(TELEMETRY_OUTPUT, &telemetry) {
                            warn!("Failed to queue telemetry: {}", e);
                        }
                    }

                    VIBRATION_INPUT => match float_values(&**data) {
                        Some(values) => adapter.deliver_vibration(&values),
                        None => warn!("Vibration input is not a Float64Array"),
                    },

                    GLOVE_SENSORS_INPUT => match float_values(&**data) {
                        Some(values) => {
                            if let Err(e) = adapter.write_hand_reading(&values) {
                                warn!("Failed to forward hand reading: {}", e);
                            }
                        }
                        None => warn!("Glove sensor input is not a Float64Array"),
                    },

                    COMMAND_INPUT => match first_binary(&**data) {
                        Some(bytes) => {
                            match serde_json::from_slice::<TelecontrolCommandWithMetadata>(bytes) {
                                Ok(TelecontrolCommandWithMetadata {
                                    command: Some(command),
                                    metadata,
                                }) => {
                                    debug!(
                                        "Command {} from {:?}: {:?}",
                                        metadata.command_id, metadata.source, command
                                    );
                                    if let Err(e) = adapter.execute(command) {
                                        warn!("Command {} failed: {:#}", metadata.command_id, e);
                                    }
                                }
                                Ok(_) => warn!("Received telecontrol command without payload"),
                                Err(e) => warn!("Failed to parse telecontrol command: {}", e),
                            }
                        }
                        None => warn!("Received empty telecontrol command"),
                    },

                    ENCODERS_INPUT => {
                        if let Some(bytes) = first_binary(&**data) {
                            match serde_json::from_slice::<EncoderFeedback>(bytes) {
                                Ok(feedback) => encoder_feed.update(feedback),
                                Err(e) => warn!("Failed to parse encoder feedback: {}", e),
                            }
                        }
                    }

                    other => {
                        debug!("Unknown input id: {}", other);
                    }
                }
            }

            Event::Stop(_) => {
                info!("Stop event received");
                info!("Total events processed: {}", event_count);
                for (input_id, count) in &input_stats {
                    info!("  {}: {} events", input_id, count);
                }
                break;
            }

            _ => {}
        }

        flush_outbox(&mut node, &outbound);
    }

    adapter.close();
    flush_outbox(&mut node, &outbound);

    info!("Glove telecontrol node shutting down");
    Ok(())
}
