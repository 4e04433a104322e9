use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vallox_bus::protocol::{BusObserver, RawTraffic, VariableUpdate};
use vallox_bus::transport::SerialBus;
use vallox_bus::{BusConfig, ChecksumMismatch, Error, ProtocolEngine, Telegram};

/// Logs every event the engine reports
struct Logger;

impl BusObserver for Logger {
    fn on_frame_accepted(&mut self, telegram: &Telegram) {
        info!("{}", telegram);
    }

    fn on_byte_dropped(&mut self, byte: u8, mismatch: &ChecksumMismatch) {
        warn!("Dropped byte {:02X} ({})", byte, mismatch);
    }

    fn on_variable_updated(&mut self, update: &VariableUpdate) {
        info!("{} = {} (#{})", update.name, update.decoded, update.counter);
    }

    fn on_raw_traffic(&mut self, traffic: &RawTraffic) {
        info!("{}", traffic);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = BusConfig::default();
    if let Some(port) = std::env::args().nth(1) {
        config.port = port;
    }

    match SerialBus::available_ports() {
        Ok(ports) => info!("Available ports: {:?}", ports),
        Err(e) => warn!("Could not list ports: {}", e),
    }

    let mut engine = match ProtocolEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };
    let mut bus = match SerialBus::open(&config) {
        Ok(bus) => bus,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    // Ask for the current fan speed once, then just listen
    if let Err(e) = bus.send(&engine.poll_variable(vallox_bus::VariableCode::FAN_SPEED)) {
        warn!("Poll failed: {}", e);
    }

    let mut logger = Logger;
    loop {
        match bus.pump(&mut engine) {
            Ok(events) => {
                for event in &events {
                    event.notify(&mut logger);
                }
            }
            Err(Error::Serial(e)) => {
                error!("Lost {}: {}", bus.name(), e);
                break;
            }
            Err(e) => {
                error!("Read failed: {}", e);
                std::thread::sleep(Duration::from_secs(1));
            }
        }
    }
}
