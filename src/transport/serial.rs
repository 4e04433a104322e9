use std::io::{self, Read, Write};

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info, warn};

use crate::core::{BusConfig, Error, Result};
use crate::protocol::{BusEvent, ProtocolEngine, Telegram};

/// Bytes read from the port per call
const READ_CHUNK: usize = 64;

/// RS-485 adapter on a local serial port
pub struct SerialBus {
    /// Serial port attached to the bus
    port: Box<dyn SerialPort>,
    /// Device path, for logging
    name: String,
    /// Scratch space for reads
    buffer: [u8; READ_CHUNK],
}

impl SerialBus {
    /// Opens the configured port at 8N1 without flow control
    pub fn open(config: &BusConfig) -> Result<Self> {
        config.validate()?;

        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|e| Error::serial(format!("Failed to open {}: {}", config.port, e)))?;

        info!("Opened {} at {} baud", config.port, config.baud_rate);

        Ok(SerialBus {
            port,
            name: config.port.clone(),
            buffer: [0; READ_CHUNK],
        })
    }

    /// Names of the serial ports present on this machine
    pub fn available_ports() -> Result<Vec<String>> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads whatever the port has and feeds it to `engine`
    ///
    /// A read timeout is not an error; it just yields no events. A zero-length
    /// read means the adapter went away and is reported as a serial error.
    pub fn pump(&mut self, engine: &mut ProtocolEngine) -> Result<Vec<BusEvent>> {
        read_into(&mut self.port, &mut self.buffer, engine)
    }

    /// Writes one telegram to the bus
    pub fn send(&mut self, telegram: &Telegram) -> Result<()> {
        debug!("Sending telegram {} on {}", telegram, self.name);
        self.port.write_all(&telegram.to_bytes())?;
        self.port.flush()?;
        Ok(())
    }
}

fn read_into<R: Read + ?Sized>(
    reader: &mut R,
    buffer: &mut [u8],
    engine: &mut ProtocolEngine,
) -> Result<Vec<BusEvent>> {
    match reader.read(buffer) {
        Ok(0) => {
            warn!("Serial port returned end of stream");
            Err(Error::serial("port closed"))
        }
        Ok(n) => Ok(engine.push_bytes(&buffer[..n])),
        Err(e) if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::Interrupted => {
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}
