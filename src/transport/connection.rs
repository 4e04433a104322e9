use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::core::{Address, BusConfig, Error, Result, VariableCode};
use crate::protocol::{
    codec::TelegramCodec,
    convert::encode_fan_speed,
    telegram::{build_poll_request, build_set_command},
    BusEvent, EngineSnapshot, ProtocolEngine, Telegram,
};

/// Requests accepted by a running connection
#[derive(Debug)]
pub enum BusCommand {
    /// Write a telegram to the bus
    Send(Telegram),
    /// Reply with a copy of the engine's tables
    Snapshot(oneshot::Sender<EngineSnapshot>),
}

/// Cloneable handle for talking to a running [`BusConnection`]
#[derive(Debug, Clone)]
pub struct BusHandle {
    /// Address outgoing telegrams are sent from
    local_address: Address,
    command_tx: mpsc::Sender<BusCommand>,
}

impl BusHandle {
    pub fn local_address(&self) -> Address {
        self.local_address
    }

    /// Queues a telegram for transmission
    pub async fn send(&self, telegram: Telegram) -> Result<()> {
        self.command_tx
            .send(BusCommand::Send(telegram))
            .await
            .map_err(|e| Error::channel_closed(format!("Failed to queue telegram: {}", e)))
    }

    /// Asks the master to set `code` to `value`
    pub async fn set_variable(&self, code: VariableCode, value: u8) -> Result<()> {
        self.send(build_set_command(self.local_address, code, value)).await
    }

    /// Asks the master for the value of `code`
    pub async fn poll_variable(&self, code: VariableCode) -> Result<()> {
        self.send(build_poll_request(self.local_address, code)).await
    }

    /// Sets the fan speed to `level` (1-8)
    pub async fn set_fan_speed(&self, level: u8) -> Result<()> {
        let raw = encode_fan_speed(level).ok_or_else(|| {
            Error::invalid_argument(format!("fan speed level {} is outside 1-8", level))
        })?;
        self.set_variable(VariableCode::FAN_SPEED, raw).await
    }

    /// Fetches a copy of the connection's variable and traffic tables
    pub async fn snapshot(&self) -> Result<EngineSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(BusCommand::Snapshot(reply_tx))
            .await
            .map_err(|e| Error::channel_closed(format!("Failed to request snapshot: {}", e)))?;
        reply_rx
            .await
            .map_err(|e| Error::channel_closed(format!("Snapshot reply dropped: {}", e)))
    }
}

/// Drives a [`ProtocolEngine`] over an async byte stream
///
/// The connection task is the engine's only writer: incoming bytes and
/// outgoing commands are interleaved on one task, so bytes are always
/// processed in arrival order. Events are published without waiting; while
/// the event receiver is full new events are dropped.
pub struct BusConnection<T> {
    engine: ProtocolEngine,
    framed: Framed<T, TelegramCodec>,
    command_rx: mpsc::Receiver<BusCommand>,
    event_tx: mpsc::Sender<BusEvent>,
}

impl<T> BusConnection<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Creates a connection plus the handle and event receiver that go with it
    pub fn new(io: T, config: &BusConfig) -> Result<(Self, BusHandle, mpsc::Receiver<BusEvent>)> {
        let engine = ProtocolEngine::from_config(config)?;
        let (command_tx, command_rx) = mpsc::channel(config.event_capacity);
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);

        let handle = BusHandle {
            local_address: engine.local_address(),
            command_tx,
        };
        let connection = BusConnection {
            engine,
            framed: Framed::new(io, TelegramCodec::new()),
            command_rx,
            event_tx,
        };
        Ok((connection, handle, event_rx))
    }

    /// Creates a connection and runs it on a new task
    pub fn spawn(
        io: T,
        config: &BusConfig,
    ) -> Result<(BusHandle, mpsc::Receiver<BusEvent>, JoinHandle<Result<()>>)> {
        let (connection, handle, event_rx) = Self::new(io, config)?;
        let task = tokio::spawn(connection.run());
        Ok((handle, event_rx, task))
    }

    /// Runs until the byte stream ends, or until every handle and the event
    /// receiver have been dropped
    pub async fn run(mut self) -> Result<()> {
        let mut commands_open = true;
        let mut events_open = true;
        let mut dropped_events: u64 = 0;

        loop {
            tokio::select! {
                command = self.command_rx.recv(), if commands_open => match command {
                    Some(BusCommand::Send(telegram)) => {
                        debug!("Sending telegram {}", telegram);
                        self.framed.send(telegram).await?;
                    }
                    Some(BusCommand::Snapshot(reply)) => {
                        let _ = reply.send(self.engine.snapshot());
                    }
                    None => {
                        debug!("All bus handles dropped");
                        commands_open = false;
                    }
                },

                frame = self.framed.next() => match frame {
                    Some(Ok(sync_event)) => {
                        for event in self.engine.handle_sync_event(sync_event) {
                            if !events_open {
                                break;
                            }
                            match self.event_tx.try_send(event) {
                                Ok(()) => {
                                    if dropped_events > 0 {
                                        info!("Event receiver caught up, {} events dropped", dropped_events);
                                        dropped_events = 0;
                                    }
                                }
                                Err(TrySendError::Full(event)) => {
                                    if dropped_events == 0 {
                                        warn!("Event receiver is full, dropping {:?}", event);
                                    }
                                    dropped_events += 1;
                                }
                                Err(TrySendError::Closed(_)) => {
                                    debug!("Event receiver dropped");
                                    events_open = false;
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Bus read failed: {}", e);
                        return Err(e);
                    }
                    None => {
                        info!("Bus stream closed");
                        return Ok(());
                    }
                },
            }

            if !commands_open && !events_open {
                info!("Nobody is listening, closing bus connection");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{telegram::encode, variables::DecodedValue};
    use std::time::Duration;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_events_from_stream() {
        let (mut bus, io) = duplex(64);
        let (handle, mut events, task) = BusConnection::spawn(io, &BusConfig::default()).unwrap();

        let telegram = encode(Address::MASTER, Address::PANELS, 0x29, 0x07);
        bus.write_all(&[0x55]).await.unwrap();
        bus.write_all(&telegram.to_bytes()).await.unwrap();

        assert!(matches!(events.recv().await, Some(BusEvent::ByteDropped { byte: 0x55, .. })));
        assert_eq!(events.recv().await, Some(BusEvent::FrameAccepted(telegram)));
        match events.recv().await {
            Some(BusEvent::VariableUpdated(update)) => {
                assert_eq!(update.decoded, DecodedValue::FanSpeed(3));
            }
            other => panic!("unexpected event {:?}", other),
        }

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.variable(VariableCode::FAN_SPEED).unwrap().raw, 0x07);

        drop(bus);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_commands_reach_the_wire() {
        let (mut bus, io) = duplex(64);
        let (handle, _events, _task) = BusConnection::spawn(io, &BusConfig::default()).unwrap();

        handle.set_fan_speed(8).await.unwrap();
        handle.poll_variable(VariableCode::TEMP_INSIDE).await.unwrap();

        let mut wire = [0u8; 12];
        bus.read_exact(&mut wire).await.unwrap();
        assert_eq!(&wire[..6], &[0x01, 0x22, 0x11, 0x29, 0xFF, 0x5C]);
        assert_eq!(&wire[6..], &[0x01, 0x22, 0x11, 0x00, 0x34, 0x68]);
    }

    #[tokio::test]
    async fn test_full_event_channel_does_not_block_commands() {
        let (mut bus, io) = duplex(64);
        let mut config = BusConfig::default();
        config.event_capacity = 1;
        let (handle, mut events, _task) = BusConnection::spawn(io, &config).unwrap();

        let reports = [
            encode(Address::MASTER, Address::PANELS, 0x29, 0x07),
            encode(Address::MASTER, Address::PANELS, 0x32, 0x73),
            encode(Address::MASTER, Address::PANELS, 0x34, 0x64),
        ];
        for telegram in &reports {
            bus.write_all(&telegram.to_bytes()).await.unwrap();
        }

        // Nobody drains the events while the tables fill up
        let snapshot = timeout(Duration::from_secs(2), async {
            loop {
                let snapshot = handle.snapshot().await.unwrap();
                if snapshot.variables.len() == reports.len() {
                    return snapshot;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("snapshot not answered while events were pending");
        assert_eq!(snapshot.variable(VariableCode::FAN_SPEED).unwrap().raw, 0x07);

        handle.set_fan_speed(8).await.unwrap();
        let mut wire = [0u8; 6];
        timeout(Duration::from_secs(2), bus.read_exact(&mut wire))
            .await
            .expect("telegram not sent while events were pending")
            .unwrap();
        assert_eq!(wire, [0x01, 0x22, 0x11, 0x29, 0xFF, 0x5C]);

        // Only the first event fit, the rest were dropped
        assert_eq!(events.recv().await, Some(BusEvent::FrameAccepted(reports[0])));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_fan_speed_rejected_before_sending() {
        let (_bus, io) = duplex(64);
        let (handle, _events, _task) = BusConnection::spawn(io, &BusConfig::default()).unwrap();
        assert!(matches!(handle.set_fan_speed(0).await, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_connection_stops_when_nobody_listens() {
        let (mut bus, io) = duplex(64);
        let (handle, events, task) = BusConnection::spawn(io, &BusConfig::default()).unwrap();
        drop(handle);
        drop(events);

        // One frame is enough to notice the event receiver is gone
        let telegram = encode(Address::MASTER, Address::PANELS, 0x2A, 0x30);
        bus.write_all(&telegram.to_bytes()).await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (_bus, io) = duplex(8);
        let mut config = BusConfig::default();
        config.event_capacity = 0;
        assert!(BusConnection::new(io, &config).is_err());
    }
}
