//! Acquisition loop: measure every sensor, render the report, push it to the
//! collector, pause, repeat.
//!
//! Everything runs sequentially on one task. Sensor failures are absorbed
//! (stale readings keep the report flowing); transmission failures end the
//! run, since a report with nowhere to go is not worth producing.
use core::convert::Infallible;

use crate::core::ReportBuffer;
use crate::error::{ReportError, SendError, StationError};
use crate::protocol::transport::reliable_send::ReliableSend;
use crate::protocol::transport::traits::{
    byte_stream::ByteStream,
    digital_line::{GainControl, PulseInput},
    register_bus::RegisterBus,
    station_timer::StationTimer,
};
use crate::protocol::transport::{CYCLE_PAUSE_MS, REPORT_SEND_TIMEOUT_MS};
use crate::sensors::{Sensor, StationSensor};

/// Runtime knobs of the acquisition loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationConfig {
    /// Deadline for pushing one report (ms).
    pub send_timeout_ms: u32,
    /// Pause after each cycle (ms).
    pub cycle_pause_ms: u32,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: REPORT_SEND_TIMEOUT_MS,
            cycle_pause_ms: CYCLE_PAUSE_MS,
        }
    }
}

/// Result of one successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Sensors that republished their previous value this cycle.
    pub stale_sensors: usize,
    /// Size of the transmitted report.
    pub bytes_sent: usize,
}

/// Render the report: a leading newline, then each sensor's lines in array order.
pub fn assemble_report<I: PulseInput, O: GainControl>(
    sensors: &[StationSensor<I, O>],
) -> Result<ReportBuffer, ReportError> {
    let mut report = ReportBuffer::new();
    if !report.push_bytes(b"\n") {
        return Err(ReportError::BufferTooSmall {
            capacity: report.capacity(),
        });
    }
    for sensor in sensors {
        sensor.format_reading(&mut report)?;
    }
    Ok(report)
}

pub struct WeatherStation<B, T, S, I, O, const N: usize>
where
    B: RegisterBus,
    T: StationTimer,
    S: ByteStream,
    I: PulseInput,
    O: GainControl,
{
    /// Register bus shared by every sensor.
    bus: B,
    timer: T,
    /// Connected stream towards the collector.
    stream: S,
    sensors: [StationSensor<I, O>; N],
    config: StationConfig,
}

impl<B, T, S, I, O, const N: usize> WeatherStation<B, T, S, I, O, N>
where
    B: RegisterBus,
    T: StationTimer,
    S: ByteStream,
    S::Error: core::fmt::Debug,
    I: PulseInput,
    O: GainControl,
{
    /// Assemble a station from already constructed (calibrated) sensors.
    pub fn new(
        bus: B,
        timer: T,
        stream: S,
        sensors: [StationSensor<I, O>; N],
        config: StationConfig,
    ) -> Self {
        Self {
            bus,
            timer,
            stream,
            sensors,
            config,
        }
    }

    /// Refresh every sensor in array order; returns how many went stale.
    pub async fn acquire(&mut self) -> usize {
        let mut stale = 0;
        for sensor in self.sensors.iter_mut() {
            let reading = sensor.take_measurement(&mut self.bus, &mut self.timer).await;
            if !reading.is_fresh() {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: publishing previous reading", sensor.name());
                stale += 1;
            }
        }
        stale
    }

    /// Render the current readings.
    pub fn report(&self) -> Result<ReportBuffer, ReportError> {
        assemble_report(&self.sensors)
    }

    /// One acquisition cycle: measure, render, transmit.
    ///
    /// A transport error closes the stream before being returned; a timeout is
    /// returned as-is.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, StationError<S::Error>> {
        let stale_sensors = self.acquire().await;
        let report = self.report()?;

        let sent = self
            .stream
            .send_all(report.as_bytes(), self.config.send_timeout_ms, &mut self.timer)
            .await;

        match sent {
            Ok(()) => Ok(CycleOutcome {
                stale_sensors,
                bytes_sent: report.len(),
            }),
            Err(err) => {
                if let SendError::Transport(_) = err {
                    #[cfg(feature = "defmt")]
                    defmt::error!("Collector link lost, closing stream");
                    self.stream.close().await;
                }
                Err(StationError::Send(err))
            }
        }
    }

    /// Cycle forever with a fixed pause between cycles. Returns only on an
    /// unrecoverable error.
    pub async fn run(&mut self) -> Result<Infallible, StationError<S::Error>> {
        loop {
            self.run_cycle().await?;
            self.timer.delay_ms(self.config.cycle_pause_ms).await;
        }
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn sensors(&self) -> &[StationSensor<I, O>; N] {
        &self.sensors
    }

    /// Tear the station down, returning its collaborators.
    pub fn into_parts(self) -> (B, T, S, [StationSensor<I, O>; N]) {
        (self.bus, self.timer, self.stream, self.sensors)
    }
}
