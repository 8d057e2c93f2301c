//! # Station Example
//!
//! Runs the acquisition core on a desktop against simulated hardware:
//! - a register bus hosting a BMP085 and the HH10D calibration EEPROM
//! - two square-wave generators standing in for the frequency outputs
//! - a local TCP collector printing every report it receives
//!
//! ```bash
//! cargo run --example station
//! ```

use meteo_station::infra::compensation::Oversampling;
use meteo_station::protocol::transport::DEFAULT_FREQUENCY_DIVISOR as FREQUENCY_DIVISOR;
use meteo_station::protocol::transport::traits::{
    byte_stream::ByteStream,
    digital_line::{GainControl, PulseInput},
    register_bus::RegisterBus,
    station_timer::StationTimer,
};
use meteo_station::sensors::{bmp085, hh10d, tls230rlf::Tls230rlf, StationSensor};
use meteo_station::station::{StationConfig, WeatherStation};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, sleep_until, Duration, Instant};

const CYCLES: usize = 3;

// ==========================================================================
// Simulated hardware
// ==========================================================================

/// Two-device register bus: BMP085 at 0x77, HH10D EEPROM at 0x51.
struct SimulatedBus {
    bmp085: [u8; 256],
    hh10d: [u8; 256],
    pointer: u8,
}

impl SimulatedBus {
    fn new() -> Self {
        let mut bmp085 = [0u8; 256];
        // Datasheet calibration block (AC1..MD).
        let calibration: [i16; 11] = [
            408, -72, -14383, 32741, 32757, 23153, 6190, 4, -32768, -8711, 2868,
        ];
        for (index, word) in calibration.iter().enumerate() {
            let at = 0xAA + 2 * index;
            bmp085[at..at + 2].copy_from_slice(&word.to_be_bytes());
        }

        let mut hh10d = [0u8; 256];
        hh10d[0x0A..0x0C].copy_from_slice(&512i16.to_be_bytes());
        hh10d[0x0C..0x0E].copy_from_slice(&6800i16.to_be_bytes());

        Self {
            bmp085,
            hh10d,
            pointer: 0,
        }
    }

    fn device(&mut self, address: u8) -> Result<&mut [u8; 256], DemoBusError> {
        match address {
            bmp085::DEFAULT_ADDRESS => Ok(&mut self.bmp085),
            hh10d::DEFAULT_ADDRESS => Ok(&mut self.hh10d),
            _ => Err(DemoBusError::Nack(address)),
        }
    }
}

#[derive(Debug)]
enum DemoBusError {
    Nack(#[allow(dead_code)] u8),
}

impl RegisterBus for SimulatedBus {
    type Error = DemoBusError;

    async fn write<'a>(&'a mut self, address: u8, bytes: &'a [u8], _timeout_ms: u32) -> Result<(), Self::Error> {
        let memory = self.device(address)?;
        match bytes {
            // Temperature conversion: datasheet UT.
            [0xF4, 0x2E] => memory[0xF6..0xF8].copy_from_slice(&27898u16.to_be_bytes()),
            // Pressure conversion: datasheet UP at oss 0.
            [0xF4, 0x34] => memory[0xF6..0xF9].copy_from_slice(&[0x5D, 0x23, 0x00]),
            _ => {}
        }
        if let Some(&register) = bytes.first() {
            self.pointer = register;
        }
        Ok(())
    }

    async fn read<'a>(&'a mut self, address: u8, buffer: &'a mut [u8], _timeout_ms: u32) -> Result<(), Self::Error> {
        let start = self.pointer as usize;
        let memory = self.device(address)?;
        buffer.copy_from_slice(&memory[start..start + buffer.len()]);
        Ok(())
    }

    async fn read_register<'a>(
        &'a mut self,
        address: u8,
        register: u8,
        buffer: &'a mut [u8],
        timeout_ms: u32,
    ) -> Result<(), Self::Error> {
        self.pointer = register;
        self.read(address, buffer, timeout_ms).await
    }
}

/// Square wave on a pin, timestamped in microseconds.
struct SquareWave {
    origin: Instant,
    half_period_us: u64,
}

impl SquareWave {
    /// `frequency_hz` is the sensor's output, before the ÷256 pre-scaler.
    fn new(frequency_hz: u64) -> Self {
        let on_pin = frequency_hz as f64 / FREQUENCY_DIVISOR as f64;
        Self {
            origin: Instant::now(),
            half_period_us: (500_000.0 / on_pin) as u64,
        }
    }
}

impl PulseInput for SquareWave {
    fn ticks_per_second(&self) -> u64 {
        1_000_000
    }

    async fn wait_for_edge(&mut self) -> u64 {
        let now_us = self.origin.elapsed().as_micros() as u64;
        let edge_us = (now_us / self.half_period_us + 1) * self.half_period_us;
        sleep_until(self.origin + Duration::from_micros(edge_us)).await;
        edge_us
    }
}

struct GainPin {
    high: bool,
}

impl GainControl for GainPin {
    fn set_high(&mut self) {
        println!("   [gain] high range");
        self.high = true;
    }

    fn set_low(&mut self) {
        println!("   [gain] low range");
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

struct TokioTimer {
    origin: Instant,
}

impl StationTimer for TokioTimer {
    async fn delay_ms(&mut self, millis: u32) {
        sleep(Duration::from_millis(millis as u64)).await;
    }

    fn now_ms(&mut self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Client side of the collector connection.
struct TcpLink(TcpStream);

impl ByteStream for TcpLink {
    type Error = std::io::Error;

    async fn send<'a>(&'a mut self, bytes: &'a [u8]) -> Result<usize, Self::Error> {
        self.0.write(bytes).await
    }

    async fn close(&mut self) {
        let _ = self.0.shutdown().await;
    }
}

// ==========================================================================
// Demo
// ==========================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== meteo-station demo ===\n");

    // 1. Collector: print whatever arrives.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let collector_address = listener.local_addr()?;
    let collector = tokio::spawn(async move {
        let (mut socket, peer) = listener.accept().await?;
        println!("   [collector] connection from {peer}");
        let mut buffer = [0u8; 1024];
        loop {
            let read = socket.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            print!("{}", String::from_utf8_lossy(&buffer[..read]));
        }
        Ok::<_, std::io::Error>(())
    });

    // 2. Sensors, each calibrated once on the shared bus.
    println!("1. Calibrating sensors");
    let mut bus = SimulatedBus::new();
    let mut timer = TokioTimer {
        origin: Instant::now(),
    };

    let pressure = bmp085::Bmp085::new(
        &mut bus,
        &mut timer,
        bmp085::DEFAULT_ADDRESS,
        Oversampling::UltraLowPower,
    )
    .await
    .map_err(|err| format!("BMP085: {err}"))?;
    let humidity = hh10d::Hh10d::new(
        &mut bus,
        &mut timer,
        hh10d::DEFAULT_ADDRESS,
        SquareWave::new(6_400),
        FREQUENCY_DIVISOR,
    )
    .await;
    let light = Tls230rlf::new(
        &mut timer,
        SquareWave::new(40_000),
        GainPin { high: false },
        FREQUENCY_DIVISOR,
    )
    .await;
    println!(
        "   BMP085 @ {:#04X} ({:?}), HH10D @ {:#04X}",
        pressure.address(),
        pressure.oversampling(),
        humidity.address()
    );
    println!(
        "   {} Pa, {:.1} °C, {:.1} %RH, {:.2} lm\n",
        pressure.pascals(),
        pressure.celsius(),
        humidity.relative_humidity(),
        light.illuminance()
    );

    // 3. Acquisition cycles.
    println!("2. Running {CYCLES} cycles towards {collector_address}");
    let link = TcpLink(TcpStream::connect(collector_address).await?);
    let mut station = WeatherStation::new(
        bus,
        timer,
        link,
        [
            StationSensor::PressureTemperature(pressure),
            StationSensor::Humidity(humidity),
            StationSensor::Light(light),
        ],
        StationConfig::default(),
    );

    for cycle in 1..=CYCLES {
        let outcome = station
            .run_cycle()
            .await
            .map_err(|err| format!("cycle {cycle}: {err}"))?;
        println!(
            "   [station] cycle {cycle}: {} bytes, {} stale",
            outcome.bytes_sent, outcome.stale_sensors
        );
        sleep(Duration::from_millis(station.config().cycle_pause_ms as u64)).await;
    }

    let (_bus, _timer, mut link, _sensors) = station.into_parts();
    link.close().await;
    collector.await??;

    println!("\n=== Demo finished ===");
    Ok(())
}
