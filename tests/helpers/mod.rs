/// Test doubles simulating the register bus, the digital lines, the collector
/// stream and the timer during integration tests.
///
/// Every double is a cheap `Clone` handle over shared state so a test can keep
/// inspecting (or sabotaging) a collaborator after moving it into a sensor or
/// a station.
use meteo_station::protocol::transport::traits::{
    byte_stream::ByteStream,
    digital_line::{GainControl, PulseInput},
    register_bus::RegisterBus,
    station_timer::StationTimer,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use tokio::time::{sleep, Duration, Instant};

//==================================================================================REGISTER_BUS
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBusError {
    /// No device answered at this address (or the bus is offline).
    Nack { address: u8 },
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
/// One transaction seen on the bus.
pub enum BusTransaction {
    Write { address: u8, bytes: Vec<u8> },
    Read { address: u8, register: u8, len: usize },
}

struct Device {
    memory: Vec<u8>,
    pointer: u8,
    /// `(register, value)` writes that latch `(result register, bytes)` into memory.
    conversions: HashMap<(u8, u8), (u8, Vec<u8>)>,
}

#[derive(Default)]
struct BusState {
    devices: HashMap<u8, Device>,
    offline: bool,
    /// `(address, register)` whose writes NACK.
    refused: Option<(u8, u8)>,
    log: Vec<BusTransaction>,
}

#[allow(dead_code)]
#[derive(Clone, Default)]
/// Register-addressed bus hosting simulated devices.
pub struct MockBus {
    state: Rc<RefCell<BusState>>,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device with 256 zeroed registers.
    pub fn attach(&self, address: u8) {
        self.state.borrow_mut().devices.insert(
            address,
            Device {
                memory: vec![0; 256],
                pointer: 0,
                conversions: HashMap::new(),
            },
        );
    }

    /// Preload `bytes` starting at `register`.
    pub fn set_registers(&self, address: u8, register: u8, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        let device = state.devices.get_mut(&address).expect("device attached");
        let start = register as usize;
        device.memory[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Writing `value` to `register` makes `result` readable at `result_register`.
    pub fn on_command(&self, address: u8, register: u8, value: u8, result_register: u8, result: &[u8]) {
        let mut state = self.state.borrow_mut();
        let device = state.devices.get_mut(&address).expect("device attached");
        device
            .conversions
            .insert((register, value), (result_register, result.to_vec()));
    }

    /// Every transaction NACKs while offline.
    pub fn set_offline(&self, offline: bool) {
        self.state.borrow_mut().offline = offline;
    }

    /// Writes selecting `register` on `address` NACK; everything else works.
    pub fn refuse_register(&self, address: u8, register: u8) {
        self.state.borrow_mut().refused = Some((address, register));
    }

    pub fn transactions(&self) -> Vec<BusTransaction> {
        self.state.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    fn with_device<R>(
        &self,
        address: u8,
        f: impl FnOnce(&mut Device) -> R,
    ) -> Result<R, MockBusError> {
        let mut state = self.state.borrow_mut();
        if state.offline {
            return Err(MockBusError::Nack { address });
        }
        state
            .devices
            .get_mut(&address)
            .map(f)
            .ok_or(MockBusError::Nack { address })
    }

    fn read_at(&self, address: u8, register: Option<u8>, buffer: &mut [u8]) -> Result<(), MockBusError> {
        let start = self.with_device(address, |device| {
            if let Some(register) = register {
                device.pointer = register;
            }
            let start = device.pointer;
            for (offset, byte) in buffer.iter_mut().enumerate() {
                *byte = device.memory[(start as usize + offset) % 256];
            }
            device.pointer = device.pointer.wrapping_add(buffer.len() as u8);
            start
        })?;
        self.state.borrow_mut().log.push(BusTransaction::Read {
            address,
            register: start,
            len: buffer.len(),
        });
        Ok(())
    }
}

impl RegisterBus for MockBus {
    type Error = MockBusError;

    async fn write<'a>(&'a mut self, address: u8, bytes: &'a [u8], _timeout_ms: u32) -> Result<(), Self::Error> {
        let refused = self.state.borrow().refused;
        if refused.is_some_and(|(at, register)| at == address && bytes.first() == Some(&register)) {
            return Err(MockBusError::Nack { address });
        }
        self.with_device(address, |device| {
            let Some((&register, payload)) = bytes.split_first() else {
                return;
            };
            device.pointer = register;
            if let Some(&value) = payload.first() {
                if let Some((result_register, result)) = device.conversions.get(&(register, value)) {
                    let start = *result_register as usize;
                    device.memory[start..start + result.len()].copy_from_slice(result);
                    return;
                }
            }
            for (offset, byte) in payload.iter().enumerate() {
                device.memory[(register as usize + offset) % 256] = *byte;
            }
        })?;
        self.state.borrow_mut().log.push(BusTransaction::Write {
            address,
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    async fn read<'a>(&'a mut self, address: u8, buffer: &'a mut [u8], _timeout_ms: u32) -> Result<(), Self::Error> {
        self.read_at(address, None, buffer)
    }

    async fn read_register<'a>(
        &'a mut self,
        address: u8,
        register: u8,
        buffer: &'a mut [u8],
        _timeout_ms: u32,
    ) -> Result<(), Self::Error> {
        self.read_at(address, Some(register), buffer)
    }
}

//==================================================================================BMP085_FIXTURE
/// Datasheet calibration words (AC1..MD) as stored in the EEPROM.
#[allow(dead_code)]
pub const DATASHEET_CALIBRATION: [i32; 11] = [
    408, -72, -14383, 32741, 32757, 23153, 6190, 4, -32768, -8711, 2868,
];
/// Datasheet raw temperature sample.
#[allow(dead_code)]
pub const DATASHEET_UT: u16 = 27898;
/// Datasheet raw pressure sample.
#[allow(dead_code)]
pub const DATASHEET_UP: u32 = 23843;

/// Attach a BMP085 answering with the datasheet calibration and the given raw
/// samples for `oss`.
#[allow(dead_code)]
pub fn install_bmp085(bus: &MockBus, address: u8, ut: u16, up: u32, oss: u8) {
    bus.attach(address);
    let mut eeprom = Vec::with_capacity(22);
    for word in DATASHEET_CALIBRATION {
        eeprom.extend_from_slice(&(word as u16).to_be_bytes());
    }
    bus.set_registers(address, 0xAA, &eeprom);
    set_bmp085_samples(bus, address, ut, up, oss);
}

/// Replace the raw samples a BMP085 returns after its conversion commands.
#[allow(dead_code)]
pub fn set_bmp085_samples(bus: &MockBus, address: u8, ut: u16, up: u32, oss: u8) {
    bus.on_command(address, 0xF4, 0x2E, 0xF6, &ut.to_be_bytes());
    let raw = (up << (8 - oss)).to_be_bytes();
    bus.on_command(address, 0xF4, 0x34 + (oss << 6), 0xF6, &raw[1..]);
}

/// Attach an HH10D EEPROM holding `sensitivity` and `offset`.
#[allow(dead_code)]
pub fn install_hh10d(bus: &MockBus, address: u8, sensitivity: i16, offset: i16) {
    bus.attach(address);
    bus.set_registers(address, 0x0A, &sensitivity.to_be_bytes());
    bus.set_registers(address, 0x0C, &offset.to_be_bytes());
}

//==================================================================================PULSE_INPUT
#[allow(dead_code)]
#[derive(Clone)]
/// Edge source replaying scripted timestamps. Waits forever once the script is
/// exhausted, like a silent line.
pub struct ScriptedInput {
    ticks_per_second: u64,
    edges: Rc<RefCell<VecDeque<u64>>>,
    clock: Rc<Cell<u64>>,
}

#[allow(dead_code)]
impl ScriptedInput {
    pub fn new(ticks_per_second: u64) -> Self {
        Self {
            ticks_per_second,
            edges: Rc::new(RefCell::new(VecDeque::new())),
            clock: Rc::new(Cell::new(1_000)),
        }
    }

    /// Queue one full period (three edges) lasting `period_ticks`.
    pub fn push_period(&self, period_ticks: u64) -> &Self {
        let start = self.clock.get();
        let mut edges = self.edges.borrow_mut();
        edges.push_back(start);
        edges.push_back(start + period_ticks / 2);
        edges.push_back(start + period_ticks);
        self.clock.set(start + 2 * period_ticks);
        self
    }

    /// Queue raw timestamps.
    pub fn push_edges(&self, timestamps: &[u64]) {
        self.edges.borrow_mut().extend(timestamps.iter().copied());
    }

    pub fn pending_edges(&self) -> usize {
        self.edges.borrow().len()
    }
}

impl PulseInput for ScriptedInput {
    fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }

    async fn wait_for_edge(&mut self) -> u64 {
        let next = self.edges.borrow_mut().pop_front();
        match next {
            Some(timestamp) => timestamp,
            None => std::future::pending().await,
        }
    }
}

/// Period (ticks) seen on the pin for a sensor running at `frequency_hz`
/// behind a `divisor` pre-scaler.
#[allow(dead_code)]
pub fn period_ticks(frequency_hz: u64, ticks_per_second: u64, divisor: u64) -> u64 {
    ticks_per_second * divisor / frequency_hz
}

//==================================================================================GAIN_LINE
#[allow(dead_code)]
#[derive(Clone, Default)]
/// Output line recording its level and how many times it toggled.
pub struct MockGainLine {
    high: Rc<Cell<bool>>,
    transitions: Rc<Cell<usize>>,
}

#[allow(dead_code)]
impl MockGainLine {
    /// Line starting low.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transitions(&self) -> usize {
        self.transitions.get()
    }

    fn drive(&self, high: bool) {
        if self.high.get() != high {
            self.transitions.set(self.transitions.get() + 1);
        }
        self.high.set(high);
    }
}

impl GainControl for MockGainLine {
    fn set_high(&mut self) {
        self.drive(true);
    }

    fn set_low(&mut self) {
        self.drive(false);
    }

    fn is_set_high(&self) -> bool {
        self.high.get()
    }
}

//==================================================================================BYTE_STREAM
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStreamError {
    ConnectionReset,
    NotConnected,
}

#[derive(Default)]
struct StreamState {
    max_chunk: usize,
    received: Vec<u8>,
    attempts: usize,
    fail_on_attempt: Option<usize>,
    /// Writes after this many attempts never complete.
    park_after: Option<usize>,
    closed: bool,
}

#[allow(dead_code)]
#[derive(Clone)]
/// Collector link accepting at most `max_chunk` bytes per call.
pub struct ChunkedStream {
    state: Rc<RefCell<StreamState>>,
}

#[allow(dead_code)]
impl ChunkedStream {
    pub fn new(max_chunk: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(StreamState {
                max_chunk,
                ..StreamState::default()
            })),
        }
    }

    /// Link that never accepts a byte.
    pub fn stalled() -> Self {
        Self::new(0)
    }

    /// Fail with `ConnectionReset` on the given (1-based) attempt.
    pub fn failing_on(attempt: usize, max_chunk: usize) -> Self {
        let stream = Self::new(max_chunk);
        stream.state.borrow_mut().fail_on_attempt = Some(attempt);
        stream
    }

    /// Accept `max_chunk` bytes per call for `attempts` calls, then block every
    /// write forever, like a peer whose receive window stays full.
    pub fn parked_after(attempts: usize, max_chunk: usize) -> Self {
        let stream = Self::new(max_chunk);
        stream.state.borrow_mut().park_after = Some(attempts);
        stream
    }

    pub fn received(&self) -> Vec<u8> {
        self.state.borrow().received.clone()
    }

    pub fn attempts(&self) -> usize {
        self.state.borrow().attempts
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }
}

impl ByteStream for ChunkedStream {
    type Error = MockStreamError;

    async fn send<'a>(&'a mut self, bytes: &'a [u8]) -> Result<usize, Self::Error> {
        {
            let mut state = self.state.borrow_mut();
            state.attempts += 1;
            if state.closed {
                return Err(MockStreamError::NotConnected);
            }
            if state.fail_on_attempt == Some(state.attempts) {
                return Err(MockStreamError::ConnectionReset);
            }
        }
        let parked = {
            let state = self.state.borrow();
            state.park_after.is_some_and(|limit| state.attempts > limit)
        };
        if parked {
            return std::future::pending().await;
        }
        // Let the clock move between attempts on a stalled link.
        tokio::task::yield_now().await;

        let mut state = self.state.borrow_mut();
        let accepted = bytes.len().min(state.max_chunk);
        state.received.extend_from_slice(&bytes[..accepted]);
        Ok(accepted)
    }

    async fn close(&mut self) {
        self.state.borrow_mut().closed = true;
    }
}

//==================================================================================TIMER
#[allow(dead_code)]
#[derive(Clone)]
/// Timer based on `tokio::time` recording every requested delay.
pub struct TokioTimer {
    origin: Instant,
    delays: Rc<RefCell<Vec<u32>>>,
}

#[allow(dead_code)]
impl TokioTimer {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            delays: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn delays(&self) -> Vec<u32> {
        self.delays.borrow().clone()
    }
}

impl StationTimer for TokioTimer {
    async fn delay_ms(&mut self, millis: u32) {
        self.delays.borrow_mut().push(millis);
        sleep(Duration::from_millis(millis as u64)).await;
    }

    fn now_ms(&mut self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
