use std::{
    fmt::{self, Display},
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use log::*;
use serde::{Deserialize, Serialize};

use crate::core::{Cartridge, Controller, Cpu, Mapper, Memory, Nes, Ppu, Settings};

/// Version byte save states start with
const STATE_VERSION: u8 = 1;

/// What a [Session] is currently doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Not running, either freshly created or stopped
    Stopped,
    /// Advancing frames
    Running,
    /// Execution hit a halting opcode and cannot continue without a reset
    Crashed,
}

/// The front-end boundary of a [Session].
///
/// A session calls back through this trait whenever it has something the
/// front-end should present. All methods default to doing nothing, so a
/// host only implements what it cares about.
pub trait Host {
    /// Called after every completed frame, with the picture ready in the
    /// machine's PPU. `skip` is set when the session has fallen behind
    /// real time and the host should drop the blit to catch up; audio is
    /// still delivered and the frame is still paced.
    fn on_frame(&mut self, _nes: &Nes, _skip: bool) {}
    /// Called with the audio samples produced during the last frame.
    fn on_samples(&mut self, _samples: &[f32]) {}
    /// Called when the session stops, with the CPU fault if one caused it.
    fn on_stop(&mut self, _error: Option<&str>) {}
    /// Called while a ROM loads, with a rough percentage of the work done.
    fn on_load_progress(&mut self, _percent: u8) {}
}

/// A [Host] that ignores every callback. Useful headlessly.
pub struct NullHost;
impl Host for NullHost {}

/// Controller state shared between threads.
///
/// A front-end keeps one clone on its input thread and writes button
/// states into it; the session reads it at the start of every frame.
#[derive(Clone, Default)]
pub struct SharedInput {
    bits: [Arc<AtomicU8>; 2],
}

impl SharedInput {
    /// Set the state of one of the two controllers.
    pub fn set(&self, index: usize, state: Controller) {
        self.bits[index].store(state.to_bits(), Ordering::Relaxed);
    }
    /// Get the state of one of the two controllers.
    pub fn get(&self, index: usize) -> Controller {
        Controller::from_bits(self.bits[index].load(Ordering::Relaxed))
    }
}

/// Why a save state failed to apply.
///
/// A failed [Session::state_load] leaves the running machine untouched.
#[derive(Debug)]
pub enum StateError {
    /// The data starts with a version this build does not understand
    UnsupportedVersion(u8),
    /// The data ends before the header does
    Truncated,
    /// The state was taken with a different ROM loaded
    RomMismatch,
    /// The body failed to encode or decode
    Corrupt(postcard::Error),
}

impl Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::UnsupportedVersion(v) => write!(f, "Unsupported save state version {}", v),
            StateError::Truncated => write!(f, "Save state is truncated"),
            StateError::RomMismatch => write!(f, "Save state was taken from a different ROM"),
            StateError::Corrupt(e) => write!(f, "Save state body is corrupt: {}", e),
        }
    }
}
impl std::error::Error for StateError {}

// Everything a save state holds. RAM, VRAM and OAM are stored as their
// own fields rather than inside their owning components, so the layout
// stays stable as the components change shape.
#[derive(Serialize)]
struct SaveStateRef<'a> {
    ram: &'a Memory,
    vram: &'a Memory,
    oam: &'a Memory,
    cpu: &'a Cpu,
    mapper: &'a dyn Mapper,
    ppu: &'a Ppu,
}
#[derive(Deserialize)]
struct SaveState {
    ram: Memory,
    vram: Memory,
    oam: Memory,
    cpu: Cpu,
    mapper: Box<dyn Mapper>,
    ppu: Ppu,
}

/// An emulation session: a [Nes] plus everything a front-end needs to
/// run it. Loads ROMs, starts and stops, paces itself against real time
/// or audio consumption, and takes and restores save states.
pub struct Session<H: Host = NullHost> {
    /// The machine being emulated
    pub nes: Nes,
    /// Settings applied while running
    pub settings: Settings,
    host: H,
    input: SharedInput,
    state: RunState,
    last_frame: Option<Instant>,
}

impl Session<NullHost> {
    /// Create a session with no ROM loaded and no host.
    pub fn new() -> Session<NullHost> {
        Session::with_host(NullHost)
    }
}

impl Default for Session<NullHost> {
    fn default() -> Self {
        Session::new()
    }
}

impl<H: Host> Session<H> {
    /// Create a session that reports to the given host.
    pub fn with_host(host: H) -> Session<H> {
        Session {
            nes: Nes::new(),
            settings: Settings::default(),
            host,
            input: SharedInput::default(),
            state: RunState::Stopped,
            last_frame: None,
        }
    }
    /// Load an iNES ROM image, optionally with the battery backed RAM
    /// saved from a previous session. Stops the session and resets the
    /// machine into the new cartridge.
    pub fn load_rom(&mut self, bytes: &[u8], savedata: Option<Vec<u8>>) -> Result<(), String> {
        self.host.on_load_progress(0);
        let cartridge = Cartridge::from_ines(bytes, savedata)?;
        info!("Loaded {} cartridge", cartridge);
        self.stop();
        self.nes.set_cartridge(cartridge);
        self.host.on_load_progress(100);
        Ok(())
    }
    /// The input handle front-ends write controller states into.
    pub fn input(&self) -> SharedInput {
        self.input.clone()
    }
    /// What the session is currently doing.
    pub fn run_state(&self) -> RunState {
        self.state
    }
    /// Start advancing frames. A crashed session must be [Session::reset] first.
    pub fn start(&mut self) {
        if self.state == RunState::Crashed {
            warn!("Refusing to start a crashed session, reset it first");
            return;
        }
        self.state = RunState::Running;
        self.last_frame = None;
        self.nes.apu.start();
    }
    /// Stop advancing frames and discard pending audio.
    pub fn stop(&mut self) {
        if self.state == RunState::Running {
            self.host.on_stop(None);
        }
        self.state = RunState::Stopped;
        self.nes.apu.stop();
    }
    /// Press the reset button. A crashed session becomes stopped.
    pub fn reset(&mut self) {
        self.nes.reset();
        if self.state == RunState::Crashed {
            self.state = RunState::Stopped;
        }
    }
    /// Advance one frame: latch input, run the machine to the next
    /// VBlank, report video and audio to the host, and pace.
    ///
    /// On a CPU fault the session moves to [RunState::Crashed] and the
    /// host is told why.
    pub fn advance_frame(&mut self) -> Result<u32, String> {
        let started = Instant::now();
        // Flag the frame for skipping when the gap since the last one has
        // grown past two frame periods, i.e. we are a full frame behind
        let skip = self
            .last_frame
            .is_some_and(|last| started.duration_since(last) > 2 * self.frame_duration());
        self.last_frame = Some(started);
        (0..2).for_each(|i| {
            let state = self.input.get(i);
            self.nes.set_controller_state(i, state);
        });
        let settings = self.settings;
        let cycles = match self.nes.advance_frame(&settings) {
            Ok(cycles) => cycles,
            Err(e) => {
                self.state = RunState::Crashed;
                self.host.on_stop(Some(&e));
                return Err(e);
            }
        };
        self.host.on_frame(&self.nes, skip);
        let samples = self.nes.apu.drain_samples();
        if !samples.is_empty() {
            self.host.on_samples(&samples);
        }
        self.pace(started);
        Ok(cycles)
    }
    /// Advance frames until stopped (or crashed).
    pub fn run(&mut self) {
        while self.state == RunState::Running {
            if self.advance_frame().is_err() {
                break;
            }
        }
    }
    fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(self.settings.region.frame_millis() / 1000.0)
    }
    // Sleep off the rest of the frame, either against the audio queue or
    // against the wall clock. With sound disabled the queue never fills,
    // so the clock takes over even when pacing to audio.
    fn pace(&mut self, started: Instant) {
        if self.settings.pace_to_audio && self.settings.sound_enabled && self.nes.apu.is_running() {
            let millis = self.nes.apu.millis_until_free();
            if millis > 0 {
                thread::sleep(Duration::from_millis(millis));
            }
        } else {
            let frame = self.frame_duration();
            let elapsed = started.elapsed();
            if elapsed < frame {
                thread::sleep(frame - elapsed);
            }
        }
    }
    /// Capture the machine into a save state.
    ///
    /// The data starts with a version byte and a checksum of the loaded
    /// PRG ROM, so a state can be refused instead of restoring it onto
    /// the wrong ROM. The APU and controllers are not captured; audio
    /// restarts cleanly on the next frame.
    pub fn state_save(&self) -> Result<Vec<u8>, StateError> {
        let state = SaveStateRef {
            ram: &self.nes.ram,
            vram: &self.nes.ppu.nametable_ram,
            oam: &self.nes.ppu.oam,
            cpu: &self.nes.cpu,
            mapper: self.nes.cartridge.mapper.as_ref(),
            ppu: &self.nes.ppu,
        };
        let mut bytes = vec![STATE_VERSION];
        bytes.extend_from_slice(&self.nes.cartridge.prg_checksum().to_le_bytes());
        bytes.extend(postcard::to_allocvec(&state).map_err(StateError::Corrupt)?);
        Ok(bytes)
    }
    /// Restore the machine from a save state taken by [Session::state_save].
    ///
    /// The data is validated and decoded in full before any of it is
    /// applied, so a failure leaves the machine exactly as it was.
    pub fn state_load(&mut self, bytes: &[u8]) -> Result<(), StateError> {
        let (&version, rest) = bytes.split_first().ok_or(StateError::Truncated)?;
        if version != STATE_VERSION {
            return Err(StateError::UnsupportedVersion(version));
        }
        if rest.len() < 4 {
            return Err(StateError::Truncated);
        }
        let (sum, body) = rest.split_at(4);
        let checksum = u32::from_le_bytes([sum[0], sum[1], sum[2], sum[3]]);
        if checksum != self.nes.cartridge.prg_checksum() {
            return Err(StateError::RomMismatch);
        }
        let state: SaveState = postcard::from_bytes(body).map_err(StateError::Corrupt)?;
        self.nes.ram = state.ram;
        self.nes.cpu = state.cpu;
        self.nes.cartridge.mapper = state.mapper;
        self.nes.ppu = state.ppu;
        self.nes.ppu.nametable_ram = state.vram;
        self.nes.ppu.oam = state.oam;
        debug!("Restored save state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ines(prg_fill: u8) -> Vec<u8> {
        let mut bytes = vec![b'N', b'E', b'S', 0x1A, 1, 1, 0, 0];
        bytes.resize(16, 0);
        let mut prg = vec![prg_fill; 0x4000];
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0x80;
        bytes.extend_from_slice(&prg);
        bytes.extend_from_slice(&[0; 0x2000]);
        bytes
    }

    #[test]
    fn test_run_state_transitions() {
        let mut session = Session::new();
        assert_eq!(session.run_state(), RunState::Stopped);
        session.start();
        assert_eq!(session.run_state(), RunState::Running);
        assert!(session.nes.apu.is_running());
        session.stop();
        assert_eq!(session.run_state(), RunState::Stopped);
        assert!(!session.nes.apu.is_running());
    }

    #[test]
    fn test_crash_requires_reset() {
        let mut session = Session::new();
        // An empty PRG ROM padded with $02 jams immediately
        session.load_rom(&ines(0x02), None).unwrap();
        session.start();
        assert!(session.advance_frame().is_err());
        assert_eq!(session.run_state(), RunState::Crashed);
        // Starting again is refused until reset
        session.start();
        assert_eq!(session.run_state(), RunState::Crashed);
        session.reset();
        assert_eq!(session.run_state(), RunState::Stopped);
    }

    #[test]
    fn test_shared_input() {
        let session = Session::new();
        let input = session.input();
        let mut state = Controller::new();
        state.a = true;
        input.set(0, state);
        // A clone sees the same state
        assert!(session.input().get(0).a);
        assert!(!session.input().get(1).a);
    }

    #[test]
    fn test_state_round_trip() {
        let mut session = Session::new();
        session.load_rom(&ines(0xEA), None).unwrap();
        session.nes.ram.write(0x10, 0x42);
        session.nes.cpu.a = 0x99;
        let state = session.state_save().unwrap();
        session.nes.ram.write(0x10, 0x00);
        session.nes.cpu.a = 0x00;
        session.state_load(&state).unwrap();
        assert_eq!(session.nes.ram.read(0x10), 0x42);
        assert_eq!(session.nes.cpu.a, 0x99);
    }

    #[test]
    fn test_state_version_check() {
        let mut session = Session::new();
        session.load_rom(&ines(0xEA), None).unwrap();
        let mut state = session.state_save().unwrap();
        state[0] = 9;
        assert!(matches!(
            session.state_load(&state),
            Err(StateError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_state_rom_mismatch() {
        let mut session = Session::new();
        session.load_rom(&ines(0xEA), None).unwrap();
        let state = session.state_save().unwrap();
        session.load_rom(&ines(0xA9), None).unwrap();
        assert!(matches!(
            session.state_load(&state),
            Err(StateError::RomMismatch)
        ));
    }

    #[test]
    fn test_state_truncated() {
        let mut session = Session::new();
        assert!(matches!(
            session.state_load(&[]),
            Err(StateError::Truncated)
        ));
        assert!(matches!(
            session.state_load(&[STATE_VERSION, 0x00]),
            Err(StateError::Truncated)
        ));
    }

    #[test]
    fn test_failed_load_leaves_machine_alone() {
        let mut session = Session::new();
        session.load_rom(&ines(0xEA), None).unwrap();
        session.nes.cpu.a = 0x55;
        let mut state = session.state_save().unwrap();
        // Corrupt the body
        let n = state.len();
        state.truncate(n - 8);
        assert!(session.state_load(&state).is_err());
        assert_eq!(session.nes.cpu.a, 0x55);
    }
}
