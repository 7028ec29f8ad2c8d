/// The video region the console is emulating.
///
/// Changes the frame rate and the number of scanlines per frame.
/// Sub-frame timing differences between the two regions are not emulated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Region {
    Ntsc,
    Pal,
}

impl Region {
    /// The number of scanlines per frame, including VBlank.
    pub fn scanlines(&self) -> u32 {
        match self {
            Region::Ntsc => 262,
            Region::Pal => 312,
        }
    }
    /// The duration of one frame in milliseconds.
    pub fn frame_millis(&self) -> f64 {
        match self {
            Region::Ntsc => 1000.0 / 60.0,
            Region::Pal => 1000.0 / 50.0,
        }
    }
}

/// Settings for how to run the emulator.
///
/// Contains fields that change the visual and audio output, along with a
/// few that can change the behaviour of some games (by interfering with
/// the sprite 0 hit or sprite overflow flags).
#[derive(Copy, Clone, Debug)]
pub struct Settings {
    /// Whether the APU produces samples. When `false` the channels still
    /// clock (so length counters and IRQs behave normally) but no output
    /// accumulates.
    pub sound_enabled: bool,
    /// Whether a running session paces itself against audio consumption
    /// rather than a fixed frame duration.
    pub pace_to_audio: bool,
    /// The video region to emulate.
    pub region: Region,
    /// Whether to limit each scanline to rendering at most 8 sprites.
    /// Sprite 0 hit and sprite overflow behaviour are unchanged, this is only visual.
    pub scanline_sprite_limit: bool,
    /// Whether to always draw sprites on top of the background
    pub always_sprites_on_top: bool,
    /// Master volume applied to mixed samples, 0.0 to 1.0.
    pub volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sound_enabled: true,
            pace_to_audio: false,
            region: Region::Ntsc,
            scanline_sprite_limit: true,
            always_sprites_on_top: false,
            volume: 1.0,
        }
    }
}
