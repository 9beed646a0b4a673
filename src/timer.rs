/// the delay and sound timers; both count down at 60Hz, independently of how
/// fast instructions are being executed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Timers::default()
    }

    /// one 60Hz tick; each timer stops at zero
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// whether the host should be making a noise
    pub fn is_sounding(&self) -> bool {
        self.sound > 0
    }
}
