use crate::display::Display;
use crate::input::{Input, CHIP8_KEY_COUNT};
use crate::interpreter::Chip8Interpreter;
use crate::sound::Sound;
use std::error::Error;
use std::time::{Duration, Instant};

/// timers tick, and the screen redraws, at 60Hz
pub const FRAME: Duration = Duration::from_nanos(1_000_000_000 / 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnvConfig {
    /// instructions per 60Hz frame; 12 gives roughly 720Hz
    pub cycles_per_frame: usize,
    /// terminals only report key presses, never releases, so a press is
    /// held for this many frames
    pub key_hold_frames: u32,
    /// sleep out the rest of each frame; off for tests
    pub pace: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig {
            cycles_per_frame: 12,
            key_hold_frames: 6,
            pace: true,
        }
    }
}

/// Sets everything up and runs the main loop: each frame polls the keys,
/// ticks the timers, follows the sound timer, runs a batch of instructions
/// and draws the screen.
pub struct Environment<'a> {
    interpreter: Chip8Interpreter,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    config: EnvConfig,
    key_hold: [u32; CHIP8_KEY_COUNT],
}

impl<'a> Environment<'a> {
    pub fn new(
        interpreter: Chip8Interpreter,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
        config: EnvConfig,
    ) -> Self {
        Environment {
            interpreter,
            display,
            input,
            sound,
            config,
            key_hold: [0; CHIP8_KEY_COUNT],
        }
    }

    pub fn interpreter(&self) -> &Chip8Interpreter {
        &self.interpreter
    }

    /// run until the user quits, the program faults, or `max_frames` have
    /// gone by; returns how many frames were run
    pub fn main_loop(&mut self, max_frames: Option<u64>) -> Result<u64, Box<dyn Error>> {
        let mut frames = 0;
        let result = loop {
            if max_frames.map_or(false, |max| frames >= max) {
                break Ok(frames);
            }
            if self.input.quit_requested() {
                log::info!("quit after {} frames", frames);
                break Ok(frames);
            }
            let started = Instant::now();
            if let Err(e) = self.run_frame() {
                break Err(e);
            }
            frames += 1;
            if self.config.pace {
                if let Some(rest) = FRAME.checked_sub(started.elapsed()) {
                    spin_sleep::sleep(rest);
                }
            }
        };
        // don't leave the speaker on whatever happened
        self.sound.follow(false)?;
        result
    }

    /// one 60Hz frame
    pub fn run_frame(&mut self) -> Result<(), Box<dyn Error>> {
        self.update_keys()?;

        self.interpreter.tick_timers();
        self.sound.follow(self.interpreter.is_sounding())?;

        // nothing useful happens while blocked on Fx0A, so just poll once
        let cycles = if self.interpreter.is_awaiting_key() {
            1
        } else {
            self.config.cycles_per_frame
        };
        for _ in 0..cycles {
            if let Err(e) = self.interpreter.step() {
                if e.is_fatal() {
                    return Err(e.into());
                }
                // already logged; carry on past it
            }
        }

        self.display.draw(self.interpreter.framebuffer())?;
        Ok(())
    }

    fn update_keys(&mut self) -> Result<(), Box<dyn Error>> {
        for &key in self.input.peek_keys()? {
            match self.key_hold.get_mut(key as usize) {
                Some(hold) => *hold = self.config.key_hold_frames,
                None => log::warn!("input produced key {:#x}, ignoring", key),
            }
        }
        self.input.flush_keys()?;

        for (key, hold) in self.key_hold.iter_mut().enumerate() {
            self.interpreter.set_key(key, *hold > 0)?;
            *hold = hold.saturating_sub(1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use crate::input::DummyInput;
    use crate::sound::Mute;

    const TEST_CONFIG: EnvConfig = EnvConfig {
        cycles_per_frame: 3,
        key_hold_frames: 2,
        pace: false,
    };

    fn boot(program: &[u8]) -> Chip8Interpreter {
        let mut i = Chip8Interpreter::with_seed(1);
        i.load(program).unwrap();
        i
    }

    #[test]
    fn test_frame_runs_cycles_and_draws() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let program = [0x70, 0x01, 0x70, 0x01, 0x70, 0x01, 0x70, 0x01, 0x12, 0x08];
        let mut env = Environment::new(
            boot(&program),
            &mut display,
            &mut input,
            &mut sound,
            TEST_CONFIG,
        );
        env.run_frame()?;
        assert_eq!(env.interpreter().registers()[0], 3);
        env.run_frame()?;
        assert_eq!(env.interpreter().registers()[0], 4);
        drop(env);
        assert_eq!(display.frames_drawn, 2);
        Ok(())
    }

    #[test]
    fn test_beeps_while_sound_timer_runs() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut env = Environment::new(
            boot(&[0x60, 0x02, 0xf0, 0x18, 0x12, 0x04]),
            &mut display,
            &mut input,
            &mut sound,
            TEST_CONFIG,
        );
        env.run_frame()?;
        env.run_frame()?;
        env.run_frame()?;
        assert_eq!(env.interpreter().sound_timer(), 0);
        drop(env);
        assert_eq!(sound.beeps, 1);
        assert!(!sound.is_beeping());
        Ok(())
    }

    #[test]
    fn test_key_held_then_released() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[0xa]);
        let mut sound = Mute::new();
        // v1 counts the instructions that saw key A down
        let program = [0x60, 0x0a, 0xe0, 0xa1, 0x71, 0x01, 0x12, 0x02];
        let mut env = Environment::new(
            boot(&program),
            &mut display,
            &mut input,
            &mut sound,
            TEST_CONFIG,
        );
        for _ in 0..4 {
            env.run_frame()?;
        }
        assert_eq!(env.interpreter().registers()[1], 2);
        Ok(())
    }

    #[test]
    fn test_key_wait_resolves_from_input() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut env = Environment::new(
            boot(&[0xf3, 0x0a, 0x12, 0x02]),
            &mut display,
            &mut input,
            &mut sound,
            TEST_CONFIG,
        );
        env.run_frame()?;
        assert!(env.interpreter().is_awaiting_key());
        env.run_frame()?;
        assert_eq!(env.interpreter().program_counter(), 0x202);
        drop(env);

        let mut input = DummyInput::new(&[0x9]);
        let mut env = Environment::new(
            boot(&[0xf3, 0x0a, 0x12, 0x02]),
            &mut display,
            &mut input,
            &mut sound,
            TEST_CONFIG,
        );
        env.run_frame()?;
        assert!(!env.interpreter().is_awaiting_key());
        assert_eq!(env.interpreter().registers()[3], 0x9);
        Ok(())
    }

    #[test]
    fn test_unknown_opcode_doesnt_stop_frame() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut env = Environment::new(
            boot(&[0xff, 0xff, 0x60, 0x07, 0x12, 0x04]),
            &mut display,
            &mut input,
            &mut sound,
            TEST_CONFIG,
        );
        env.run_frame()?;
        assert_eq!(env.interpreter().registers()[0], 7);
        Ok(())
    }

    #[test]
    fn test_main_loop_frame_limit() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut env = Environment::new(
            boot(&[0x12, 0x00]),
            &mut display,
            &mut input,
            &mut sound,
            TEST_CONFIG,
        );
        assert_eq!(env.main_loop(Some(3))?, 3);
        drop(env);
        assert_eq!(display.frames_drawn, 3);
        Ok(())
    }

    #[test]
    fn test_main_loop_stops_on_fatal() {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut env = Environment::new(
            boot(&[0x00, 0xee]),
            &mut display,
            &mut input,
            &mut sound,
            TEST_CONFIG,
        );
        let err = env.main_loop(Some(10)).unwrap_err();
        assert!(err.to_string().contains("stack underflow"));
        assert!(env.interpreter().is_faulted());
    }

    #[test]
    fn test_paced_frame_takes_a_frame() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut env = Environment::new(
            boot(&[0x12, 0x00]),
            &mut display,
            &mut input,
            &mut sound,
            EnvConfig::default(),
        );
        let started = Instant::now();
        env.main_loop(Some(2))?;
        assert!(started.elapsed() >= FRAME * 2);
        Ok(())
    }
}
