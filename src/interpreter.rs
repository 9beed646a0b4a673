//! # interpreter
//!
//! The CHIP-8 machine as programs see it:
//!  * 4K of RAM, font at 0x050, programs loaded at 0x200
//!  * V0-VF 8bit registers; VF doubles as the carry/borrow/collision flag
//!    and gets clobbered by the ALU and draw instructions
//!  * I, a 16bit index register for memory-referencing instructions
//!  * a 16 deep call stack, outside of RAM
//!  * delay and sound timers, ticked by the host at 60Hz
//!  * a 64x32 monochrome framebuffer and a 16 key hex keypad
//!
//! Nothing here knows about real time: the host decides how many times to
//! `step()` per `tick_timers()`.
use crate::display::{Framebuffer, CHIP8_DISPLAY_HEIGHT};
use crate::error::Chip8Error;
use crate::input::Keypad;
use crate::instruction::{Instruction, Reg};
use crate::memory::{Chip8MemoryMap, MemoryMap, CHIP8_PROGRAM_ADDR};
use crate::timer::Timers;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::io;

/// VF, written as a side effect by several instructions
const FLAG: Reg = 0xf;

const STACK_DEPTH: usize = 16;

/// Behaviours that differ between CHIP-8 interpreters in the wild. The
/// defaults suit most modern ROMs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Quirks {
    /// 8xy6/8xyE copy Vy into Vx before shifting, like the COSMAC VIP did
    pub shift_uses_vy: bool,
    /// Fx55/Fx65 leave I pointing just past the last register transferred
    pub load_store_increments_index: bool,
}

#[derive(Clone, Debug)]
enum ExecState {
    Running,
    /// Fx0A is waiting for a key to land in this register
    AwaitingKey(Reg),
    /// stopped on a fatal error until the next reset
    Faulted(Chip8Error),
}

pub struct Chip8Interpreter {
    memory: Chip8MemoryMap,
    v: [u8; 16],
    i: u16,
    program_counter: u16,
    stack: [u16; STACK_DEPTH],
    stack_pointer: usize,
    timers: Timers,
    framebuffer: Framebuffer,
    keypad: Keypad,
    state: ExecState,
    last_error: Option<Chip8Error>,
    quirks: Quirks,
    rng: Box<dyn RngCore>,
}

impl Chip8Interpreter {
    /// a freshly reset machine with an entropy-seeded random source
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// same random numbers every run, for tests and replays
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: impl RngCore + 'static) -> Self {
        Chip8Interpreter {
            memory: Chip8MemoryMap::new(),
            v: [0; 16],
            i: 0,
            program_counter: CHIP8_PROGRAM_ADDR,
            stack: [0; STACK_DEPTH],
            stack_pointer: 0,
            timers: Timers::new(),
            framebuffer: Framebuffer::new(),
            keypad: Keypad::new(),
            state: ExecState::Running,
            last_error: None,
            quirks: Quirks::default(),
            rng: Box::new(rng),
        }
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    /// back to power-on state: memory, registers, stack, screen and keys
    /// cleared, font reloaded, PC at 0x200
    pub fn reset(&mut self) {
        self.memory.reset();
        self.v = [0; 16];
        self.i = 0;
        self.program_counter = self.memory.program_addr;
        self.stack = [0; STACK_DEPTH];
        self.stack_pointer = 0;
        self.timers = Timers::new();
        self.framebuffer.clear();
        self.keypad.release_all();
        self.state = ExecState::Running;
        self.last_error = None;
        log::debug!("reset");
    }

    /// load a chip8 program at 0x200; doesn't reset anything else
    pub fn load(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        self.memory.load_program(program).map_err(|e| self.record(e))?;
        log::info!("loaded {} byte program", program.len());
        Ok(())
    }

    /// load a chip8 program from a file or whatever
    pub fn load_from(&mut self, reader: &mut impl io::Read) -> Result<(), Chip8Error> {
        self.memory
            .load_program_from(reader)
            .map_err(|e| self.record(e))?;
        log::info!("loaded program");
        Ok(())
    }

    /// Fetch, decode and execute one instruction, or poll once for a key if
    /// an Fx0A is pending.
    ///
    /// Unknown opcodes are skipped: the error is returned and PC stays past
    /// the bad word. Stack overflow/underflow and out-of-range memory access
    /// are fatal and every later step returns the same error until `reset()`.
    pub fn step(&mut self) -> Result<(), Chip8Error> {
        match self.state {
            ExecState::Faulted(ref e) => return Err(e.clone()),
            ExecState::AwaitingKey(x) => {
                self.poll_key(x);
                return Ok(());
            }
            ExecState::Running => {}
        }
        self.cycle().map_err(|e| self.record(e))
    }

    /// one 60Hz tick of the delay and sound timers
    pub fn tick_timers(&mut self) {
        self.timers.tick();
    }

    /// press or release one of the 16 keys
    pub fn set_key(&mut self, index: usize, pressed: bool) -> Result<(), Chip8Error> {
        self.keypad.set(index, pressed).map_err(|e| self.record(e))
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay
    }

    /// whether the host should be making a noise
    pub fn is_sounding(&self) -> bool {
        self.timers.is_sounding()
    }

    /// blocked on Fx0A with nothing pressed yet; a host can step less often
    /// while this holds
    pub fn is_awaiting_key(&self) -> bool {
        matches!(self.state, ExecState::AwaitingKey(_)) && self.keypad.first_pressed().is_none()
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self.state, ExecState::Faulted(_))
    }

    /// most recent failure of any operation, cleared by `reset()`
    pub fn last_error(&self) -> Option<&Chip8Error> {
        self.last_error.as_ref()
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }

    /// V0..VF by number; `None` past VF
    pub fn register(&self, index: usize) -> Option<u8> {
        self.v.get(index).copied()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack_pointer
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }

    /// registers, one per line, for debugging
    pub fn register_dump(&self) -> String {
        let mut lines: Vec<String> = self
            .v
            .iter()
            .enumerate()
            .map(|(n, value)| format!("V{:X}: {:#04x}", n, value))
            .collect();
        lines.push(format!("I:  {:#06x}", self.i));
        lines.push(format!("PC: {:#06x}", self.program_counter));
        lines.push(format!("SP: {}", self.stack_pointer));
        lines.join("\n")
    }

    fn record(&mut self, e: Chip8Error) -> Chip8Error {
        if e.is_fatal() {
            log::error!("{}\n{}", e, self.register_dump());
            self.state = ExecState::Faulted(e.clone());
        } else {
            log::warn!("{}", e);
        }
        self.last_error = Some(e.clone());
        e
    }

    fn poll_key(&mut self, x: Reg) {
        if let Some(key) = self.keypad.first_pressed() {
            log::debug!("key {:X} pressed, V{:X} resumed", key, x);
            self.v[x] = key;
            self.state = ExecState::Running;
        }
    }

    fn cycle(&mut self) -> Result<(), Chip8Error> {
        let pc = self.program_counter;
        let word = self.memory.get_word(pc)?;
        self.program_counter = pc.wrapping_add(2);
        let instruction = Instruction::decode(word, pc)?;
        log::trace!("{:#05x}: {:04x}  {}", pc, word, instruction);
        self.execute(instruction, pc)
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
    }

    /// PC has already moved past the instruction; `pc` is where it was
    fn execute(&mut self, instruction: Instruction, pc: u16) -> Result<(), Chip8Error> {
        use Instruction::*;

        match instruction {
            ClearScreen => self.framebuffer.clear(),
            Return => {
                if self.stack_pointer == 0 {
                    return Err(Chip8Error::StackUnderflow { pc });
                }
                self.stack_pointer -= 1;
                self.program_counter = self.stack[self.stack_pointer];
            }
            Jump(nnn) => self.program_counter = nnn,
            Call(nnn) => {
                if self.stack_pointer == STACK_DEPTH {
                    return Err(Chip8Error::StackOverflow { pc });
                }
                self.stack[self.stack_pointer] = self.program_counter;
                self.stack_pointer += 1;
                self.program_counter = nnn;
            }
            SkipIfEqualImm(x, nn) => self.skip_if(self.v[x] == nn),
            SkipIfNotEqualImm(x, nn) => self.skip_if(self.v[x] != nn),
            SkipIfEqual(x, y) => self.skip_if(self.v[x] == self.v[y]),
            LoadImm(x, nn) => self.v[x] = nn,
            AddImm(x, nn) => self.v[x] = self.v[x].wrapping_add(nn),
            Move(x, y) => self.v[x] = self.v[y],
            Or(x, y) => self.v[x] |= self.v[y],
            And(x, y) => self.v[x] &= self.v[y],
            Xor(x, y) => self.v[x] ^= self.v[y],
            Add(x, y) => {
                let (sum, carry) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = sum;
                self.v[FLAG] = carry as u8;
            }
            Sub(x, y) => {
                let no_borrow = self.v[x] >= self.v[y];
                self.v[x] = self.v[x].wrapping_sub(self.v[y]);
                self.v[FLAG] = no_borrow as u8;
            }
            ShiftRight(x, y) => {
                if self.quirks.shift_uses_vy {
                    self.v[x] = self.v[y];
                }
                let out = self.v[x] & 0x01;
                self.v[x] >>= 1;
                self.v[FLAG] = out;
            }
            SubReverse(x, y) => {
                let no_borrow = self.v[y] >= self.v[x];
                self.v[x] = self.v[y].wrapping_sub(self.v[x]);
                self.v[FLAG] = no_borrow as u8;
            }
            ShiftLeft(x, y) => {
                if self.quirks.shift_uses_vy {
                    self.v[x] = self.v[y];
                }
                let out = self.v[x] >> 7;
                self.v[x] <<= 1;
                self.v[FLAG] = out;
            }
            SkipIfNotEqual(x, y) => self.skip_if(self.v[x] != self.v[y]),
            LoadIndex(nnn) => self.i = nnn,
            JumpOffset(nnn) => self.program_counter = nnn + self.v[0] as u16,
            Random(x, nn) => self.v[x] = self.rng.gen::<u8>() & nn,
            Draw(x, y, n) => {
                let (col, row) = (self.v[x], self.v[y]);
                // rows clipped off the bottom are never read
                let below = CHIP8_DISPLAY_HEIGHT - row as usize % CHIP8_DISPLAY_HEIGHT;
                let visible = (n as usize).min(below);
                let sprite = self.memory.get_ro_slice(self.i, visible)?;
                let collision = self.framebuffer.draw_sprite(col, row, sprite);
                self.v[FLAG] = collision as u8;
            }
            SkipIfKey(x) => self.skip_if(self.keypad.is_pressed(self.v[x] as usize)),
            SkipIfNotKey(x) => self.skip_if(!self.keypad.is_pressed(self.v[x] as usize)),
            GetDelay(x) => self.v[x] = self.timers.delay,
            WaitKey(x) => match self.keypad.first_pressed() {
                Some(key) => self.v[x] = key,
                None => {
                    log::debug!("waiting for a key for V{:X}", x);
                    self.state = ExecState::AwaitingKey(x);
                }
            },
            SetDelay(x) => self.timers.delay = self.v[x],
            SetSound(x) => self.timers.sound = self.v[x],
            AddIndex(x) => {
                self.i = self.i.wrapping_add(self.v[x] as u16);
                self.v[FLAG] = (self.i >= 0x1000) as u8;
            }
            LoadGlyph(x) => self.i = self.memory.glyph_addr(self.v[x]),
            StoreBcd(x) => {
                let value = self.v[x];
                self.memory
                    .write(&[value / 100, (value / 10) % 10, value % 10], self.i)?;
            }
            StoreRegisters(x) => {
                self.memory
                    .get_rw_slice(self.i, x + 1)?
                    .copy_from_slice(&self.v[..=x]);
                self.bump_index(x);
            }
            LoadRegisters(x) => {
                let src = self.memory.get_ro_slice(self.i, x + 1)?;
                self.v[..=x].copy_from_slice(src);
                self.bump_index(x);
            }
        }
        Ok(())
    }

    fn bump_index(&mut self, x: Reg) {
        if self.quirks.load_store_increments_index {
            self.i = self.i.wrapping_add(x as u16 + 1);
        }
    }
}

impl Default for Chip8Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
