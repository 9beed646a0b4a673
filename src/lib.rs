//! # chip8
//!
//! A CHIP-8 interpreter and a terminal host to run it in.
//!
//! ## Design
//!
//! * the interpreter is the whole machine: memory, registers, stack, timers,
//!   framebuffer and keypad, owned by one value so several can run at once
//! * it never looks at the clock; the host calls `step()` as often as it
//!   likes and `tick_timers()` at 60Hz
//! * abstract display, input and sound behind traits so the host can plug
//!   in alternatives; starting with TUI in-console
//! * interpreter differences (e.g. the shift instructions) are quirk flags
//!   rather than hard-coded
//!
//! Model
//!
//! ```text
//! Environment
//!  |-- display, input, sound, config
//!  |-- interpreter(quirks, rng)
//!  |    |-- memory map (font, program)
//!  |    |-- instruction decoder
//!  |    `-- framebuffer, keypad, timers
//!  `-- main loop, once per 60Hz frame
//!       |-- poll input; press/release keys
//!       |-- interpreter.tick_timers(); beep while the sound timer runs
//!       |-- interpreter.step() x cycles_per_frame (x1 while awaiting a key)
//!       |-- display.draw(interpreter.framebuffer())
//!       `-- sleep out the rest of the frame
//! ```
pub mod display;
pub mod environment;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod sound;
pub mod timer;

pub use error::Chip8Error;
pub use interpreter::{Chip8Interpreter, Quirks};
