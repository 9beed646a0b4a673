use crate::error::Chip8Error;
use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;
use std::collections::HashMap;
use std::io;
use std::time::Duration;

/// how many keys the COSMAC hex keypad has
pub const CHIP8_KEY_COUNT: usize = 16;

/// state of the 16-key hex keypad, as seen by the interpreter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; CHIP8_KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Keypad::default()
    }

    /// press or release a key; out of range indices are rejected untouched
    pub fn set(&mut self, index: usize, pressed: bool) -> Result<(), Chip8Error> {
        match self.keys.get_mut(index) {
            Some(key) => {
                *key = pressed;
                Ok(())
            }
            None => Err(Chip8Error::InvalidKey(index)),
        }
    }

    /// keys outside the bank read as not pressed
    pub fn is_pressed(&self, index: usize) -> bool {
        self.keys.get(index).copied().unwrap_or(false)
    }

    /// lowest-numbered key currently held down
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&k| k).map(|k| k as u8)
    }

    pub fn release_all(&mut self) {
        self.keys = [false; CHIP8_KEY_COUNT];
    }
}

/// map of async bytes read from the keyboard to what the chip8 might expect,
/// using left-hand side of qwerty keyboard
///   1 2 3 C      1 2 3 4
///   4 5 6 D  =>  q w e r
///   7 8 9 E      a s d f
///   A 0 B F      z x c v
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00), // x
    ('1', 0x01), // 1
    ('2', 0x02), // 2
    ('3', 0x03), // 3
    ('q', 0x04), // q
    ('w', 0x05), // w
    ('e', 0x06), // e
    ('a', 0x07), // a
    ('s', 0x08), // s
    ('d', 0x09), // d
    ('z', 0x0a), // z
    ('c', 0x0b), // c
    ('4', 0x0c), // 4
    ('r', 0x0d), // r
    ('f', 0x0e), // f
    ('v', 0x0f), // v
];

/// reads keypresses
pub trait Input {
    /// get a list of all the mapped keys that have been pressed recently,
    /// without flushing them from the buffer
    fn peek_keys(&mut self) -> Result<&[u8], io::Error>;

    /// flush all the keypresses from the buffer
    fn flush_keys(&mut self) -> Result<(), io::Error>;

    /// whether the user has asked to leave
    fn quit_requested(&self) -> bool {
        false
    }
}

/// simple implementation of Input, using the terminal in raw mode
pub struct StdinInput {
    buffer: Vec<u8>,
    keymap: HashMap<char, u8>,
    quit: bool,
}

impl StdinInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            buffer: Vec::new(),
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            quit: false,
        })
    }

    fn read_stdin(&mut self) -> Result<(), io::Error> {
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => match evt.code {
                    KeyCode::Char(key) => match self.keymap.get(&key.to_ascii_lowercase()) {
                        Some(mapped_key) => self.buffer.push(*mapped_key),
                        None => log::debug!("can't map {:?} to a COSMAC key", key),
                    },
                    KeyCode::Esc => self.quit = true,
                    other => log::debug!("ignoring key event {:?}", other),
                },
                // resizes etc. get picked up on the next draw
                _ => {}
            }
        }
        Ok(())
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::error!("couldn't restore terminal: {}", e);
        }
    }
}

impl Input for StdinInput {
    fn peek_keys(&mut self) -> Result<&[u8], io::Error> {
        self.read_stdin()?;
        Ok(self.buffer.as_slice())
    }

    fn flush_keys(&mut self) -> Result<(), io::Error> {
        self.read_stdin()?;
        self.buffer.clear();
        Ok(())
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}

/// dummy Input implementation for testing
pub struct DummyInput {
    bytes: Vec<u8>,
}

impl DummyInput {
    pub fn new(keys: &[u8]) -> Self {
        DummyInput {
            bytes: Vec::from(keys),
        }
    }
}

impl Input for DummyInput {
    fn peek_keys(&mut self) -> Result<&[u8], io::Error> {
        Ok(self.bytes.as_slice())
    }

    fn flush_keys(&mut self) -> Result<(), io::Error> {
        self.bytes.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypad_starts_released() {
        let k = Keypad::new();
        assert_eq!(k.first_pressed(), None);
        assert!((0..16).all(|i| !k.is_pressed(i)));
    }

    #[test]
    fn test_set_and_release() -> Result<(), Chip8Error> {
        let mut k = Keypad::new();
        k.set(0xa, true)?;
        assert!(k.is_pressed(0xa));
        k.set(0xa, false)?;
        assert!(!k.is_pressed(0xa));
        Ok(())
    }

    #[test]
    fn test_out_of_range_key_rejected() {
        let mut k = Keypad::new();
        assert!(matches!(k.set(16, true), Err(Chip8Error::InvalidKey(16))));
        assert_eq!(k, Keypad::new());
        assert!(!k.is_pressed(16));
    }

    #[test]
    fn test_first_pressed_is_lowest() -> Result<(), Chip8Error> {
        let mut k = Keypad::new();
        k.set(0xc, true)?;
        k.set(0x3, true)?;
        assert_eq!(k.first_pressed(), Some(0x3));
        k.release_all();
        assert_eq!(k.first_pressed(), None);
        Ok(())
    }

    #[test]
    fn test_keymap_covers_every_key() {
        let mut seen: Vec<u8> = CHIP8_CONVENTIONAL_KEYMAP.iter().map(|(_, k)| *k).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_dummy_input_flush() -> Result<(), io::Error> {
        let mut i = DummyInput::new(&[1, 2]);
        assert_eq!(i.peek_keys()?, &[1, 2]);
        assert_eq!(i.peek_keys()?, &[1, 2]);
        i.flush_keys()?;
        assert!(i.peek_keys()?.is_empty());
        assert!(!i.quit_requested());
        Ok(())
    }
}
