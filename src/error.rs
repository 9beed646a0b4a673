use std::io;
use thiserror::Error;

/// Everything that can go wrong while loading or running a CHIP-8 program.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },

    #[error("stack overflow: call at {pc:#06x} with all 16 stack slots in use")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: return at {pc:#06x} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("unknown opcode {opcode:#06x} at {pc:#06x}")]
    UnknownOpcode { opcode: u16, pc: u16 },

    #[error("memory access out of bounds at address {addr:#06x}")]
    MemoryOutOfBounds { addr: usize },

    #[error("key index {0:#x} is outside the 16-key bank")]
    InvalidKey(usize),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Chip8Error {
    /// fatal errors leave the machine in a state it can't continue from;
    /// only a reset clears them
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Chip8Error::StackOverflow { .. }
                | Chip8Error::StackUnderflow { .. }
                | Chip8Error::MemoryOutOfBounds { .. }
        )
    }
}

// io::Error isn't Clone, so copy the kind and message across
impl Clone for Chip8Error {
    fn clone(&self) -> Self {
        match self {
            Chip8Error::RomTooLarge { size, max } => Chip8Error::RomTooLarge {
                size: *size,
                max: *max,
            },
            Chip8Error::StackOverflow { pc } => Chip8Error::StackOverflow { pc: *pc },
            Chip8Error::StackUnderflow { pc } => Chip8Error::StackUnderflow { pc: *pc },
            Chip8Error::UnknownOpcode { opcode, pc } => Chip8Error::UnknownOpcode {
                opcode: *opcode,
                pc: *pc,
            },
            Chip8Error::MemoryOutOfBounds { addr } => {
                Chip8Error::MemoryOutOfBounds { addr: *addr }
            }
            Chip8Error::InvalidKey(k) => Chip8Error::InvalidKey(*k),
            Chip8Error::Io(e) => Chip8Error::Io(io::Error::new(e.kind(), e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Chip8Error::StackOverflow { pc: 0x200 }.is_fatal());
        assert!(Chip8Error::StackUnderflow { pc: 0x200 }.is_fatal());
        assert!(Chip8Error::MemoryOutOfBounds { addr: 0x1000 }.is_fatal());
        assert!(!Chip8Error::UnknownOpcode { opcode: 0x5001, pc: 0x200 }.is_fatal());
        assert!(!Chip8Error::InvalidKey(16).is_fatal());
    }

    #[test]
    fn test_unknown_opcode_message_has_raw_word() {
        let e = Chip8Error::UnknownOpcode { opcode: 0xe0ff, pc: 0x20a };
        assert_eq!(e.to_string(), "unknown opcode 0xe0ff at 0x020a");
    }

    #[test]
    fn test_clone_io_keeps_kind() {
        let e = Chip8Error::from(io::Error::new(io::ErrorKind::NotFound, "rom"));
        match e.clone() {
            Chip8Error::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected {:?}", other),
        }
    }
}
