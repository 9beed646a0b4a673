//! # instruction
//!
//! CHIP-8 instructions are two bytes, big-endian, decoded by nibble:
//!
//! ```text
//!   o x y n       o: opcode family
//!   . x n n       x, y: register indices
//!   . n n n       n / nn / nnn: 4, 8 and 12 bit immediates
//! ```
use crate::error::Chip8Error;
use std::fmt;

/// A register index, 0x0..=0xf
pub type Reg = usize;

/// the fields every instruction word is carved into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fields {
    pub op: u8,
    pub x: Reg,
    pub y: Reg,
    pub n: u8,
    pub nn: u8,
    pub nnn: u16,
}

impl From<u16> for Fields {
    fn from(word: u16) -> Self {
        Fields {
            op: ((word & 0xf000) >> 12) as u8,
            x: ((word & 0x0f00) >> 8) as usize,
            y: ((word & 0x00f0) >> 4) as usize,
            n: (word & 0x000f) as u8,
            nn: (word & 0x00ff) as u8,
            nnn: word & 0x0fff,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1nnn
    Jump(u16),
    /// 2nnn
    Call(u16),
    /// 3xnn
    SkipIfEqualImm(Reg, u8),
    /// 4xnn
    SkipIfNotEqualImm(Reg, u8),
    /// 5xy0
    SkipIfEqual(Reg, Reg),
    /// 6xnn
    LoadImm(Reg, u8),
    /// 7xnn
    AddImm(Reg, u8),
    /// 8xy0
    Move(Reg, Reg),
    /// 8xy1
    Or(Reg, Reg),
    /// 8xy2
    And(Reg, Reg),
    /// 8xy3
    Xor(Reg, Reg),
    /// 8xy4
    Add(Reg, Reg),
    /// 8xy5
    Sub(Reg, Reg),
    /// 8xy6
    ShiftRight(Reg, Reg),
    /// 8xy7
    SubReverse(Reg, Reg),
    /// 8xyE
    ShiftLeft(Reg, Reg),
    /// 9xy0
    SkipIfNotEqual(Reg, Reg),
    /// Annn
    LoadIndex(u16),
    /// Bnnn
    JumpOffset(u16),
    /// Cxnn
    Random(Reg, u8),
    /// Dxyn
    Draw(Reg, Reg, u8),
    /// Ex9E
    SkipIfKey(Reg),
    /// ExA1
    SkipIfNotKey(Reg),
    /// Fx07
    GetDelay(Reg),
    /// Fx0A
    WaitKey(Reg),
    /// Fx15
    SetDelay(Reg),
    /// Fx18
    SetSound(Reg),
    /// Fx1E
    AddIndex(Reg),
    /// Fx29
    LoadGlyph(Reg),
    /// Fx33
    StoreBcd(Reg),
    /// Fx55
    StoreRegisters(Reg),
    /// Fx65
    LoadRegisters(Reg),
}

impl Instruction {
    /// decode an instruction word; `pc` is only used to report where a bad
    /// word was found
    pub fn decode(word: u16, pc: u16) -> Result<Instruction, Chip8Error> {
        use Instruction::*;

        let Fields {
            op,
            x,
            y,
            n,
            nn,
            nnn,
        } = Fields::from(word);

        let instruction = match (op, n) {
            (0x0, _) if nnn == 0x0e0 => ClearScreen,
            (0x0, _) if nnn == 0x0ee => Return,
            (0x1, _) => Jump(nnn),
            (0x2, _) => Call(nnn),
            (0x3, _) => SkipIfEqualImm(x, nn),
            (0x4, _) => SkipIfNotEqualImm(x, nn),
            (0x5, 0x0) => SkipIfEqual(x, y),
            (0x6, _) => LoadImm(x, nn),
            (0x7, _) => AddImm(x, nn),
            (0x8, 0x0) => Move(x, y),
            (0x8, 0x1) => Or(x, y),
            (0x8, 0x2) => And(x, y),
            (0x8, 0x3) => Xor(x, y),
            (0x8, 0x4) => Add(x, y),
            (0x8, 0x5) => Sub(x, y),
            (0x8, 0x6) => ShiftRight(x, y),
            (0x8, 0x7) => SubReverse(x, y),
            (0x8, 0xe) => ShiftLeft(x, y),
            (0x9, 0x0) => SkipIfNotEqual(x, y),
            (0xa, _) => LoadIndex(nnn),
            (0xb, _) => JumpOffset(nnn),
            (0xc, _) => Random(x, nn),
            (0xd, _) => Draw(x, y, n),
            (0xe, _) if nn == 0x9e => SkipIfKey(x),
            (0xe, _) if nn == 0xa1 => SkipIfNotKey(x),
            (0xf, _) => match nn {
                0x07 => GetDelay(x),
                0x0a => WaitKey(x),
                0x15 => SetDelay(x),
                0x18 => SetSound(x),
                0x1e => AddIndex(x),
                0x29 => LoadGlyph(x),
                0x33 => StoreBcd(x),
                0x55 => StoreRegisters(x),
                0x65 => LoadRegisters(x),
                _ => return Err(Chip8Error::UnknownOpcode { opcode: word, pc }),
            },
            _ => return Err(Chip8Error::UnknownOpcode { opcode: word, pc }),
        };
        Ok(instruction)
    }
}

/// short assembler-ish mnemonics, for trace logging
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(a) => write!(f, "JP {:#05x}", a),
            Call(a) => write!(f, "CALL {:#05x}", a),
            SkipIfEqualImm(x, nn) => write!(f, "SE V{:X}, {:#04x}", x, nn),
            SkipIfNotEqualImm(x, nn) => write!(f, "SNE V{:X}, {:#04x}", x, nn),
            SkipIfEqual(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LoadImm(x, nn) => write!(f, "LD V{:X}, {:#04x}", x, nn),
            AddImm(x, nn) => write!(f, "ADD V{:X}, {:#04x}", x, nn),
            Move(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            Add(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight(x, y) => write!(f, "SHR V{:X}, V{:X}", x, y),
            SubReverse(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft(x, y) => write!(f, "SHL V{:X}, V{:X}", x, y),
            SkipIfNotEqual(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            LoadIndex(a) => write!(f, "LD I, {:#05x}", a),
            JumpOffset(a) => write!(f, "JP V0, {:#05x}", a),
            Random(x, nn) => write!(f, "RND V{:X}, {:#04x}", x, nn),
            Draw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SkipIfKey(x) => write!(f, "SKP V{:X}", x),
            SkipIfNotKey(x) => write!(f, "SKNP V{:X}", x),
            GetDelay(x) => write!(f, "LD V{:X}, DT", x),
            WaitKey(x) => write!(f, "LD V{:X}, K", x),
            SetDelay(x) => write!(f, "LD DT, V{:X}", x),
            SetSound(x) => write!(f, "LD ST, V{:X}", x),
            AddIndex(x) => write!(f, "ADD I, V{:X}", x),
            LoadGlyph(x) => write!(f, "LD F, V{:X}", x),
            StoreBcd(x) => write!(f, "LD B, V{:X}", x),
            StoreRegisters(x) => write!(f, "LD [I], V{:X}", x),
            LoadRegisters(x) => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Instruction::*;
    use super::*;

    fn decode(word: u16) -> Instruction {
        Instruction::decode(word, 0x200).unwrap()
    }

    #[test]
    fn test_fields() {
        let f = Fields::from(0xd12f);
        assert_eq!(f.op, 0xd);
        assert_eq!(f.x, 0x1);
        assert_eq!(f.y, 0x2);
        assert_eq!(f.n, 0xf);
        assert_eq!(f.nn, 0x2f);
        assert_eq!(f.nnn, 0x12f);
    }

    #[test]
    fn test_decode_system_family() {
        assert_eq!(decode(0x00e0), ClearScreen);
        assert_eq!(decode(0x00ee), Return);
    }

    #[test]
    fn test_decode_flow_and_immediates() {
        assert_eq!(decode(0x1234), Jump(0x234));
        assert_eq!(decode(0x2abc), Call(0xabc));
        assert_eq!(decode(0x3a42), SkipIfEqualImm(0xa, 0x42));
        assert_eq!(decode(0x4a42), SkipIfNotEqualImm(0xa, 0x42));
        assert_eq!(decode(0x5ab0), SkipIfEqual(0xa, 0xb));
        assert_eq!(decode(0x6f01), LoadImm(0xf, 0x01));
        assert_eq!(decode(0x7001), AddImm(0x0, 0x01));
        assert_eq!(decode(0x9ab0), SkipIfNotEqual(0xa, 0xb));
        assert_eq!(decode(0xa050), LoadIndex(0x050));
        assert_eq!(decode(0xb300), JumpOffset(0x300));
        assert_eq!(decode(0xc30f), Random(0x3, 0x0f));
        assert_eq!(decode(0xd125), Draw(0x1, 0x2, 5));
    }

    #[test]
    fn test_decode_alu_family() {
        assert_eq!(decode(0x8120), Move(1, 2));
        assert_eq!(decode(0x8121), Or(1, 2));
        assert_eq!(decode(0x8122), And(1, 2));
        assert_eq!(decode(0x8123), Xor(1, 2));
        assert_eq!(decode(0x8124), Add(1, 2));
        assert_eq!(decode(0x8125), Sub(1, 2));
        assert_eq!(decode(0x8126), ShiftRight(1, 2));
        assert_eq!(decode(0x8127), SubReverse(1, 2));
        assert_eq!(decode(0x812e), ShiftLeft(1, 2));
    }

    #[test]
    fn test_decode_key_and_misc_families() {
        assert_eq!(decode(0xe59e), SkipIfKey(5));
        assert_eq!(decode(0xe5a1), SkipIfNotKey(5));
        assert_eq!(decode(0xf507), GetDelay(5));
        assert_eq!(decode(0xf50a), WaitKey(5));
        assert_eq!(decode(0xf515), SetDelay(5));
        assert_eq!(decode(0xf518), SetSound(5));
        assert_eq!(decode(0xf51e), AddIndex(5));
        assert_eq!(decode(0xf529), LoadGlyph(5));
        assert_eq!(decode(0xf533), StoreBcd(5));
        assert_eq!(decode(0xf555), StoreRegisters(5));
        assert_eq!(decode(0xf565), LoadRegisters(5));
    }

    #[test]
    fn test_decode_unknown() {
        for word in [0x0000, 0x0123, 0x5121, 0x8128, 0x812f, 0x9121, 0xe100, 0xf1ff] {
            match Instruction::decode(word, 0x2f0) {
                Err(Chip8Error::UnknownOpcode { opcode, pc }) => {
                    assert_eq!(opcode, word);
                    assert_eq!(pc, 0x2f0);
                }
                other => panic!("{:#06x} decoded to {:?}", word, other),
            }
        }
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(decode(0x00e0).to_string(), "CLS");
        assert_eq!(decode(0xd125).to_string(), "DRW V1, V2, 5");
        assert_eq!(decode(0xa050).to_string(), "LD I, 0x050");
        assert_eq!(decode(0x6f01).to_string(), "LD VF, 0x01");
    }
}
