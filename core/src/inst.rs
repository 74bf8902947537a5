use crate::error::ExecError;

/// A decoded CHIP-8 instruction.
///
/// Register operands are the 4-bit `x`/`y` fields of the opcode, so every
/// index is in `[0, 16)` by construction. Decoding happens once per fetch;
/// execution dispatches over these variants exhaustively, which keeps the
/// opcode table complete by compiler enforcement instead of by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0: turn every framebuffer cell off.
    ClearScreen,
    /// 00EE: return from a subroutine.
    Return,
    /// 1NNN: jump to NNN.
    Jump(u16),
    /// 2NNN: call the subroutine at NNN.
    Call(u16),
    /// 3XNN: skip the next instruction if VX == NN.
    SkipEqImm { x: u8, nn: u8 },
    /// 4XNN: skip the next instruction if VX != NN.
    SkipNeImm { x: u8, nn: u8 },
    /// 5XY0: skip the next instruction if VX == VY.
    SkipEqReg { x: u8, y: u8 },
    /// 6XNN: VX = NN.
    SetImm { x: u8, nn: u8 },
    /// 7XNN: VX += NN, wrapping, carry flag untouched.
    AddImm { x: u8, nn: u8 },
    /// 8XY0: VX = VY.
    Move { x: u8, y: u8 },
    /// 8XY1: VX |= VY.
    Or { x: u8, y: u8 },
    /// 8XY2: VX &= VY.
    And { x: u8, y: u8 },
    /// 8XY3: VX ^= VY.
    Xor { x: u8, y: u8 },
    /// 8XY4: VX += VY, VF = carry.
    Add { x: u8, y: u8 },
    /// 8XY5: VX -= VY, VF = 1 when no borrow.
    Sub { x: u8, y: u8 },
    /// 8XY6: VX >>= 1, VF = the bit shifted out.
    ShiftRight(u8),
    /// 8XY7: VX = VY - VX, VF = 1 when no borrow.
    SubReverse { x: u8, y: u8 },
    /// 8XYE: VX <<= 1, VF = the bit shifted out.
    ShiftLeft(u8),
    /// 9XY0: skip the next instruction if VX != VY.
    SkipNeReg { x: u8, y: u8 },
    /// ANNN: I = NNN.
    SetIndex(u16),
    /// BNNN: jump to NNN + V0.
    JumpOffset(u16),
    /// CXNN: VX = random byte & NN.
    Random { x: u8, nn: u8 },
    /// DXYN: draw an N-byte sprite from memory at I to (VX, VY).
    Draw { x: u8, y: u8, n: u8 },
    /// EX9E: skip the next instruction if key VX is pressed.
    SkipKeyPressed(u8),
    /// EXA1: skip the next instruction if key VX is released.
    SkipKeyReleased(u8),
    /// FX07: VX = delay timer.
    ReadDelay(u8),
    /// FX0A: block until any key is pressed, then VX = that key.
    WaitKey(u8),
    /// FX15: delay timer = VX.
    SetDelay(u8),
    /// FX18: sound timer = VX.
    SetSound(u8),
    /// FX1E: I += VX.
    AddIndex(u8),
    /// FX29: I = address of the font glyph for VX.
    FontGlyph(u8),
    /// FX33: write the decimal digits of VX to memory at I, I+1, I+2.
    StoreBcd(u8),
    /// FX55: store V0..=VX to memory at I, then I += X + 1.
    StoreRegs(u8),
    /// FX65: load V0..=VX from memory at I, then I += X + 1.
    LoadRegs(u8),
}

impl Instruction {
    /// Decode a big-endian opcode word.
    ///
    /// Any pattern outside the original CHIP-8 set, including the 0NNN
    /// machine-code call, yields [`ExecError::UnimplementedOpcode`].
    pub fn decode(opcode: u16) -> Result<Instruction, ExecError> {
        let n1 = ((opcode >> 12) & 0xF) as u8;
        let x = ((opcode >> 8) & 0xF) as u8;
        let y = ((opcode >> 4) & 0xF) as u8;
        let n = (opcode & 0xF) as u8;
        let nn = (opcode & 0xFF) as u8;
        let nnn = opcode & 0xFFF;

        let inst = match (n1, x, y, n) {
            (0x0, 0x0, 0xE, 0x0) => Instruction::ClearScreen,
            (0x0, 0x0, 0xE, 0xE) => Instruction::Return,
            (0x1, _, _, _) => Instruction::Jump(nnn),
            (0x2, _, _, _) => Instruction::Call(nnn),
            (0x3, _, _, _) => Instruction::SkipEqImm { x, nn },
            (0x4, _, _, _) => Instruction::SkipNeImm { x, nn },
            (0x5, _, _, 0x0) => Instruction::SkipEqReg { x, y },
            (0x6, _, _, _) => Instruction::SetImm { x, nn },
            (0x7, _, _, _) => Instruction::AddImm { x, nn },
            (0x8, _, _, 0x0) => Instruction::Move { x, y },
            (0x8, _, _, 0x1) => Instruction::Or { x, y },
            (0x8, _, _, 0x2) => Instruction::And { x, y },
            (0x8, _, _, 0x3) => Instruction::Xor { x, y },
            (0x8, _, _, 0x4) => Instruction::Add { x, y },
            (0x8, _, _, 0x5) => Instruction::Sub { x, y },
            (0x8, _, _, 0x6) => Instruction::ShiftRight(x),
            (0x8, _, _, 0x7) => Instruction::SubReverse { x, y },
            (0x8, _, _, 0xE) => Instruction::ShiftLeft(x),
            (0x9, _, _, 0x0) => Instruction::SkipNeReg { x, y },
            (0xA, _, _, _) => Instruction::SetIndex(nnn),
            (0xB, _, _, _) => Instruction::JumpOffset(nnn),
            (0xC, _, _, _) => Instruction::Random { x, nn },
            (0xD, _, _, _) => Instruction::Draw { x, y, n },
            (0xE, _, 0x9, 0xE) => Instruction::SkipKeyPressed(x),
            (0xE, _, 0xA, 0x1) => Instruction::SkipKeyReleased(x),
            (0xF, _, 0x0, 0x7) => Instruction::ReadDelay(x),
            (0xF, _, 0x0, 0xA) => Instruction::WaitKey(x),
            (0xF, _, 0x1, 0x5) => Instruction::SetDelay(x),
            (0xF, _, 0x1, 0x8) => Instruction::SetSound(x),
            (0xF, _, 0x1, 0xE) => Instruction::AddIndex(x),
            (0xF, _, 0x2, 0x9) => Instruction::FontGlyph(x),
            (0xF, _, 0x3, 0x3) => Instruction::StoreBcd(x),
            (0xF, _, 0x5, 0x5) => Instruction::StoreRegs(x),
            (0xF, _, 0x6, 0x5) => Instruction::LoadRegs(x),
            _ => return Err(ExecError::UnimplementedOpcode(opcode)),
        };

        Ok(inst)
    }
}
