use std::io;

use rand::{rngs::StdRng, RngCore, SeedableRng};

use crate::error::{ExecError, LoadError};
use crate::inst::Instruction;

const MEMORY_SIZE: usize = 0x1000;
pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// Address where execution of a loaded program begins.
pub const ENTRY_POINT: u16 = 0x200;

/// Largest program image that fits between the entry point and the end of
/// memory: 4096 - 512 = 3584 bytes.
pub const MAX_IMAGE_SIZE: usize = MEMORY_SIZE - ENTRY_POINT as usize;

const STACK_DEPTH: usize = 16;
const FONT_GLYPH_BYTES: u16 = 5;

/// The built-in hexadecimal font: 16 glyphs of 5 bytes each, written to the
/// bottom of memory so glyph `g` sits at address `5 * g`.
pub static DEFAULT_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Read a program image from an I/O source that declared its own length,
/// e.g. file metadata. Yields [`LoadError::ShortRead`] when the source
/// hands over fewer bytes than declared.
pub fn read_image(mut reader: impl io::Read, declared_len: usize) -> Result<Vec<u8>, LoadError> {
    let mut image = Vec::with_capacity(declared_len);
    let got = reader
        .read_to_end(&mut image)
        .map_err(|_| LoadError::ShortRead {
            expected: declared_len,
            got: 0,
        })?;
    if got < declared_len {
        return Err(LoadError::ShortRead {
            expected: declared_len,
            got,
        });
    }
    Ok(image)
}

/// Where the program counter goes after an instruction executes.
///
/// Every instruction states its control flow explicitly; there is no default
/// advance for branch instructions to override.
enum Flow {
    /// Move to the following instruction.
    Advance,
    /// Skip over the following instruction.
    Skip,
    /// Transfer to an absolute address.
    Jump(u16),
    /// Stay on this instruction; only the key-wait uses this.
    Wait,
}

/// Configures and loads a [`Vm`].
#[derive(Debug, Default)]
pub struct VmBuilder {
    image: Option<Vec<u8>>,
    font: Option<[u8; 80]>,
    rng_seed: Option<u64>,
}

impl VmBuilder {
    pub fn new() -> VmBuilder {
        VmBuilder::default()
    }

    /// Program image to place at the entry point.
    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }

    /// Replacement for the built-in font table.
    pub fn with_font(mut self, font: [u8; 80]) -> Self {
        self.font = Some(font);
        self
    }

    /// Seed for the CXNN random source. Unseeded machines draw from entropy.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<Vm, LoadError> {
        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut vm = Vm {
            regs: [0; 16],
            index: 0,
            pc: ENTRY_POINT,
            stack: [0; STACK_DEPTH],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            memory: [0; MEMORY_SIZE],
            framebuffer: [false; SCREEN_WIDTH * SCREEN_HEIGHT],
            fb_dirty: true,
            rng,
        };

        vm.load(self.image.as_deref().unwrap_or(&[]))?;
        if let Some(font) = self.font {
            vm.memory[..font.len()].copy_from_slice(&font);
        }
        Ok(vm)
    }
}

/// The complete CHIP-8 machine state plus its decoder/executor.
pub struct Vm {
    /// General purpose registers V0-VF. VF doubles as the
    /// carry/borrow/collision flag.
    regs: [u8; 16],
    /// Index register I. May legally accumulate past 0xFFF; accesses
    /// through it are bounds-checked at use.
    index: u16,
    /// Program counter.
    pc: u16,
    /// Return-address stack for subroutine calls.
    stack: [u16; STACK_DEPTH],
    /// Stack pointer, always in `[0, 16]`.
    sp: u8,
    /// Delay timer, decremented at 60 Hz by the host.
    delay_timer: u8,
    /// Sound timer, a bare counter; no tone is synthesized here.
    sound_timer: u8,
    /// 4096 bytes of memory: font table at 0x000, program at 0x200.
    memory: [u8; MEMORY_SIZE],
    /// 64x32 cells, row-major, strictly on/off. Color is presentation.
    framebuffer: [bool; SCREEN_WIDTH * SCREEN_HEIGHT],
    /// Set whenever a draw or clear changes the framebuffer.
    fb_dirty: bool,
    /// Random source for CXNN.
    rng: StdRng,
}

impl Vm {
    /// Reset the machine and load `image` at the entry point.
    ///
    /// All registers, timers, the stack and the framebuffer are zeroed and
    /// the font table is rewritten, so a failed load leaves a blank machine
    /// rather than a corrupted one.
    pub fn load(&mut self, image: &[u8]) -> Result<(), LoadError> {
        if image.len() > MAX_IMAGE_SIZE {
            return Err(LoadError::ImageTooLarge {
                size: image.len(),
                max: MAX_IMAGE_SIZE,
            });
        }

        self.regs = [0; 16];
        self.index = 0;
        self.pc = ENTRY_POINT;
        self.stack = [0; STACK_DEPTH];
        self.sp = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.memory = [0; MEMORY_SIZE];
        self.framebuffer = [false; SCREEN_WIDTH * SCREEN_HEIGHT];
        self.fb_dirty = true;

        self.memory[..DEFAULT_FONT.len()].copy_from_slice(&DEFAULT_FONT);
        self.memory[ENTRY_POINT as usize..ENTRY_POINT as usize + image.len()]
            .copy_from_slice(image);
        Ok(())
    }

    /// The 64x32 cell grid, row-major. `true` is a lit cell.
    pub fn framebuffer(&self) -> &[bool] {
        &self.framebuffer[..]
    }

    /// State of a single framebuffer cell.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.framebuffer[y * SCREEN_WIDTH + x]
    }

    /// Whether the framebuffer changed since the last call; clears the flag.
    pub fn take_display_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.fb_dirty, false)
    }

    /// Current sound timer value; non-zero means the buzzer should sound.
    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// Decrement both hardware timers by one step, clamping at zero.
    /// The host calls this at 60 Hz, independent of instruction throughput.
    pub fn step_timers(&mut self) {
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }
        if self.sound_timer > 0 {
            self.sound_timer -= 1;
        }
    }

    /// Run one fetch/decode/execute cycle against the given key state.
    ///
    /// `keys[k]` is true while pad key `k` (0x0-0xF) is held. The key-wait
    /// instruction with no key down leaves the whole machine untouched, so
    /// the host simply re-invokes `step` on the next cycle.
    pub fn step(&mut self, keys: &[bool; 16]) -> Result<(), ExecError> {
        let pc = self.pc;
        if pc as usize + 1 >= MEMORY_SIZE {
            return Err(ExecError::PcOutOfBounds(pc));
        }
        let opcode =
            u16::from_be_bytes([self.memory[pc as usize], self.memory[pc as usize + 1]]);
        let inst = Instruction::decode(opcode)?;
        log::trace!("{:#06x}: {:04X} {:?}", pc, opcode, inst);

        let flow = self.execute(inst, keys)?;
        self.pc = match flow {
            Flow::Advance => pc + 2,
            Flow::Skip => pc + 4,
            Flow::Jump(addr) => addr,
            Flow::Wait => pc,
        };
        Ok(())
    }

    fn execute(&mut self, inst: Instruction, keys: &[bool; 16]) -> Result<Flow, ExecError> {
        let flow = match inst {
            Instruction::ClearScreen => {
                self.framebuffer = [false; SCREEN_WIDTH * SCREEN_HEIGHT];
                self.fb_dirty = true;
                Flow::Advance
            }
            Instruction::Return => {
                if self.sp == 0 {
                    return Err(ExecError::StackUnderflow);
                }
                self.sp -= 1;
                // The stack holds call-site addresses; resume just past one.
                Flow::Jump(self.stack[self.sp as usize] + 2)
            }
            Instruction::Jump(nnn) => Flow::Jump(nnn),
            Instruction::Call(nnn) => {
                if self.sp as usize == STACK_DEPTH {
                    return Err(ExecError::StackOverflow);
                }
                self.stack[self.sp as usize] = self.pc;
                self.sp += 1;
                Flow::Jump(nnn)
            }
            Instruction::SkipEqImm { x, nn } => {
                if self.regs[x as usize] == nn {
                    Flow::Skip
                } else {
                    Flow::Advance
                }
            }
            Instruction::SkipNeImm { x, nn } => {
                if self.regs[x as usize] != nn {
                    Flow::Skip
                } else {
                    Flow::Advance
                }
            }
            Instruction::SkipEqReg { x, y } => {
                if self.regs[x as usize] == self.regs[y as usize] {
                    Flow::Skip
                } else {
                    Flow::Advance
                }
            }
            Instruction::SetImm { x, nn } => {
                self.regs[x as usize] = nn;
                Flow::Advance
            }
            Instruction::AddImm { x, nn } => {
                self.regs[x as usize] = self.regs[x as usize].wrapping_add(nn);
                Flow::Advance
            }
            Instruction::Move { x, y } => {
                self.regs[x as usize] = self.regs[y as usize];
                Flow::Advance
            }
            Instruction::Or { x, y } => {
                self.regs[x as usize] |= self.regs[y as usize];
                Flow::Advance
            }
            Instruction::And { x, y } => {
                self.regs[x as usize] &= self.regs[y as usize];
                Flow::Advance
            }
            Instruction::Xor { x, y } => {
                self.regs[x as usize] ^= self.regs[y as usize];
                Flow::Advance
            }
            Instruction::Add { x, y } => {
                let (sum, carry) = self.regs[x as usize].overflowing_add(self.regs[y as usize]);
                self.regs[x as usize] = sum;
                self.regs[0xF] = carry as u8;
                Flow::Advance
            }
            Instruction::Sub { x, y } => {
                let (diff, borrow) = self.regs[x as usize].overflowing_sub(self.regs[y as usize]);
                self.regs[x as usize] = diff;
                self.regs[0xF] = (!borrow) as u8;
                Flow::Advance
            }
            Instruction::ShiftRight(x) => {
                let vx = self.regs[x as usize];
                self.regs[x as usize] = vx >> 1;
                self.regs[0xF] = vx & 0x01;
                Flow::Advance
            }
            Instruction::SubReverse { x, y } => {
                let (diff, borrow) = self.regs[y as usize].overflowing_sub(self.regs[x as usize]);
                self.regs[x as usize] = diff;
                self.regs[0xF] = (!borrow) as u8;
                Flow::Advance
            }
            Instruction::ShiftLeft(x) => {
                let vx = self.regs[x as usize];
                self.regs[x as usize] = vx << 1;
                self.regs[0xF] = vx >> 7;
                Flow::Advance
            }
            Instruction::SkipNeReg { x, y } => {
                if self.regs[x as usize] != self.regs[y as usize] {
                    Flow::Skip
                } else {
                    Flow::Advance
                }
            }
            Instruction::SetIndex(nnn) => {
                self.index = nnn;
                Flow::Advance
            }
            Instruction::JumpOffset(nnn) => Flow::Jump(nnn + self.regs[0] as u16),
            Instruction::Random { x, nn } => {
                self.regs[x as usize] = self.rng.next_u32() as u8 & nn;
                Flow::Advance
            }
            Instruction::Draw { x, y, n } => {
                let collided =
                    self.draw_sprite(self.regs[x as usize], self.regs[y as usize], n)?;
                self.regs[0xF] = collided as u8;
                self.fb_dirty = true;
                Flow::Advance
            }
            Instruction::SkipKeyPressed(x) => {
                // Key index is the low nibble of VX.
                if keys[(self.regs[x as usize] & 0xF) as usize] {
                    Flow::Skip
                } else {
                    Flow::Advance
                }
            }
            Instruction::SkipKeyReleased(x) => {
                if !keys[(self.regs[x as usize] & 0xF) as usize] {
                    Flow::Skip
                } else {
                    Flow::Advance
                }
            }
            Instruction::ReadDelay(x) => {
                self.regs[x as usize] = self.delay_timer;
                Flow::Advance
            }
            Instruction::WaitKey(x) => match keys.iter().position(|&held| held) {
                Some(key) => {
                    self.regs[x as usize] = key as u8;
                    Flow::Advance
                }
                // No key down: a pure no-op cycle, pc included.
                None => Flow::Wait,
            },
            Instruction::SetDelay(x) => {
                self.delay_timer = self.regs[x as usize];
                Flow::Advance
            }
            Instruction::SetSound(x) => {
                self.sound_timer = self.regs[x as usize];
                Flow::Advance
            }
            Instruction::AddIndex(x) => {
                self.index = self.index.wrapping_add(self.regs[x as usize] as u16);
                Flow::Advance
            }
            Instruction::FontGlyph(x) => {
                self.index = self.regs[x as usize] as u16 * FONT_GLYPH_BYTES;
                Flow::Advance
            }
            Instruction::StoreBcd(x) => {
                let base = self.checked_span(3)?;
                let vx = self.regs[x as usize];
                self.memory[base] = vx / 100;
                self.memory[base + 1] = (vx / 10) % 10;
                self.memory[base + 2] = vx % 10;
                Flow::Advance
            }
            Instruction::StoreRegs(x) => {
                let base = self.checked_span(x as usize + 1)?;
                for i in 0..=x as usize {
                    self.memory[base + i] = self.regs[i];
                }
                self.index += x as u16 + 1;
                Flow::Advance
            }
            Instruction::LoadRegs(x) => {
                let base = self.checked_span(x as usize + 1)?;
                for i in 0..=x as usize {
                    self.regs[i] = self.memory[base + i];
                }
                self.index += x as u16 + 1;
                Flow::Advance
            }
        };

        Ok(flow)
    }

    /// Validate that `len` bytes starting at the index register fall inside
    /// memory, returning the base address.
    fn checked_span(&self, len: usize) -> Result<usize, ExecError> {
        let base = self.index as usize;
        if base + len > MEMORY_SIZE {
            return Err(ExecError::MemoryOutOfBounds {
                address: base + len - 1,
            });
        }
        Ok(base)
    }

    /// XOR-blit an N-byte sprite from memory at the index register onto the
    /// framebuffer at `(x, y)`, bit 7 of each row leftmost.
    ///
    /// Coordinates do not wrap: rows below the screen and columns past its
    /// right edge are clipped. Returns true when any previously-lit cell
    /// was turned off, checked against the prior state of every cell drawn.
    fn draw_sprite(&mut self, x: u8, y: u8, height: u8) -> Result<bool, ExecError> {
        let base = self.checked_span(height as usize)?;

        let mut collided = false;
        for row in 0..height as usize {
            let py = y as usize + row;
            if py >= SCREEN_HEIGHT {
                break;
            }
            let bits = self.memory[base + row];
            for col in 0..8 {
                let px = x as usize + col;
                if px >= SCREEN_WIDTH {
                    break;
                }
                if bits & (0x80 >> col) == 0 {
                    continue;
                }
                let cell = &mut self.framebuffer[py * SCREEN_WIDTH + px];
                if *cell {
                    collided = true;
                }
                *cell = !*cell;
            }
        }
        Ok(collided)
    }
}
