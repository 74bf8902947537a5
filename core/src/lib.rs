//! CHIP-8 virtual machine.
//!
//! The crate implements the original CHIP-8 instruction set against a small
//! register/memory/display state machine. It owns no window, no timing loop
//! and no input device: the host feeds a program image into [`VmBuilder`],
//! calls [`Vm::step`] with the current 16-key state once per emulated cycle,
//! drives the two hardware timers at 60 Hz through [`Vm::step_timers`] and
//! reads the boolean framebuffer back out for presentation.
//!
//! Useful links:
//! * [Guide to making a CHIP-8 emulator](https://tobiasvl.github.io/blog/write-a-chip-8-emulator/)
//! * [Cowgod's Chip-8 technical reference](http://devernay.free.fr/hacks/chip8/C8TECH10.HTM)

mod color;
mod error;
mod inst;
mod vm;

pub use color::{Color, ParseColorError, Surface, DEFAULT_BACKGROUND_COLOR, DEFAULT_FOREGROUND_COLOR};
pub use error::{ExecError, LoadError};
pub use inst::Instruction;
pub use vm::{
    read_image, Vm, VmBuilder, DEFAULT_FONT, ENTRY_POINT, MAX_IMAGE_SIZE, SCREEN_HEIGHT,
    SCREEN_WIDTH,
};
