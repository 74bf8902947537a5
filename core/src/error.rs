use thiserror::Error;

/// Failures while placing a program image into VM memory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The image does not fit between the entry point and the end of memory.
    #[error("program image is {size} bytes, at most {max} fit above the entry point")]
    ImageTooLarge { size: usize, max: usize },

    /// The image source yielded fewer bytes than its declared size.
    #[error("image source declared {expected} bytes but only {got} were read")]
    ShortRead { expected: usize, got: usize },
}

/// Faults that terminate an emulation run. No instruction is retried and
/// there is no partial-instruction rollback; the host decides how to halt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// The program counter points past the last fetchable instruction.
    #[error("program counter {0:#06x} points past the end of memory")]
    PcOutOfBounds(u16),

    /// Decode succeeded on no known opcode pattern.
    #[error("no semantics for opcode {0:#06x}")]
    UnimplementedOpcode(u16),

    /// A call was issued with all 16 stack slots in use.
    #[error("subroutine call with all stack slots in use")]
    StackOverflow,

    /// A return was issued with an empty call stack.
    #[error("subroutine return with an empty call stack")]
    StackUnderflow,

    /// A memory-indexed operation reached past the 4096-byte address space.
    /// The index register is allowed to accumulate past 0xFFF, so the
    /// access itself is the point where the fault is reported.
    #[error("memory access out of bounds at address {address:#07x}")]
    MemoryOutOfBounds { address: usize },
}
