use thiserror::Error;

/// Fatal conditions raised by the CPU core.
///
/// The emulated machine is a closed, deterministic system: none of these are
/// recoverable and no operation is retried. The run loop stops at the first
/// error, after the offending site has logged a full register/flag dump.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An opcode id with no registered handler was fetched.
    #[error("no handler for opcode 0x{opcode:03X} ({mnemonic}) at PC=0x{pc:04X}")]
    Decode {
        /// Dense opcode id (0x000-0x0FF base, 0x100-0x1FF CB-prefixed).
        opcode: u16,
        mnemonic: String,
        /// Address of the opcode byte.
        pc: u16,
    },

    /// The cartridge controller rejected an access, e.g. an out-of-bounds
    /// read for the configured ROM/RAM size. The bus has no fallback value
    /// to substitute.
    #[error("cartridge {access} at 0x{addr:04X} failed: {reason}")]
    BusRange {
        addr: u16,
        access: Access,
        reason: String,
    },

    /// An address in the IO range (FF00-FF7F) has no registered handler.
    ///
    /// Returning 0 or dropping the write here would silently mask unported
    /// hardware behaviour, so unmapped IO registers fail loudly instead.
    #[error("unimplemented I/O register 0x{addr:04X} ({access})")]
    UnmappedIo { addr: u16, access: Access },

    /// ROM size or bank layout inconsistent with the supplied data,
    /// detected at load time before the run loop starts.
    #[error("malformed cartridge configuration: {0}")]
    Config(String),
}

/// Direction of a failed bus access, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Access::Read => write!(f, "read"),
            Access::Write => write!(f, "write"),
        }
    }
}
