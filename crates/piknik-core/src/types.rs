use std::fmt;

/// Operation selector sent as the first byte after the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Replace the stored blob
    Store = 0x53,
    /// Fetch the stored blob, leaving it in place
    Get = 0x47,
    /// Fetch the stored blob and delete it on the server
    Move = 0x4d,
}

impl Opcode {
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x53 => Some(Opcode::Store),
            0x47 => Some(Opcode::Get),
            0x4d => Some(Opcode::Move),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Store => "store",
            Opcode::Get => "get",
            Opcode::Move => "move",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a fetch treats the stored blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Leave the blob on the server
    #[default]
    Get,
    /// Atomically fetch and delete
    Move,
}

impl FetchMode {
    pub fn from_move_flag(is_move: bool) -> Self {
        if is_move {
            FetchMode::Move
        } else {
            FetchMode::Get
        }
    }

    pub fn is_move(self) -> bool {
        self == FetchMode::Move
    }

    pub fn opcode(self) -> Opcode {
        match self {
            FetchMode::Get => Opcode::Get,
            FetchMode::Move => Opcode::Move,
        }
    }
}
