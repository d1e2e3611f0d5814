//! Error types for SCTE-35 decoding.

use thiserror::Error;

/// Errors that can occur while decoding a `splice_info_section`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Scte35Error {
    /// A read or skip would move the cursor past the end of the input.
    #[error("buffer underrun: requested {requested} bits, {remaining} remaining")]
    BufferUnderrun {
        /// Number of bits the decoder tried to consume.
        requested: usize,
        /// Number of bits left in the buffer at that point.
        remaining: usize,
    },

    /// An unsigned read was asked for zero bits or more than 64.
    #[error("invalid bit width: {0} (must be 1..=64)")]
    InvalidBitWidth(u32),

    /// A command's declared length cannot hold its fixed fields.
    #[error("splice command 0x{command_type:02X} declares {length} bytes, too short")]
    InvalidCommandLength {
        /// Raw `splice_command_type`.
        command_type: u8,
        /// Declared `splice_command_length`.
        length: u16,
    },

    /// A descriptor's declared length cannot hold its 4-byte identifier.
    #[error("splice descriptor 0x{tag:02X} declares {length} bytes, too short for identifier")]
    InvalidDescriptorLength {
        /// Raw `splice_descriptor_tag`.
        tag: u8,
        /// Declared `descriptor_length`.
        length: u8,
    },

    /// A known descriptor body read past its declared `descriptor_length`.
    #[error("splice descriptor 0x{tag:02X} declares {length} bytes, body consumed {consumed_bits} bits")]
    DescriptorBodyOverrun {
        /// Raw `splice_descriptor_tag`.
        tag: u8,
        /// Declared `descriptor_length`.
        length: u8,
        /// Bits the body parser consumed after the identifier.
        consumed_bits: usize,
    },

    /// The descriptors' cumulative length overshoots the declared loop length.
    #[error("descriptor loop overrun: declared {declared} bytes, consumed {consumed}")]
    DescriptorLoopOverrun {
        /// Declared `descriptor_loop_length`.
        declared: u16,
        /// Sum of `2 + descriptor_length` over the parsed descriptors.
        consumed: usize,
    },
}

/// Result type alias for SCTE-35 decoding.
pub type Result<T> = std::result::Result<T, Scte35Error>;
