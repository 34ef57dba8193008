//! Error types for packet decoding

use thiserror::Error;

/// Errors that can occur while decoding a single diagnostic message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// Packet carries a different PGN than the decoder expects
    #[error("{name}: expected PGN {expected}, got {actual}")]
    WrongPgn {
        name: &'static str,
        expected: u32,
        actual: u32,
    },

    /// Payload shorter than the fixed part of the message
    #[error("data too short: expected {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// Length prefix disagrees with the bytes that follow it
    #[error("length prefix {declared} does not match payload of {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },

    /// Value cannot be represented in the wire layout
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Result type for decoding operations
pub type PacketResult<T> = Result<T, PacketError>;

/// Fail with [`PacketError::TooShort`] unless `data` holds at least `expected` bytes
pub fn require_len(data: &[u8], expected: usize) -> PacketResult<()> {
    if data.len() < expected {
        return Err(PacketError::TooShort {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_len() {
        assert!(require_len(&[0; 8], 8).is_ok());
        assert_eq!(
            require_len(&[0; 3], 8),
            Err(PacketError::TooShort {
                expected: 8,
                actual: 3
            })
        );
    }

    #[test]
    fn test_error_display() {
        let err = PacketError::LengthMismatch {
            declared: 9,
            actual: 7,
        };
        assert_eq!(
            err.to_string(),
            "length prefix 9 does not match payload of 7 bytes"
        );
    }
}
