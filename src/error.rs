// Error type shared by the page codec, the packet reader and the writers

use thiserror::Error;

use crate::ogg::page::Page;

/// Everything that can go wrong while reading or writing an Ogg stream.
#[derive(Debug, Error)]
pub enum OggError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The page does not start with `OggS`.
    #[error("invalid capture pattern {0:02x?}")]
    InvalidCapture([u8; 4]),

    #[error("unsupported stream structure version {0}")]
    UnsupportedVersion(u8),

    /// Input ended in the middle of a page.
    #[error("page truncated: expected {expected} bytes, got {got}")]
    TruncatedPage { expected: usize, got: usize },

    #[error("invalid page layout: {0}")]
    InvalidPage(&'static str),

    /// The page decoded but its CRC does not match. The page is kept so the
    /// caller can decide to skip or accept it.
    #[error("checksum mismatch on page {} of stream {:#010x}: stored {stored:#010x}, computed {computed:#010x}", .page.sequence(), .page.serial())]
    BadChecksum {
        stored: u32,
        computed: u32,
        page: Box<Page>,
    },

    #[error("sequence gap in stream {sid:#010x}: expected page {expected}, found {found}")]
    SequenceGap { sid: u32, expected: u32, found: u32 },

    /// Continuation flag and pending packet data disagree.
    #[error("stream {sid:#010x} desynchronized at page {sequence}: {reason}")]
    Desync {
        sid: u32,
        sequence: u32,
        reason: &'static str,
    },

    #[error("stream {sid:#010x} ended with {pending} bytes of an unfinished packet")]
    TruncatedStream { sid: u32, pending: usize },

    #[error("packet writer for stream {sid:#010x} is closed")]
    WriterClosed { sid: u32 },

    #[error("container is closed")]
    ContainerClosed,
}

impl OggError {
    /// Reported corruption after which reading can carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            OggError::BadChecksum { .. }
                | OggError::SequenceGap { .. }
                | OggError::Desync { .. }
                | OggError::TruncatedStream { .. }
        )
    }

    /// Take back the page carried by a checksum error.
    pub fn into_page(self) -> Option<Page> {
        match self {
            OggError::BadChecksum { page, .. } => Some(*page),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OggError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(OggError::SequenceGap { sid: 1, expected: 2, found: 4 }.is_recoverable());
        assert!(OggError::TruncatedStream { sid: 1, pending: 10 }.is_recoverable());
        assert!(!OggError::InvalidCapture(*b"RIFF").is_recoverable());
        assert!(!OggError::WriterClosed { sid: 1 }.is_recoverable());
        assert!(!OggError::ContainerClosed.is_recoverable());
    }

    #[test]
    fn test_messages() {
        let err = OggError::SequenceGap { sid: 0x10, expected: 3, found: 5 };
        assert_eq!(
            err.to_string(),
            "sequence gap in stream 0x00000010: expected page 3, found 5"
        );
        assert!(OggError::ContainerClosed.into_page().is_none());
    }
}
