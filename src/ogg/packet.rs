use std::fmt;

/// Identifies the page a packet was completed on.
///
/// Only a lookup key for diagnostics; it holds no reference to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRef {
    pub sequence: u32,
    pub checksum: u32,
}

/// One packet of a logical stream.
///
/// Packets coming out of the reader carry the serial number, the sequence
/// number and granule position of the page they ended on, and the BOS/EOS
/// marks. Packets handed to a writer only need their data and, if the codec
/// wants one, a granule position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    pub(crate) sid: u32,
    pub(crate) sequence: u32,
    pub(crate) granule_position: u64,
    pub(crate) bos: bool,
    pub(crate) eos: bool,
    pub(crate) data: Vec<u8>,
    pub(crate) origin: Option<PageRef>,
}

impl Packet {
    pub fn new(data: Vec<u8>) -> Self {
        Packet {
            data,
            ..Default::default()
        }
    }

    pub fn with_granule_position(mut self, granule_position: u64) -> Self {
        self.granule_position = granule_position;
        self
    }

    /// Stream serial number
    pub fn sid(&self) -> u32 {
        self.sid
    }

    /// Sequence number of the page the packet ended on.
    pub fn sequence_number(&self) -> u32 {
        self.sequence
    }

    pub fn granule_position(&self) -> u64 {
        self.granule_position
    }

    pub fn set_granule_position(&mut self, granule_position: u64) {
        self.granule_position = granule_position;
    }

    pub fn is_bos(&self) -> bool {
        self.bos
    }

    pub fn is_eos(&self) -> bool {
        self.eos
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Page this packet was read from, if any.
    pub fn origin(&self) -> Option<PageRef> {
        self.origin
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet(sid={:#010x}, page={}, granule={}, {} bytes{}{})",
            self.sid,
            self.sequence,
            self.granule_position,
            self.data.len(),
            if self.bos { ", bos" } else { "" },
            if self.eos { ", eos" } else { "" }
        )
    }
}
