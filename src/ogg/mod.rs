// Ogg container support (RFC 3533)
//
// OGG Page Layout:
// - Page Header (27 bytes)
//   - Capture Pattern: "OggS" (4 bytes)
//   - Version: 0 (1 byte)
//   - Header Type: 1=continuation, 2=bos, 4=eos (1 byte)
//   - Granule Position (8 bytes)
//   - Bitstream Serial Number (4 bytes)
//   - Page Sequence Number (4 bytes)
//   - CRC Checksum (4 bytes)
//   - Number of Page Segments (1 byte)
// - Segment Table (one lacing value per segment)
// - Page Body (sum of the lacing values)
//
// A lacing value of 255 means the packet goes on in the next segment, which
// may sit on the next page of the same stream. Anything below 255 ends it.

pub mod crc;
pub mod file;
pub mod packet;
pub mod page;
pub mod reader;
pub mod writer;

pub use file::OggFile;
pub use packet::{Packet, PageRef};
pub use page::{Page, PageHeader};
pub use reader::PacketReader;
pub use writer::PacketWriter;

// OGG signature
pub const OGG_SIGNATURE: &[u8; 4] = b"OggS";
pub const OGG_VERSION: u8 = 0;

// OGG page header types
pub const OGG_HEADER_TYPE_CONTINUATION: u8 = 0x01;
pub const OGG_HEADER_TYPE_BOS: u8 = 0x02; // Beginning of Stream
pub const OGG_HEADER_TYPE_EOS: u8 = 0x04; // End of Stream

/// Fixed part of the page header, up to and including the segment count.
pub const PAGE_HEADER_SIZE: usize = 27;
pub(crate) const CHECKSUM_OFFSET: usize = 22;

/// Largest segment table, and largest lacing value.
pub const MAX_SEGMENTS: usize = 255;
pub const MAX_LACING_VALUE: u8 = 255;

/// Granule position of a page on which no packet completes (-1 as i64).
pub const GRANULE_UNSET: u64 = u64::MAX;
