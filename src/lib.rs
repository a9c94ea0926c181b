//! oggframe - Ogg bitstream (RFC 3533) reading and writing
//!
//! Pages come off a byte stream through [`Page::read`], get reassembled into
//! [`Packet`]s by the [`PacketReader`], and go the other way through one
//! [`PacketWriter`] per logical stream. [`OggFile`] owns the byte stream and
//! hands out both.
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use oggframe::OggFile;
//!
//! # fn main() -> oggframe::Result<()> {
//! let mut ogg = OggFile::new(BufReader::new(File::open("track.ogg")?));
//! let mut reader = ogg.packet_reader()?;
//! while let Some(packet) = reader.next_packet()? {
//!     println!("{}", packet);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Payloads are opaque here; decoding Vorbis, Opus or Theora is up to the
//! caller.

pub mod config;
pub mod error;
pub mod ogg;
mod utils;

pub use config::OggConfig;
pub use error::{OggError, Result};
pub use ogg::{OggFile, Packet, PacketReader, PacketWriter, Page, PageHeader, PageRef};
