// Packet buffering and page layout for one logical stream
//
// Packets are buffered until flush, then laced: a packet of n bytes becomes
// n / 255 segments of 255 and one closing segment of n % 255, which is 0 when
// n is a multiple of 255. The lacing values are cut into pages of at most
// `max_segments_per_page` entries. A closing 0 that lands past a page boundary
// opens the next page, which then carries the continuation flag.

use std::io::Write;

use log::{debug, trace};

use crate::error::{OggError, Result};
use crate::ogg::file::OggFile;
use crate::ogg::packet::Packet;
use crate::ogg::page::Page;
use crate::ogg::{
    GRANULE_UNSET, MAX_LACING_VALUE, OGG_HEADER_TYPE_BOS, OGG_HEADER_TYPE_CONTINUATION,
    OGG_HEADER_TYPE_EOS,
};

/// Writes packets of one logical stream into a container.
///
/// Obtained from [`OggFile::packet_writer`]. Buffered packets and the page
/// counter live in the container; the handle only names the stream.
pub struct PacketWriter<'a, S> {
    file: &'a mut OggFile<S>,
    sid: u32,
}

impl<'a, S: Write> PacketWriter<'a, S> {
    pub(crate) fn new(file: &'a mut OggFile<S>, sid: u32) -> Self {
        PacketWriter { file, sid }
    }

    pub fn sid(&self) -> u32 {
        self.sid
    }

    /// Buffer a packet without writing anything yet.
    ///
    /// BOS and EOS marks on the packet are ignored; the first page of the
    /// stream gets BOS and [`close`](Self::close) sets EOS.
    pub fn buffer_packet(&mut self, packet: Packet) -> Result<()> {
        self.file.writer_state(self.sid).buffer(packet)
    }

    /// Buffer a packet and optionally flush right away.
    pub fn buffer_packet_and_flush(&mut self, packet: Packet, flush: bool) -> Result<()> {
        self.buffer_packet(packet)?;
        if flush {
            self.flush()?;
        }
        Ok(())
    }

    /// Payload bytes waiting for the next flush, framing excluded.
    ///
    /// RFC 3533 suggests pages of 4-8 KB; callers can watch this to decide
    /// when to flush.
    pub fn pending_byte_size(&self) -> usize {
        self.file
            .existing_writer_state(self.sid)
            .map_or(0, WriterState::pending_byte_size)
    }

    /// Set the granule position of the most recently buffered packet.
    ///
    /// Also used for the empty EOS packet that `close` may have to add.
    pub fn set_granule_position(&mut self, granule_position: u64) {
        self.file
            .writer_state(self.sid)
            .set_granule_position(granule_position);
    }

    pub fn granule_position(&self) -> u64 {
        self.file
            .existing_writer_state(self.sid)
            .map_or(0, |w| w.granule_position)
    }

    /// Sequence number the next page will get.
    pub fn next_sequence(&self) -> u32 {
        self.file
            .existing_writer_state(self.sid)
            .map_or(0, |w| w.next_sequence)
    }

    pub fn is_closed(&self) -> bool {
        self.file
            .existing_writer_state(self.sid)
            .is_some_and(|w| w.closed)
    }

    /// Lay the buffered packets out into pages and write them.
    pub fn flush(&mut self) -> Result<()> {
        self.file.flush_writer(self.sid)
    }

    /// Mark the end of the stream, flush, and refuse any further packets.
    pub fn close(&mut self) -> Result<()> {
        self.file.close_writer(self.sid)
    }
}

/// One lacing value and, if it closes a packet, that packet's index.
#[derive(Debug, Clone, Copy)]
struct Lace {
    value: u8,
    ends: Option<usize>,
}

#[derive(Debug)]
pub(crate) struct WriterState {
    sid: u32,
    buffer: Vec<Packet>,
    next_sequence: u32,
    granule_position: u64,
    pub(crate) closed: bool,
}

impl WriterState {
    pub(crate) fn new(sid: u32) -> Self {
        WriterState {
            sid,
            buffer: Vec::new(),
            next_sequence: 0,
            granule_position: 0,
            closed: false,
        }
    }

    pub(crate) fn buffer(&mut self, mut packet: Packet) -> Result<()> {
        if self.closed {
            return Err(OggError::WriterClosed { sid: self.sid });
        }
        packet.sid = self.sid;
        packet.sequence = 0;
        packet.bos = false;
        packet.eos = false;
        packet.origin = None;
        self.granule_position = packet.granule_position;
        trace!(
            "stream {:#010x}: buffered {} bytes",
            self.sid,
            packet.data.len()
        );
        self.buffer.push(packet);
        Ok(())
    }

    pub(crate) fn pending_byte_size(&self) -> usize {
        self.buffer.iter().map(|p| p.data.len()).sum()
    }

    fn set_granule_position(&mut self, granule_position: u64) {
        self.granule_position = granule_position;
        if let Some(last) = self.buffer.last_mut() {
            last.granule_position = granule_position;
        }
    }

    /// Flag the last buffered packet as the end of the stream, adding an
    /// empty one when nothing is buffered.
    pub(crate) fn mark_end(&mut self) -> Result<()> {
        if self.closed {
            return Err(OggError::WriterClosed { sid: self.sid });
        }
        match self.buffer.last_mut() {
            Some(last) => last.eos = true,
            None => self.buffer.push(Packet {
                sid: self.sid,
                granule_position: self.granule_position,
                eos: true,
                ..Default::default()
            }),
        }
        Ok(())
    }

    /// Turn the buffer into finished pages and clear it.
    pub(crate) fn layout(&mut self, max_segments: usize) -> Result<Vec<Page>> {
        if self.closed {
            return Err(OggError::WriterClosed { sid: self.sid });
        }
        if self.buffer.is_empty() {
            return Ok(Vec::new());
        }

        let mut laces = Vec::new();
        for (index, packet) in self.buffer.iter().enumerate() {
            let full = packet.data.len() / MAX_LACING_VALUE as usize;
            laces.extend(std::iter::repeat(Lace {
                value: MAX_LACING_VALUE,
                ends: None,
            })
            .take(full));
            laces.push(Lace {
                value: (packet.data.len() % MAX_LACING_VALUE as usize) as u8,
                ends: Some(index),
            });
        }

        let body: Vec<u8> = self
            .buffer
            .iter()
            .flat_map(|p| p.data.iter().copied())
            .collect();

        let mut pages = Vec::new();
        let mut offset = 0;
        let mut continued = false;

        for chunk in laces.chunks(max_segments.max(1)) {
            let mut header_type = 0;
            if continued {
                header_type |= OGG_HEADER_TYPE_CONTINUATION;
            }
            if self.next_sequence == 0 {
                header_type |= OGG_HEADER_TYPE_BOS;
            }
            if chunk
                .iter()
                .filter_map(|l| l.ends)
                .any(|i| self.buffer[i].eos)
            {
                header_type |= OGG_HEADER_TYPE_EOS;
            }

            let granule_position = chunk
                .iter()
                .rev()
                .find_map(|l| l.ends)
                .map_or(GRANULE_UNSET, |i| self.buffer[i].granule_position);

            let size: usize = chunk.iter().map(|l| l.value as usize).sum();
            let table: Vec<u8> = chunk.iter().map(|l| l.value).collect();
            let page = Page::new(
                header_type,
                granule_position,
                self.sid,
                self.next_sequence,
                table,
                body[offset..offset + size].to_vec(),
            )?;

            offset += size;
            continued = chunk.last().is_some_and(|l| l.ends.is_none());
            self.next_sequence = self.next_sequence.wrapping_add(1);
            pages.push(page);
        }

        debug!(
            "stream {:#010x}: laid out {} packets into {} pages",
            self.sid,
            self.buffer.len(),
            pages.len()
        );
        self.buffer.clear();
        Ok(pages)
    }
}
