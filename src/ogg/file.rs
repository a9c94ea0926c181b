// Ogg container: the one owner of the physical stream
//
// Reading: a single packet reader covers every logical stream, since their
// pages are interleaved in one byte stream.
// Writing: one packet writer per serial number; every page any of them
// produces reaches the stream through `write_pages`.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use log::{debug, info};

use crate::config::OggConfig;
use crate::error::{OggError, Result};
use crate::ogg::page::Page;
use crate::ogg::reader::{PacketReader, ReaderState};
use crate::ogg::writer::{PacketWriter, WriterState};

/// An Ogg physical bitstream over some byte stream.
///
/// Writers that were never closed lose their buffered packets when the file
/// is dropped; call [`close`](OggFile::close) to finish every stream.
pub struct OggFile<S> {
    stream: Option<S>,
    config: OggConfig,
    reader: Option<ReaderState>,
    writers: BTreeMap<u32, WriterState>,
}

impl<S> OggFile<S> {
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, OggConfig::default())
    }

    pub fn with_config(stream: S, config: OggConfig) -> Self {
        OggFile {
            stream: Some(stream),
            config,
            reader: None,
            writers: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &OggConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Serial numbers that have a writer, in ascending order.
    pub fn writer_sids(&self) -> Vec<u32> {
        self.writers.keys().copied().collect()
    }

    /// Give the stream back without finishing any writer.
    pub fn into_inner(self) -> Result<S> {
        self.stream.ok_or(OggError::ContainerClosed)
    }

    pub(crate) fn reader_parts(&mut self) -> Result<(&mut S, &mut ReaderState, OggConfig)> {
        let stream = self.stream.as_mut().ok_or(OggError::ContainerClosed)?;
        let state = self.reader.get_or_insert_with(ReaderState::new);
        Ok((stream, state, self.config))
    }

    pub(crate) fn writer_state(&mut self, sid: u32) -> &mut WriterState {
        self.writers
            .entry(sid)
            .or_insert_with(|| WriterState::new(sid))
    }

    pub(crate) fn existing_writer_state(&self, sid: u32) -> Option<&WriterState> {
        self.writers.get(&sid)
    }
}

impl<S: Read> OggFile<S> {
    /// The packet reader of this file, created on first use.
    pub fn packet_reader(&mut self) -> Result<PacketReader<'_, S>> {
        if self.is_closed() {
            return Err(OggError::ContainerClosed);
        }
        self.reader.get_or_insert_with(ReaderState::new);
        Ok(PacketReader::new(self))
    }
}

impl<S: Write> OggFile<S> {
    /// The writer for `sid`, created on first use.
    pub fn packet_writer(&mut self, sid: u32) -> Result<PacketWriter<'_, S>> {
        if self.is_closed() {
            return Err(OggError::ContainerClosed);
        }
        if !self.writers.contains_key(&sid) {
            debug!("new packet writer for stream {:#010x}", sid);
            self.writer_state(sid);
        }
        Ok(PacketWriter::new(self, sid))
    }

    /// Write finished pages to the stream, in order.
    pub fn write_pages(&mut self, pages: &[Page]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(OggError::ContainerClosed)?;
        for page in pages {
            page.write(stream)?;
            debug!(
                "wrote page {} of stream {:#010x}: {} segments, {} bytes",
                page.sequence(),
                page.serial(),
                page.segment_table().len(),
                page.encoded_len()
            );
        }
        Ok(())
    }

    pub(crate) fn flush_writer(&mut self, sid: u32) -> Result<()> {
        if self.is_closed() {
            return Err(OggError::ContainerClosed);
        }
        let max_segments = self.config.segments_per_page();
        let pages = self.writer_state(sid).layout(max_segments)?;
        self.write_pages(&pages)
    }

    pub(crate) fn close_writer(&mut self, sid: u32) -> Result<()> {
        if self.is_closed() {
            return Err(OggError::ContainerClosed);
        }
        self.writer_state(sid).mark_end()?;
        self.flush_writer(sid)?;
        self.writer_state(sid).closed = true;
        debug!("closed packet writer for stream {:#010x}", sid);
        Ok(())
    }

    /// Close every open writer, flush the stream and hand it back.
    pub fn close(&mut self) -> Result<S> {
        if self.is_closed() {
            return Err(OggError::ContainerClosed);
        }

        let open: Vec<u32> = self
            .writers
            .iter()
            .filter(|(_, w)| !w.closed)
            .map(|(&sid, _)| sid)
            .collect();
        for sid in open {
            self.close_writer(sid)?;
        }

        let mut stream = self.stream.take().ok_or(OggError::ContainerClosed)?;
        stream.flush()?;
        info!("closed ogg file with {} logical streams", self.writers.len());
        Ok(stream)
    }
}
