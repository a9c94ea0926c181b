// Packet reassembly
//
// Pages of every logical stream come out of one physical stream. Each page's
// segments are appended to the pending packet of its serial number; a lacing
// value below 255 completes that packet and it is handed out right away. The
// rest of the page is kept and consumed by the following calls.

use std::collections::HashMap;
use std::io::Read;

use log::{debug, trace, warn};

use crate::config::OggConfig;
use crate::error::{OggError, Result};
use crate::ogg::file::OggFile;
use crate::ogg::packet::{Packet, PageRef};
use crate::ogg::page::Page;
use crate::ogg::MAX_LACING_VALUE;

/// Reads packets from a container, in page order, across all streams.
///
/// Obtained from [`OggFile::packet_reader`]. The reassembly state lives in the
/// container, so dropping the handle and asking for a new one resumes where
/// the previous one stopped.
pub struct PacketReader<'a, S> {
    file: &'a mut OggFile<S>,
}

impl<'a, S: Read> PacketReader<'a, S> {
    pub(crate) fn new(file: &'a mut OggFile<S>) -> Self {
        PacketReader { file }
    }

    /// Next packet, or `Ok(None)` once every stream is exhausted.
    ///
    /// Recoverable errors (see [`OggError::is_recoverable`]) report corruption;
    /// the following call carries on with the remaining data.
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        let (input, state, config) = self.file.reader_parts()?;
        state.next_packet(input, &config)
    }
}

impl<S: Read> Iterator for PacketReader<'_, S> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet().transpose()
    }
}

/// Per serial number reassembly state.
#[derive(Debug, Default)]
struct StreamState {
    pending: Option<PendingPacket>,
    last_sequence: Option<u32>,
}

#[derive(Debug)]
struct PendingPacket {
    data: Vec<u8>,
    bos: bool,
}

/// A page being taken apart.
#[derive(Debug)]
struct PageCursor {
    page: Page,
    segment: usize,
    offset: usize,
    // a packet has begun on this page
    started: bool,
    last_end: Option<usize>,
}

impl PageCursor {
    fn new(page: Page) -> Self {
        let last_end = page.last_packet_end();
        PageCursor {
            page,
            segment: 0,
            offset: 0,
            started: false,
            last_end,
        }
    }

    /// Step over the tail of a packet whose beginning was lost.
    fn skip_continuation(&mut self) {
        let table = self.page.segment_table();
        while self.segment < table.len() {
            let len = table[self.segment];
            self.offset += len as usize;
            self.segment += 1;
            if len < MAX_LACING_VALUE {
                break;
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ReaderState {
    streams: HashMap<u32, StreamState>,
    current: Option<PageCursor>,
    finished: bool,
}

impl ReaderState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_packet<R: Read>(
        &mut self,
        input: &mut R,
        config: &OggConfig,
    ) -> Result<Option<Packet>> {
        loop {
            if let Some(packet) = self.next_from_current() {
                return Ok(Some(packet));
            }
            if self.finished {
                return self.drain_unfinished();
            }

            match Page::read(input) {
                Ok(Some(page)) => self.accept(page)?,
                Ok(None) => {
                    debug!("end of input");
                    self.finished = true;
                }
                Err(OggError::BadChecksum {
                    stored,
                    computed,
                    page,
                }) => {
                    if config.verify_checksums {
                        return Err(OggError::BadChecksum {
                            stored,
                            computed,
                            page,
                        });
                    }
                    self.accept(*page)?;
                }
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
        }
    }

    /// Continue with the segments left on the current page.
    fn next_from_current(&mut self) -> Option<Packet> {
        let cursor = self.current.as_mut()?;
        let sid = cursor.page.serial();
        let stream = self.streams.entry(sid).or_default();

        while cursor.segment < cursor.page.segment_table().len() {
            let index = cursor.segment;
            let len = cursor.page.segment_table()[index];

            let begins = stream.pending.is_none();
            let bos = begins && cursor.page.is_bos() && !cursor.started;
            if begins {
                cursor.started = true;
            }
            let pending = stream.pending.get_or_insert_with(|| PendingPacket {
                data: Vec::new(),
                bos,
            });

            let end = cursor.offset + len as usize;
            pending.data.extend_from_slice(&cursor.page.data()[cursor.offset..end]);
            cursor.offset = end;
            cursor.segment += 1;

            if len < MAX_LACING_VALUE {
                if let Some(done) = stream.pending.take() {
                    let page = &cursor.page;
                    let packet = Packet {
                        sid,
                        sequence: page.sequence(),
                        granule_position: page.granule_position(),
                        bos: done.bos,
                        eos: page.is_eos() && cursor.last_end == Some(index),
                        data: done.data,
                        origin: Some(PageRef {
                            sequence: page.sequence(),
                            checksum: page.checksum(),
                        }),
                    };
                    trace!("{}", packet);
                    return Some(packet);
                }
            }
        }

        self.current = None;
        None
    }

    /// Take in a freshly decoded page, checking it against the stream state.
    fn accept(&mut self, page: Page) -> Result<()> {
        let sid = page.serial();
        let sequence = page.sequence();
        let stream = self.streams.entry(sid).or_default();
        let mut report = None;

        if let Some(last) = stream.last_sequence {
            let expected = last.wrapping_add(1);
            if sequence != expected {
                warn!(
                    "stream {:#010x}: expected page {}, found {}",
                    sid, expected, sequence
                );
                if let Some(lost) = stream.pending.take() {
                    debug!(
                        "stream {:#010x}: dropping {} bytes of a packet cut by the gap",
                        sid,
                        lost.data.len()
                    );
                }
                report = Some(OggError::SequenceGap {
                    sid,
                    expected,
                    found: sequence,
                });
            }
        }
        stream.last_sequence = Some(sequence);

        let mut cursor = PageCursor::new(page);
        if cursor.page.is_continued() {
            if stream.pending.is_none() {
                cursor.skip_continuation();
                if report.is_none() {
                    warn!(
                        "stream {:#010x}: page {} continues a packet that never began",
                        sid, sequence
                    );
                    report = Some(OggError::Desync {
                        sid,
                        sequence,
                        reason: "continued page without a pending packet",
                    });
                }
            }
        } else if let Some(lost) = stream.pending.take() {
            warn!(
                "stream {:#010x}: page {} drops {} bytes of an unfinished packet",
                sid,
                sequence,
                lost.data.len()
            );
            if report.is_none() {
                report = Some(OggError::Desync {
                    sid,
                    sequence,
                    reason: "pending packet not continued",
                });
            }
        }

        self.current = Some(cursor);
        match report {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// At end of input, report each stream left with half a packet.
    fn drain_unfinished(&mut self) -> Result<Option<Packet>> {
        let open = self
            .streams
            .iter()
            .filter(|(_, s)| s.pending.is_some())
            .map(|(&sid, _)| sid)
            .min();

        let Some(sid) = open else {
            return Ok(None);
        };
        let pending = self
            .streams
            .get_mut(&sid)
            .and_then(|s| s.pending.take())
            .map(|p| p.data.len())
            .unwrap_or(0);
        warn!(
            "stream {:#010x} truncated with {} bytes pending",
            sid, pending
        );
        Err(OggError::TruncatedStream { sid, pending })
    }
}
