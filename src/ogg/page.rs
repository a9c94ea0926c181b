use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};

use crate::error::{OggError, Result};
use crate::ogg::{
    crc, CHECKSUM_OFFSET, MAX_LACING_VALUE, MAX_SEGMENTS, OGG_HEADER_TYPE_BOS,
    OGG_HEADER_TYPE_CONTINUATION, OGG_HEADER_TYPE_EOS, OGG_SIGNATURE, OGG_VERSION,
    PAGE_HEADER_SIZE,
};
use crate::utils::io::read_up_to;

/// OGG Page Header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub(crate) header_type: u8,
    pub(crate) granule_position: u64,
    pub(crate) serial: u32,
    pub(crate) sequence: u32,
    pub(crate) checksum: u32,
    pub(crate) segment_table: Vec<u8>,
}

/// OGG Page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub(crate) header: PageHeader,
    pub(crate) data: Vec<u8>,
}

impl PageHeader {
    /// Read a page header.
    ///
    /// `Ok(None)` means the input ended cleanly before the first byte.
    pub fn read<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let mut raw = [0u8; PAGE_HEADER_SIZE];
        let got = read_up_to(reader, &mut raw)?;
        if got == 0 {
            return Ok(None);
        }
        if got < PAGE_HEADER_SIZE {
            return Err(OggError::TruncatedPage {
                expected: PAGE_HEADER_SIZE,
                got,
            });
        }

        let capture = [raw[0], raw[1], raw[2], raw[3]];
        if &capture != OGG_SIGNATURE {
            return Err(OggError::InvalidCapture(capture));
        }
        if raw[4] != OGG_VERSION {
            return Err(OggError::UnsupportedVersion(raw[4]));
        }

        let segment_count = raw[26] as usize;
        let mut segment_table = vec![0u8; segment_count];
        let got = read_up_to(reader, &mut segment_table)?;
        if got < segment_count {
            return Err(OggError::TruncatedPage {
                expected: PAGE_HEADER_SIZE + segment_count,
                got: PAGE_HEADER_SIZE + got,
            });
        }

        Ok(Some(PageHeader {
            header_type: raw[5],
            granule_position: LittleEndian::read_u64(&raw[6..14]),
            serial: LittleEndian::read_u32(&raw[14..18]),
            sequence: LittleEndian::read_u32(&raw[18..22]),
            checksum: LittleEndian::read_u32(&raw[22..26]),
            segment_table,
        }))
    }

    /// Serialize the header and segment table with the given checksum.
    fn to_bytes(&self, checksum: u32) -> Vec<u8> {
        let mut raw = [0u8; PAGE_HEADER_SIZE];
        raw[0..4].copy_from_slice(OGG_SIGNATURE);
        raw[4] = OGG_VERSION;
        raw[5] = self.header_type;
        LittleEndian::write_u64(&mut raw[6..14], self.granule_position);
        LittleEndian::write_u32(&mut raw[14..18], self.serial);
        LittleEndian::write_u32(&mut raw[18..22], self.sequence);
        LittleEndian::write_u32(&mut raw[22..26], checksum);
        raw[26] = self.segment_table.len() as u8;

        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&raw);
        out.extend_from_slice(&self.segment_table);
        out
    }

    /// Total body size announced by the segment table
    pub fn data_size(&self) -> usize {
        self.segment_table.iter().map(|&x| x as usize).sum()
    }

    /// Header plus segment table size in bytes.
    pub fn encoded_len(&self) -> usize {
        PAGE_HEADER_SIZE + self.segment_table.len()
    }

    pub fn header_type(&self) -> u8 {
        self.header_type
    }

    pub fn segment_table(&self) -> &[u8] {
        &self.segment_table
    }
}

impl Page {
    /// Build a page from its parts; the checksum is computed here.
    pub fn new(
        header_type: u8,
        granule_position: u64,
        serial: u32,
        sequence: u32,
        segment_table: Vec<u8>,
        data: Vec<u8>,
    ) -> Result<Self> {
        if segment_table.len() > MAX_SEGMENTS {
            return Err(OggError::InvalidPage("more than 255 segments"));
        }
        let mut page = Page {
            header: PageHeader {
                header_type,
                granule_position,
                serial,
                sequence,
                checksum: 0,
                segment_table,
            },
            data,
        };
        if page.header.data_size() != page.data.len() {
            return Err(OggError::InvalidPage("segment table does not match body length"));
        }
        page.header.checksum = page.compute_checksum();
        Ok(page)
    }

    /// Read one page.
    ///
    /// A checksum mismatch is returned as [`OggError::BadChecksum`] with the
    /// decoded page inside it.
    pub fn read<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let Some(header) = PageHeader::read(reader)? else {
            return Ok(None);
        };

        let data_size = header.data_size();
        let mut data = vec![0u8; data_size];
        let got = read_up_to(reader, &mut data)?;
        if got < data_size {
            return Err(OggError::TruncatedPage {
                expected: header.encoded_len() + data_size,
                got: header.encoded_len() + got,
            });
        }

        let page = Page { header, data };
        let computed = page.compute_checksum();
        if computed != page.header.checksum {
            warn!(
                "checksum mismatch on page {} of stream {:#010x}",
                page.sequence(),
                page.serial()
            );
            return Err(OggError::BadChecksum {
                stored: page.header.checksum,
                computed,
                page: Box::new(page),
            });
        }

        debug!(
            "read page {} of stream {:#010x}: {} segments, {} bytes",
            page.sequence(),
            page.serial(),
            page.header.segment_table.len(),
            page.data.len()
        );
        Ok(Some(page))
    }

    /// CRC over the encoded page with the checksum field zeroed.
    pub fn compute_checksum(&self) -> u32 {
        let crc = crc::update(0, &self.header.to_bytes(0));
        crc::update(crc, &self.data)
    }

    /// Encode the page, computing a fresh checksum.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header.to_bytes(0);
        out.extend_from_slice(&self.data);
        let crc = crc::checksum(&out);
        LittleEndian::write_u32(&mut out[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4], crc);
        out
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    pub fn header(&self) -> &PageHeader {
        &self.header
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn serial(&self) -> u32 {
        self.header.serial
    }

    pub fn sequence(&self) -> u32 {
        self.header.sequence
    }

    pub fn granule_position(&self) -> u64 {
        self.header.granule_position
    }

    /// Checksum as stored in the header
    pub fn checksum(&self) -> u32 {
        self.header.checksum
    }

    pub fn segment_table(&self) -> &[u8] {
        &self.header.segment_table
    }

    pub fn is_continued(&self) -> bool {
        self.header.header_type & OGG_HEADER_TYPE_CONTINUATION != 0
    }

    pub fn is_bos(&self) -> bool {
        self.header.header_type & OGG_HEADER_TYPE_BOS != 0
    }

    pub fn is_eos(&self) -> bool {
        self.header.header_type & OGG_HEADER_TYPE_EOS != 0
    }

    /// Number of packets that end on this page.
    pub fn packet_count(&self) -> usize {
        self.header
            .segment_table
            .iter()
            .filter(|&&v| v < MAX_LACING_VALUE)
            .count()
    }

    /// Index of the last segment that ends a packet.
    pub fn last_packet_end(&self) -> Option<usize> {
        self.header
            .segment_table
            .iter()
            .rposition(|&v| v < MAX_LACING_VALUE)
    }

    /// Whether the last packet on the page goes on in the next page.
    pub fn is_open_ended(&self) -> bool {
        self.header.segment_table.last() == Some(&MAX_LACING_VALUE)
    }

    pub fn encoded_len(&self) -> usize {
        self.header.encoded_len() + self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // BOS|EOS page, granule 0, serial 1, sequence 0, one segment "abc"
    const SMALL_PAGE: [u8; 31] = [
        0x4f, 0x67, 0x67, 0x53, 0x00, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x63, 0x76, 0xfb, 0x98, 0x01, 0x03,
        0x61, 0x62, 0x63,
    ];

    #[test]
    fn test_decode_known_page() {
        let page = Page::read(&mut Cursor::new(&SMALL_PAGE[..])).unwrap().unwrap();
        assert!(page.is_bos());
        assert!(page.is_eos());
        assert!(!page.is_continued());
        assert_eq!(page.serial(), 1);
        assert_eq!(page.sequence(), 0);
        assert_eq!(page.granule_position(), 0);
        assert_eq!(page.checksum(), 0x98fb_7663);
        assert_eq!(page.segment_table(), &[3]);
        assert_eq!(page.data(), b"abc");
        assert_eq!(page.packet_count(), 1);
        assert_eq!(page.encoded_len(), SMALL_PAGE.len());
    }

    #[test]
    fn test_encode_matches_known_bytes() {
        let page = Page::new(
            OGG_HEADER_TYPE_BOS | OGG_HEADER_TYPE_EOS,
            0,
            1,
            0,
            vec![3],
            b"abc".to_vec(),
        )
        .unwrap();
        assert_eq!(page.checksum(), 0x98fb_7663);
        assert_eq!(page.to_bytes(), SMALL_PAGE.to_vec());
    }

    #[test]
    fn test_empty_input_is_end() {
        assert!(Page::read(&mut Cursor::new(Vec::new())).unwrap().is_none());
    }

    #[test]
    fn test_bad_capture_and_version() {
        let mut bytes = SMALL_PAGE.to_vec();
        bytes[0] = b'X';
        match Page::read(&mut Cursor::new(bytes)) {
            Err(OggError::InvalidCapture(c)) => assert_eq!(&c, b"XggS"),
            other => panic!("unexpected {:?}", other),
        }

        let mut bytes = SMALL_PAGE.to_vec();
        bytes[4] = 1;
        assert!(matches!(
            Page::read(&mut Cursor::new(bytes)),
            Err(OggError::UnsupportedVersion(1))
        ));
    }

    #[test]
    fn test_truncated_page() {
        let short = &SMALL_PAGE[..10];
        assert!(matches!(
            Page::read(&mut Cursor::new(short)),
            Err(OggError::TruncatedPage { expected: 27, got: 10 })
        ));

        let no_body = &SMALL_PAGE[..29];
        assert!(matches!(
            Page::read(&mut Cursor::new(no_body)),
            Err(OggError::TruncatedPage { expected: 31, got: 29 })
        ));
    }

    #[test]
    fn test_checksum_error_keeps_page() {
        let mut bytes = SMALL_PAGE.to_vec();
        bytes[29] ^= 0x20;
        let err = Page::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.is_recoverable());
        let page = err.into_page().unwrap();
        assert_eq!(page.data(), b"aBc");
        assert_ne!(page.compute_checksum(), page.checksum());
    }

    #[test]
    fn test_layout_validation() {
        assert!(Page::new(0, 0, 1, 0, vec![2], b"abc".to_vec()).is_err());
        assert!(Page::new(0, 0, 1, 0, vec![0; 256], Vec::new()).is_err());
    }

    #[test]
    fn test_packet_ends() {
        let page = Page::new(0, 0, 7, 3, vec![255, 10, 255, 255], vec![0; 775]).unwrap();
        assert_eq!(page.packet_count(), 1);
        assert_eq!(page.last_packet_end(), Some(1));
        assert!(page.is_open_ended());

        let empty = Page::new(0, 0, 7, 4, Vec::new(), Vec::new()).unwrap();
        assert_eq!(empty.packet_count(), 0);
        assert_eq!(empty.last_packet_end(), None);
        assert!(!empty.is_open_ended());
    }
}
