//! Property-based tests using proptest
//!
//! Random packet sequences go through the writer and back through the reader.

use proptest::prelude::*;
use std::io::Cursor;

use oggframe::ogg::{GRANULE_UNSET, MAX_LACING_VALUE};
use oggframe::{OggConfig, OggFile, Packet, Page};

/// Packet sizes biased towards the 255-byte boundaries
fn size_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![
        0usize..600,
        (0usize..5).prop_map(|k| k * 255),
        (1usize..5).prop_map(|k| k * 255 - 1),
        (1usize..5).prop_map(|k| k * 255 + 1),
        Just(255 * 255),
        66_000usize..70_000,
    ]
}

fn packets_strategy() -> impl Strategy<Value = Vec<(usize, u64, bool)>> {
    // u64::MAX is the "no packet completed" marker, never a real granule
    prop::collection::vec((size_strategy(), 0..u64::MAX, any::<bool>()), 1..12)
}

fn data(index: usize, size: usize) -> Vec<u8> {
    (0..size).map(|i| (index ^ i) as u8).collect()
}

fn write_stream(packets: &[(usize, u64, bool)], config: OggConfig, flush_each: bool) -> Vec<u8> {
    let mut out = OggFile::with_config(Vec::new(), config);
    {
        let mut w = out.packet_writer(0xabcd).unwrap();
        for (i, &(size, granule, flush)) in packets.iter().enumerate() {
            let last = i + 1 == packets.len();
            w.buffer_packet_and_flush(
                Packet::new(data(i, size)).with_granule_position(granule),
                !last && (flush_each || flush),
            )
            .unwrap();
        }
    }
    out.close().unwrap()
}

fn read_pages(bytes: Vec<u8>) -> Vec<Page> {
    let mut input = Cursor::new(bytes);
    let mut pages = Vec::new();
    while let Some(page) = Page::read(&mut input).unwrap() {
        pages.push(page);
    }
    pages
}

proptest! {
    #[test]
    fn round_trip_one_stream(packets in packets_strategy()) {
        let bytes = write_stream(&packets, OggConfig::default(), true);
        let mut input = OggFile::new(Cursor::new(bytes));
        let read: Vec<Packet> = input.packet_reader().unwrap().map(|r| r.unwrap()).collect();

        prop_assert_eq!(read.len(), packets.len());
        for (i, (p, &(size, granule, _))) in read.iter().zip(&packets).enumerate() {
            prop_assert_eq!(p.sid(), 0xabcd);
            let want = data(i, size);
            prop_assert_eq!(p.data(), want.as_slice());
            prop_assert_eq!(p.granule_position(), granule);
            prop_assert_eq!(p.is_bos(), i == 0);
            prop_assert_eq!(p.is_eos(), i + 1 == packets.len());
        }
    }

    #[test]
    fn page_layout_invariants(packets in packets_strategy(), max_segments in 1u8..=255) {
        let config = OggConfig::default().max_segments_per_page(max_segments);
        let pages = read_pages(write_stream(&packets, config, false));

        let mut open_ended = false;
        for (i, page) in pages.iter().enumerate() {
            prop_assert_eq!(page.sequence(), i as u32);
            prop_assert_eq!(page.is_bos(), i == 0);
            prop_assert_eq!(page.is_eos(), i + 1 == pages.len());
            prop_assert!(page.segment_table().len() <= max_segments as usize);
            prop_assert!(!page.segment_table().is_empty());
            prop_assert_eq!(page.is_continued(), open_ended);
            prop_assert_eq!(page.granule_position() == GRANULE_UNSET, page.packet_count() == 0);
            open_ended = page.segment_table().last() == Some(&MAX_LACING_VALUE);
        }
        prop_assert!(!open_ended);

        let completed: usize = pages.iter().map(|p| p.packet_count()).sum();
        prop_assert_eq!(completed, packets.len());
    }

    #[test]
    fn arbitrary_flushes_keep_payloads(packets in packets_strategy()) {
        let bytes = write_stream(&packets, OggConfig::default(), false);
        let mut input = OggFile::new(Cursor::new(bytes));
        let read: Vec<Packet> = input.packet_reader().unwrap().map(|r| r.unwrap()).collect();

        prop_assert_eq!(read.len(), packets.len());
        for (i, (p, &(size, _, _))) in read.iter().zip(&packets).enumerate() {
            let want = data(i, size);
            prop_assert_eq!(p.data(), want.as_slice());
        }
    }
}
