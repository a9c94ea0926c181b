// Ogg page checksum
//
// CRC-32 with polynomial 0x04c11db7, initial value 0, no bit reflection and
// no final xor. This is not the zlib/IEEE CRC, so crc32fast and friends do
// not apply.

const POLYNOMIAL: u32 = 0x04c1_1db7;

static TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut r = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            r = if r & 0x8000_0000 != 0 {
                (r << 1) ^ POLYNOMIAL
            } else {
                r << 1
            };
            bit += 1;
        }
        table[i] = r;
        i += 1;
    }
    table
}

/// Feed `bytes` into a running checksum.
pub fn update(mut crc: u32, bytes: &[u8]) -> u32 {
    for &b in bytes {
        crc = (crc << 8) ^ TABLE[(((crc >> 24) as u8) ^ b) as usize];
    }
    crc
}

/// Checksum of a complete buffer.
pub fn checksum(bytes: &[u8]) -> u32 {
    update(0, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(checksum(b"123456789"), 0x89a1_897f);
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data = b"OggS and some page body bytes";
        let split = update(update(0, &data[..7]), &data[7..]);
        assert_eq!(split, checksum(data));
    }
}
