// I/O utilities for reading page data

use std::io::{ErrorKind, Read};

/// Fill `buf` as far as the reader allows.
///
/// Returns the number of bytes read, which is only less than `buf.len()`
/// when the input is exhausted. Interrupted reads are retried.
pub fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
