//! Reader/writer tunables.
//!
//! Defaults follow RFC 3533: checksums are verified and pages are cut at the
//! full 255-entry segment table. Both can be overridden from code or from the
//! environment:
//! - `OGGFRAME_VERIFY_CRC` = 0|false|off|no disables checksum verification
//! - `OGGFRAME_PAGE_SEGMENTS` = 1..=255 caps the segment table of written pages

use std::fmt;

pub const ENV_VERIFY_CRC: &str = "OGGFRAME_VERIFY_CRC";
pub const ENV_PAGE_SEGMENTS: &str = "OGGFRAME_PAGE_SEGMENTS";

/// Configuration shared by the reader and the writers of one container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OggConfig {
    /// Report pages whose CRC does not match and skip them.
    /// When false, such pages are used as if they were valid.
    pub verify_checksums: bool,

    /// Upper bound on lacing values per written page (1..=255).
    /// Smaller values give smaller pages, e.g. 32 keeps pages near 8 KB.
    pub max_segments_per_page: u8,
}

impl Default for OggConfig {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            max_segments_per_page: u8::MAX,
        }
    }
}

impl OggConfig {
    /// Defaults overridden by environment variables, invalid values ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var(ENV_VERIFY_CRC) {
            if let Some(b) = parse_bool(&v) {
                cfg.verify_checksums = b;
            }
        }
        if let Ok(v) = std::env::var(ENV_PAGE_SEGMENTS) {
            if let Ok(n) = v.trim().parse::<u8>() {
                cfg = cfg.max_segments_per_page(n);
            }
        }
        cfg
    }

    pub fn verify_checksums(mut self, on: bool) -> Self {
        self.verify_checksums = on;
        self
    }

    /// Zero is clamped to one segment per page.
    pub fn max_segments_per_page(mut self, n: u8) -> Self {
        self.max_segments_per_page = n.max(1);
        self
    }

    pub(crate) fn segments_per_page(&self) -> usize {
        self.max_segments_per_page.max(1) as usize
    }
}

impl fmt::Display for OggConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verify_checksums={}, max_segments_per_page={}",
            self.verify_checksums, self.max_segments_per_page
        )
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = OggConfig::default();
        assert!(cfg.verify_checksums);
        assert_eq!(cfg.max_segments_per_page, 255);
        assert_eq!(cfg.segments_per_page(), 255);
    }

    #[test]
    fn test_builder_clamps_zero_segments() {
        let cfg = OggConfig::default().max_segments_per_page(0).verify_checksums(false);
        assert_eq!(cfg.max_segments_per_page, 1);
        assert!(!cfg.verify_checksums);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool(" Off "), Some(false));
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("maybe"), None);
    }
}
