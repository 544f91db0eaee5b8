//! Text encoding normalization for delimited text and HTML sources.
//!
//! Input is accepted as UTF-8 when it validates, otherwise it is decoded from a
//! legacy regional encoding (GBK unless configured otherwise).
use encoding_rs::Encoding;
use std::borrow::Cow;

/// Default legacy encoding tried when the bytes are not UTF-8
pub const DEFAULT_LEGACY_ENCODING: &Encoding = encoding_rs::GBK;

const UTF8_BOM: char = '\u{feff}';

/// Returns `bytes` as UTF-8 text, decoding from `legacy` if they are not valid UTF-8.
///
/// A leading UTF-8 byte order mark is removed.
pub fn to_utf8<'a>(bytes: &'a [u8], legacy: &'static Encoding) -> Cow<'a, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text.strip_prefix(UTF8_BOM).unwrap_or(text)),
        Err(_) => {
            tracing::debug!(encoding = legacy.name(), "input is not UTF-8, decoding as legacy text");
            let (text, _) = legacy.decode_without_bom_handling(bytes);
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_utf8() {
        assert!(matches!(to_utf8("名称,数量".as_bytes(), DEFAULT_LEGACY_ENCODING), Cow::Borrowed("名称,数量")));
    }

    #[test]
    fn strip_bom() {
        assert_eq!(to_utf8(b"\xEF\xBB\xBFa,b", DEFAULT_LEGACY_ENCODING), "a,b");
    }

    #[test]
    fn decode_gbk() {
        let (bytes, _, _) = encoding_rs::GBK.encode("名称,数量");
        assert!(std::str::from_utf8(&bytes).is_err());
        assert_eq!(to_utf8(&bytes, DEFAULT_LEGACY_ENCODING), "名称,数量");
    }

    #[test]
    fn decode_other_legacy_encoding() {
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("表");
        assert_eq!(to_utf8(&bytes, encoding_rs::SHIFT_JIS), "表");
    }
}
