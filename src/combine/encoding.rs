//! Encoding resolution. Bytes are decoded by the first candidate in a fixed priority list
//! that accepts every byte; windows-1252 is the byte-preserving fallback when none does.

use crate::combine::error::MergeError;
use encoding_rs::{DecoderResult, EncoderResult, Encoding, EUC_KR, UTF_8, WINDOWS_1252};

/// Candidate labels used when neither config nor CLI selects any.
pub const DEFAULT_ENCODING_LABELS: [&str; 2] = ["utf-8", "euc-kr"];

/// Written in place of a character the target encoding cannot represent.
const REPLACEMENT_BYTE: u8 = b'?';

/// Scratch buffer size for streaming encoder/decoder calls.
const CHUNK_LEN: usize = 8192;

/// Labels accepted on top of the WHATWG label set.
const LABEL_ALIASES: [(&str, &str); 2] = [("cp949", "windows-949"), ("uhc", "windows-949")];

/// Raw bytes with the text they decode to and the encoding that produced it.
#[derive(Debug, Clone)]
pub struct DecodedContent {
    pub bytes: Vec<u8>,
    pub text: String,
    pub encoding: &'static Encoding,
    /// True when no candidate accepted the bytes and the fallback decoding was used.
    pub lossy: bool,
    /// Offsets of byte sequences the primary candidate rejects. Empty unless `lossy`.
    pub malformed_offsets: Vec<usize>,
}

impl DecodedContent {
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Decoded text with a leading byte-order mark removed.
    pub fn text_without_bom(&self) -> &str {
        self.text.strip_prefix('\u{FEFF}').unwrap_or(&self.text)
    }
}

/// Text encoded into a target encoding, with the count of characters replaced by `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedText {
    pub bytes: Vec<u8>,
    pub replaced: usize,
}

/// Ordered list of candidate encodings.
#[derive(Debug, Clone)]
pub struct EncodingResolver {
    candidates: Vec<&'static Encoding>,
}

impl Default for EncodingResolver {
    fn default() -> Self {
        Self {
            candidates: vec![UTF_8, EUC_KR],
        }
    }
}

impl EncodingResolver {
    /// Build a resolver from encodings in priority order. Duplicates are dropped, keeping
    /// the first position.
    pub fn new(candidates: Vec<&'static Encoding>) -> Result<Self, MergeError> {
        if candidates.is_empty() {
            return Err(MergeError::EmptyEncodingList);
        }
        let mut unique: Vec<&'static Encoding> = Vec::with_capacity(candidates.len());
        for encoding in candidates {
            check_candidate(encoding)?;
            if !unique.contains(&encoding) {
                unique.push(encoding);
            }
        }
        Ok(Self { candidates: unique })
    }

    /// Build a resolver from encoding labels such as `utf-8`, `euc-kr`, `cp949`, `shift_jis`.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self, MergeError> {
        let encodings = labels
            .iter()
            .map(|l| encoding_for_label(l.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(encodings)
    }

    pub fn candidates(&self) -> &[&'static Encoding] {
        &self.candidates
    }

    /// Decode `bytes` with the first candidate that accepts all of them. Never fails: when
    /// every candidate rejects the input, the windows-1252 decoding is returned with
    /// `lossy` set and the offsets the primary candidate rejected.
    pub fn resolve(&self, bytes: Vec<u8>) -> DecodedContent {
        let found = self.candidates.iter().find_map(|&encoding| {
            encoding
                .decode_without_bom_handling_and_without_replacement(&bytes)
                .map(|text| (encoding, text.into_owned()))
        });
        if let Some((encoding, text)) = found {
            return DecodedContent {
                bytes,
                text,
                encoding,
                lossy: false,
                malformed_offsets: Vec::new(),
            };
        }

        let malformed_offsets = malformed_offsets(self.candidates[0], &bytes);
        let text = WINDOWS_1252.decode_without_bom_handling(&bytes).0.into_owned();
        DecodedContent {
            bytes,
            text,
            encoding: WINDOWS_1252,
            lossy: true,
            malformed_offsets,
        }
    }
}

/// Look up an encoding by label (case-insensitive, surrounding whitespace ignored).
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding, MergeError> {
    let trimmed = label.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let canonical = LABEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, target)| *target)
        .unwrap_or(trimmed);
    Encoding::for_label(canonical.as_bytes()).ok_or_else(|| MergeError::UnknownEncoding {
        label: label.to_string(),
    })
}

/// UTF-16 and `replacement` decode but encode as UTF-8, so appended bytes would not
/// match the file.
fn check_candidate(encoding: &'static Encoding) -> Result<(), MergeError> {
    if encoding.output_encoding() != encoding {
        return Err(MergeError::UnsupportedEncoding {
            name: encoding.name().to_string(),
            reason: format!("text would be written as {}", encoding.output_encoding().name()),
        });
    }
    Ok(())
}

/// Start offsets of every malformed sequence `encoding` reports for `bytes`.
fn malformed_offsets(encoding: &'static Encoding, bytes: &[u8]) -> Vec<usize> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut scratch = vec![0u8; CHUNK_LEN];
    let mut offsets = Vec::new();
    let mut pos = 0;
    loop {
        let (result, read, _) =
            decoder.decode_to_utf8_without_replacement(&bytes[pos..], &mut scratch, true);
        pos += read;
        match result {
            DecoderResult::InputEmpty => break,
            DecoderResult::OutputFull => {}
            DecoderResult::Malformed(bad, after) => {
                offsets.push(pos.saturating_sub(bad as usize + after as usize));
            }
        }
    }
    offsets
}

/// Encode `text` into `encoding`, writing `?` for each unencodable character.
pub fn encode_lossy(encoding: &'static Encoding, text: &str) -> EncodedText {
    if encoding == UTF_8 {
        return EncodedText {
            bytes: text.as_bytes().to_vec(),
            replaced: 0,
        };
    }
    let mut encoder = encoding.new_encoder();
    let mut bytes = Vec::with_capacity(text.len());
    let mut scratch = vec![0u8; CHUNK_LEN];
    let mut replaced = 0;
    let mut rest = text;
    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(rest, &mut scratch, true);
        bytes.extend_from_slice(&scratch[..written]);
        rest = &rest[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(_) => {
                bytes.push(REPLACEMENT_BYTE);
                replaced += 1;
            }
        }
    }
    EncodedText { bytes, replaced }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::SHIFT_JIS;

    fn euc_kr_bytes(s: &str) -> Vec<u8> {
        EUC_KR.encode(s).0.into_owned()
    }

    #[test]
    fn ascii_resolves_to_default_encoding() {
        let decoded = EncodingResolver::default().resolve(b"int main() {}".to_vec());
        assert_eq!(decoded.encoding, UTF_8);
        assert!(!decoded.lossy);
        assert_eq!(decoded.text, "int main() {}");
        assert!(decoded.malformed_offsets.is_empty());
    }

    #[test]
    fn utf8_hangul_resolves_to_default_encoding() {
        let decoded = EncodingResolver::default().resolve("// 주석 안녕하세요".as_bytes().to_vec());
        assert_eq!(decoded.encoding, UTF_8);
        assert!(!decoded.lossy);
        assert_eq!(decoded.text, "// 주석 안녕하세요");
    }

    #[test]
    fn euc_kr_bytes_resolve_to_legacy_encoding() {
        let bytes = euc_kr_bytes("// 안녕하세요\nint x;");
        assert!(std::str::from_utf8(&bytes).is_err());
        let decoded = EncodingResolver::default().resolve(bytes);
        assert_eq!(decoded.encoding, EUC_KR);
        assert!(!decoded.lossy);
        assert_eq!(decoded.text, "// 안녕하세요\nint x;");
    }

    #[test]
    fn undecodable_bytes_fall_back_and_record_offsets() {
        // Latin-1 "café": 0xE9 opens a sequence that never completes in UTF-8 or EUC-KR.
        let decoded = EncodingResolver::default().resolve(b"caf\xE9".to_vec());
        assert!(decoded.lossy);
        assert_eq!(decoded.encoding, WINDOWS_1252);
        assert_eq!(decoded.text, "café");
        assert_eq!(decoded.malformed_offsets, vec![3]);
    }

    #[test]
    fn fallback_records_every_malformed_offset() {
        let decoded = EncodingResolver::default().resolve(b"a\xFFb\xFEc\x80".to_vec());
        assert!(decoded.lossy);
        assert_eq!(decoded.malformed_offsets, vec![1, 3, 5]);
    }

    #[test]
    fn resolve_never_fails_and_fallback_preserves_bytes() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        let decoded = EncodingResolver::default().resolve(bytes.clone());
        assert!(decoded.lossy);
        assert_eq!(decoded.text.chars().count(), 256);
        assert_eq!(encode_lossy(WINDOWS_1252, &decoded.text).bytes, bytes);
    }

    #[test]
    fn empty_input_decodes_under_first_candidate() {
        let decoded = EncodingResolver::default().resolve(Vec::new());
        assert_eq!(decoded.encoding, UTF_8);
        assert!(!decoded.lossy);
        assert!(decoded.text.is_empty());
    }

    #[test]
    fn candidate_order_decides_between_valid_encodings() -> Result<(), MergeError> {
        let bytes = euc_kr_bytes("한글");
        let resolver = EncodingResolver::from_labels(&["euc-kr", "utf-8"])?;
        assert_eq!(resolver.resolve(bytes.clone()).encoding, EUC_KR);
        let resolver = EncodingResolver::from_labels(&["utf-8", "shift_jis", "euc-kr"])?;
        let decoded = resolver.resolve(bytes);
        assert_ne!(decoded.encoding, UTF_8);
        assert!(!decoded.lossy);
        Ok(())
    }

    #[test]
    fn legacy_encoding_outside_candidates_is_lossy() -> Result<(), MergeError> {
        let resolver = EncodingResolver::from_labels(&["utf-8"])?;
        let decoded = resolver.resolve(euc_kr_bytes("안녕"));
        assert!(decoded.lossy);
        assert!(!decoded.malformed_offsets.is_empty());
        Ok(())
    }

    #[test]
    fn text_without_bom_strips_leading_mark_only() {
        let decoded = EncodingResolver::default().resolve(b"\xEF\xBB\xBFint a;".to_vec());
        assert_eq!(decoded.encoding, UTF_8);
        assert_eq!(decoded.text, "\u{FEFF}int a;");
        assert_eq!(decoded.text_without_bom(), "int a;");
    }

    #[test]
    fn labels_resolve_with_aliases_and_dedupe() -> Result<(), MergeError> {
        assert_eq!(encoding_for_label("cp949")?, EUC_KR);
        assert_eq!(encoding_for_label(" UTF-8 ")?, UTF_8);
        assert_eq!(encoding_for_label("sjis")?, SHIFT_JIS);
        let resolver = EncodingResolver::from_labels(&["utf-8", "utf8", "euc-kr", "cp949"])?;
        assert_eq!(resolver.candidates(), &[UTF_8, EUC_KR]);
        Ok(())
    }

    #[test]
    fn unknown_label_errors() {
        match encoding_for_label("klingon") {
            Err(MergeError::UnknownEncoding { label }) => assert_eq!(label, "klingon"),
            other => panic!("expected UnknownEncoding, got {:?}", other),
        }
    }

    #[test]
    fn utf16_and_empty_lists_are_rejected() {
        assert!(matches!(
            EncodingResolver::from_labels(&["utf-16le"]),
            Err(MergeError::UnsupportedEncoding { .. })
        ));
        assert!(matches!(
            EncodingResolver::new(Vec::new()),
            Err(MergeError::EmptyEncodingList)
        ));
    }

    #[test]
    fn encode_lossy_replaces_unencodable_characters() {
        let encoded = encode_lossy(WINDOWS_1252, "a안b녕");
        assert_eq!(encoded.bytes, b"a?b?");
        assert_eq!(encoded.replaced, 2);
    }

    #[test]
    fn encode_lossy_into_legacy_encoding_round_trips() {
        let encoded = encode_lossy(EUC_KR, "// 안녕하세요 🙂");
        assert_eq!(encoded.replaced, 1);
        let (text, had_errors) = EUC_KR.decode_without_bom_handling(&encoded.bytes);
        assert!(!had_errors);
        assert_eq!(text, "// 안녕하세요 ?");
    }

    #[test]
    fn encode_lossy_utf8_is_verbatim() {
        let encoded = encode_lossy(UTF_8, "안녕 café");
        assert_eq!(encoded.bytes, "안녕 café".as_bytes());
        assert_eq!(encoded.replaced, 0);
    }
}
