/// Proquint resolver - reads the key itself as the encoded path
///
/// A proquint is a sequence of `-`-separated five-letter words, each word
/// encoding 16 bits as consonant-vowel-consonant-vowel-consonant.
use crate::{
    error::{NameError, NameResult},
    namesys::resolve::{Resolution, ResolveOnce, ResolveOptions},
    path::Path,
};
use async_trait::async_trait;
use std::time::Duration;

const CONSONANTS: &[u8; 16] = b"bdfghjklmnprstvz";
const VOWELS: &[u8; 4] = b"aiou";

/// Encode bytes as proquint words; an odd trailing byte is padded with zero
///
/// Decoding keeps the padding byte, so odd-length input does not round-trip.
pub fn encode(bytes: &[u8]) -> String {
    bytes
        .chunks(2)
        .map(|chunk| {
            let n = u16::from(chunk[0]) << 8 | u16::from(chunk.get(1).copied().unwrap_or(0));
            encode_word(n)
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn encode_word(n: u16) -> String {
    let c = |shift: u16| CONSONANTS[usize::from((n >> shift) & 0x0f)] as char;
    let v = |shift: u16| VOWELS[usize::from((n >> shift) & 0x03)] as char;
    [c(12), v(10), c(6), v(4), c(0)].iter().collect()
}

/// Decode proquint words into bytes
pub fn decode(s: &str) -> NameResult<Vec<u8>> {
    if s.is_empty() {
        return Err(NameError::InvalidProquint(s.to_string()));
    }

    let mut out = Vec::with_capacity((s.len() + 1) / 6 * 2);
    for word in s.split('-') {
        let n = decode_word(word).ok_or_else(|| NameError::InvalidProquint(s.to_string()))?;
        out.extend_from_slice(&n.to_be_bytes());
    }
    Ok(out)
}

fn decode_word(word: &str) -> Option<u16> {
    let bytes = word.as_bytes();
    if bytes.len() != 5 {
        return None;
    }

    let c = |b: u8| CONSONANTS.iter().position(|&x| x == b).map(|i| i as u16);
    let v = |b: u8| VOWELS.iter().position(|&x| x == b).map(|i| i as u16);

    Some(
        c(bytes[0])? << 12
            | v(bytes[1])? << 10
            | c(bytes[2])? << 6
            | v(bytes[3])? << 4
            | c(bytes[4])?,
    )
}

pub fn is_proquint(s: &str) -> bool {
    decode(s).is_ok()
}

/// Resolves proquint keys without any I/O
#[derive(Debug, Default, Clone, Copy)]
pub struct ProquintResolver;

#[async_trait]
impl ResolveOnce for ProquintResolver {
    async fn resolve_once(&self, name: &str, _options: &ResolveOptions) -> NameResult<Resolution> {
        let bytes = decode(name)?;
        let txt = String::from_utf8(bytes)
            .map_err(|_| NameError::InvalidProquint(format!("{}: not UTF-8", name)))?;

        // Decoding is a pure function of the key, so nothing is gained by caching
        Ok(Resolution::new(Path::parse(&txt)?, Duration::ZERO))
    }
}
