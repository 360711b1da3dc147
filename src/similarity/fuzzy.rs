//! Context-triggered piecewise hashing.
//!
//! Digests use the spamsum text layout `blocksize:digest1:digest2`, where
//! `digest1` is cut at `blocksize` and `digest2` at twice that. A rolling
//! hash over the last seven bytes decides the cut points, so an edit only
//! disturbs the pieces it touches and two digests can be compared by edit
//! distance.

use thiserror::Error;

const ROLLING_WINDOW: usize = 7;
const MIN_BLOCK_SIZE: u64 = 3;
const SPAMSUM_LENGTH: usize = 64;
const HASH_PRIME: u32 = 0x0100_0193;
const HASH_INIT: u32 = 0x2802_1967;
const MAX_RUN: usize = 3;

const B64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FuzzyHashError {
    #[error("malformed fuzzy digest '{0}'")]
    Malformed(String),
}

/// Rolling hash over a fixed window of recent bytes
#[derive(Default)]
struct RollingHash {
    window: [u8; ROLLING_WINDOW],
    h1: u32,
    h2: u32,
    h3: u32,
    n: usize,
}

impl RollingHash {
    fn update(&mut self, c: u8) -> u32 {
        let c32 = u32::from(c);
        let slot = self.n % ROLLING_WINDOW;

        #[allow(clippy::cast_possible_truncation)] // ROLLING_WINDOW is 7
        let window_len = ROLLING_WINDOW as u32;

        self.h2 = self
            .h2
            .wrapping_sub(self.h1)
            .wrapping_add(window_len.wrapping_mul(c32));
        self.h1 = self
            .h1
            .wrapping_add(c32)
            .wrapping_sub(u32::from(self.window[slot]));
        self.window[slot] = c;
        self.n += 1;
        self.h3 = (self.h3 << 5) ^ c32;

        self.h1.wrapping_add(self.h2).wrapping_add(self.h3)
    }
}

#[inline]
fn piece_hash(c: u8, h: u32) -> u32 {
    h.wrapping_mul(HASH_PRIME) ^ u32::from(c)
}

#[inline]
fn b64_char(h: u32) -> char {
    char::from(B64[(h % 64) as usize])
}

/// Compute the fuzzy digest of `data`
#[must_use]
pub fn hash(data: &[u8]) -> String {
    let len = data.len() as u64;
    let mut block_size = MIN_BLOCK_SIZE;
    while block_size * (SPAMSUM_LENGTH as u64) < len {
        block_size *= 2;
    }

    loop {
        let (first, second) = digest_at(data, block_size);
        if block_size > MIN_BLOCK_SIZE && first.len() < SPAMSUM_LENGTH / 2 {
            block_size /= 2;
            continue;
        }
        return format!("{block_size}:{first}:{second}");
    }
}

fn digest_at(data: &[u8], block_size: u64) -> (String, String) {
    let mut roll = RollingHash::default();
    let mut h1 = HASH_INIT;
    let mut h2 = HASH_INIT;
    let mut first = String::with_capacity(SPAMSUM_LENGTH);
    let mut second = String::with_capacity(SPAMSUM_LENGTH / 2);
    let double = block_size * 2;

    for &c in data {
        h1 = piece_hash(c, h1);
        h2 = piece_hash(c, h2);
        let trigger = u64::from(roll.update(c));

        if trigger % block_size == block_size - 1 && first.len() < SPAMSUM_LENGTH - 1 {
            first.push(b64_char(h1));
            h1 = HASH_INIT;
        }
        if trigger % double == double - 1 && second.len() < SPAMSUM_LENGTH / 2 - 1 {
            second.push(b64_char(h2));
            h2 = HASH_INIT;
        }
    }

    if h1 != HASH_INIT {
        first.push(b64_char(h1));
    }
    if h2 != HASH_INIT {
        second.push(b64_char(h2));
    }

    (first, second)
}

struct ParsedDigest<'a> {
    block_size: u64,
    first: &'a str,
    second: &'a str,
}

impl<'a> ParsedDigest<'a> {
    fn parse(digest: &'a str) -> Result<Self, FuzzyHashError> {
        let malformed = || FuzzyHashError::Malformed(digest.to_string());

        let mut parts = digest.splitn(3, ':');
        let block_size = parts
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&bs| bs >= MIN_BLOCK_SIZE)
            .ok_or_else(malformed)?;
        let first = parts.next().ok_or_else(malformed)?;
        let second = parts.next().ok_or_else(malformed)?;

        if second.contains(':') {
            return Err(malformed());
        }

        Ok(Self {
            block_size,
            first,
            second,
        })
    }
}

/// Similarity of two digests, 0 (unrelated) to 100 (identical)
///
/// # Errors
///
/// Returns an error if either digest is not in `blocksize:digest1:digest2` form.
pub fn compare(a: &str, b: &str) -> Result<u32, FuzzyHashError> {
    let a = ParsedDigest::parse(a)?;
    let b = ParsedDigest::parse(b)?;

    let (bs_a, bs_b) = (a.block_size, b.block_size);
    if bs_a != bs_b && bs_a != bs_b.saturating_mul(2) && bs_b != bs_a.saturating_mul(2) {
        return Ok(0);
    }

    let a1 = collapse_runs(a.first);
    let a2 = collapse_runs(a.second);
    let b1 = collapse_runs(b.first);
    let b2 = collapse_runs(b.second);

    if bs_a == bs_b && a1 == b1 {
        return Ok(100);
    }

    let score = if bs_a == bs_b {
        score_strings(&a1, &b1, bs_a).max(score_strings(&a2, &b2, bs_a.saturating_mul(2)))
    } else if bs_a == bs_b.saturating_mul(2) {
        score_strings(&a1, &b2, bs_a)
    } else {
        score_strings(&a2, &b1, bs_b)
    };

    Ok(score)
}

/// Runs of a repeated character carry little information; keep at most three.
fn collapse_runs(s: &str) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::with_capacity(s.len());
    for &c in s.as_bytes() {
        let run = out.iter().rev().take_while(|&&p| p == c).count();
        if run < MAX_RUN {
            out.push(c);
        }
    }
    out
}

fn has_common_substring(a: &[u8], b: &[u8]) -> bool {
    if a.len() < ROLLING_WINDOW || b.len() < ROLLING_WINDOW {
        return false;
    }
    a.windows(ROLLING_WINDOW)
        .any(|w| b.windows(ROLLING_WINDOW).any(|v| v == w))
}

/// Edit distance with unit insert/delete and a substitution cost of two
fn edit_distance(a: &[u8], b: &[u8]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitute = prev[j] + if ca == cb { 0 } else { 2 };
            let delete = prev[j + 1] + 1;
            let insert = curr[j] + 1;
            curr[j + 1] = substitute.min(delete).min(insert);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn score_strings(a: &[u8], b: &[u8], block_size: u64) -> u32 {
    if a.len() > SPAMSUM_LENGTH || b.len() > SPAMSUM_LENGTH {
        return 0;
    }
    if !has_common_substring(a, b) {
        return 0;
    }

    let spamsum_len = SPAMSUM_LENGTH as u64;
    let distance = edit_distance(a, b) as u64;
    let total = (a.len() + b.len()) as u64;

    let scaled = distance * spamsum_len / total;
    let scaled = 100 * scaled / spamsum_len;
    if scaled >= 100 {
        return 0;
    }
    let mut score = 100 - scaled;

    // Small block sizes produce short, collision-prone pieces; cap the score
    // by how much data the shorter digest actually covers.
    let cap_block_size = ((99 + ROLLING_WINDOW as u64) / ROLLING_WINDOW as u64) * MIN_BLOCK_SIZE;
    if block_size < cap_block_size {
        let cap = block_size / MIN_BLOCK_SIZE * a.len().min(b.len()) as u64;
        score = score.min(cap);
    }

    u32::try_from(score).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
        let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn test_hash_layout() {
        let digest = hash(&pseudo_random_bytes(10_000, 1));
        let parts: Vec<&str> = digest.split(':').collect();
        assert_eq!(parts.len(), 3);

        let block_size: u64 = parts[0].parse().unwrap();
        assert!(block_size >= MIN_BLOCK_SIZE);
        assert!(!parts[1].is_empty());
        assert!(parts[1].len() <= SPAMSUM_LENGTH);
        assert!(parts[2].len() <= SPAMSUM_LENGTH / 2);
        assert!(parts[1].bytes().all(|c| B64.contains(&c)));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let data = pseudo_random_bytes(4096, 7);
        assert_eq!(hash(&data), hash(&data));
    }

    #[test]
    fn test_hash_empty_input() {
        assert_eq!(hash(&[]), "3::");
    }

    #[test]
    fn test_identical_digests_score_hundred() {
        let digest = hash(&pseudo_random_bytes(20_000, 3));
        assert_eq!(compare(&digest, &digest), Ok(100));
    }

    #[test]
    fn test_small_edit_scores_high() {
        let original = pseudo_random_bytes(65_536, 11);
        let mut edited = original.clone();
        edited[30_000] ^= 0xFF;

        let score = compare(&hash(&original), &hash(&edited)).unwrap();
        assert!(score > 50, "single-byte edit scored {score}");
    }

    #[test]
    fn test_unrelated_data_scores_zero() {
        let a = hash(&pseudo_random_bytes(65_536, 5));
        let b = hash(&pseudo_random_bytes(65_536, 6));
        assert_eq!(compare(&a, &b), Ok(0));
    }

    #[test]
    fn test_incompatible_block_sizes() {
        assert_eq!(compare("3:ABCDEFGHIJ:ABCDE", "12:ABCDEFGHIJ:ABCDE"), Ok(0));
    }

    #[test]
    fn test_malformed_digest() {
        assert!(matches!(
            compare("not a digest", "3:ABC:AB"),
            Err(FuzzyHashError::Malformed(_))
        ));
        assert!(compare("3:ABC", "3:ABC:AB").is_err());
        assert!(compare("1:ABC:AB", "3:ABC:AB").is_err());
    }

    #[test]
    fn test_collapse_runs() {
        assert_eq!(collapse_runs("AAAAAB"), b"AAAB".to_vec());
        assert_eq!(collapse_runs("ABAB"), b"ABAB".to_vec());
        assert_eq!(collapse_runs(""), Vec::<u8>::new());
    }

    #[test]
    fn test_edit_distance_weights() {
        assert_eq!(edit_distance(b"ABC", b"ABC"), 0);
        assert_eq!(edit_distance(b"ABC", b"ABD"), 2);
        assert_eq!(edit_distance(b"ABC", b"ABCD"), 1);
        assert_eq!(edit_distance(b"", b"AB"), 2);
    }

    #[test]
    fn test_common_substring_required() {
        assert!(has_common_substring(b"xxABCDEFGyy", b"zzABCDEFGzz"));
        assert!(!has_common_substring(b"ABCDEF", b"ABCDEF"));
        assert!(!has_common_substring(b"ABCDEFGH", b"HGFEDCBA"));
    }
}
