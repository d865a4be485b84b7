//! Rijndael field arithmetic for probing test-ROM byte patterns.
//!
//! The pattern logged by the CHR-RAM test ROM turns out to be successive
//! powers of the field generator `0x03`, so the tables below can be used to
//! check whether a logged sequence matches field multiplication or a plain
//! integer recurrence.

use serde::Serialize;

/// x^8 + x^4 + x^3 + x + 1
pub const RIJNDAEL_POLY: u16 = 0x11B;

/// Multiplicative generator of GF(2^8) under `RIJNDAEL_POLY`.
pub const GENERATOR: u8 = 0x03;

/// Bytes as they appear in the test-ROM log.
pub const LOGGED_PATTERN: [u8; 16] = [
    0x03, 0x05, 0x0F, 0x11, 0x33, 0x55, 0xFF, 0x1A, 0x2E, 0x72, 0x96, 0xA1, 0xF8, 0x13, 0x35,
    0x5F,
];

/// Seed bytes read off the log before the recurrence was worked out.
pub const SEED_BYTES: [u8; 8] = [0x03, 0x05, 0x0F, 0x11, 0x33, 0x55, 0xFF, 0x1A];

/// Product of `a` and `b` in GF(2^8).
pub fn gfmul(a: u8, b: u8) -> u8 {
    let mut a = u16::from(a);
    let mut b = b;
    let mut acc: u16 = 0;
    while b != 0 {
        if b & 1 != 0 {
            acc ^= a;
        }
        a <<= 1;
        if a & 0x100 != 0 {
            a ^= RIJNDAEL_POLY;
        }
        b >>= 1;
    }
    (acc & 0xFF) as u8
}

/// `g, g^2, ..., g^count`.
pub fn powers(generator: u8, count: usize) -> Vec<u8> {
    std::iter::successors(Some(generator), |&prev| Some(gfmul(prev, generator)))
        .take(count)
        .collect()
}

/// Seed bytes followed by `prev * 3 mod 256`.
pub fn naive_pattern(count: usize) -> Vec<u8> {
    let mut out: Vec<u8> = SEED_BYTES.iter().copied().take(count).collect();
    while out.len() < count {
        let prev = out.last().copied().unwrap_or(GENERATOR);
        out.push(prev.wrapping_mul(3));
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatternComparison {
    pub expected: Vec<u8>,
    pub observed: Vec<u8>,
    /// One flag per index present in both sequences.
    pub matches: Vec<bool>,
    pub first_divergence: Option<usize>,
}

impl PatternComparison {
    pub fn matched(&self) -> usize {
        self.matches.iter().filter(|&&m| m).count()
    }

    /// True when every shared index matches and the lengths agree.
    pub fn is_exact(&self) -> bool {
        self.first_divergence.is_none() && self.expected.len() == self.observed.len()
    }
}

pub fn compare(expected: &[u8], observed: &[u8]) -> PatternComparison {
    let matches: Vec<bool> = expected
        .iter()
        .zip(observed)
        .map(|(e, o)| e == o)
        .collect();
    let first_divergence = matches.iter().position(|&m| !m);
    PatternComparison {
        expected: expected.to_vec(),
        observed: observed.to_vec(),
        matches,
        first_divergence,
    }
}

/// Space-separated upper-case hex, e.g. `03 05 0F`.
pub fn hex_row(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_annihilates() {
        for a in 0..=255u8 {
            assert_eq!(gfmul(a, 0), 0);
            assert_eq!(gfmul(0, a), 0);
        }
    }

    #[test]
    fn one_is_identity() {
        for b in 0..=255u8 {
            assert_eq!(gfmul(1, b), b);
        }
    }

    #[test]
    fn multiplication_commutes() {
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                assert_eq!(gfmul(a, b), gfmul(b, a));
            }
        }
    }

    #[test]
    fn known_products() {
        // FIPS-197 section 4.2 worked example
        assert_eq!(gfmul(0x57, 0x83), 0xC1);
        assert_eq!(gfmul(0x57, 0x13), 0xFE);
        assert_eq!(gfmul(0x80, 0x02), 0x1B);
    }

    #[test]
    fn generator_powers_reproduce_log() {
        let generated = powers(GENERATOR, LOGGED_PATTERN.len());
        let cmp = compare(&generated, &LOGGED_PATTERN);
        assert!(cmp.is_exact());
        assert_eq!(cmp.matched(), 16);
    }

    #[test]
    fn generator_has_order_255() {
        let all = powers(GENERATOR, 255);
        assert_eq!(all[254], 1);
        let mut sorted = all.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 255);
    }

    #[test]
    fn naive_recurrence_diverges_after_seed() {
        let naive = naive_pattern(16);
        assert_eq!(&naive[..8], &SEED_BYTES);
        assert_eq!(naive[8], 0x4E);
        let cmp = compare(&naive, &LOGGED_PATTERN);
        assert_eq!(cmp.first_divergence, Some(8));
    }

    #[test]
    fn naive_pattern_shorter_than_seed() {
        assert_eq!(naive_pattern(3), vec![0x03, 0x05, 0x0F]);
    }

    #[test]
    fn compare_flags_length_mismatch() {
        let cmp = compare(&[1, 2, 3], &[1, 2]);
        assert_eq!(cmp.first_divergence, None);
        assert!(!cmp.is_exact());
    }

    #[test]
    fn hex_row_formats() {
        assert_eq!(hex_row(&[0x03, 0xAF, 0x00]), "03 AF 00");
    }
}
