// src/load/sniff.rs

const CANDIDATES: [u8; 4] = [b',', b';', b'|', b'\t'];

/// Pick the field delimiter by counting candidates in the header line,
/// ignoring anything inside double quotes. Ties go to the earlier
/// candidate, so a header with no separators at all reads as comma-separated.
pub fn sniff_delimiter(header_line: &str) -> u8 {
    let mut counts = [0usize; CANDIDATES.len()];
    let mut in_quotes = false;

    for b in header_line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(i) = CANDIDATES.iter().position(|&c| c == b) {
            counts[i] += 1;
        }
    }

    let mut best = 0;
    for i in 1..CANDIDATES.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    CANDIDATES[best]
}
