//! Byte counts as printed in cleanup totals.

const UNITS: [&str; 5] = ["bytes", "KB", "MB", "GB", "TB"];

/// Format a byte count with binary multiples, one decimal above bytes.
pub fn format_size(bytes: u64) -> String {
    let Some((exponent, unit)) = UNITS
        .iter()
        .enumerate()
        .rev()
        .find(|(exponent, _)| bytes >= 1u64 << (10 * exponent))
        .filter(|(exponent, _)| *exponent > 0)
    else {
        return format!("{bytes} bytes");
    };

    let scaled = bytes as f64 / (1u64 << (10 * exponent)) as f64;
    format!("{scaled:.1} {unit}")
}

/// Convert a pkginfo `*_item_size` value (KiB) to bytes.
pub fn kib_to_bytes(kib: u64) -> u64 {
    kib.saturating_mul(1024)
}
