//! Size, rate and ETA token parsing.

/// Convert `<number><unit>` into bytes. Binary units (KiB, MiB, GiB, TiB) use
/// 1024, decimal units (KB, MB, GB, TB) use 1000, `B` is bytes. Matching is
/// case-insensitive.
pub fn parse_size(number: &str, unit: &str) -> Option<u64> {
    let value: f64 = number.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let multiplier = unit_multiplier(unit.trim())?;
    Some((value * multiplier).round() as u64)
}

fn unit_multiplier(unit: &str) -> Option<f64> {
    let lower = unit.to_ascii_lowercase();
    let stem = lower.strip_suffix('b')?;
    if stem.is_empty() {
        return Some(1.0);
    }
    let (prefix, binary) = match stem.strip_suffix('i') {
        Some(p) => (p, true),
        None => (stem, false),
    };
    let power = match prefix {
        "k" => 1,
        "m" => 2,
        "g" => 3,
        "t" => 4,
        _ => return None,
    };
    let base: f64 = if binary { 1024.0 } else { 1000.0 };
    Some(base.powi(power))
}

/// Parse `mm:ss` or `hh:mm:ss` into seconds. Anything else is `None`.
pub fn parse_eta(raw: &str) -> Option<u64> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    let mut total: u64 = 0;
    for part in parts {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: u64 = part.parse().ok()?;
        total = total.checked_mul(60)?.checked_add(n)?;
    }
    Some(total)
}
