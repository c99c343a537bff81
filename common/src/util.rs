use std::cmp::Ordering;

use eyre::{Context, ContextCompat, Result, bail};

/// Parses sizes such as `16K`, `2G` or `512` into bytes, using binary units
pub fn parse_data_size(size: &str) -> Result<u64> {
    let size = size.trim().to_lowercase();
    let size = size.strip_suffix('b').unwrap_or(&size);
    let (number, multiplier) = match size.chars().last() {
        Some('k') => (&size[..size.len() - 1], 1u64 << 10),
        Some('m') => (&size[..size.len() - 1], 1 << 20),
        Some('g') => (&size[..size.len() - 1], 1 << 30),
        Some('t') => (&size[..size.len() - 1], 1 << 40),
        Some(c) if c.is_ascii_digit() => (size, 1),
        _ => bail!("Unsupported data size {size}"),
    };
    let number = number
        .parse::<u64>()
        .context(format!("Parse data size: {size}"))?;
    number
        .checked_mul(multiplier)
        .context(format!("Data size overflows: {size}"))
}

/// Orders sizes by their value in bytes. Unparseable sizes go last, compared as text.
pub fn compare_data_sizes(a: &str, b: &str) -> Ordering {
    match (parse_data_size(a), parse_data_size(b)) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
