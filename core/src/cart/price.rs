// ranmix/src/cart/price.rs

//! Display helpers for integer prices in the smallest currency unit.

/// Renders `125000` as `125,000đ`.
pub fn format_price(price: u64) -> String {
  let digits = price.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out.push('đ');
  out
}

/// Recovers the integer from a display string by dropping every non-digit.
///
/// Returns `None` when no digit remains or the value does not fit in a `u64`.
pub fn parse_price(display: &str) -> Option<u64> {
  let digits: String = display.chars().filter(char::is_ascii_digit).collect();
  if digits.is_empty() {
    return None;
  }
  digits.parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn formats_with_thousands_separators() {
    assert_eq!(format_price(0), "0đ");
    assert_eq!(format_price(999), "999đ");
    assert_eq!(format_price(1_000), "1,000đ");
    assert_eq!(format_price(125_000), "125,000đ");
    assert_eq!(format_price(1_234_567), "1,234,567đ");
  }

  #[test]
  fn parse_inverts_format() {
    for p in [0u64, 7, 39_000, 50_000, 299_000, 1_000_000, 98_765_432_100, u64::MAX] {
      assert_eq!(parse_price(&format_price(p)), Some(p), "price {}", p);
    }
  }

  #[test]
  fn parse_rejects_digitless_input() {
    assert_eq!(parse_price("Liên hệ"), None);
    assert_eq!(parse_price(""), None);
    assert_eq!(parse_price("299.000 VND"), Some(299_000));
  }
}
