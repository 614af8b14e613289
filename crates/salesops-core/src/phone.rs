//! Phone number normalisation, the join key between bookings and call logs.

/// Normalise a raw phone number to `+<digits>`.
///
/// Non-digits are stripped and a bare 10-digit number is assumed to be North
/// American, so it gains a leading `1`. Input without any digits yields an
/// empty string, which never matches anything.
pub fn normalize(phone: &str) -> String {
  let mut digits: String = phone.chars().filter(char::is_ascii_digit).collect();
  if digits.is_empty() {
    return String::new();
  }
  if digits.len() == 10 {
    digits.insert(0, '1');
  }
  format!("+{digits}")
}

/// [`normalize`] over an optional column value.
pub fn normalize_opt(phone: Option<&str>) -> String {
  phone.map(normalize).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ten_digit_numbers_gain_country_code() {
    assert_eq!(normalize("555-111-2222"), "+15551112222");
    assert_eq!(normalize("(555) 111 2222"), "+15551112222");
    assert_eq!(normalize("5551112222"), "+15551112222");
  }

  #[test]
  fn other_lengths_are_kept_as_is() {
    assert_eq!(normalize("+1 555 111 2222"), "+15551112222");
    assert_eq!(normalize("+44 20 7946 0958"), "+442079460958");
    assert_eq!(normalize("12345"), "+12345");
  }

  #[test]
  fn empty_and_digitless_inputs_yield_empty() {
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("n/a"), "");
    assert_eq!(normalize_opt(None), "");
  }

  #[test]
  fn repeated_calls_agree() {
    let raw = "555.111.2222";
    assert_eq!(normalize(raw), normalize(raw));
  }
}
