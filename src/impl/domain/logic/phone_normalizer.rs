pub(crate) const COUNTRY_CODE: &str = "55";

/// Shortest digit string that can carry the country code (2 + 2 area + 8).
const MIN_LEN_WITH_COUNTRY_CODE: usize = 12;

/// Canonicalize a phone string into a comparison key.
///
/// Keeps digits only, drops a leading country code, and for numbers of 10+
/// digits keeps the 2-digit area code plus the last 8 digits. The latter
/// collapses the optional mobile '9' prefix, so 8- and 9-digit local numbers
/// compare equal.
///
/// The country code is not stripped unconditionally: a leading "55" only
/// counts as one when at least 12 digits are present. Shorter inputs such as
/// "5512345678" keep it as their area code, which keeps the function
/// idempotent on its own output.
pub(crate) fn normalize_phone(raw: &str) -> String {
    let digits = digits_only(raw);
    let local = match digits.strip_prefix(COUNTRY_CODE) {
        Some(rest) if digits.len() >= MIN_LEN_WITH_COUNTRY_CODE => rest,
        _ => digits.as_str(),
    };
    if local.len() >= 10 {
        format!("{}{}", &local[..2], &local[local.len() - 8..])
    } else {
        local.to_string()
    }
}

pub(crate) fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}
