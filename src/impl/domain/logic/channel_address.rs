use super::phone_normalizer::{digits_only, COUNTRY_CODE};

/// Suffix of addresses that expose the participant's phone number.
pub(crate) const PHONE_SUFFIX: &str = "@c.us";
/// Suffix of anonymized participant addresses.
pub(crate) const ANONYMIZED_SUFFIX: &str = "@lid";
pub(crate) const STATUS_BROADCAST: &str = "status@broadcast";

/// Longest stored phone that still lacks the country code (2 area + 9 local).
const MAX_LEN_WITHOUT_COUNTRY_CODE: usize = 11;

pub(crate) fn is_anonymized(address: &str) -> bool {
    address.ends_with(ANONYMIZED_SUFFIX)
}

/// Part of the address before the '@', if any.
pub(crate) fn user_part(address: &str) -> &str {
    address.split('@').next().unwrap_or_default()
}

/// Phone candidate carried by a non-anonymized address, if it looks like one.
pub(crate) fn phone_candidate(address: &str) -> Option<String> {
    if is_anonymized(address) {
        return None;
    }
    let digits = digits_only(user_part(address));
    (!digits.is_empty()).then_some(digits)
}

/// Full international digits for a stored phone, adding the country code
/// when it is missing.
pub(crate) fn international_digits(phone: &str) -> String {
    let digits = digits_only(phone);
    if digits.len() <= MAX_LEN_WITHOUT_COUNTRY_CODE {
        format!("{COUNTRY_CODE}{digits}")
    } else {
        digits
    }
}

/// Transport address for a phone, following the channel suffix convention.
pub(crate) fn phone_address(phone: &str) -> String {
    format!("{}{}", international_digits(phone), PHONE_SUFFIX)
}
