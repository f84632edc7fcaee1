use iso_currency::Currency;
use num_format::{Locale, ToFormattedString as _};
use rust_decimal::{prelude::ToPrimitive as _, Decimal, RoundingStrategy};

/// Standard number decimal places for the given currency
/// (ex. JPY = 0, BRL = 2).
fn decimal_places(currency: Currency) -> u32 {
    currency.exponent().unwrap_or(0) as u32
}

/// Format a (non-negative) cash amount with currency symbol, correct number of
/// decimal places and proper thousands separators (ex. "R$ 1,234.50").
///
/// For consistency, uses en locale ('.' as decimal mark, i.e. 1,000.00)
/// regardless of user's locale or currency.
pub(crate) fn format_amount(amount: Decimal, currency: Currency) -> String {
    let decimal_places = decimal_places(currency);
    let rounded =
        amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero);
    let integer_part = rounded
        .trunc()
        .to_i64()
        .unwrap_or_default()
        .to_formatted_string(&Locale::en);
    if decimal_places == 0 {
        return format!("{} {}", currency.symbol(), integer_part);
    }
    let fractional_digits = (rounded.fract().abs() * Decimal::from(10u64.pow(decimal_places)))
        .trunc()
        .to_u64()
        .unwrap_or_default();
    format!(
        "{} {}.{:0width$}",
        currency.symbol(),
        integer_part,
        fractional_digits,
        width = decimal_places as usize,
    )
}
