use std::str::FromStr;

use anyhow::{Result, bail};
use rust_decimal::Decimal;

/// Parses an Indonesian-formatted numeric string ("1.234,56") into an exact
/// decimal. `.` is the thousands separator, `,` the decimal separator.
/// Callers treat a failure as "value absent" and default to zero.
pub fn parse_number(input: &str) -> Result<Decimal> {
    let cleaned = input.trim().replace('.', "").replace(',', ".");
    match Decimal::from_str(&cleaned) {
        Ok(value) => Ok(value),
        Err(_) => bail!("malformed locale number: {input:?}"),
    }
}
