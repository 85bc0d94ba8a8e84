// Numeric helpers shared by the execution core and its notifications

pub mod decimal {
    use rust_decimal::{Decimal, RoundingStrategy};

    /// Scale of order amounts and crypto-denominated values
    pub const AMOUNT_SCALE: u32 = 8;

    /// Scale of fiat-denominated values
    pub const FIAT_SCALE: u32 = 2;

    /// Round half away from zero to `scale` decimal places
    pub fn round_to(value: Decimal, scale: u32) -> Decimal {
        value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Round an amount to 8 decimal places
    pub fn round_amount(value: Decimal) -> Decimal {
        round_to(value, AMOUNT_SCALE)
    }

    /// Percentage `rate` of `basis`, rounded to `scale`
    pub fn percent_of(basis: Decimal, rate: Decimal, scale: u32) -> Decimal {
        round_to(basis / Decimal::ONE_HUNDRED * rate, scale)
    }
}

pub mod format {
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;

    use super::decimal::round_to;

    /// Format a number with `.` thousands and `,` decimal separators
    pub fn format_grouped(value: Decimal, precision: u32) -> String {
        let rounded = round_to(value, precision);
        let fixed = format!("{:.*}", precision as usize, rounded.abs());
        let (integer, fraction) = match fixed.split_once('.') {
            Some((integer, fraction)) => (integer.to_string(), Some(fraction.to_string())),
            None => (fixed.clone(), None),
        };

        let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
        for (index, digit) in integer.chars().enumerate() {
            if index > 0 && (integer.len() - index) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(digit);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };

        match fraction {
            Some(fraction) => format!("{}{},{}", sign, grouped, fraction),
            None => format!("{}{}", sign, grouped),
        }
    }

    /// Format a timestamp as `DD/MM/YYYY HH:mm`
    pub fn format_date_time(time: DateTime<Utc>) -> String {
        time.format("%d/%m/%Y %H:%M").to_string()
    }
}
