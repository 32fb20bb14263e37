//! Oracle NUMBER codec.
//!
//! Oracle NUMBER is a variable-length format where:
//! - First byte is exponent (with sign info in high bit)
//! - Remaining bytes are base-100 digits of mantissa
//! - Negative numbers store `101 - digit` and end with a 102 terminator
//!   when the mantissa is shorter than 20 bytes

use crate::error::{Error, Result};

/// Maximum number of base-100 digits in a NUMBER mantissa.
const MAX_MANTISSA_DIGITS: usize = 20;

/// Decode Oracle NUMBER format to string.
///
/// Preserves full precision by returning the number as a string.
/// Use `.parse::<i64>()` or `.parse::<f64>()` to convert.
pub fn decode_oracle_number(bytes: &[u8]) -> Result<String> {
    if bytes.is_empty() {
        return Ok("0".to_string());
    }

    let exp_byte = bytes[0];
    let is_positive = (exp_byte & 0x80) != 0;

    // Calculate exponent
    let exponent: i16 = if is_positive {
        exp_byte as i16 - 193
    } else {
        // Invert bits for negative numbers
        (!exp_byte) as i16 - 193
    };

    // decimal_point_index indicates where the decimal point goes
    let mut decimal_point_index: i16 = exponent * 2 + 2;

    // Handle zero and special cases
    if bytes.len() == 1 {
        if is_positive {
            return Ok("0".to_string());
        } else {
            // -1e126 (max negative value) - rare, return special
            return Ok("-1e126".to_string());
        }
    }

    // Check for trailing 102 byte for negative numbers
    let mantissa_end = if !is_positive && bytes[bytes.len() - 1] == 102 {
        bytes.len() - 1
    } else {
        bytes.len()
    };

    // Process mantissa bytes to extract base-100 digits
    let mut digits: Vec<u8> = Vec::with_capacity((mantissa_end - 1) * 2);

    for (i, &byte) in bytes.iter().enumerate().take(mantissa_end).skip(1) {
        let digit_pair = if is_positive {
            byte.wrapping_sub(1)
        } else {
            101u8.wrapping_sub(byte)
        };

        // First digit of the pair
        let d1 = digit_pair / 10;
        // Second digit of the pair
        let d2 = digit_pair % 10;

        // Handle leading zeros - they reduce decimal point index
        if digits.is_empty() && d1 == 0 {
            decimal_point_index -= 1;
            if d2 != 0 || i < mantissa_end - 1 {
                digits.push(d2);
            } else if d2 == 0 {
                decimal_point_index -= 1;
            }
        } else if d1 == 10 {
            // Overflow case (99+1=100) - rare
            digits.push(1);
            digits.push(0);
            decimal_point_index += 1;
        } else {
            digits.push(d1);
            // Only add trailing zero if not last byte
            if d2 != 0 || i < mantissa_end - 1 {
                digits.push(d2);
            }
        }
    }

    // Remove trailing zeros from digits
    while !digits.is_empty() && digits[digits.len() - 1] == 0 {
        digits.pop();
    }

    // If all digits were zeros
    if digits.is_empty() {
        return Ok("0".to_string());
    }

    // Build the string
    let mut result = String::new();

    if !is_positive {
        result.push('-');
    }

    let num_digits = digits.len() as i16;

    if decimal_point_index <= 0 {
        // Number is less than 1: 0.00...digits
        result.push('0');
        result.push('.');
        for _ in decimal_point_index..0 {
            result.push('0');
        }
        for d in &digits {
            result.push((b'0' + d) as char);
        }
    } else if decimal_point_index >= num_digits {
        // Number is an integer: digits + trailing zeros
        for d in &digits {
            result.push((b'0' + d) as char);
        }
        for _ in num_digits..decimal_point_index {
            result.push('0');
        }
    } else {
        // Number has decimal point in the middle
        for (i, d) in digits.iter().enumerate() {
            if i as i16 == decimal_point_index {
                result.push('.');
            }
            result.push((b'0' + d) as char);
        }
    }

    Ok(result)
}

/// Encode decimal text (`-12.50`, `0.005`, `42`) as an Oracle NUMBER.
///
/// Exponent notation, `NaN` and infinities are rejected.
pub fn encode_oracle_number(text: &str) -> Result<Vec<u8>> {
    let invalid = || Error::type_conversion(format!("'{}' is not a decimal number", text));

    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let int_part = int_part.trim_start_matches('0');
    let frac_part = frac_part.trim_end_matches('0');
    if int_part.is_empty() && frac_part.is_empty() {
        return Ok(vec![0x80]);
    }

    // Pad both halves to whole base-100 digits around the decimal point.
    let mut digits = String::with_capacity(int_part.len() + frac_part.len() + 2);
    if int_part.len() % 2 == 1 {
        digits.push('0');
    }
    digits.push_str(int_part);
    let int_pairs = digits.len() / 2;
    digits.push_str(frac_part);
    if frac_part.len() % 2 == 1 {
        digits.push('0');
    }

    let mut pairs: Vec<u8> = digits
        .as_bytes()
        .chunks(2)
        .map(|p| (p[0] - b'0') * 10 + (p[1] - b'0'))
        .collect();

    let mut exponent = int_pairs as i32 - 1;
    let leading_zeros = pairs.iter().take_while(|&&p| p == 0).count();
    pairs.drain(..leading_zeros);
    exponent -= leading_zeros as i32;
    while pairs.last() == Some(&0) {
        pairs.pop();
    }

    if pairs.len() > MAX_MANTISSA_DIGITS {
        return Err(Error::type_conversion(format!(
            "'{}' exceeds NUMBER precision",
            text
        )));
    }
    if !(-65..=62).contains(&exponent) {
        return Err(Error::type_conversion(format!(
            "'{}' is outside the NUMBER range",
            text
        )));
    }

    let mut bytes = Vec::with_capacity(pairs.len() + 2);
    if negative {
        bytes.push((62 - exponent) as u8);
        bytes.extend(pairs.iter().map(|p| 101 - p));
        if pairs.len() < MAX_MANTISSA_DIGITS {
            bytes.push(102);
        }
    } else {
        bytes.push((193 + exponent) as u8);
        bytes.extend(pairs.iter().map(|p| p + 1));
    }
    Ok(bytes)
}
