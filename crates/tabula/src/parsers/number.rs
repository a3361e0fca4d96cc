use tabula_api::{NumberFormat, NumberTypeOption, TypeOptionData};

/// Largest number of fractional digits a Number field renders.
pub const MAX_NUMBER_SCALE: u32 = 20;

pub fn parse_number_type_option(type_option: Option<&TypeOptionData>) -> NumberTypeOption {
    let Some(option) = type_option else {
        return NumberTypeOption::default();
    };
    let format = match option.get("format") {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .and_then(NumberFormat::from_code)
    .unwrap_or_default();

    let scale = option
        .get("scale")
        .and_then(serde_json::Value::as_u64)
        .and_then(|s| u32::try_from(s).ok())
        .filter(|s| *s <= MAX_NUMBER_SCALE)
        .unwrap_or(0);
    let text = |key: &str| {
        option
            .get(key)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    NumberTypeOption {
        format,
        scale,
        symbol: text("symbol"),
        name: text("name"),
    }
}

/// Decode a Number cell.
///
/// Currency symbols, grouping separators, percent signs and whitespace that
/// clients left in the stored text are ignored. Non-finite results read as
/// absent.
pub fn parse_number_cell(data: Option<&serde_json::Value>) -> Option<f64> {
    parse_number_cell_with_format(data, NumberFormat::Num)
}

/// [`parse_number_cell`] for a field of the given format. EUR text uses `,`
/// as the decimal separator and `.` for grouping.
pub fn parse_number_cell_with_format(
    data: Option<&serde_json::Value>,
    format: NumberFormat,
) -> Option<f64> {
    let value = match data? {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => {
            let cleaned = clean_number_text(s, format == NumberFormat::EUR);
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Keep only the characters of a number literal. An `e` survives only as an
/// exponent marker: right after a digit and before a digit or sign.
fn clean_number_text(s: &str, decimal_comma: bool) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut cleaned = String::with_capacity(s.len());
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '0'..='9' | '-' | '+' => cleaned.push(c),
            '.' if !decimal_comma => cleaned.push('.'),
            ',' if decimal_comma => cleaned.push('.'),
            'e' | 'E' => {
                let after_digit = i > 0 && chars[i - 1].is_ascii_digit();
                let before_exponent = chars
                    .get(i + 1)
                    .is_some_and(|n| n.is_ascii_digit() || matches!(n, '+' | '-'));
                if after_digit && before_exponent {
                    cleaned.push(c);
                }
            }
            _ => {}
        }
    }
    cleaned
}

/// Render a number with the field's scale and currency symbol.
pub fn format_number_cell(value: f64, option: &NumberTypeOption) -> String {
    let digits = format!("{:.*}", option.scale.min(MAX_NUMBER_SCALE) as usize, value);
    match option.format {
        NumberFormat::Num => digits,
        NumberFormat::Percent => format!("{}%", digits),
        currency => {
            let symbol = if option.symbol.is_empty() {
                currency.symbol()
            } else {
                option.symbol.as_str()
            };
            match digits.strip_prefix('-') {
                Some(abs) => format!("-{}{}", symbol, abs),
                None => format!("{}{}", symbol, digits),
            }
        }
    }
}
