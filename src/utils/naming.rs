//! File name helpers shared by the location rules and the metadata store.

/// Removes characters that would break a single-line, pipe-delimited name.
pub fn sanitize_name_part(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\t' | '|'))
        .collect()
}

/// Keeps the digits of an invoice number and left-pads them with zeros to width 7.
pub fn pad_invoice_number(number: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{:0>7}", digits)
}

/// Extension of a file name, without the dot. Empty when there is none.
pub fn file_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_string(),
        _ => String::new(),
    }
}

/// Splits `name` into stem and `.ext` suffix (suffix may be empty).
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}
