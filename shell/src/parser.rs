//! Command line tokenizer and number parser
//!
//! Tokens are separated by spaces. A line ends at CR, LF or the end of the
//! string, whichever comes first.

use crate::error::ShellError;

/// Returns whether `byte` terminates a line
pub fn is_end_of_line(byte: u8) -> bool {
    matches!(byte, b'\r' | b'\n' | 0)
}

/// Cuts `line` at its first line terminator
pub fn trim_line(line: &str) -> &str {
    match line.bytes().position(is_end_of_line) {
        Some(end) => &line[..end],
        None => line,
    }
}

/// Parses an integer the way the shell reads numbers
///
/// Accepts an optional leading `-`, then a decimal number, a `0x`
/// hexadecimal number or a `0`-prefixed octal number. Parsing stops at the
/// first character that is not a digit of the base. Returns `None` when
/// there is no number at all.
///
/// ```
/// use shell::parser::parse_int;
///
/// assert_eq!(parse_int("42"), Some(42));
/// assert_eq!(parse_int("0x2f"), Some(0x2f));
/// assert_eq!(parse_int("017"), Some(0o17));
/// assert_eq!(parse_int("-12abc"), Some(-12));
/// assert_eq!(parse_int("pid"), None);
/// ```
pub fn parse_int(token: &str) -> Option<i32> {
    let (negative, rest) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };

    let (radix, digits, prefixed) = if let Some(hex) = rest.strip_prefix("0x") {
        (16, hex, true)
    } else if let Some(octal) = rest.strip_prefix('0') {
        (8, octal, true)
    } else {
        (10, rest, false)
    };

    let mut value: i32 = 0;
    let mut seen = prefixed;
    for c in digits.chars() {
        let Some(digit) = c.to_digit(radix) else {
            break;
        };
        value = value.wrapping_mul(radix as i32).wrapping_add(digit as i32);
        seen = true;
    }

    if !seen {
        return None;
    }
    Some(if negative { value.wrapping_neg() } else { value })
}

/// The arguments that follow a command word
#[derive(Debug, Clone)]
pub struct Args<'a> {
    tokens: core::str::SplitAsciiWhitespace<'a>,
}

impl<'a> Args<'a> {
    pub fn new(rest: &'a str) -> Self {
        Self {
            tokens: rest.split_ascii_whitespace(),
        }
    }

    /// The next raw token
    pub fn next_token(&mut self) -> Result<&'a str, ShellError> {
        self.tokens.next().ok_or(ShellError::MissingArgument)
    }

    /// The next token as an integer
    pub fn next_int(&mut self) -> Result<i32, ShellError> {
        parse_int(self.next_token()?).ok_or(ShellError::BadNumber)
    }

    /// The next token as a data-space address
    pub fn next_address(&mut self) -> Result<u16, ShellError> {
        u16::try_from(self.next_int()?).map_err(|_| ShellError::BadNumber)
    }

    /// The next token as a byte value
    ///
    /// Values wider than a byte are truncated, as a store would.
    pub fn next_byte(&mut self) -> Result<u8, ShellError> {
        Ok(self.next_int()? as u8)
    }
}

/// Splits a line into its command word and arguments
///
/// Leading spaces are skipped. Returns `None` for blank lines and comments
/// (lines starting with `#`).
pub fn split_command(line: &str) -> Option<(&str, Args<'_>)> {
    let line = trim_line(line).trim_start_matches(' ');
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    Some((word, Args::new(rest)))
}
