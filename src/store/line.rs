const TRADE_NAME_PREFIX: &str = "Trade_Name_";
const USERNAME_PREFIX: &str = "GST_UserID_";
const PASSWORD_PREFIX: &str = "GST_PSSWD_";

/// The three recognized key families of the credential file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    TradeName,
    Username,
    Password,
}

impl Field {
    pub fn prefix(self) -> &'static str {
        match self {
            Field::TradeName => TRADE_NAME_PREFIX,
            Field::Username => USERNAME_PREFIX,
            Field::Password => PASSWORD_PREFIX,
        }
    }

    /// Renders the full key for one indexed field, e.g. `GST_UserID_3`.
    pub fn key(self, index: u32) -> String {
        format!("{}{}", self.prefix(), index)
    }
}

/// One recognized `PREFIX<digits>=value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub field: Field,
    pub index: u32,
    pub value: String,
}

/// Parse a single line of the credential file.
///
/// Anything that is not `PREFIX<digits>=value` with a positive index —
/// blank lines, comments, foreign keys, malformed indices — returns `None`
/// and is preserved verbatim by the write path.
pub fn parse(line: &str) -> Option<Entry> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let eq_pos = trimmed.find('=')?;
    let key = trimmed[..eq_pos].trim_end();
    let raw_value = &trimmed[eq_pos + 1..];

    for field in [Field::TradeName, Field::Username, Field::Password] {
        if let Some(digits) = key.strip_prefix(field.prefix()) {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let index: u32 = digits.parse().ok()?;
            if index == 0 {
                return None;
            }
            return Some(Entry {
                field,
                index,
                value: unquote(raw_value).to_string(),
            });
        }
    }

    None
}

/// Renders `KEY="VALUE"`, the file's canonical line form.
pub fn format_entry(field: Field, index: u32, value: &str) -> String {
    format!("{}=\"{}\"", field.key(index), value)
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
