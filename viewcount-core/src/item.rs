use {
    std::collections::BTreeMap,
    serde::{Serialize, Deserialize},
    thiserror::Error,
};

pub const ATTRIBUTE_ID: &str = "id";
pub const ATTRIBUTE_VIEW_COUNT: &str = "view_count";

/// Typed attribute value, encoded the same way managed document stores do: `{"N": "5"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    /// Arbitrary precision decimal kept as text.
    N(String),
    /// Base64 encoded binary, kept as text.
    B(String),
    SS(Vec<String>),
    NS(Vec<String>),
    BS(Vec<String>),
    M(BTreeMap<String, AttributeValue>),
    L(Vec<AttributeValue>),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
}

impl AttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::S(value.into())
    }

    pub fn number(value: u64) -> Self {
        Self::N(value.to_string())
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::B(_) => "B",
            Self::SS(_) => "SS",
            Self::NS(_) => "NS",
            Self::BS(_) => "BS",
            Self::M(_) => "M",
            Self::L(_) => "L",
            Self::Bool(_) => "BOOL",
            Self::Null(_) => "NULL",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item {
    attributes: BTreeMap<String, AttributeValue>,
}

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.attributes.get(name) {
            Some(AttributeValue::S(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterRecord {
    pub id: String,
    pub view_count: u64,
}

impl CounterRecord {
    pub fn new(id: impl Into<String>, view_count: u64) -> Self {
        Self {
            id: id.into(),
            view_count,
        }
    }

    /// An item without a `view_count` attribute counts as zero views.
    pub fn from_item(id: impl Into<String>, item: &Item) -> Result<Self, RecordError> {
        let view_count = match item.get(ATTRIBUTE_VIEW_COUNT) {
            None => 0,
            Some(AttributeValue::N(v)) => count_from_number(v)
                .map_err(|err| RecordError::Number { attribute: ATTRIBUTE_VIEW_COUNT, source: err })?,
            Some(other) => return Err(RecordError::UnexpectedType {
                attribute: ATTRIBUTE_VIEW_COUNT,
                expected: "N",
                actual: other.type_name(),
            }),
        };

        Ok(Self::new(id, view_count))
    }

    pub fn to_item(&self) -> Item {
        Item::new()
            .with(ATTRIBUTE_ID, AttributeValue::string(self.id.clone()))
            .with(ATTRIBUTE_VIEW_COUNT, AttributeValue::number(self.view_count))
    }
}

#[derive(Error, Debug, Eq, PartialEq)]
pub enum RecordError {
    #[error("attribute {attribute} has type {actual}, expected {expected}")]
    UnexpectedType { attribute: &'static str, expected: &'static str, actual: &'static str },

    #[error("attribute {attribute} is not a valid count: {source}")]
    Number { attribute: &'static str, source: NumberError },
}

#[derive(Error, Debug, Eq, PartialEq)]
pub enum NumberError {
    #[error("number is empty")]
    Empty,

    #[error("malformed number: {text:?}")]
    Malformed { text: String },

    #[error("number is negative: {text}")]
    Negative { text: String },

    #[error("number is not integral: {text}")]
    NotIntegral { text: String },

    #[error("number does not fit into 64 bits: {text}")]
    OutOfRange { text: String },
}

/// Converts decimal text (`5`, `5.0`, `5E2`, `-0`) into a count without going through floats.
pub fn count_from_number(text: &str) -> Result<u64, NumberError> {
    if text.is_empty() {
        return Err(NumberError::Empty);
    }

    let malformed = || NumberError::Malformed { text: text.to_owned() };

    let (negative, unsigned) = match text.as_bytes()[0] {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(index) => (&unsigned[..index], Some(&unsigned[index + 1..])),
        None => (unsigned, None),
    };

    let (integer_digits, fraction_digits) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if integer_digits.is_empty() && fraction_digits.is_empty() {
        return Err(malformed());
    }
    if !integer_digits.bytes().chain(fraction_digits.bytes()).all(|v| v.is_ascii_digit()) {
        return Err(malformed());
    }

    let exponent = match exponent {
        Some(v) => parse_exponent(v).ok_or_else(malformed)?,
        None => Some(0),
    };

    let digits = || integer_digits.bytes().chain(fraction_digits.bytes());
    if digits().all(|v| v == b'0') {
        return Ok(0);
    }
    if negative {
        return Err(NumberError::Negative { text: text.to_owned() });
    }

    // exponent does not fit into i64 while the mantissa is non-zero
    let exponent = match exponent {
        Some(v) => v,
        None if text.contains('-') => return Err(NumberError::NotIntegral { text: text.to_owned() }),
        None => return Err(NumberError::OutOfRange { text: text.to_owned() }),
    };

    let total_digits = integer_digits.len() as i64 + fraction_digits.len() as i64;
    let point = (integer_digits.len() as i64).saturating_add(exponent);

    let mut count: u64 = 0;
    for (index, digit) in digits().enumerate() {
        let digit = u64::from(digit - b'0');
        if (index as i64) < point {
            count = count.checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| NumberError::OutOfRange { text: text.to_owned() })?;
        } else if digit != 0 {
            return Err(NumberError::NotIntegral { text: text.to_owned() });
        }
    }

    let trailing_zeros = point.saturating_sub(total_digits);
    if trailing_zeros > 0 && count != 0 {
        if trailing_zeros > 20 {
            return Err(NumberError::OutOfRange { text: text.to_owned() });
        }
        for _ in 0..trailing_zeros {
            count = count.checked_mul(10)
                .ok_or_else(|| NumberError::OutOfRange { text: text.to_owned() })?;
        }
    }

    Ok(count)
}

/// `None` on malformed input, `Some(None)` when the exponent does not fit into an i64.
fn parse_exponent(text: &str) -> Option<Option<i64>> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|v| v.is_ascii_digit()) {
        return None;
    }

    Some(text.parse::<i64>().ok())
}
