use serde::{Deserialize, Serialize};

/// Token substituted for missing and never-seen category values.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Maps category strings to stable integer codes.
///
/// The vocabulary is fixed when the encoder is fitted. Code `0` is always
/// reserved for [`UNKNOWN_CATEGORY`]; the remaining values are numbered in
/// sorted order starting at `1`. Encoding never fails: missing values and values
/// outside the vocabulary map to the unknown code.
///
/// # Examples
///
/// ```
/// use raincast::CategoryEncoder;
///
/// let encoder = CategoryEncoder::fit([Some("N"), Some("SE"), None, Some("N")]);
/// assert_eq!(encoder.encode(Some("N")), 1);
/// assert_eq!(encoder.encode(Some("SE")), 2);
/// assert_eq!(encoder.encode(None), 0);
/// assert_eq!(encoder.encode(Some("WNW")), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    /// Index is the code. `classes[0]` is the unknown token, the rest is sorted.
    classes: Vec<String>,
}

impl CategoryEncoder {
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut known: Vec<String> = values
            .into_iter()
            .flatten()
            .filter(|v| *v != UNKNOWN_CATEGORY)
            .map(str::to_string)
            .collect();
        known.sort_unstable();
        known.dedup();

        let mut classes = Vec::with_capacity(known.len() + 1);
        classes.push(UNKNOWN_CATEGORY.to_string());
        classes.extend(known);
        Self { classes }
    }

    pub fn unknown_code(&self) -> u32 {
        0
    }

    pub fn encode(&self, value: Option<&str>) -> u32 {
        let Some(value) = value else {
            return self.unknown_code();
        };
        match self.classes[1..].binary_search_by(|class| class.as_str().cmp(value)) {
            Ok(idx) => idx as u32 + 1,
            Err(_) => self.unknown_code(),
        }
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.encode(Some(value)) != self.unknown_code() || value == UNKNOWN_CATEGORY
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.len() <= 1
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
