//! Select expressions describing which resource attributes to fetch.
//!
//! Flora APIs take a `select` parameter in a compact grammar:
//! `field,group[sub1,sub2],single.child`. The [`Select`] tree models that
//! grammar programmatically, so nested selections can be built from data
//! instead of string concatenation. Its `Display` implementation produces
//! the wire form.

use std::fmt;

/// A field-selection tree.
///
/// Lists serialize as comma-joined items. Group entries serialize as
/// `key[items]` when the entry selects more than one sub-item and `key.item`
/// otherwise. Plain fields pass through unchanged, so an already-formatted
/// select string can be used as-is.
///
/// # Examples
///
/// ```
/// use flora_client::Select;
///
/// let select = Select::list([
///     Select::field("id"),
///     Select::field("name"),
///     Select::group([("address", Select::list(["city", "zip"]))]),
/// ]);
///
/// assert_eq!(select.to_string(), "id,name,address[city,zip]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Select {
    /// A single attribute, or a pre-formatted select expression.
    Field(String),
    /// A sequence of selections, serialized comma-separated.
    List(Vec<Select>),
    /// Named sub-selections, serialized as `key[..]` or `key.child`.
    Group(Vec<(String, Select)>),
}

impl Select {
    /// Creates a plain field selection.
    pub fn field(name: impl Into<String>) -> Self {
        Select::Field(name.into())
    }

    /// Creates a list selection from anything convertible to [`Select`].
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Select>,
    {
        Select::List(items.into_iter().map(Into::into).collect())
    }

    /// Creates a group selection from `(key, sub-selection)` entries.
    ///
    /// Entry order is preserved in the serialized output.
    pub fn group<K, S, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Select>,
    {
        Select::Group(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Number of sub-items a selection contributes to its parent.
    ///
    /// Group entries count once per entry; list items are counted through
    /// recursively. The count decides bracket vs. dot form: only entries
    /// with more than one sub-item are bracketed.
    fn sub_item_count(&self) -> usize {
        match self {
            Select::Field(_) => 1,
            Select::List(items) => items.iter().map(Select::sub_item_count).sum(),
            Select::Group(entries) => entries.len(),
        }
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Select::Field(name) => f.write_str(name),
            Select::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Select::Group(entries) => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(key)?;
                    if value.sub_item_count() > 1 {
                        write!(f, "[{value}]")?;
                    } else {
                        write!(f, ".{value}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Select {
    fn from(name: &str) -> Self {
        Select::Field(name.to_string())
    }
}

impl From<String> for Select {
    fn from(name: String) -> Self {
        Select::Field(name)
    }
}

impl From<Vec<Select>> for Select {
    fn from(items: Vec<Select>) -> Self {
        Select::List(items)
    }
}
