//! Common data types
use std::borrow::Cow;
use std::fmt;
use serde::{Serialize, Deserialize};

pub type Atom<'a> = Cow<'a, str>;

///////////////////////////////////////////////////////////////////////////////
// SOURCE LOCATIONS
///////////////////////////////////////////////////////////////////////////////

/// Position in the trimmed template source.
///
/// `line` and `column` are 1-based; the column counts grapheme clusters, so a
/// combining sequence occupies a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn start() -> Self {
        Location {offset: 0, line: 1, column: 1}
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

///////////////////////////////////////////////////////////////////////////////
// ATTRIBUTES
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue<'a> {
    /// Written without `=`; the value is boolean `true`.
    Flag,
    /// Quoted or bare literal.
    Literal(Atom<'a>),
    /// Braced value. Holds the text between the outer braces, verbatim.
    Dynamic(Atom<'a>),
}

impl<'a> AttrValue<'a> {
    pub fn is_dynamic(&self) -> bool {
        match self {
            AttrValue::Dynamic(_) => true,
            _ => false,
        }
    }
}

impl<'a> fmt::Display for AttrValue<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Flag => write!(f, "true"),
            AttrValue::Literal(x) => write!(f, "{:?}", x),
            AttrValue::Dynamic(x) => write!(f, "{{{}}}", x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: Atom<'a>,
    pub value: AttrValue<'a>,
}

/// Attributes in source order. Setting an existing name replaces its value
/// and keeps the original position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attributes<'a>(Vec<Attribute<'a>>);

impl<'a> Attributes<'a> {
    pub fn new() -> Self {
        Attributes(Vec::new())
    }
    pub fn insert(&mut self, name: impl Into<Atom<'a>>, value: AttrValue<'a>) {
        let name = name.into();
        match self.0.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.0.push(Attribute {name, value}),
        }
    }
    pub fn get(&self, name: &str) -> Option<&AttrValue<'a>> {
        self.0
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| &attr.value)
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute<'a>> {
        self.0.iter()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn has_dynamic(&self) -> bool {
        self.0.iter().any(|attr| attr.value.is_dynamic())
    }
}

impl<'a, 'b> IntoIterator for &'b Attributes<'a> {
    type Item = &'b Attribute<'a>;
    type IntoIter = std::slice::Iter<'b, Attribute<'a>>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'a, N: Into<Atom<'a>>> FromIterator<(N, AttrValue<'a>)> for Attributes<'a> {
    fn from_iter<I: IntoIterator<Item = (N, AttrValue<'a>)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

///////////////////////////////////////////////////////////////////////////////
// CHARACTER CLASSES
///////////////////////////////////////////////////////////////////////////////

pub fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}
