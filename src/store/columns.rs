use ahash::AHashMap;

use crate::error::{Error, Result};

/// Allow-list of attribute column names, discovered from the schema at load time.
///
/// Every attribute name supplied by a caller is resolved through
/// [`Columns::position`] before it is used for anything else.
#[derive(Debug, Clone, Default)]
pub(crate) struct Columns {
    names: Vec<String>,
    index: AHashMap<String, usize>,
}

impl Columns {
    pub(crate) fn new(names: Vec<String>) -> Self {
        let index = names.iter().enumerate().map(|(i, name)| (name.clone(), i)).collect();
        Self { names, index }
    }

    #[inline] pub(crate) fn names(&self) -> &[String] { &self.names }

    #[inline] pub(crate) fn len(&self) -> usize { self.names.len() }

    /// Position of a known attribute, or `InvalidAttribute`.
    pub(crate) fn position(&self, name: &str) -> Result<usize> {
        self.index.get(name).copied().ok_or_else(|| Error::InvalidAttribute(name.to_string()))
    }
}

/// Quote an SQL identifier, doubling any embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
