use crate::{DatabaseMetadata, writer::SQL_2003_KEYWORDS};
use std::{collections::HashSet, sync::Arc};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum KeywordCase {
    #[default]
    Upper,
    Lower,
    /// Follow the case the database folds unquoted identifiers to.
    DatabasePreferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// One clause per line, sub-queries indented.
    pub beautify: bool,
    pub indent_size: usize,
    pub keyword_case: KeywordCase,
    pub always_quote_identifiers: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            beautify: false,
            indent_size: 2,
            keyword_case: KeywordCase::Upper,
            always_quote_identifiers: false,
        }
    }
}

/// Immutable inputs shared by every formatter: database metadata and options.
#[derive(Debug, Clone)]
pub struct FormatterState {
    pub metadata: Arc<DatabaseMetadata>,
    pub options: FormatOptions,
    /// Upper case reserved words, SQL:2003 plus the database specific ones.
    pub keywords: Arc<HashSet<String>>,
}

impl FormatterState {
    pub fn new(metadata: Arc<DatabaseMetadata>, options: FormatOptions) -> Self {
        let keywords = SQL_2003_KEYWORDS
            .iter()
            .map(|v| v.to_string())
            .chain(metadata.keywords.iter().map(|v| v.to_uppercase()))
            .collect();
        Self {
            metadata,
            options,
            keywords: Arc::new(keywords),
        }
    }

    pub fn is_keyword(&self, identifier: &str) -> bool {
        self.keywords.contains(&identifier.to_uppercase())
    }

    pub fn upper_case_keywords(&self) -> bool {
        match self.options.keyword_case {
            KeywordCase::Upper => true,
            KeywordCase::Lower => false,
            KeywordCase::DatabasePreferred => !self.metadata.stores_lower_case_identifiers,
        }
    }
}

impl Default for FormatterState {
    fn default() -> Self {
        Self::new(Default::default(), Default::default())
    }
}
