//! Search fields and their command-line aliases

use std::collections::HashMap;
use std::fmt;

use crate::error::{MailError, Result};

/// A searchable field of the Gmail query language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SearchField {
    From,
    To,
    Words,
    Label,
    Category,
    Subject,
    Filename,
    Ids,
    Before,
    After,
    Extra,
}

/// How a field's values are rendered into query fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldFormat {
    /// Query keyword (`from`, `label`, ...); empty for free text
    pub keyword: &'static str,
    /// Separator between keyword and value
    pub sep: &'static str,
    /// Text placed on both sides of each rendered value
    pub surround: &'static str,
    /// Wrap the joined values in `{ }` so they match with OR
    pub group_or: bool,
}

impl SearchField {
    pub const ALL: [SearchField; 11] = [
        SearchField::From,
        SearchField::To,
        SearchField::Words,
        SearchField::Label,
        SearchField::Category,
        SearchField::Subject,
        SearchField::Filename,
        SearchField::Ids,
        SearchField::Before,
        SearchField::After,
        SearchField::Extra,
    ];

    pub fn format(self) -> FieldFormat {
        let keyed = |keyword| FieldFormat {
            keyword,
            sep: ":",
            surround: "",
            group_or: false,
        };

        match self {
            SearchField::From => keyed("from"),
            SearchField::To => keyed("to"),
            SearchField::Label => keyed("label"),
            SearchField::Category => keyed("category"),
            SearchField::Subject => keyed("subject"),
            SearchField::Filename => keyed("filename"),
            SearchField::Before => keyed("before"),
            SearchField::After => keyed("after"),
            SearchField::Ids => FieldFormat {
                group_or: true,
                ..keyed("rfc822msgid")
            },
            SearchField::Words => FieldFormat {
                keyword: "",
                sep: "",
                surround: "\"",
                group_or: false,
            },
            SearchField::Extra => FieldFormat {
                keyword: "",
                sep: "",
                surround: "",
                group_or: false,
            },
        }
    }

    /// Command-line flags that select this field
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            SearchField::From => &["-f", "--from"],
            SearchField::To => &["-t", "--to"],
            SearchField::Words => &["-w", "--words", "--word"],
            SearchField::Label => &["-l", "--label"],
            SearchField::Category => &["-c", "--category"],
            SearchField::Subject => &["-s", "--subject"],
            SearchField::Filename => &["--filename"],
            SearchField::Ids => &["-i", "--ids"],
            SearchField::Before => &["-b", "--before"],
            SearchField::After => &["-a", "--after"],
            SearchField::Extra => &["-e", "--extra"],
        }
    }

    pub fn is_date(self) -> bool {
        matches!(self, SearchField::Before | SearchField::After)
    }

    pub fn name(self) -> &'static str {
        match self {
            SearchField::From => "from",
            SearchField::To => "to",
            SearchField::Words => "words",
            SearchField::Label => "label",
            SearchField::Category => "category",
            SearchField::Subject => "subject",
            SearchField::Filename => "filename",
            SearchField::Ids => "ids",
            SearchField::Before => "before",
            SearchField::After => "after",
            SearchField::Extra => "extra",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flat lookup from every alias to the field that owns it
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    by_alias: HashMap<&'static str, SearchField>,
}

impl FieldRegistry {
    /// Build a registry, rejecting any alias claimed by two fields
    pub fn new<I>(definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (SearchField, &'static [&'static str])>,
    {
        let mut by_alias = HashMap::new();
        for (field, aliases) in definitions {
            for alias in aliases {
                if let Some(owner) = by_alias.insert(*alias, field)
                    && owner != field
                {
                    return Err(MailError::DuplicateAlias {
                        alias: alias.to_string(),
                        first: owner.name(),
                        second: field.name(),
                    });
                }
            }
        }
        Ok(Self { by_alias })
    }

    /// Registry of the aliases declared by [`SearchField::aliases`]
    pub fn standard() -> Self {
        let definitions = SearchField::ALL.iter().map(|f| (*f, f.aliases()));
        match Self::new(definitions) {
            Ok(registry) => registry,
            Err(e) => unreachable!("built-in search aliases overlap: {}", e),
        }
    }

    pub fn lookup(&self, alias: &str) -> Option<SearchField> {
        self.by_alias.get(alias).copied()
    }

    pub fn len(&self) -> usize {
        self.by_alias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_alias.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_resolves_every_alias() {
        let registry = FieldRegistry::standard();
        for field in SearchField::ALL {
            for alias in field.aliases() {
                assert_eq!(registry.lookup(alias), Some(field));
            }
        }
        assert_eq!(registry.lookup("--nope"), None);
    }

    #[test]
    fn test_overlapping_aliases_rejected() {
        const FROM: &[&str] = &["-f", "--from"];
        const FILENAME: &[&str] = &["-f", "--filename"];
        let result = FieldRegistry::new([
            (SearchField::From, FROM),
            (SearchField::Filename, FILENAME),
        ]);
        assert!(matches!(
            result,
            Err(MailError::DuplicateAlias { ref alias, .. }) if alias == "-f"
        ));
    }

    #[test]
    fn test_free_text_format() {
        let format = SearchField::Words.format();
        assert_eq!(format.keyword, "");
        assert_eq!(format.surround, "\"");
        assert!(SearchField::Ids.format().group_or);
        assert!(!SearchField::From.format().group_or);
    }
}
