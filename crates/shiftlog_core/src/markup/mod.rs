//! Body preprocessors selected by the entry's markup discriminator.
//!
//! # Responsibility
//! - Transform the submitted body into the stored description exactly
//!   once per create.
//! - Keep preprocessor selection a closed enum dispatch; unknown request
//!   discriminators are normalized to the default before this module is
//!   reached.

use crate::model::entry::Markup;
use crate::repo::entry_repo::NewEntry;
use pulldown_cmark::{html, Options, Parser};

/// Capability applied to an entry body before persistence.
pub trait Preprocessor {
    /// Transforms the entry, filling `description` from `source`.
    fn process(&self, entry: NewEntry) -> NewEntry;
}

/// Identity preprocessor: the description is the source verbatim.
pub struct DefaultPreprocessor;

impl Preprocessor for DefaultPreprocessor {
    fn process(&self, mut entry: NewEntry) -> NewEntry {
        entry.description = Some(entry.source.clone());
        entry
    }
}

/// Renders the source as CommonMark into an HTML description.
pub struct CommonmarkPreprocessor;

impl Preprocessor for CommonmarkPreprocessor {
    fn process(&self, mut entry: NewEntry) -> NewEntry {
        let parser = Parser::new_ext(&entry.source, Options::empty());
        let mut rendered = String::new();
        html::push_html(&mut rendered, parser);
        entry.description = Some(rendered);
        entry
    }
}

static DEFAULT: DefaultPreprocessor = DefaultPreprocessor;
static COMMONMARK: CommonmarkPreprocessor = CommonmarkPreprocessor;

/// Selects the preprocessor for a markup discriminator.
pub fn preprocessor_for(markup: Markup) -> &'static dyn Preprocessor {
    match markup {
        Markup::None => &DEFAULT,
        Markup::Commonmark => &COMMONMARK,
    }
}

#[cfg(test)]
mod tests {
    use super::preprocessor_for;
    use crate::model::entry::Markup;
    use crate::repo::entry_repo::NewEntry;
    use std::collections::BTreeSet;

    fn draft(source: &str, markup: Markup) -> NewEntry {
        NewEntry {
            owner: "alice".to_string(),
            source: source.to_string(),
            description: None,
            markup,
            logbooks: BTreeSet::new(),
            tags: BTreeSet::new(),
        }
    }

    #[test]
    fn default_preprocessor_copies_source_verbatim() {
        let processed =
            preprocessor_for(Markup::None).process(draft("**not rendered**", Markup::None));
        assert_eq!(processed.description.as_deref(), Some("**not rendered**"));
    }

    #[test]
    fn commonmark_preprocessor_renders_html() {
        let processed = preprocessor_for(Markup::Commonmark)
            .process(draft("**bold** move", Markup::Commonmark));
        let description = processed.description.unwrap();
        assert!(description.contains("<strong>bold</strong>"));
        assert_eq!(processed.source, "**bold** move");
    }
}
