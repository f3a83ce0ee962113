//! Element selectors

use std::fmt;

/// How an element is located
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Raw CSS selector
    Css(String),
    /// `data-test-subj` attribute. `a > b` nests, `~name` matches one word of
    /// a space separated attribute value.
    TestSubject(String),
}

impl Selector {
    pub fn css(selector: impl Into<String>) -> Self {
        Selector::Css(selector.into())
    }

    pub fn test_subject(subject: impl Into<String>) -> Self {
        Selector::TestSubject(subject.into())
    }

    /// CSS form sent to the browser
    pub fn to_css(&self) -> String {
        match self {
            Selector::Css(css) => css.clone(),
            Selector::TestSubject(subject) => test_subject_css(subject),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(css) => f.write_str(css),
            Selector::TestSubject(subject) => write!(f, "testSubject({subject})"),
        }
    }
}

fn test_subject_css(subject: &str) -> String {
    subject
        .split('>')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.strip_prefix('~') {
            Some(word) => format!("[data-test-subj~=\"{word}\"]"),
            None => format!("[data-test-subj=\"{part}\"]"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_subject() {
        assert_eq!(
            Selector::test_subject("addPanelButton").to_css(),
            "[data-test-subj=\"addPanelButton\"]"
        );
    }

    #[test]
    fn test_nested_and_word_subject() {
        assert_eq!(
            Selector::test_subject("embeddablePanel > ~embeddablePanelToggleMenuIcon").to_css(),
            "[data-test-subj=\"embeddablePanel\"] [data-test-subj~=\"embeddablePanelToggleMenuIcon\"]"
        );
    }

    #[test]
    fn test_css_passthrough() {
        assert_eq!(Selector::css(".visNewVisDialog").to_css(), ".visNewVisDialog");
    }
}
