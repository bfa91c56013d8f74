use std::{
    fmt::{
        Display,
        Formatter,
    },
    sync::Arc,
};

/// A byte range inside a named source, attached to emitted items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub source: Option<Arc<str>>,
    pub start: usize,
    pub end: usize,
}

impl SourceLocation {
    pub fn new(source: impl Into<Arc<str>>, start: usize, end: usize) -> Self {
        Self {
            source: Some(source.into()),
            start,
            end,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.start == self.end
    }

}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{source}:{}..{}", self.start, self.end),
            None => write!(f, "<unknown>:{}..{}", self.start, self.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_format_source_and_range() {
        assert_eq!(SourceLocation::new("a.yul", 1, 5).to_string(), "a.yul:1..5");
        assert_eq!(SourceLocation::empty().to_string(), "<unknown>:0..0");
        assert!(SourceLocation::empty().is_empty());
        assert!(!SourceLocation::new("a.yul", 1, 5).is_empty());
    }
}
