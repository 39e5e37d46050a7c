//! Case selection by path pattern
//!
//! A pattern is split on `/`; segment N must be a substring of the case name at
//! depth N. Deeper cases than the pattern covers always match.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaseFilter {
    segments: Vec<String>,
}

impl CaseFilter {
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .map(crate::models::normalize_name)
            .collect::<Vec<_>>();

        // An empty pattern selects everything
        if segments.iter().all(|s| s.is_empty()) {
            return Self::default();
        }
        Self { segments }
    }

    pub fn from_option(pattern: Option<&str>) -> Self {
        pattern.map(Self::new).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Does a case named `name` at `depth` pass the filter?
    pub fn matches(&self, depth: usize, name: &str) -> bool {
        match self.segments.get(depth) {
            Some(segment) => name.contains(segment.as_str()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = CaseFilter::new("");
        assert!(filter.is_empty());
        assert!(filter.matches(0, "TestAdd"));
        assert!(filter.matches(3, "anything"));
    }

    #[test]
    fn test_segment_per_depth() {
        let filter = CaseFilter::new("Divide/zero");
        assert!(filter.matches(0, "TestDivide"));
        assert!(!filter.matches(0, "TestAdd"));
        assert!(filter.matches(1, "division_by_zero"));
        assert!(!filter.matches(1, "success"));
        assert!(filter.matches(2, "deeper"));
    }

    #[test]
    fn test_pattern_spaces_normalized() {
        let filter = CaseFilter::new("TestDivide/by zero");
        assert!(filter.matches(1, "division_by_zero"));
    }

    #[test]
    fn test_from_option() {
        assert!(CaseFilter::from_option(None).is_empty());
        assert!(!CaseFilter::from_option(Some("Add")).is_empty());
    }
}
