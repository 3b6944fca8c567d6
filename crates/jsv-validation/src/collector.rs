//! Error accumulation for a single validation run.

use crate::error::ValidationError;
use std::ops::ControlFlow;

/// Signal returned by every check: `Break` unwinds the whole traversal.
pub type Flow = ControlFlow<()>;

/// Collects errors for one `validate` call and decides whether traversal
/// may continue after each one.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<ValidationError>,
    collect_all: bool,
}

impl ErrorCollector {
    pub fn new(collect_all: bool) -> Self {
        Self {
            errors: Vec::new(),
            collect_all,
        }
    }

    /// Store an error. Returns `Break` in fail-fast mode.
    pub fn report(&mut self, error: ValidationError) -> Flow {
        tracing::trace!(
            keyword = error.keyword(),
            data_path = %error.data_path,
            "Validation error reported"
        );
        self.errors.push(error);
        if self.collect_all {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }

    /// Position to later withdraw errors from, see [`ErrorCollector::take_since`]
    pub fn mark(&self) -> usize {
        self.errors.len()
    }

    /// Remove and return every error reported after `mark`
    pub fn take_since(&mut self, mark: usize) -> Vec<ValidationError> {
        self.errors.split_off(mark.min(self.errors.len()))
    }

    /// Re-add errors withdrawn by `take_since`, keeping their order
    pub fn restore(&mut self, errors: Vec<ValidationError>) {
        self.errors.extend(errors);
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn collects_all(&self) -> bool {
        self.collect_all
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorKind;
    use crate::path::{InstancePath, PathNotation};

    fn missing(property: &str) -> ValidationError {
        ValidationError::new(
            ValidationErrorKind::MissingRequiredProperty {
                property: property.to_string(),
            },
            InstancePath::new(),
            PathNotation::JsonPointer,
            "#/required",
        )
    }

    #[test]
    fn test_fail_fast_stops_on_first_report() {
        let mut collector = ErrorCollector::new(false);
        assert_eq!(collector.report(missing("a")), ControlFlow::Break(()));
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_collect_all_keeps_order() {
        let mut collector = ErrorCollector::new(true);
        assert_eq!(collector.report(missing("a")), ControlFlow::Continue(()));
        assert_eq!(collector.report(missing("b")), ControlFlow::Continue(()));
        let messages: Vec<_> = collector.errors().iter().map(|e| e.message.clone()).collect();
        assert_eq!(
            messages,
            vec![
                "should have required property 'a'",
                "should have required property 'b'"
            ]
        );
    }

    #[test]
    fn test_take_since_and_restore() {
        let mut collector = ErrorCollector::new(true);
        let _ = collector.report(missing("a"));
        let mark = collector.mark();
        let _ = collector.report(missing("b"));
        let _ = collector.report(missing("c"));

        let taken = collector.take_since(mark);
        assert_eq!(taken.len(), 2);
        assert_eq!(collector.len(), 1);

        collector.restore(taken);
        assert_eq!(collector.len(), 3);
        assert_eq!(collector.errors()[2], missing("c"));
        assert!(collector.take_since(10).is_empty());
    }
}
