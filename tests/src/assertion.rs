//! Assertion types and builders for verifying step results.

use retrace_core::{ElementId, ElementType};
use retrace_graph::{GraphSnapshot, MemoryGraph, SnapshotValue};
use retrace_journal::{EditLog, Operation};

use crate::error::{ScenarioError, ScenarioResult};

/// Expected state of one attribute value after a step.
#[derive(Debug, Clone)]
pub struct ValueCheck {
    pub element_type: ElementType,
    pub label: String,
    pub element: ElementId,
    /// `None` expects the attribute default.
    pub expected: Option<SnapshotValue>,
}

/// A complete assertion for a step result.
#[derive(Default)]
pub struct Assertion {
    // Graph assertions
    pub vertices: Option<usize>,
    pub transactions: Option<usize>,
    pub attributes: Option<usize>,
    pub values: Vec<ValueCheck>,

    // Log assertions
    pub words: Option<usize>,
    pub applications: Option<usize>,
    pub objects: Option<usize>,
    pub kinds: Vec<(Operation, usize)>,
    pub empty_log: Option<bool>,

    // Custom assertion function
    #[allow(clippy::type_complexity)]
    pub custom: Option<Box<dyn Fn(&MemoryGraph, &EditLog) -> bool>>,
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion")
            .field("vertices", &self.vertices)
            .field("transactions", &self.transactions)
            .field("attributes", &self.attributes)
            .field("values", &self.values)
            .field("words", &self.words)
            .field("applications", &self.applications)
            .field("objects", &self.objects)
            .field("kinds", &self.kinds)
            .field("empty_log", &self.empty_log)
            .field("custom", &self.custom.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Assertion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify the assertion against the graph a step left behind and the
    /// log it recorded.
    pub fn verify(&self, step: &str, graph: &MemoryGraph, log: &EditLog) -> ScenarioResult<()> {
        self.verify_graph(step, graph)?;
        self.verify_log(step, log)?;

        if let Some(ref custom) = self.custom {
            if !custom(graph, log) {
                return Err(ScenarioError::assertion_failed(
                    step,
                    "custom assertion failed",
                ));
            }
        }

        Ok(())
    }

    fn verify_graph(&self, step: &str, graph: &MemoryGraph) -> ScenarioResult<()> {
        let counts = [
            ("vertices", self.vertices, graph.vertex_count()),
            ("transactions", self.transactions, graph.transaction_count()),
            ("attributes", self.attributes, graph.attribute_count()),
        ];
        for (what, expected, actual) in counts {
            if let Some(expected) = expected {
                if actual != expected {
                    return Err(ScenarioError::assertion_failed(
                        step,
                        format!("expected {} {}, got {}", expected, what, actual),
                    ));
                }
            }
        }

        if self.values.is_empty() {
            return Ok(());
        }

        let snapshot = GraphSnapshot::capture(graph);
        for check in &self.values {
            let attribute = graph
                .find_attribute(check.element_type, &check.label)
                .ok_or_else(|| {
                    ScenarioError::assertion_failed(
                        step,
                        format!("no {} attribute '{}'", check.element_type, check.label),
                    )
                })?;
            let actual = snapshot
                .attributes
                .get(&attribute)
                .and_then(|a| a.values.get(&check.element));
            if actual != check.expected.as_ref() {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "expected {}.{} of {} to be {:?}, got {:?}",
                        check.element_type, check.label, check.element, check.expected, actual
                    ),
                ));
            }
        }

        Ok(())
    }

    fn verify_log(&self, step: &str, log: &EditLog) -> ScenarioResult<()> {
        if let Some(expected) = self.empty_log {
            if log.is_empty() != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected empty log: {}, got {}", expected, log.is_empty()),
                ));
            }
        }

        if self.words.is_none()
            && self.applications.is_none()
            && self.objects.is_none()
            && self.kinds.is_empty()
        {
            return Ok(());
        }

        let stats = log.stats().map_err(|e| ScenarioError::edit(step, e))?;
        let counts = [
            ("words", self.words, stats.words),
            ("applications", self.applications, stats.applications),
            ("objects", self.objects, stats.objects),
        ];
        for (what, expected, actual) in counts {
            if let Some(expected) = expected {
                if actual != expected {
                    return Err(ScenarioError::assertion_failed(
                        step,
                        format!("expected {} {}, got {}", expected, what, actual),
                    ));
                }
            }
        }

        for (operation, expected) in &self.kinds {
            let actual = stats.kinds.get(operation).map_or(0, |k| k.applications);
            if actual != *expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "expected {} {} applications, got {}",
                        expected,
                        operation.name(),
                        actual
                    ),
                ));
            }
        }

        Ok(())
    }
}

/// Builder for creating assertions fluently.
#[derive(Default)]
pub struct AssertionBuilder {
    assertion: Assertion,
}

impl AssertionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(mut self, n: usize) -> Self {
        self.assertion.vertices = Some(n);
        self
    }

    pub fn transactions(mut self, n: usize) -> Self {
        self.assertion.transactions = Some(n);
        self
    }

    pub fn attributes(mut self, n: usize) -> Self {
        self.assertion.attributes = Some(n);
        self
    }

    /// The graph holds no vertices, transactions or attributes.
    pub fn empty_graph(self) -> Self {
        self.vertices(0).transactions(0).attributes(0)
    }

    /// Expect a non-default value on a vertex attribute.
    pub fn vertex_value(
        self,
        label: &str,
        element: impl Into<ElementId>,
        expected: SnapshotValue,
    ) -> Self {
        self.value(ElementType::Vertex, label, element, Some(expected))
    }

    /// Expect a non-default value on a transaction attribute.
    pub fn transaction_value(
        self,
        label: &str,
        element: impl Into<ElementId>,
        expected: SnapshotValue,
    ) -> Self {
        self.value(ElementType::Transaction, label, element, Some(expected))
    }

    /// Expect the attribute default.
    pub fn default_value(
        self,
        element_type: ElementType,
        label: &str,
        element: impl Into<ElementId>,
    ) -> Self {
        self.value(element_type, label, element, None)
    }

    fn value(
        mut self,
        element_type: ElementType,
        label: &str,
        element: impl Into<ElementId>,
        expected: Option<SnapshotValue>,
    ) -> Self {
        self.assertion.values.push(ValueCheck {
            element_type,
            label: label.to_string(),
            element: element.into(),
            expected,
        });
        self
    }

    pub fn words(mut self, n: usize) -> Self {
        self.assertion.words = Some(n);
        self
    }

    pub fn applications(mut self, n: usize) -> Self {
        self.assertion.applications = Some(n);
        self
    }

    pub fn objects(mut self, n: usize) -> Self {
        self.assertion.objects = Some(n);
        self
    }

    /// Expect `n` applications of one operation kind.
    pub fn kind(mut self, operation: Operation, n: usize) -> Self {
        self.assertion.kinds.push((operation, n));
        self
    }

    pub fn empty_log(mut self) -> Self {
        self.assertion.empty_log = Some(true);
        self
    }

    pub fn custom<F>(mut self, f: F) -> Self
    where
        F: Fn(&MemoryGraph, &EditLog) -> bool + 'static,
    {
        self.assertion.custom = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Assertion {
        self.assertion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrace_core::{AttributeSpec, GraphWrite};

    fn finished_log() -> EditLog {
        let mut log = EditLog::new();
        log.finish().unwrap();
        log
    }

    #[test]
    fn test_counts_are_checked() {
        // GIVEN a graph with one vertex
        let mut graph = MemoryGraph::new();
        graph.add_vertex().unwrap();
        let log = finished_log();

        // THEN
        let ok = AssertionBuilder::new().vertices(1).empty_log().build();
        assert!(ok.verify("step", &graph, &log).is_ok());
        let empty = AssertionBuilder::new().empty_graph().build();
        assert!(empty.verify("step", &MemoryGraph::new(), &log).is_ok());

        let wrong = AssertionBuilder::new().vertices(2).build();
        let err = wrong.verify("step", &graph, &log).unwrap_err();
        assert!(err.to_string().contains("expected 2 vertices, got 1"));
    }

    #[test]
    fn test_value_checks_read_through_labels() {
        // GIVEN
        let mut graph = MemoryGraph::new();
        let v = graph.add_vertex().unwrap();
        let count = graph
            .add_attribute(AttributeSpec::new(ElementType::Vertex, "int", "count"))
            .unwrap();
        graph.set_int(count, v.into(), 5).unwrap();
        let log = finished_log();

        // THEN
        let set = AssertionBuilder::new()
            .vertex_value("count", v, SnapshotValue::Int(5))
            .build();
        assert!(set.verify("step", &graph, &log).is_ok());

        let default = AssertionBuilder::new()
            .default_value(ElementType::Vertex, "count", v)
            .build();
        assert!(default.verify("step", &graph, &log).is_err());

        let missing = AssertionBuilder::new()
            .vertex_value("weight", v, SnapshotValue::Int(5))
            .build();
        assert!(missing.verify("step", &graph, &log).is_err());
    }
}
