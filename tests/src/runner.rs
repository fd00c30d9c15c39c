//! Scenario runner.

use retrace_graph::{GraphSnapshot, MemoryGraph};
use retrace_journal::EditLog;
use retrace_transaction::EditTransaction;

use crate::error::{ScenarioError, ScenarioResult};
use crate::scenario::{Scenario, Step};

/// Runs a scenario against a [`MemoryGraph`].
pub struct Runner<'s> {
    scenario: &'s Scenario,
}

impl<'s> Runner<'s> {
    pub fn new(scenario: &'s Scenario) -> Self {
        Self { scenario }
    }

    /// Run the scenario.
    pub fn run(&self) -> ScenarioResult<()> {
        let mut graph = MemoryGraph::new();
        let initial = GraphSnapshot::capture(&graph);
        let mut logs = Vec::with_capacity(self.scenario.steps.len());

        for step in &self.scenario.steps {
            let log = self.run_step(step, &mut graph)?;
            logs.push((step.name.as_str(), log));
        }

        // Unwind every step, newest first
        for (name, log) in logs.iter().rev() {
            log.undo(&mut graph)
                .map_err(|e| ScenarioError::edit(name, e))?;
        }
        if GraphSnapshot::capture(&graph) != initial {
            return Err(ScenarioError::diverged(&self.scenario.name, "full undo"));
        }

        Ok(())
    }

    fn run_step(&self, step: &Step, graph: &mut MemoryGraph) -> ScenarioResult<EditLog> {
        let prior = graph.clone();

        let mut tx = EditTransaction::recording(&mut *graph);
        (step.mutate)(&mut tx).map_err(|e| ScenarioError::transaction(&step.name, e))?;
        let log = tx
            .commit()
            .map_err(|e| ScenarioError::transaction(&step.name, e))?
            .into_log();

        step.assertion.verify(&step.name, graph, &log)?;

        let after = GraphSnapshot::capture(graph);
        self.check_replay(&step.name, &log, &prior, &after, ("execute", "undo"))?;

        let bytes = log
            .to_bytes()
            .map_err(|e| ScenarioError::edit(&step.name, e))?;
        let reloaded = EditLog::from_bytes_with(&bytes, &self.scenario.registry)
            .map_err(|e| ScenarioError::edit(&step.name, e))?;
        self.check_replay(
            &step.name,
            &reloaded,
            &prior,
            &after,
            ("reloaded execute", "reloaded undo"),
        )?;

        Ok(log)
    }

    /// Execute `log` on a copy of `prior` and undo it again.
    fn check_replay(
        &self,
        step: &str,
        log: &EditLog,
        prior: &MemoryGraph,
        after: &GraphSnapshot,
        phases: (&'static str, &'static str),
    ) -> ScenarioResult<()> {
        let mut replica = prior.clone();

        log.execute(&mut replica)
            .map_err(|e| ScenarioError::edit(step, e))?;
        if GraphSnapshot::capture(&replica) != *after {
            return Err(ScenarioError::diverged(step, phases.0));
        }

        log.undo(&mut replica)
            .map_err(|e| ScenarioError::edit(step, e))?;
        if GraphSnapshot::capture(&replica) != GraphSnapshot::capture(prior) {
            return Err(ScenarioError::diverged(step, phases.1));
        }

        Ok(())
    }
}
