//! Expansion of a root task into its full, deduplicated dependency graph.
//!
//! [TaskGraph::build] walks the requirements of the root task depth-first, in
//! the order each variant declares them. Every identity is represented by a
//! single canonical [Task], the first instance discovered during the walk.
//! Later duplicates are discarded and all dependent links are attached to the
//! canonical instance instead.
//!
//! Under the hood the tasks are nodes of a [petgraph] graph, with an edge
//! pointing from each requirement to the task that requires it.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use petgraph::Graph;
use petgraph::graph::NodeIndex;

use crate::error::TaskError;
use crate::task::{ArcStr, Task};

pub struct TaskGraph {
    graph: Graph<Arc<Task>, ()>,
    index: HashMap<ArcStr, NodeIndex>,
    root: NodeIndex,
}

impl TaskGraph {
    /// Expands `root` into every task reachable through its requirements.
    ///
    /// Fails if any requirement cannot be constructed, or if a requirement
    /// chain leads back to a task that is still being expanded.
    pub fn build(root: impl Into<Arc<Task>>) -> Result<Self, TaskError> {
        let root: Arc<Task> = root.into();

        let span = tracing::info_span!("build_task_graph", root = root.identity());
        let _enter = span.enter();

        let mut walk = Walk::default();
        let index = walk.insert(root.clone());
        walk.expand(&root, index)?;

        tracing::info!("collected {} tasks", walk.graph.node_count());

        Ok(Self {
            graph: walk.graph,
            index: walk.index,
            root: index,
        })
    }

    pub fn root(&self) -> &Arc<Task> {
        &self.graph[self.root]
    }

    /// The canonical task for an identity.
    pub fn get(&self, identity: &str) -> Option<&Arc<Task>> {
        self.index.get(identity).map(|&index| &self.graph[index])
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.index.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All canonical tasks in discovery order, root first.
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.graph.node_weights()
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.tasks().map(|task| task.identity())
    }

    /// Canonical direct requirements of a task, in the order its variant
    /// declares them.
    pub fn requirements_of(&self, identity: &str) -> Option<Vec<&Arc<Task>>> {
        let &index = self.index.get(identity)?;

        // petgraph yields the most recently added edge first
        let mut requirements: Vec<_> = self
            .graph
            .neighbors_directed(index, petgraph::Direction::Incoming)
            .map(|requirement| &self.graph[requirement])
            .collect();
        requirements.reverse();

        Some(requirements)
    }

    /// Tasks that report themselves ready and are not completed yet.
    pub fn ready(&self) -> Vec<&Arc<Task>> {
        self.tasks()
            .filter(|task| task.is_ready() && !task.is_completed())
            .collect()
    }

    /// All tasks ordered so that each requirement comes before every task
    /// that depends on it.
    pub fn order(&self) -> Result<Vec<&Arc<Task>>, TaskError> {
        let sorted = petgraph::algo::toposort(&self.graph, None).map_err(|cycle| {
            TaskError::CyclicDependency {
                cycle: vec![self.graph[cycle.node_id()].identity().to_string()],
            }
        })?;

        Ok(sorted.into_iter().map(|index| &self.graph[index]).collect())
    }
}

impl fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGraph")
            .field("root", &self.root().identity())
            .field("tasks", &self.identities().collect::<Vec<_>>())
            .finish()
    }
}

/// Renders the graph as a Mermaid flowchart.
impl fmt::Display for TaskGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "graph LR")?;

        for index in self.graph.node_indices() {
            let identity = self.graph[index].identity().replace('"', "\\\"");
            writeln!(f, "    {:?}[\"{}\"]", index.index(), identity)?;
        }

        for edge in self.graph.raw_edges() {
            writeln!(
                f,
                "    {:?} --> {:?}",
                edge.source().index(),
                edge.target().index()
            )?;
        }

        Ok(())
    }
}

/// State of a single depth-first expansion.
#[derive(Default)]
struct Walk {
    graph: Graph<Arc<Task>, ()>,
    index: HashMap<ArcStr, NodeIndex>,
    /// Identities currently being expanded, outermost first.
    path: Vec<ArcStr>,
    on_path: HashSet<ArcStr>,
}

impl Walk {
    fn insert(&mut self, task: Arc<Task>) -> NodeIndex {
        tracing::debug!(identity = task.identity(), "discovered task");

        let identity = task.identity_shared();
        let index = self.graph.add_node(task);
        self.index.insert(identity, index);
        index
    }

    fn expand(&mut self, task: &Arc<Task>, index: NodeIndex) -> Result<(), TaskError> {
        self.path.push(task.identity_shared());
        self.on_path.insert(task.identity_shared());

        for requirement in task.requirements()? {
            if self.on_path.contains(requirement.identity()) {
                return Err(self.cycle(requirement.identity()));
            }

            let existing = self.index.get(requirement.identity()).copied();
            let (canonical, requirement_index, fresh) = match existing {
                Some(existing) => {
                    tracing::trace!(identity = requirement.identity(), "reusing canonical task");
                    (self.graph[existing].clone(), existing, false)
                }
                None => {
                    let requirement = Arc::new(requirement);
                    let inserted = self.insert(requirement.clone());
                    (requirement, inserted, true)
                }
            };

            if canonical.add_dependent(task) {
                tracing::trace!(
                    requirement = canonical.identity(),
                    dependent = task.identity(),
                    "linked dependent"
                );
            }
            self.graph.update_edge(requirement_index, index, ());

            if fresh {
                self.expand(&canonical, requirement_index)?;
            }
        }

        self.path.pop();
        self.on_path.remove(task.identity());
        Ok(())
    }

    fn cycle(&self, identity: &str) -> TaskError {
        let start = self
            .path
            .iter()
            .position(|item| item.as_ref() == identity)
            .unwrap_or(0);

        let mut cycle: Vec<String> = self.path[start..].iter().map(|item| item.to_string()).collect();
        cycle.push(identity.to_string());

        TaskError::CyclicDependency { cycle }
    }
}
