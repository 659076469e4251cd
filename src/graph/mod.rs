//! Sequential state graphs.
//!
//! A graph is an ordered chain of named nodes. Each node takes the state by
//! value and hands back the updated state; the chain runs start to end once
//! per invocation with no branching.

mod citation;

pub use citation::{citation_graph, CitationState, GenerateAnswerNode, RetrieveNode, Stage};

use crate::error::{QuillError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, info_span, Instrument};

/// One step of a graph.
#[async_trait]
pub trait Node<S>: Send + Sync {
    async fn run(&self, state: S) -> Result<S>;
}

/// Graph under construction.
pub struct StateGraph<S> {
    nodes: Vec<(String, Box<dyn Node<S>>)>,
}

impl<S> Default for StateGraph<S>
where
    S: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Send + 'static,
{
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Append a node to the end of the chain.
    pub fn add_node(mut self, name: impl Into<String>, node: Box<dyn Node<S>>) -> Self {
        self.nodes.push((name.into(), node));
        self
    }

    /// Append several nodes, in order.
    pub fn add_sequence<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = (N, Box<dyn Node<S>>)>,
        N: Into<String>,
    {
        for (name, node) in nodes {
            self.nodes.push((name.into(), node));
        }
        self
    }

    /// Validate the chain: at least one node, unique names.
    pub fn compile(self) -> Result<CompiledGraph<S>> {
        if self.nodes.is_empty() {
            return Err(QuillError::Pipeline("Graph has no nodes".to_string()));
        }

        let mut seen = HashSet::new();
        for (name, _) in &self.nodes {
            if !seen.insert(name.as_str()) {
                return Err(QuillError::Pipeline(format!("Duplicate node name: {}", name)));
            }
        }

        Ok(CompiledGraph { nodes: self.nodes })
    }
}

/// Executable graph.
pub struct CompiledGraph<S> {
    nodes: Vec<(String, Box<dyn Node<S>>)>,
}

impl<S> CompiledGraph<S>
where
    S: Send + 'static,
{
    /// Node names in execution order.
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Run every node in order and return the final state.
    pub async fn invoke(&self, state: S) -> Result<S> {
        self.invoke_with(state, |_, _| {}).await
    }

    /// Like [`invoke`](Self::invoke), reporting the state after each node.
    pub async fn invoke_with<F>(&self, mut state: S, mut on_step: F) -> Result<S>
    where
        F: FnMut(&str, &S) + Send,
    {
        for (name, node) in &self.nodes {
            debug!("Running node {}", name);
            state = node
                .run(state)
                .instrument(info_span!("node", name = %name))
                .await?;
            on_step(name, &state);
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Push(&'static str);

    #[async_trait]
    impl Node<Vec<String>> for Push {
        async fn run(&self, mut state: Vec<String>) -> Result<Vec<String>> {
            state.push(self.0.to_string());
            Ok(state)
        }
    }

    struct Fail;

    #[async_trait]
    impl Node<Vec<String>> for Fail {
        async fn run(&self, _state: Vec<String>) -> Result<Vec<String>> {
            Err(QuillError::Search("offline".to_string()))
        }
    }

    fn push(name: &'static str) -> Box<dyn Node<Vec<String>>> {
        Box::new(Push(name))
    }

    #[tokio::test]
    async fn test_nodes_run_in_order() {
        let graph = StateGraph::<Vec<String>>::new()
            .add_sequence([("a", push("a")), ("b", push("b"))])
            .add_node("c", push("c"))
            .compile()
            .unwrap();

        assert_eq!(graph.node_names(), vec!["a", "b", "c"]);

        let mut steps = Vec::new();
        let state = graph
            .invoke_with(Vec::new(), |name, s| steps.push((name.to_string(), s.len())))
            .await
            .unwrap();

        assert_eq!(state, vec!["a", "b", "c"]);
        assert_eq!(
            steps,
            vec![("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 3)]
        );
    }

    #[tokio::test]
    async fn test_error_stops_chain() {
        let graph = StateGraph::<Vec<String>>::new()
            .add_node("fail", Box::new(Fail))
            .add_node("after", push("after"))
            .compile()
            .unwrap();

        let err = graph.invoke(Vec::new()).await.unwrap_err();
        assert!(matches!(err, QuillError::Search(_)));
    }

    #[test]
    fn test_graph_is_reusable() {
        let graph = StateGraph::<Vec<String>>::new()
            .add_node("a", push("a"))
            .compile()
            .unwrap();

        let first = tokio_test::block_on(graph.invoke(Vec::new())).unwrap();
        let second = tokio_test::block_on(graph.invoke(first)).unwrap();
        assert_eq!(second, vec!["a", "a"]);
    }

    #[test]
    fn test_compile_rejects_empty_and_duplicates() {
        assert!(StateGraph::<Vec<String>>::new().compile().is_err());

        let dup = StateGraph::<Vec<String>>::new()
            .add_node("a", push("a"))
            .add_node("a", push("a"))
            .compile();
        assert!(dup.is_err());
    }
}
