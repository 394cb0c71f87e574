// SPDX-License-Identifier: MIT OR Apache-2.0
//! Merge selected nodes through combiner chains.
//!
//! For every bucket the classifier produces, a chain of combiners is
//! built and wired: the members feed the chain, and the downstream links
//! of the primary member are moved onto the chain's result unless that
//! would close a loop back into the bucket.

use crate::chain::{build_chain, Chain};
use crate::classify::{classify, BucketCategory, MergeRequest};
use crate::cycle::link_creates_cycle;
use crate::error::{OperatorError, Result};
use crate::report::{OperatorStatus, Reports};
use crate::settings::WranglerSettings;
use nodewrangle_graph::{Graph, Link, NodeId, Operation, TreeType};
use std::collections::HashSet;

/// Output names that carry a depth channel
const DEPTH_OUTPUT_NAMES: [&str; 2] = ["Z", "Depth"];

/// Merge the selected nodes.
///
/// Returns [`OperatorStatus::PassThrough`] when nothing could be
/// classified.
pub fn merge_nodes(
    graph: &mut Graph,
    request: MergeRequest,
    settings: &WranglerSettings,
    reports: &mut Reports,
) -> Result<OperatorStatus> {
    let tree = graph.tree_type();
    if tree == TreeType::Custom {
        return Err(OperatorError::WrongTree(tree));
    }

    let request = request.normalized(tree);
    let buckets = classify(graph, &request);
    if buckets.is_empty() {
        return Ok(OperatorStatus::PassThrough);
    }

    let mut created = 0;
    for (category, entries) in buckets.into_non_empty() {
        let targets: HashSet<NodeId> = entries.iter().map(|e| e.node).collect();
        let chain = build_chain(graph, category, entries, request.mode, settings);
        created += chain.combiners.len();
        if chain.kind.is_multi_input() {
            wire_multi_input(graph, &chain, &targets)?;
        } else {
            wire_binary(graph, category, &chain, &targets)?;
        }
    }

    tracing::info!(combiners = created, mode = request.mode.symbol(), "merged nodes");
    reports.info(format!("Added {created} combiner node(s)"));
    Ok(OperatorStatus::Finished)
}

/// Links leaving the node's first enabled output
fn primary_links(graph: &Graph, node: NodeId) -> Vec<Link> {
    graph
        .node(node)
        .and_then(|n| n.first_enabled_output())
        .map(|index| graph.output_links(node, index))
        .unwrap_or_default()
}

/// Keep the links whose rewire would not feed back into `targets`
fn redirectable(graph: &Graph, links: Vec<Link>, targets: &HashSet<NodeId>) -> Vec<Link> {
    links
        .into_iter()
        .filter(|link| {
            let cycle = link_creates_cycle(graph, link, targets);
            if cycle {
                tracing::debug!(link = ?link.id, "left link in place to avoid a cycle");
            }
            !cycle
        })
        .collect()
}

/// Move each link so it leaves the result output of `combiner`
fn redirect(graph: &mut Graph, links: &[Link], combiner: NodeId) -> Result<()> {
    let Some(output) = graph
        .node(combiner)
        .and_then(|n| n.first_enabled_output().and_then(|i| n.output(i)))
        .map(|s| s.id)
    else {
        return Ok(());
    };
    for link in links {
        graph.relink(link.id, combiner, output)?;
    }
    Ok(())
}

/// Link the primary output of `from` into input `input` of `to`
fn connect_primary(graph: &mut Graph, from: NodeId, to: NodeId, input: usize) -> Result<()> {
    let Some(output) = graph.node(from).and_then(|n| n.first_enabled_output()) else {
        return Ok(());
    };
    graph.connect_indices(from, output, to, input)?;
    Ok(())
}

/// Link the depth output of `from`, if any, into input `input` of `to`
fn connect_depth(graph: &mut Graph, from: NodeId, to: NodeId, input: usize) -> Result<()> {
    let Some(node) = graph.node(from) else {
        return Ok(());
    };
    let primary = node.first_enabled_output();
    let depth = node
        .outputs
        .iter()
        .enumerate()
        .find(|(i, s)| Some(*i) != primary && DEPTH_OUTPUT_NAMES.contains(&s.name.as_str()))
        .map(|(i, _)| i);
    if let Some(index) = depth {
        graph.connect_indices(from, index, to, input)?;
    }
    Ok(())
}

fn wire_binary(
    graph: &mut Graph,
    category: BucketCategory,
    chain: &Chain,
    targets: &HashSet<NodeId>,
) -> Result<()> {
    let (Some((first, second)), Some(outermost)) = (chain.kind.primary_inputs(), chain.outermost())
    else {
        return Ok(());
    };
    let depth = chain.kind.depth_inputs();
    let members: Vec<NodeId> = chain.members.iter().map(|e| e.node).collect();
    let Some(&primary) = members.first() else {
        return Ok(());
    };

    // Decide on redirects before the chain adds links of its own
    let mut candidates = primary_links(graph, primary);
    if candidates.is_empty() && members.len() == 2 {
        candidates = primary_links(graph, members[1]);
    }
    let candidates = redirectable(graph, candidates, targets);

    connect_primary(graph, primary, chain.combiners[0], first)?;
    if let Some((depth_first, _)) = depth {
        connect_depth(graph, primary, chain.combiners[0], depth_first)?;
    }

    for (i, &combiner) in chain.combiners.iter().enumerate() {
        if i > 0 {
            let previous = chain.combiners[i - 1];
            connect_primary(graph, previous, combiner, first)?;
            if let Some((depth_first, _)) = depth {
                connect_depth(graph, previous, combiner, depth_first)?;
            }
        }
        if let Some(&member) = members.get(i + 1) {
            connect_primary(graph, member, combiner, second)?;
            if let Some((_, depth_second)) = depth {
                connect_depth(graph, member, combiner, depth_second)?;
            }
        }
    }

    redirect(graph, &candidates, outermost)?;
    tracing::debug!(?category, redirected = candidates.len(), "wired combiner chain");
    Ok(())
}

fn wire_multi_input(graph: &mut Graph, chain: &Chain, targets: &HashSet<NodeId>) -> Result<()> {
    let Some(combiner) = chain.outermost() else {
        return Ok(());
    };
    let indices = chain
        .kind
        .multi_input_indices(chain.operation.unwrap_or(Operation::Join));
    let Some((&multi, fixed)) = indices.split_last() else {
        return Ok(());
    };

    // First member with downstream links donates them to the combiner
    let candidates = chain
        .members
        .iter()
        .map(|e| primary_links(graph, e.node))
        .find(|links| !links.is_empty())
        .unwrap_or_default();
    let candidates = redirectable(graph, candidates, targets);

    let mut stacked = Vec::new();
    for (i, entry) in chain.members.iter().enumerate() {
        match fixed.get(i) {
            Some(&index) => connect_primary(graph, entry.node, combiner, index)?,
            None => stacked.push(entry.node),
        }
    }
    // Multi-input sockets draw their latest link on top
    for &member in stacked.iter().rev() {
        connect_primary(graph, member, combiner, multi)?;
    }

    redirect(graph, &candidates, combiner)?;
    Ok(())
}
