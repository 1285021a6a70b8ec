//! Reference tagging, connected components and cycle checks

use std::collections::VecDeque;

use ahash::AHashMap;
use tracing::debug;

use crate::graph::{DeBruijnGraph, NodeId};
use crate::kmer::kmer::Ori;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Grey,
    Black,
}

impl DeBruijnGraph {
    /// Flag nodes sharing a k-mer with the reference; returns how many were flagged
    pub fn mark_ref_nodes(&mut self) -> usize {
        let k = self.k;
        let mers = self.reference.mers();
        let mut refnodes = 0;
        for node in self.nodes.values_mut() {
            if node.mark_ref(mers, k) {
                refnodes += 1;
            }
            node.component = 0;
        }
        debug!("{} of {} nodes touch the reference", refnodes, self.nodes.len());
        refnodes
    }

    /// Label connected components starting from 1 and return the ids of those
    /// containing at least one reference node, in ascending order
    pub fn mark_connected_components(&mut self) -> Vec<usize> {
        for node in self.nodes.values_mut() {
            node.component = 0;
        }

        let mut comp = 0;
        let mut ref_comps = Vec::new();
        for start in self.sorted_ids(None) {
            if self.nodes[&start].component != 0 {
                continue;
            }
            comp += 1;
            let mut touches = false;
            let mut queue: VecDeque<NodeId> = VecDeque::from([start]);
            while let Some(id) = queue.pop_front() {
                let Some(node) = self.nodes.get_mut(id.as_str()) else {
                    continue;
                };
                if node.component != 0 {
                    continue;
                }
                node.component = comp;
                touches |= node.touch_ref;
                queue.extend(node.edges.iter().map(|e| e.node_id.clone()));
            }
            if touches {
                ref_comps.push(comp);
            }
        }

        debug!("{} components, {} touching the reference", comp, ref_comps.len());
        ref_comps
    }

    /// True if a directed walk from the source revisits a node still on the
    /// walk; special nodes are never entered
    pub fn has_cycle(&self) -> bool {
        let (Some(source), Some(_)) = (self.source.as_ref(), self.sink.as_ref()) else {
            return false;
        };

        let mut colors: AHashMap<&str, Color> = self
            .nodes
            .values()
            .filter(|n| !n.is_special())
            .map(|n| (n.id.as_str(), Color::White))
            .collect();

        let found = [Ori::F, Ori::R]
            .into_iter()
            .any(|dir| self.cycle_from(source, dir, &mut colors));
        if found {
            debug!("Cycle found in the graph (k = {})", self.k);
        }
        found
    }

    fn cycle_from<'a>(&'a self, start: &'a str, dir: Ori, colors: &mut AHashMap<&'a str, Color>) -> bool {
        // (node, orientation, next edge index)
        let mut stack: Vec<(&str, Ori, usize)> = vec![(start, dir, 0)];
        colors.insert(start, Color::Grey);

        while let Some(top) = stack.last_mut() {
            let (id, ori, idx) = *top;
            let Some(node) = self.nodes.get(id) else {
                stack.pop();
                continue;
            };
            match node.edges.get(idx) {
                None => {
                    colors.insert(id, Color::Black);
                    stack.pop();
                }
                Some(edge) => {
                    top.2 += 1;
                    if !edge.is_dir(ori) {
                        continue;
                    }
                    let Some(other) = self.nodes.get(edge.node_id.as_str()) else {
                        continue;
                    };
                    if other.is_special() {
                        continue;
                    }
                    match colors.get(other.id.as_str()) {
                        Some(Color::Grey) => return true,
                        Some(Color::White) => {
                            colors.insert(other.id.as_str(), Color::Grey);
                            stack.push((other.id.as_str(), edge.dir.dest(), 0));
                        }
                        _ => {}
                    }
                }
            }
        }
        false
    }

    /// True if some node was seen in good-quality tumor reads but never in normal reads
    pub fn has_tumor_only_kmer(&self) -> bool {
        self.nodes.values().any(|n| n.is_tumor && !n.is_normal)
    }
}
