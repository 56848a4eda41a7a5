use std::collections::HashMap;

use formloom_domain::{Condition, Layout};
use tracing::warn;

use super::FormEngineError;

/// Flat record carrying a nullable parent pointer.
pub trait TreeRecord {
    /// Returns the record id.
    fn node_id(&self) -> &str;

    /// Returns the parent id, `None` for roots.
    fn parent_node_id(&self) -> Option<&str>;

    /// Returns the sibling sort key; `None` sorts after every ordered sibling.
    fn sort_order(&self) -> Option<i64> {
        None
    }
}

impl TreeRecord for Layout {
    fn node_id(&self) -> &str {
        self.id().as_str()
    }

    fn parent_node_id(&self) -> Option<&str> {
        self.parent_id().map(|id| id.as_str())
    }

    fn sort_order(&self) -> Option<i64> {
        self.order()
    }
}

impl TreeRecord for Condition {
    fn node_id(&self) -> &str {
        self.id().as_str()
    }

    fn parent_node_id(&self) -> Option<&str> {
        self.parent_id().map(|id| id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Pending,
    OnPath,
    Reachable,
    Excluded,
}

/// Ordered forest built once from flat parent-pointer records.
///
/// Every record stays addressable by id. Records whose parent is missing
/// become roots; records on a cycle, or below one, are excluded from the
/// traversal. Both situations are reported through [`Forest::issues`].
#[derive(Debug)]
pub struct Forest<'a, T> {
    nodes: Vec<&'a T>,
    index: HashMap<&'a str, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    excluded: Vec<bool>,
    issues: Vec<FormEngineError>,
}

impl<'a, T: TreeRecord> Forest<'a, T> {
    /// Builds the forest. Duplicate ids keep their first record.
    pub fn build(records: &'a [T]) -> Self {
        let mut nodes = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());
        for record in records {
            if index.contains_key(record.node_id()) {
                warn!(id = record.node_id(), "duplicate record id ignored");
                continue;
            }
            index.insert(record.node_id(), nodes.len());
            nodes.push(record);
        }

        let mut issues = Vec::new();
        let parents = nodes
            .iter()
            .map(|node| {
                let parent_id = node.parent_node_id()?;
                let parent = index.get(parent_id).copied();
                if parent.is_none() {
                    warn!(
                        id = node.node_id(),
                        parent_id, "dangling parent, treating node as root"
                    );
                    issues.push(FormEngineError::DanglingParent {
                        id: node.node_id().to_owned(),
                        parent_id: parent_id.to_owned(),
                    });
                }
                parent
            })
            .collect::<Vec<_>>();

        let excluded = exclude_cycles(&nodes, &parents, &mut issues);

        let mut children = vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();
        for (position, parent) in parents.iter().enumerate() {
            if excluded[position] {
                continue;
            }
            match parent {
                Some(parent) => children[*parent].push(position),
                None => roots.push(position),
            }
        }

        let sort_key = |position: &usize| {
            let order = nodes[*position].sort_order();
            (order.is_none(), order.unwrap_or_default())
        };
        roots.sort_by_key(sort_key);
        for siblings in &mut children {
            siblings.sort_by_key(sort_key);
        }

        Self {
            nodes,
            index,
            children,
            roots,
            excluded,
            issues,
        }
    }

    /// Fails on the first reported issue instead of degrading.
    pub fn strict(self) -> Result<Self, FormEngineError> {
        match self.issues.first() {
            Some(issue) => Err(issue.clone()),
            None => Ok(self),
        }
    }

    /// Returns the record with the given id, excluded or not.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'a T> {
        self.index.get(id).map(|position| self.nodes[*position])
    }

    /// Returns the number of distinct records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the forest holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns every record in input order.
    pub fn records(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.nodes.iter().copied()
    }

    /// Returns roots in sibling order.
    pub fn roots(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.roots.iter().map(|position| self.nodes[*position])
    }

    /// Returns whether the id is a traversable root.
    #[must_use]
    pub fn is_root(&self, id: &str) -> bool {
        self.index
            .get(id)
            .is_some_and(|position| self.roots.contains(position))
    }

    /// Returns the direct children of a node in sibling order.
    pub fn children(&self, id: &str) -> impl Iterator<Item = &'a T> + '_ {
        self.index
            .get(id)
            .map(|position| self.children[*position].as_slice())
            .unwrap_or_default()
            .iter()
            .map(|position| self.nodes[*position])
    }

    /// Returns whether the node sits on or below a cycle.
    #[must_use]
    pub fn is_excluded(&self, id: &str) -> bool {
        self.index
            .get(id)
            .is_some_and(|position| self.excluded[*position])
    }

    /// Returns dangling parents and cycles found while building.
    #[must_use]
    pub fn issues(&self) -> &[FormEngineError] {
        self.issues.as_slice()
    }

    /// Returns traversable records depth-first in sibling order.
    #[must_use]
    pub fn depth_first(&self) -> Vec<&'a T> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        let mut stack = self.roots.iter().rev().copied().collect::<Vec<_>>();
        while let Some(position) = stack.pop() {
            ordered.push(self.nodes[position]);
            stack.extend(self.children[position].iter().rev().copied());
        }
        ordered
    }
}

fn exclude_cycles<T: TreeRecord>(
    nodes: &[&T],
    parents: &[Option<usize>],
    issues: &mut Vec<FormEngineError>,
) -> Vec<bool> {
    let mut visits = vec![Visit::Pending; nodes.len()];
    let mut path = Vec::new();

    for start in 0..nodes.len() {
        let mut cursor = Some(start);
        let outcome = loop {
            let Some(position) = cursor else {
                break Visit::Reachable;
            };
            match visits[position] {
                Visit::Reachable => break Visit::Reachable,
                Visit::Excluded => break Visit::Excluded,
                Visit::OnPath => {
                    let entry = path.iter().position(|node| *node == position).unwrap_or(0);
                    let cycle = path[entry..]
                        .iter()
                        .map(|node: &usize| nodes[*node].node_id().to_owned())
                        .collect::<Vec<_>>();
                    warn!(cycle = %cycle.join(" -> "), "cycle detected, excluding branch");
                    issues.push(FormEngineError::CycleDetected { ids: cycle });
                    break Visit::Excluded;
                }
                Visit::Pending => {
                    visits[position] = Visit::OnPath;
                    path.push(position);
                    cursor = parents[position];
                }
            }
        };

        for position in path.drain(..) {
            visits[position] = outcome;
        }
    }

    visits
        .into_iter()
        .map(|visit| visit == Visit::Excluded)
        .collect()
}
