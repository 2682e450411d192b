//! The delta tree: every comparison in this crate — a class against a
//! class, a JAR against a JAR, a whole distribution against another —
//! produces one of these trees. Shape is deliberately uniform and
//! deliberately ordered (no `HashMap`, only `BTreeMap`/`Vec` built in a
//! fixed traversal order) so the same two inputs always produce
//! byte-identical JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Unchanged,
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub kind: String,
    pub change: ChangeKind,
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Delta>,
    #[serde(default)]
    pub ignored: bool,
}

impl Delta {
    pub fn leaf(kind: impl Into<String>, change: ChangeKind, id: impl Into<String>, label: impl Into<String>) -> Delta {
        Delta { kind: kind.into(), change, id: id.into(), label: label.into(), left: None, right: None, children: vec![], ignored: false }
    }

    pub fn with_values(mut self, left: Option<String>, right: Option<String>) -> Delta {
        self.left = left;
        self.right = right;
        self
    }

    pub fn with_children(mut self, children: Vec<Delta>) -> Delta {
        self.children = children;
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// True if this node or anything beneath it actually changed, once
    /// nodes suppressed by an ignore policy are excluded.
    pub fn has_effective_change(&self) -> bool {
        if self.ignored {
            return false;
        }
        match self.change {
            ChangeKind::Unchanged => self.children.iter().any(Delta::has_effective_change),
            _ => true,
        }
    }

    /// Recomputes `change` bottom-up: a node marked `ignored` always
    /// reports as `Unchanged`, and a node with no effectively-changed
    /// children collapses to `Unchanged` too, even if an ignored child
    /// originally reported a change.
    pub fn collapse_ignored(mut self) -> Delta {
        self.children = self.children.into_iter().map(Delta::collapse_ignored).collect();
        if self.ignored {
            self.change = ChangeKind::Unchanged;
        } else if self.change == ChangeKind::Modified && !self.children.iter().any(Delta::has_effective_change) && self.left == self.right {
            self.change = ChangeKind::Unchanged;
        }
        self
    }
}

pub fn change_for_presence<L, R>(left: &Option<L>, right: &Option<R>) -> ChangeKind {
    match (left.is_some(), right.is_some()) {
        (true, true) => ChangeKind::Unchanged,
        (true, false) => ChangeKind::Removed,
        (false, true) => ChangeKind::Added,
        (false, false) => ChangeKind::Unchanged,
    }
}

pub fn change_for_equality<T: PartialEq>(left: &T, right: &T) -> ChangeKind {
    if left == right {
        ChangeKind::Unchanged
    } else {
        ChangeKind::Modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_leaf_has_no_effective_change() {
        let delta = Delta::leaf("field", ChangeKind::Unchanged, "f1", "count:I");
        assert!(!delta.has_effective_change());
    }

    #[test]
    fn ignored_modification_does_not_count_as_effective_change() {
        let mut delta = Delta::leaf("field", ChangeKind::Modified, "f1", "count:I").with_values(Some("1".into()), Some("2".into()));
        delta.ignored = true;
        assert!(!delta.has_effective_change());
    }

    #[test]
    fn parent_reflects_child_change_through_has_effective_change() {
        let child = Delta::leaf("field", ChangeKind::Modified, "f1", "count:I").with_values(Some("1".into()), Some("2".into()));
        let parent = Delta::leaf("class", ChangeKind::Unchanged, "C", "C").with_children(vec![child]);
        assert!(parent.has_effective_change());
    }

    #[test]
    fn collapse_ignored_reverts_modified_to_unchanged_when_all_children_ignored() {
        let mut child = Delta::leaf("field", ChangeKind::Modified, "f1", "count:I").with_values(Some("1".into()), Some("2".into()));
        child.ignored = true;
        let parent =
            Delta::leaf("class", ChangeKind::Modified, "C", "C").with_values(Some("C".into()), Some("C".into())).with_children(vec![child]);
        let collapsed = parent.collapse_ignored();
        assert_eq!(collapsed.change, ChangeKind::Unchanged);
    }
}
