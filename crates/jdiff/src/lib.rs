//! Semantic differ over Java class files, JAR manifests, whole JARs and
//! exploded distribution trees. Every comparison bottoms out in a
//! [`delta::Delta`] tree; [`ignore::IgnorePolicy`] suppresses selected
//! branches of that tree after it's built rather than changing how any
//! individual comparator behaves.

pub mod class_diff;
pub mod code_diff;
pub mod delta;
pub mod dist_diff;
pub mod ignore;
pub mod jar_diff;
pub mod resource_diff;

pub use class_diff::{diff_class, diff_class_with_cancel};
pub use delta::{ChangeKind, Delta};
pub use dist_diff::{diff_distribution, diff_distribution_with_cancel};
pub use ignore::IgnorePolicy;
pub use jar_diff::{diff_jar, diff_jar_with_cancel};
pub use resource_diff::diff_resource;

/// Applies an [`IgnorePolicy`] to an already-built delta tree: marks the
/// nodes each recognized token covers as `ignored`, then recomputes
/// `change` bottom-up so a node whose only differences were ignored
/// collapses back to unchanged.
///
/// Every constant-pool-index operand is already resolved to a symbolic
/// name before comparison in [`code_diff`], so a permuted constant pool
/// never shows up as an instruction or descriptor difference on its own.
/// The only place pool reordering is visible at all is the dedicated
/// `constant_pool` node [`class_diff`] emits; `ignore::POOL` suppresses
/// that node specifically.
pub fn apply_ignore_policy(delta: Delta, policy: &IgnorePolicy) -> Delta {
    let marked = mark_ignored(delta, policy);
    marked.collapse_ignored()
}

fn mark_ignored(mut delta: Delta, policy: &IgnorePolicy) -> Delta {
    delta.children = delta.children.into_iter().map(|child| mark_ignored(child, policy)).collect();

    if delta.kind == "line_number_table" && policy.contains(ignore::LINES) {
        delta.ignored = true;
    }

    if delta.kind == "constant_pool" && policy.contains(ignore::POOL) {
        delta.ignored = true;
    }

    if delta.kind == "manifest_section" && delta.id.starts_with("manifest_entry:") && policy.contains(ignore::MANIFEST_SUBSECTIONS) {
        delta.ignored = true;
    }

    if delta.kind == "jar_signature" && policy.contains(ignore::JAR_SIGNATURE) {
        delta.ignored = true;
    }

    if delta.kind == "line_ending" && policy.contains(ignore::PLATFORM) {
        delta.ignored = true;
    }

    if delta.kind == "version" && policy.contains(ignore::VERSION) {
        delta.ignored = true;
    }

    if policy.contains(ignore::TRAILING_WHITESPACE) && delta.change == ChangeKind::Modified {
        if let (Some(left), Some(right)) = (&delta.left, &delta.right) {
            if left.trim_end() == right.trim_end() {
                delta.ignored = true;
            }
        }
    }

    delta
}
