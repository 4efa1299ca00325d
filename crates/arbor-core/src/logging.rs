//! Logging and debugging facilities for Arbor.
//!
//! This module provides:
//! - Target and span names for filtering `tracing` output per subsystem
//! - A generic tree dump used to inspect cached hierarchies
//! - A scoped performance span
//!
//! # Tracing Integration
//!
//! Arbor uses the `tracing` crate for instrumentation. Install a subscriber
//! in your application to see the logs:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("arbor::layout=debug")
//!     .init();
//! ```

use std::fmt::Write as FmtWrite;

/// Span names used throughout Arbor for tracing.
pub mod span_names {
    /// Model notification handling.
    pub const MODEL_EVENT: &str = "arbor::model_event";
    /// Full size recomputation pass.
    pub const SIZE_PASS: &str = "arbor::size_pass";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal system target.
    pub const SIGNAL: &str = "arbor_core::signal";
    /// Layout cache target.
    pub const LAYOUT: &str = "arbor::layout";
    /// Tree model target.
    pub const MODEL: &str = "arbor::model";
    /// Selection model target.
    pub const SELECTION: &str = "arbor::selection";
    /// Performance spans.
    pub const PERF: &str = "arbor::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node handles.
    pub show_ids: bool,
    /// Whether to show per-node details (geometry, flags).
    pub show_details: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            show_details: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            ..Default::default()
        }
    }

    /// Options for minimal output: labels only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_details: false,
            ..Default::default()
        }
    }
}

/// A hierarchy that can be dumped by [`TreeDebug`].
pub trait TreeDebugSource {
    /// Handle identifying one node of the hierarchy.
    type Id: Copy + std::fmt::Debug;

    /// Top-level nodes, in display order.
    fn roots(&self) -> Vec<Self::Id>;

    /// Children of `id`, in display order.
    fn children(&self, id: Self::Id) -> Vec<Self::Id>;

    /// Primary label for `id`.
    fn label(&self, id: Self::Id) -> String;

    /// Optional details printed after the label.
    fn details(&self, _id: Self::Id) -> Option<String> {
        None
    }
}

/// Formats any [`TreeDebugSource`] as an indented tree.
#[derive(Debug, Clone, Default)]
pub struct TreeDebug {
    options: TreeFormatOptions,
}

impl TreeDebug {
    /// Create a formatter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a formatter with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format every root of `source` and its descendants.
    pub fn format<S: TreeDebugSource>(&self, source: &S) -> String {
        let mut output = String::new();
        let roots = source.roots();
        if roots.is_empty() {
            output.push_str("(empty)\n");
            return output;
        }
        let mut ancestors_last = Vec::new();
        for root in roots {
            self.format_subtree_into(source, root, 0, true, &mut ancestors_last, &mut output);
        }
        output
    }

    fn format_subtree_into<S: TreeDebugSource>(
        &self,
        source: &S,
        id: S::Id,
        depth: usize,
        is_last: bool,
        ancestors_last: &mut Vec<bool>,
        output: &mut String,
    ) {
        if let Some(max) = self.options.max_depth {
            if depth > max {
                return;
            }
        }

        if depth > 0 {
            output.push_str(&self.build_prefix(ancestors_last, is_last));
        }
        output.push_str(&source.label(id));

        if self.options.show_ids {
            let _ = write!(output, " [{:?}]", id);
        }

        if self.options.show_details {
            if let Some(details) = source.details(id) {
                let _ = write!(output, " ({})", details);
            }
        }

        output.push('\n');

        // Roots sit at the margin and draw no guide for their children.
        if depth > 0 {
            ancestors_last.push(is_last);
        }
        let children = source.children(id);
        let child_count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            let last = i + 1 == child_count;
            self.format_subtree_into(source, child, depth + 1, last, ancestors_last, output);
        }
        if depth > 0 {
            ancestors_last.pop();
        }
    }

    /// `ancestors_last` holds, per ancestor below the root, whether it was
    /// the last of its siblings.
    fn build_prefix(&self, ancestors_last: &[bool], is_last: bool) -> String {
        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for &ancestor_last in ancestors_last {
            if ancestor_last {
                prefix.extend(std::iter::repeat_n(' ', branch.chars().count()));
            } else {
                prefix.push_str(branch);
            }
            for _ in 0..self.options.indent_size {
                prefix.push(' ');
            }
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to measure the duration of expensive passes.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new performance span for `name`.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!(target: targets::PERF, "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}
