//! Debugging facilities for item trees.
//!
//! Horizon MVVM logs through `tracing`, with targets listed in
//! [`horizon_mvvm_core::logging::targets`]. This module adds
//! [`ModelTreeDebug`], which renders an item subtree for diagnostics:
//!
//! ```
//! use horizon_mvvm::logging::{ModelTreeDebug, TreeFormatOptions, TreeStyle};
//! use horizon_mvvm::model::{SessionModel, ViewportItem};
//!
//! let model = SessionModel::new("PlotModel");
//! model.append_item(ViewportItem::builder(), &model.root_item(), "").unwrap();
//!
//! let debug = ModelTreeDebug::with_options(TreeFormatOptions {
//!     style: TreeStyle::Ascii,
//!     ..TreeFormatOptions::minimal()
//! });
//! let text = debug.format_model(&model).unwrap();
//! assert!(text.contains("X axis"));
//! ```

pub use horizon_mvvm_core::logging::{span_names, targets};

use crate::error::Result;
use crate::model::{SessionItem, SessionModel};

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
    /// Whether to show model-unique identifiers.
    pub show_identifiers: bool,
    /// Whether to show model types.
    pub show_types: bool,
    /// Whether to show the tag each child is held under.
    pub show_tags: bool,
    /// Whether to list property values below each item.
    pub show_properties: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_identifiers: true,
            show_types: true,
            show_tags: true,
            show_properties: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_properties: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_identifiers: false,
            show_types: false,
            show_tags: false,
            show_properties: false,
            ..Default::default()
        }
    }
}

/// Renders item subtrees as indented text.
#[derive(Debug, Clone, Default)]
pub struct ModelTreeDebug {
    options: TreeFormatOptions,
}

impl ModelTreeDebug {
    /// Create a visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format a whole model, root included.
    pub fn format_model(&self, model: &SessionModel) -> Result<String> {
        let mut output = format!(
            "{} ({} item(s)):\n",
            model.model_type(),
            model.item_count()
        );
        self.format_into(&model.root_item(), 0, true, &mut output)?;
        Ok(output)
    }

    /// Format the subtree rooted at `root`.
    pub fn format_subtree(&self, root: &SessionItem) -> Result<String> {
        let mut output = String::new();
        self.format_into(root, 0, true, &mut output)?;
        Ok(output)
    }

    fn format_into(
        &self,
        item: &SessionItem,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) -> Result<()> {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }

        output.push_str(&self.build_prefix(depth, is_last));
        if self.options.show_tags && depth > 0 {
            if let Some(tag_row) = item.tag_row()? {
                output.push_str(&format!("{tag_row} "));
            }
        }
        let name = item.display_name()?;
        output.push_str(if name.is_empty() { "(unnamed)" } else { &name });
        if self.options.show_identifiers {
            output.push_str(&format!(" #{}", item.identifier()?));
        }
        if self.options.show_types {
            output.push_str(&format!(" ({})", item.model_type()?));
        }
        output.push('\n');

        if self.options.show_properties {
            let prefix = self.build_property_prefix(depth);
            for (name, value) in item.properties()? {
                output.push_str(&format!("{prefix}  .{name} = {value}\n"));
            }
        }

        let children = item.children()?;
        let count = children.len();
        for (i, child) in children.iter().enumerate() {
            self.format_into(child, depth + 1, i + 1 == count, output)?;
        }
        Ok(())
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+-- ", "`-- "),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
            TreeStyle::Compact => ("", "- ", "- "),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix
    }

    fn build_property_prefix(&self, depth: usize) -> String {
        let branch = match self.options.style {
            TreeStyle::Ascii => "|",
            TreeStyle::Unicode => "\u{2502}",
            TreeStyle::Compact => "",
        };
        let mut prefix = String::new();
        for _ in 0..depth {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix
    }
}
