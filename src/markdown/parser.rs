//! Block structure parser implementation using comrak
//!
//! comrak builds a full CommonMark AST; the tokenizer only needs the block
//! level of it, with positions. This module walks the AST and flattens it
//! into [`Block`]s that carry comrak's 1-based line/column source positions.
//! Containers whose content is styled as a whole (block quotes, code blocks,
//! headings) are not descended into; lists are, so list markers and the
//! paragraphs inside items are reported separately.

use comrak::{
    nodes::{AstNode, ListType as ComrakListType, NodeValue},
    parse_document, Arena, Options,
};

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration options for markdown block parsing.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Enable GitHub Flavored Markdown tables (left unstyled)
    pub tables: bool,
    /// Enable task lists (- [ ] and - [x])
    pub tasklist: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            tasklist: true,
        }
    }
}

impl MarkdownOptions {
    /// Convert to comrak Options.
    fn to_comrak_options(&self) -> Options {
        let mut options = Options::default();

        options.extension.table = self.tables;
        options.extension.tasklist = self.tasklist;

        options
    }
}

/// The kind of a flattened block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Heading (H1-H6)
    Heading { level: u8, setext: bool },
    /// Block quote (>)
    BlockQuote,
    /// Fenced or indented code block
    CodeBlock,
    /// Thematic break (horizontal rule)
    ThematicBreak,
    /// A list item; `depth` is 1 for top-level lists
    ListItem { ordered: bool, depth: u8 },
    /// Paragraph, scanned for inline spans by the tokenizer
    Paragraph,
}

/// A block with its source position.
///
/// Lines and columns are 1-based as reported by comrak; columns count bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Parse markdown text into its flattened block list.
///
/// # Example
/// ```ignore
/// let blocks = parse_blocks("# Hello\n\nWorld", &MarkdownOptions::default());
/// assert_eq!(blocks.len(), 2);
/// ```
pub fn parse_blocks(markdown: &str, options: &MarkdownOptions) -> Vec<Block> {
    let arena = Arena::new();
    let comrak_options = options.to_comrak_options();

    let root = parse_document(&arena, markdown, &comrak_options);

    let mut blocks = Vec::new();
    for child in root.children() {
        collect_blocks(child, 0, &mut blocks);
    }
    blocks
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Conversion Functions
// ─────────────────────────────────────────────────────────────────────────────

/// What a comrak node contributes to the block list.
enum Visit {
    Emit(BlockKind),
    List { ordered: bool },
    Skip,
}

/// Flatten a comrak node into `blocks`.
fn collect_blocks<'a>(node: &'a AstNode<'a>, list_depth: u8, blocks: &mut Vec<Block>) {
    // Copy what we need out of the node so the RefCell borrow ends before recursing
    let (visit, sourcepos) = {
        let ast = node.data.borrow();
        let visit = match &ast.value {
            NodeValue::Heading(heading) => Visit::Emit(BlockKind::Heading {
                level: heading.level,
                setext: heading.setext,
            }),
            NodeValue::BlockQuote => Visit::Emit(BlockKind::BlockQuote),
            NodeValue::CodeBlock(_) => Visit::Emit(BlockKind::CodeBlock),
            NodeValue::ThematicBreak => Visit::Emit(BlockKind::ThematicBreak),
            NodeValue::Paragraph => Visit::Emit(BlockKind::Paragraph),
            NodeValue::List(list) => Visit::List {
                ordered: matches!(list.list_type, ComrakListType::Ordered),
            },
            // Tables, HTML blocks and anything newer stay plain
            _ => Visit::Skip,
        };
        (visit, ast.sourcepos)
    };

    match visit {
        Visit::Emit(kind) => blocks.push(Block {
            kind,
            start_line: sourcepos.start.line,
            start_column: sourcepos.start.column,
            end_line: sourcepos.end.line,
        }),
        Visit::List { ordered } => {
            let depth = list_depth.saturating_add(1);
            for item in node.children() {
                let item_pos = item.data.borrow().sourcepos;
                blocks.push(Block {
                    kind: BlockKind::ListItem { ordered, depth },
                    start_line: item_pos.start.line,
                    start_column: item_pos.start.column,
                    end_line: item_pos.end.line,
                });
                for child in item.children() {
                    collect_blocks(child, depth, blocks);
                }
            }
        }
        Visit::Skip => {}
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
