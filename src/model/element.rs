//! Inline element tree.
//!
//! A paragraph's markup can be held as a tree of inline elements instead of
//! flat text plus runs. The tree is a closed enum: traversal is a `match`
//! and cloning is a structural copy.

use super::{Annotation, Color};
use serde::{Deserialize, Serialize};

/// Style introduced by one inline tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineStyle {
    /// `<b>`
    Bold,
    /// `<i>`
    Italic,
    /// `<u>`
    Underline,
    /// `<s>`
    Strikethrough,
    /// `<sub>`
    Subscript,
    /// `<sup>`
    Superscript,
    /// `<a href="...">`
    Link {
        /// Link target
        href: String,
    },
    /// `<span style="..." color="...">` (also `<t style="...">`)
    CharStyle {
        /// Named character style to resolve
        style_id: Option<String>,
        /// Explicit color, applied after the named style
        color: Option<Color>,
    },
    /// Non-empty metadata tag wrapping text
    Annotation(Annotation),
}

/// A node of the inline element tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineElement {
    /// Literal (already unescaped) text
    Text {
        /// Text content
        text: String,
    },

    /// Children rendered with an additional style
    Styled {
        /// Style introduced by this node
        style: InlineStyle,
        /// Child nodes
        children: Vec<InlineElement>,
    },

    /// Plain container without a style of its own
    Group {
        /// Child nodes
        children: Vec<InlineElement>,
    },

    /// Annotation attached at a position, carrying no text
    Anchor {
        /// The attached annotation
        annotation: Annotation,
    },
}

impl InlineElement {
    /// Create a text node.
    pub fn text(text: impl Into<String>) -> Self {
        InlineElement::Text { text: text.into() }
    }

    /// Create a styled node.
    pub fn styled(style: InlineStyle, children: Vec<InlineElement>) -> Self {
        InlineElement::Styled { style, children }
    }

    /// Create a plain container.
    pub fn group(children: Vec<InlineElement>) -> Self {
        InlineElement::Group { children }
    }

    /// Create an anchor node.
    pub fn anchor(annotation: Annotation) -> Self {
        InlineElement::Anchor { annotation }
    }

    /// Child nodes (empty for leaves).
    pub fn children(&self) -> &[InlineElement] {
        match self {
            InlineElement::Styled { children, .. } | InlineElement::Group { children } => children,
            InlineElement::Text { .. } | InlineElement::Anchor { .. } => &[],
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            InlineElement::Text { text } => out.push_str(text),
            InlineElement::Anchor { .. } => {}
            InlineElement::Styled { children, .. } | InlineElement::Group { children } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Length of the text in characters.
    pub fn char_len(&self) -> usize {
        match self {
            InlineElement::Text { text } => text.chars().count(),
            InlineElement::Anchor { .. } => 0,
            InlineElement::Styled { children, .. } | InlineElement::Group { children } => {
                children.iter().map(InlineElement::char_len).sum()
            }
        }
    }
}

/// Concatenated text of a sequence of elements.
pub fn elements_text(elements: &[InlineElement]) -> String {
    elements.iter().map(InlineElement::plain_text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_and_length() {
        let tree = InlineElement::group(vec![
            InlineElement::text("Hé"),
            InlineElement::styled(
                InlineStyle::Bold,
                vec![
                    InlineElement::text("llo "),
                    InlineElement::anchor(Annotation::Footnote {
                        id: Some("f1".to_string()),
                        number: Some(1),
                    }),
                ],
            ),
            InlineElement::text("wörld"),
        ]);

        assert_eq!(tree.plain_text(), "Héllo wörld");
        assert_eq!(tree.char_len(), 11);
        assert_eq!(tree.children().len(), 3);
    }

    #[test]
    fn test_clone_is_structural() {
        let tree = InlineElement::styled(
            InlineStyle::Italic,
            vec![InlineElement::styled(
                InlineStyle::Bold,
                vec![InlineElement::text("x")],
            )],
        );
        let copy = tree.clone();
        assert_eq!(tree, copy);
    }
}
