//! Element-tree parser.

use super::tokens::{BlockReader, Token};
use crate::error::Result;
use crate::model::{InlineElement, InlineStyle};

/// Parse paragraph inner markup into an inline element tree.
///
/// Transparent tags (`<t>` without a style) become [`InlineElement::Group`]
/// nodes; empty metadata elements become [`InlineElement::Anchor`] leaves.
pub fn parse_elements(markup: &str) -> Result<Vec<InlineElement>> {
    let block = format!("<p>{}</p>", markup);
    let (mut reader, _) = BlockReader::new(&block)?;

    let mut root: Vec<InlineElement> = Vec::new();
    let mut open: Vec<(Option<InlineStyle>, Vec<InlineElement>)> = Vec::new();

    while let Some(token) = reader.next_token()? {
        let node = match token {
            Token::Open(style) => {
                open.push((style, Vec::new()));
                continue;
            }
            Token::Close => match open.pop() {
                Some((Some(style), children)) => InlineElement::styled(style, children),
                Some((None, children)) => InlineElement::group(children),
                None => continue,
            },
            Token::Text(text) => InlineElement::text(text),
            Token::Anchor(annotation) => InlineElement::anchor(annotation),
        };
        match open.last_mut() {
            Some((_, children)) => children.push(node),
            None => root.push(node),
        }
    }

    Ok(root)
}
