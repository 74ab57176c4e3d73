//! Streaming markup parser.
//!
//! Converts paragraph markup directly into flat text plus canonical format
//! runs, keeping a stack of active formats while it walks the token stream.

use super::options::LoadOptions;
use super::tokens::{split_blocks, BlockReader, Token};
use crate::error::Result;
use crate::model::format::push_run;
use crate::model::{Anchor, CharFormat, Paragraph};
use crate::style::StyleResolver;
use log::debug;
use rayon::prelude::*;

/// Parser from KML markup to [`Paragraph`] values.
pub struct MarkupParser<'a> {
    resolver: &'a dyn StyleResolver,
}

impl<'a> MarkupParser<'a> {
    /// Create a parser that resolves named character styles through `resolver`.
    pub fn new(resolver: &'a dyn StyleResolver) -> Self {
        Self { resolver }
    }

    /// Parse the inner markup of one paragraph (no `<p>` wrapper).
    pub fn parse_paragraph(&self, markup: &str) -> Result<Paragraph> {
        self.parse_block(&format!("<p>{}</p>", markup))
    }

    /// Parse one complete `<p>` block, including its attributes.
    pub fn parse_block(&self, block: &str) -> Result<Paragraph> {
        let (mut reader, header) = BlockReader::new(block)?;
        let mut paragraph = Paragraph {
            alignment: header.alignment,
            style_id: header.style_id,
            ..Default::default()
        };

        let base = CharFormat::default();
        let mut stack: Vec<CharFormat> = Vec::new();
        let mut offset = 0;

        while let Some(token) = reader.next_token()? {
            match token {
                Token::Open(style) => {
                    let current = stack.last().unwrap_or(&base);
                    let next = match style {
                        Some(style) => current.with(&style, self.resolver),
                        None => current.clone(),
                    };
                    stack.push(next);
                }
                Token::Close => {
                    stack.pop();
                }
                Token::Text(text) => {
                    let length = text.chars().count();
                    push_run(
                        &mut paragraph.runs,
                        offset,
                        length,
                        stack.last().unwrap_or(&base),
                    );
                    paragraph.text.push_str(&text);
                    offset += length;
                }
                Token::Anchor(annotation) => paragraph.anchors.push(Anchor { offset, annotation }),
            }
        }

        Ok(paragraph)
    }

    /// Parse a whole document into paragraphs.
    ///
    /// All-or-nothing: the first malformed block fails the call, with the
    /// block's index in the error message.
    pub fn parse_document(&self, kml: &str, options: &LoadOptions) -> Result<Vec<Paragraph>> {
        let blocks = split_blocks(kml)?;
        let parallel = options.use_parallel(blocks.len());
        debug!(
            "Parsing {} paragraph blocks ({})",
            blocks.len(),
            if parallel { "parallel" } else { "sequential" }
        );

        let parse = |(index, block): (usize, &&str)| {
            self.parse_block(block).map_err(|e| e.in_paragraph(index))
        };
        if parallel {
            blocks.par_iter().enumerate().map(parse).collect()
        } else {
            blocks.iter().enumerate().map(parse).collect()
        }
    }
}
