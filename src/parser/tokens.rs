//! Block splitting and tokenization over `quick-xml` events.
//!
//! A document is split into paragraph block slices first; each block is then
//! tokenized independently, which is what lets blocks parse in parallel.

use super::registry::{self, classify, TagKind};
use crate::error::{Error, Result};
use crate::model::{Alignment, Annotation, AnnotationKind, Color, InlineStyle};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One token of paragraph content.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Opening inline tag; `None` for transparent tags that add no style.
    Open(Option<InlineStyle>),
    /// Closing inline tag
    Close,
    /// Decoded text
    Text(String),
    /// Empty metadata element
    Anchor(Annotation),
}

/// Attributes of a paragraph block tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct BlockHeader {
    pub alignment: Alignment,
    pub style_id: Option<String>,
}

fn new_reader(input: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(false).check_end_names(true);
    reader
}

fn tag_name(e: &BytesStart) -> Result<String> {
    std::str::from_utf8(e.name().as_ref())
        .map(str::to_string)
        .map_err(|_| Error::Parse("tag name is not valid UTF-8".to_string()))
}

/// Decoded attributes of one tag, checked against an allow-list.
struct Attrs(Vec<(String, String)>);

impl Attrs {
    fn read(tag: &str, e: &BytesStart, allowed: &[&str]) -> Result<Self> {
        let mut values = Vec::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|_| Error::Parse(format!("<{}>: attribute name is not valid UTF-8", tag)))?
                .to_string();
            if !allowed.contains(&key.as_str()) {
                return Err(Error::Parse(format!(
                    "unknown attribute '{}' on <{}>",
                    key, tag
                )));
            }
            let value = attr.unescape_value()?.into_owned();
            values.push((key, value));
        }
        Ok(Attrs(values))
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    fn flag(&self, tag: &str, key: &str) -> Result<bool> {
        match self.get(key) {
            None => Ok(false),
            Some("true") | Some("1") => Ok(true),
            Some("false") | Some("0") => Ok(false),
            Some(other) => Err(Error::Parse(format!(
                "<{}>: invalid boolean '{}' for '{}'",
                tag, other, key
            ))),
        }
    }
}

fn parse_annotation(tag: &str, kind: AnnotationKind, e: &BytesStart) -> Result<Annotation> {
    let attrs = Attrs::read(tag, e, registry::metadata_attributes(kind))?;
    let id = attrs.string("id");
    let annotation = match kind {
        AnnotationKind::Comment => {
            let created = attrs
                .get("created")
                .map(|value| {
                    DateTime::parse_from_rfc3339(value)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| {
                            Error::Parse(format!("<{}>: invalid timestamp '{}': {}", tag, value, e))
                        })
                })
                .transpose()?;
            Annotation::Comment {
                id,
                author: attrs.string("author"),
                created,
                resolved: attrs.flag(tag, "resolved")?,
            }
        }
        AnnotationKind::Todo => Annotation::Todo {
            id,
            completed: attrs.flag(tag, "completed")?,
            priority: attrs.string("priority"),
        },
        AnnotationKind::Footnote => {
            let number = attrs
                .get("number")
                .map(|value| {
                    value.parse::<u32>().map_err(|_| {
                        Error::Parse(format!("<{}>: invalid number '{}'", tag, value))
                    })
                })
                .transpose()?;
            Annotation::Footnote { id, number }
        }
        AnnotationKind::CharacterRef => Annotation::CharacterRef {
            id,
            target: attrs.string("target"),
        },
        AnnotationKind::LocationRef => Annotation::LocationRef {
            id,
            target: attrs.string("target"),
        },
    };
    Ok(annotation)
}

fn parse_block_header(tag: &str, e: &BytesStart) -> Result<BlockHeader> {
    let attrs = Attrs::read(tag, e, &["align", "style"])?;
    let alignment = match attrs.get("align") {
        Some(value) => value.parse()?,
        None => Alignment::Left,
    };
    Ok(BlockHeader {
        alignment,
        style_id: attrs.string("style").filter(|s| !s.is_empty()),
    })
}

/// Style introduced by an inline opening tag (`None` for transparent tags).
fn inline_style(tag: &str, kind: TagKind, e: &BytesStart) -> Result<Option<InlineStyle>> {
    if let Some(style) = registry::simple_style(kind) {
        Attrs::read(tag, e, &[])?;
        return Ok(Some(style));
    }
    match kind {
        TagKind::Link => {
            let attrs = Attrs::read(tag, e, &["href"])?;
            let href = attrs
                .string("href")
                .ok_or_else(|| Error::Parse(format!("<{}> requires an href attribute", tag)))?;
            Ok(Some(InlineStyle::Link { href }))
        }
        TagKind::Span => {
            let attrs = Attrs::read(tag, e, &["style", "color"])?;
            let color = attrs.get("color").map(str::parse::<Color>).transpose()?;
            Ok(char_style(attrs.string("style"), color))
        }
        TagKind::TextRun => {
            let attrs = Attrs::read(tag, e, &["style"])?;
            Ok(char_style(attrs.string("style"), None))
        }
        TagKind::Metadata(kind) => Ok(Some(InlineStyle::Annotation(parse_annotation(tag, kind, e)?))),
        TagKind::Root | TagKind::Block => Err(Error::Parse(format!(
            "<{}> is not allowed inside a paragraph",
            tag
        ))),
        _ => Err(Error::Parse(format!("unknown tag <{}>", tag))),
    }
}

fn char_style(style_id: Option<String>, color: Option<Color>) -> Option<InlineStyle> {
    let style_id = style_id.filter(|s| !s.is_empty());
    if style_id.is_none() && color.is_none() {
        None
    } else {
        Some(InlineStyle::CharStyle { style_id, color })
    }
}

fn known_kind(tag: &str) -> Result<TagKind> {
    classify(tag).ok_or_else(|| Error::Parse(format!("unknown tag <{}>", tag)))
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Split a document into paragraph block slices.
///
/// Accepts an optional `<kml>`/`<document>`/`<doc>` root; without one the
/// input is read as a bare sequence of blocks. Block contents are only
/// checked for balanced block tags here; [`BlockReader`] validates them.
pub(crate) fn split_blocks(kml: &str) -> Result<Vec<&str>> {
    let mut reader = new_reader(kml);
    let mut blocks = Vec::new();
    let mut root: Option<String> = None;
    let mut root_closed = false;

    loop {
        let start = reader.buffer_position();
        match reader.read_event()? {
            Event::Start(e) => {
                let tag = tag_name(&e)?;
                if root_closed {
                    return Err(Error::Parse(format!("<{}> after the document root", tag)));
                }
                match known_kind(&tag)? {
                    TagKind::Root if root.is_none() && blocks.is_empty() => {
                        Attrs::read(&tag, &e, &[])?;
                        root = Some(tag);
                    }
                    TagKind::Block => {
                        let end = e.to_end().into_owned();
                        reader.read_to_end(end.name())?;
                        blocks.push(&kml[start..reader.buffer_position()]);
                    }
                    _ => {
                        return Err(Error::Parse(format!(
                            "<{}> is not allowed at block level",
                            tag
                        )))
                    }
                }
            }
            Event::Empty(e) => {
                let tag = tag_name(&e)?;
                if root_closed {
                    return Err(Error::Parse(format!("<{}> after the document root", tag)));
                }
                match known_kind(&tag)? {
                    TagKind::Root if root.is_none() && blocks.is_empty() => {
                        Attrs::read(&tag, &e, &[])?;
                        root_closed = true;
                    }
                    TagKind::Block => blocks.push(&kml[start..reader.buffer_position()]),
                    _ => {
                        return Err(Error::Parse(format!(
                            "<{}> is not allowed at block level",
                            tag
                        )))
                    }
                }
            }
            Event::End(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if root.as_deref() == Some(tag.as_str()) && !root_closed {
                    root_closed = true;
                } else {
                    return Err(Error::Parse(format!("unexpected closing tag </{}>", tag)));
                }
            }
            Event::Text(e) => {
                if !is_blank(&e) {
                    return Err(Error::Parse("text outside of a paragraph".to_string()));
                }
            }
            Event::CData(_) => {
                return Err(Error::Parse("CDATA outside of a paragraph".to_string()));
            }
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if let (Some(tag), false) = (root, root_closed) {
        return Err(Error::Parse(format!("unclosed tag <{}>", tag)));
    }
    Ok(blocks)
}

/// Pull tokenizer over one paragraph block (`<p ...>...</p>`).
pub(crate) struct BlockReader<'a> {
    reader: Reader<&'a [u8]>,
    block_tag: String,
    open: Vec<String>,
    done: bool,
}

impl<'a> BlockReader<'a> {
    /// Open a block, reading its start tag.
    pub(crate) fn new(block: &'a str) -> Result<(Self, BlockHeader)> {
        let mut reader = new_reader(block);
        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let tag = tag_name(&e)?;
                    let header = Self::header(&tag, &e)?;
                    return Ok((Self::with_state(reader, tag), header));
                }
                Event::Empty(e) => {
                    let tag = tag_name(&e)?;
                    let header = Self::header(&tag, &e)?;
                    let mut block = Self::with_state(reader, tag);
                    block.finish()?;
                    return Ok((block, header));
                }
                Event::Text(e) if is_blank(&e) => {}
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => return Err(Error::Parse("missing paragraph element".to_string())),
                _ => return Err(Error::Parse("expected a paragraph element".to_string())),
            }
        }
    }

    fn header(tag: &str, e: &BytesStart) -> Result<BlockHeader> {
        match known_kind(tag)? {
            TagKind::Block => parse_block_header(tag, e),
            _ => Err(Error::Parse(format!("expected <p>, found <{}>", tag))),
        }
    }

    fn with_state(reader: Reader<&'a [u8]>, block_tag: String) -> Self {
        Self {
            reader,
            block_tag,
            open: Vec::new(),
            done: false,
        }
    }

    /// Next content token, or `None` once the block's closing tag is read.
    pub(crate) fn next_token(&mut self) -> Result<Option<Token>> {
        if self.done {
            return Ok(None);
        }
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => {
                    let tag = tag_name(&e)?;
                    let kind = known_kind(&tag)?;
                    let style = inline_style(&tag, kind, &e)?;
                    self.open.push(tag);
                    return Ok(Some(Token::Open(style)));
                }
                Event::Empty(e) => {
                    let tag = tag_name(&e)?;
                    match known_kind(&tag)? {
                        TagKind::Metadata(kind) => {
                            return Ok(Some(Token::Anchor(parse_annotation(&tag, kind, &e)?)));
                        }
                        // Empty formatting tags carry no text; validate and drop.
                        kind => {
                            inline_style(&tag, kind, &e)?;
                        }
                    }
                }
                Event::End(_) => {
                    if self.open.pop().is_some() {
                        return Ok(Some(Token::Close));
                    }
                    self.finish()?;
                    return Ok(None);
                }
                Event::Text(e) => {
                    let text = e.unescape()?;
                    if !text.is_empty() {
                        return Ok(Some(Token::Text(text.into_owned())));
                    }
                }
                Event::CData(e) => {
                    let text = String::from_utf8(e.into_inner().into_owned())
                        .map_err(|_| Error::Parse("CDATA is not valid UTF-8".to_string()))?;
                    if !text.is_empty() {
                        return Ok(Some(Token::Text(text)));
                    }
                }
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => {
                    let tag = self.open.last().unwrap_or(&self.block_tag);
                    return Err(Error::Parse(format!("unclosed tag <{}>", tag)));
                }
            }
        }
    }

    /// After the block closes only whitespace and comments may follow.
    fn finish(&mut self) -> Result<()> {
        self.done = true;
        loop {
            match self.reader.read_event()? {
                Event::Eof => return Ok(()),
                Event::Text(e) if is_blank(&e) => {}
                Event::Comment(_) | Event::PI(_) => {}
                _ => {
                    return Err(Error::Parse(format!(
                        "content after </{}>",
                        self.block_tag
                    )))
                }
            }
        }
    }
}
