//! Streaming SVG optimizer built on quick-xml.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::error::{Result, SpriteError};

use super::shapes::{geometry_attrs, shape_to_path_data};
use super::{Optimizer, OptimizerConfig};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Elements whose text is rendered or read out, kept byte for byte.
const TEXT_CONTENT: [&[u8]; 5] = [b"text", b"tspan", b"textPath", b"title", b"desc"];

/// The built-in optimizer.
///
/// Streams the document once, dropping and rewriting events according to
/// its [`OptimizerConfig`].
#[derive(Debug, Clone, Default)]
pub struct SvgOptimizer {
    config: OptimizerConfig,
}

impl SvgOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Rewrite a start tag. Returns the element to emit and its name.
    fn rewrite_start(
        &self,
        e: &BytesStart,
        is_root: bool,
    ) -> std::result::Result<(BytesStart<'static>, String), String> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

        let mut attrs: Vec<Attribute> = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| err.to_string())?;
            attrs.push(attr);
        }

        if self.config.remove_ids {
            attrs.retain(|a| a.key.as_ref() != b"id");
        }

        if is_root {
            attrs.retain(|a| {
                !self
                    .config
                    .remove_attrs
                    .iter()
                    .any(|name| a.key.as_ref() == name.as_bytes())
            });
        }

        if self.config.convert_shapes {
            if let Some((d, consumed)) = convert_shape(&local, &attrs) {
                attrs.retain(|a| !consumed.iter().any(|c| a.key.as_ref() == c.as_bytes()));
                let mut path = BytesStart::new("path");
                path.push_attribute(("d", d.as_str()));
                for attr in &attrs {
                    path.push_attribute(attr.clone());
                }
                return Ok((path.into_owned(), "path".to_string()));
            }
        }

        let mut start = BytesStart::new(name.clone());
        if is_root
            && self.config.add_xmlns
            && !attrs.iter().any(|a| a.key.as_ref() == b"xmlns")
        {
            start.push_attribute(("xmlns", SVG_NAMESPACE));
        }
        for attr in attrs {
            start.push_attribute(attr);
        }

        Ok((start.into_owned(), name))
    }

    fn run(&self, source: &str) -> std::result::Result<String, String> {
        let mut reader = Reader::from_str(source);

        let mut writer = Writer::new(Vec::new());
        // Output name of each open element, and whether it holds text content.
        let mut open: Vec<(String, bool)> = Vec::new();
        let mut in_text = 0usize;
        let mut skip_depth = 0usize;
        let mut seen_root = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| format!("{} at byte {}", e, reader.buffer_position()))?;

            if skip_depth > 0 {
                match event {
                    Event::Start(_) => skip_depth += 1,
                    Event::End(_) => skip_depth -= 1,
                    Event::Eof => return Err("unexpected end of document".to_string()),
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(e) => {
                    let is_root = check_root(&e, &mut seen_root, open.is_empty())?;
                    if self.config.remove_style_elements && e.local_name().as_ref() == b"style" {
                        skip_depth = 1;
                        continue;
                    }
                    let holds_text = TEXT_CONTENT.contains(&e.local_name().as_ref());
                    let (start, name) = self.rewrite_start(&e, is_root)?;
                    emit(&mut writer, Event::Start(start))?;
                    if holds_text {
                        in_text += 1;
                    }
                    open.push((name, holds_text));
                }
                Event::Empty(e) => {
                    let is_root = check_root(&e, &mut seen_root, open.is_empty())?;
                    if self.config.remove_style_elements && e.local_name().as_ref() == b"style" {
                        continue;
                    }
                    let (start, _) = self.rewrite_start(&e, is_root)?;
                    emit(&mut writer, Event::Empty(start))?;
                }
                Event::End(_) => {
                    let (name, holds_text) = open
                        .pop()
                        .ok_or_else(|| "unmatched closing tag".to_string())?;
                    if holds_text {
                        in_text -= 1;
                    }
                    emit(&mut writer, Event::End(BytesEnd::new(name)))?;
                }
                Event::Text(t)
                    if self.config.compact
                        && in_text == 0
                        && t.iter().all(u8::is_ascii_whitespace) => {}
                Event::Decl(_) if self.config.remove_xml_decl => {}
                Event::PI(_) if self.config.remove_processing_instructions => {}
                Event::Comment(_) if self.config.remove_comments => {}
                Event::DocType(_) if self.config.remove_doctype => {}
                Event::Eof => break,
                other => emit(&mut writer, other)?,
            }
        }

        if !open.is_empty() {
            let names: Vec<&str> = open.iter().map(|(name, _)| name.as_str()).collect();
            return Err(format!("unclosed <{}> element", names.join("> <")));
        }
        if !seen_root {
            return Err("no <svg> root element".to_string());
        }

        String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
    }
}

impl Optimizer for SvgOptimizer {
    fn optimize(&self, source: &str, path: &Path) -> Result<String> {
        self.run(source).map_err(|message| SpriteError::Optimize {
            path: path.to_path_buf(),
            message,
        })
    }
}

/// Track the root element. Returns whether `e` is the root.
fn check_root(
    e: &BytesStart,
    seen_root: &mut bool,
    at_top: bool,
) -> std::result::Result<bool, String> {
    if !at_top || *seen_root {
        return Ok(false);
    }
    if e.local_name().as_ref() != b"svg" {
        return Err(format!(
            "root element is <{}>, expected <svg>",
            String::from_utf8_lossy(e.name().as_ref())
        ));
    }
    *seen_root = true;
    Ok(true)
}

fn convert_shape(local: &str, attrs: &[Attribute]) -> Option<(String, &'static [&'static str])> {
    let consumed = geometry_attrs(local);
    if consumed.is_empty() {
        return None;
    }

    let values: Vec<(String, String)> = attrs
        .iter()
        .map(|a| {
            (
                String::from_utf8_lossy(a.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&a.value).into_owned(),
            )
        })
        .collect();
    let map: HashMap<&str, &str> = values
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    shape_to_path_data(local, &map).map(|d| (d, consumed))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event) -> std::result::Result<(), String> {
    writer.write_event(event).map_err(|e| e.to_string())
}
