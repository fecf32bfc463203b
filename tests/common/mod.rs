//! A small stand-in engine for integration tests.
//!
//! Source documents are `<records>` with one `<r field="value" …/>` element
//! per item. Stylesheets are `<sheet>` documents whose children drive the
//! run:
//!
//! - `<import href=…/>` loads another sheet (fatal if it cannot be loaded)
//! - `<document href=…/>` loads more records (skipped if it cannot be loaded)
//! - `<sort select=… data-type=… order=… lang=… case-order=…/>`
//! - `<emit field=…/>` adds a column to each output line
//! - `<head><meta …/></head>` makes the result an HTML tree with a head
//!
//! `<sheet method=… encoding=… html-document="true">` sets the output
//! properties. Each top-level parameter is appended as a `name=expr` line.

#![allow(dead_code)]

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;
use xslbridge::traits::{
    DocumentParser, Engine, EngineError, EvalContext, ExpressionEvaluator, HeadElement, LoadKind,
    MetaAttributes, ResultTree, SortSpecification, TransformHooks, TransformRequest, Value,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

fn attributes(element: &BytesStart<'_>) -> Result<Vec<(String, String)>, EngineError> {
    element
        .attributes()
        .map(|attr| {
            let attr = attr.map_err(|e| EngineError::Parse(e.to_string()))?;
            Ok((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            ))
        })
        .collect()
}

/// Visits every start or empty element of a well-formed document.
fn for_each_element(
    xml: &[u8],
    mut visit: impl FnMut(&str, Vec<(String, String)>, bool) -> Result<(), EngineError>,
) -> Result<(), EngineError> {
    let mut reader = Reader::from_reader(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => return Ok(()),
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                visit(&name, attributes(&e)?, false)?;
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                visit(&name, attributes(&e)?, true)?;
            }
            Ok(_) => {}
            Err(e) => return Err(EngineError::Parse(e.to_string())),
        }
    }
}

pub fn parse_records(xml: &[u8]) -> Result<Vec<Record>, EngineError> {
    let mut records = Vec::new();
    for_each_element(xml, |name, fields, _| {
        if name == "r" {
            records.push(Record { fields });
        }
        Ok(())
    })?;
    Ok(records)
}

/// Evaluates field names, `position()` and `last()`. Expressions starting
/// with `error` fail.
#[derive(Debug, Default)]
pub struct FieldEvaluator {
    evaluations: Arc<AtomicUsize>,
}

impl ExpressionEvaluator for FieldEvaluator {
    type Item = Record;
    type Expr = String;

    fn evaluate(&self, expr: &String, context: EvalContext<'_, Record>) -> Result<Value, EngineError> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        match expr.as_str() {
            "position()" => Ok(Value::Number(context.position as f64)),
            "last()" => Ok(Value::Number(context.size as f64)),
            e if e.starts_with("error") => Err(EngineError::Evaluation(format!("cannot evaluate {}", e))),
            field => Ok(Value::Nodes(
                context.item.get(field).map(str::to_string).into_iter().collect(),
            )),
        }
    }
}

/// Accepts any well-formed UTF-8 XML document.
#[derive(Debug, Default)]
pub struct XmlParser;

impl DocumentParser for XmlParser {
    type Document = String;

    fn parse_document(&self, bytes: &[u8], uri: &str) -> Result<String, EngineError> {
        let text = std::str::from_utf8(bytes).map_err(|e| EngineError::Parse(format!("{}: {}", uri, e)))?;
        for_each_element(bytes, |_, _, _| Ok(()))
            .map_err(|e| EngineError::Parse(format!("{}: {}", uri, e)))?;
        Ok(text.to_string())
    }
}

#[derive(Debug, Default, Clone)]
struct Sheet {
    method: Option<String>,
    encoding: Option<String>,
    html_document: bool,
    imports: Vec<String>,
    documents: Vec<String>,
    sorts: Vec<SortSpecification<String>>,
    emit: Vec<String>,
    head: Option<Vec<MetaAttributes>>,
}

fn parse_sheet(xml: &[u8]) -> Result<Sheet, EngineError> {
    let mut sheet = Sheet::default();
    for_each_element(xml, |name, attrs, _| {
        let map: HashMap<&str, &str> = attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        match name {
            "sheet" => {
                sheet.method = map.get("method").map(|s| s.to_string());
                sheet.encoding = map.get("encoding").map(|s| s.to_string());
                sheet.html_document = map.get("html-document") == Some(&"true");
            }
            "import" => sheet.imports.extend(map.get("href").map(|s| s.to_string())),
            "document" => sheet.documents.extend(map.get("href").map(|s| s.to_string())),
            "sort" => sheet.sorts.push(SortSpecification::from_attributes(
                map.get("select").unwrap_or(&".").to_string(),
                map.get("data-type").copied(),
                map.get("order").copied(),
                map.get("lang").copied(),
                map.get("case-order").copied(),
            )),
            "emit" => sheet.emit.extend(map.get("field").map(|s| s.to_string())),
            "head" => sheet.head = Some(Vec::new()),
            "meta" => {
                if let Some(head) = sheet.head.as_mut() {
                    head.push(MetaAttributes {
                        charset: map.get("charset").map(|s| s.to_string()),
                        http_equiv: map.get("http-equiv").map(|s| s.to_string()),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    })?;
    Ok(sheet)
}

fn resolve_uri(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

#[derive(Debug, Default)]
pub struct FakeHead {
    /// `(attributes, content)` of each `<meta>` child.
    metas: Vec<(MetaAttributes, Option<String>)>,
}

impl HeadElement for FakeHead {
    fn metas(&self) -> Vec<MetaAttributes> {
        self.metas.iter().map(|(attrs, _)| attrs.clone()).collect()
    }

    fn prepend_meta(&mut self, http_equiv: &str, content: &str) {
        let attrs = MetaAttributes {
            charset: None,
            http_equiv: Some(http_equiv.to_string()),
        };
        self.metas.insert(0, (attrs, Some(content.to_string())));
    }
}

#[derive(Debug)]
pub struct FakeResult {
    method: Option<String>,
    encoding: Option<String>,
    html_document: bool,
    head: Option<FakeHead>,
    body: String,
}

impl ResultTree for FakeResult {
    fn output_method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    fn output_encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    fn is_html_document(&self) -> bool {
        self.html_document
    }

    fn html_head(&mut self) -> Option<&mut dyn HeadElement> {
        self.head.as_mut().map(|head| head as &mut dyn HeadElement)
    }

    fn serialize(&self) -> Result<Vec<u8>, EngineError> {
        let Some(head) = &self.head else {
            return Ok(self.body.clone().into_bytes());
        };
        let mut out = String::from("<html><head>");
        for (attrs, content) in &head.metas {
            out.push_str("<meta");
            if let Some(charset) = &attrs.charset {
                out.push_str(&format!(" charset=\"{}\"", charset));
            }
            if let Some(equiv) = &attrs.http_equiv {
                out.push_str(&format!(" http-equiv=\"{}\"", equiv));
            }
            if let Some(content) = content {
                out.push_str(&format!(" content=\"{}\"", content));
            }
            out.push('>');
        }
        out.push_str("</head><body>");
        out.push_str(&self.body);
        out.push_str("</body></html>");
        Ok(out.into_bytes())
    }
}

#[derive(Debug, Default)]
pub struct RecordEngine {
    evaluator: FieldEvaluator,
    parser: XmlParser,
}

impl RecordEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts every expression evaluation into `counter`.
    pub fn with_counter(counter: Arc<AtomicUsize>) -> Self {
        Self {
            evaluator: FieldEvaluator { evaluations: counter },
            parser: XmlParser,
        }
    }

    fn load_imports(
        parser: &XmlParser,
        sheet: &mut Sheet,
        base_uri: &str,
        hooks: &mut dyn TransformHooks<FieldEvaluator, XmlParser>,
        depth: usize,
    ) -> Result<(), EngineError> {
        if depth > 8 {
            return Err(EngineError::Transform("imports nested too deeply".to_string()));
        }
        for href in std::mem::take(&mut sheet.imports) {
            let uri = resolve_uri(base_uri, &href);
            let text = hooks
                .load_document(parser, &uri, LoadKind::Stylesheet)
                .ok_or_else(|| EngineError::Transform(format!("failed to load import {}", uri)))?;
            let mut imported = parse_sheet(text.as_bytes())?;
            Self::load_imports(parser, &mut imported, &uri, hooks, depth + 1)?;
            sheet.sorts.extend(imported.sorts);
            sheet.emit.extend(imported.emit);
            sheet.documents.extend(imported.documents);
        }
        Ok(())
    }
}

impl Engine for RecordEngine {
    type Evaluator = FieldEvaluator;
    type Parser = XmlParser;
    type Output = FakeResult;

    fn transform(
        &mut self,
        request: &TransformRequest<'_>,
        hooks: &mut dyn TransformHooks<FieldEvaluator, XmlParser>,
    ) -> Result<FakeResult, EngineError> {
        let mut sheet = parse_sheet(request.stylesheet)?;
        Self::load_imports(&self.parser, &mut sheet, request.base_uri, hooks, 0)?;

        let mut records = parse_records(request.source)?;
        for href in &sheet.documents {
            let uri = resolve_uri(request.base_uri, href);
            // An unresolvable document() is an empty node-set.
            if let Some(text) = hooks.load_document(&self.parser, &uri, LoadKind::Document) {
                records.extend(parse_records(text.as_bytes())?);
            }
        }

        if !sheet.sorts.is_empty() {
            hooks.sort(&self.evaluator, &mut records, &sheet.sorts);
        }

        let mut lines: Vec<String> = records
            .iter()
            .map(|record| {
                sheet
                    .emit
                    .iter()
                    .map(|field| record.get(field).unwrap_or(""))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect();
        lines.extend(request.params.iter().map(|(name, expr)| format!("{}={}", name, expr)));

        Ok(FakeResult {
            method: sheet.method,
            encoding: sheet.encoding,
            html_document: sheet.html_document,
            head: sheet.head.map(|metas| FakeHead {
                metas: metas.into_iter().map(|m| (m, None)).collect(),
            }),
            body: lines.join("\n"),
        })
    }
}

/// `<records>` with one `<r/>` per entry of `fields`.
pub fn records(rows: &[&[(&str, &str)]]) -> Vec<u8> {
    let mut xml = String::from("<records>");
    for row in rows {
        xml.push_str("<r");
        for (name, value) in row.iter() {
            xml.push_str(&format!(" {}=\"{}\"", name, value));
        }
        xml.push_str("/>");
    }
    xml.push_str("</records>");
    xml.into_bytes()
}
