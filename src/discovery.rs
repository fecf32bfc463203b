//! Finding and applying the stylesheet an XML document asks for through
//! its `<?xml-stylesheet?>` processing instruction.

use crate::driver::{TransformDriver, TransformOutput};
use crate::error::TransformError;
use log::{debug, info};
use quick_xml::Reader;
use quick_xml::events::Event;
use url::Url;
use xslbridge_traits::{Engine, FetchError, Fetcher, SecurityPolicy};

const XSLT_TYPES: [&str; 2] = ["text/xsl", "application/xslt+xml"];

/// Reads `xml` to the end, failing on the first well-formedness error.
///
/// Requires exactly one document element with only whitespace, comments and
/// processing instructions around it.
pub(crate) fn check_well_formed(xml: &[u8]) -> Result<(), String> {
    let mut reader = Reader::from_reader(xml);
    let mut depth = 0usize;
    let mut roots = 0usize;
    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("{} at byte {}", e, reader.error_position()))?;
        let position = reader.buffer_position();
        match event {
            Event::Start(_) | Event::Empty(_) if depth == 0 => {
                roots += 1;
                if roots > 1 {
                    return Err(format!("second document element at byte {}", position));
                }
                if matches!(event, Event::Start(_)) {
                    depth = 1;
                }
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(text) if depth == 0 => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(format!("text outside the document element at byte {}", position));
                }
            }
            Event::CData(_) | Event::GeneralRef(_) if depth == 0 => {
                return Err(format!("content outside the document element at byte {}", position));
            }
            Event::Eof if depth > 0 => {
                return Err(format!("{} unclosed element(s) at end of input", depth));
            }
            Event::Eof if roots == 0 => return Err("no document element".to_string()),
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

/// Splits the content of a processing instruction into its pseudo-attributes.
/// Parsing stops at the first thing that is not `name="value"` or
/// `name='value'`.
fn pseudo_attributes(content: &str) -> Vec<(&str, &str)> {
    let mut attributes = Vec::new();
    let mut rest = content.trim_start();
    while !rest.is_empty() {
        let Some(eq) = rest.find('=') else { break };
        let name = rest[..eq].trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            break;
        }
        let after = rest[eq + 1..].trim_start();
        let Some(quote) = after.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            break;
        };
        let body = &after[1..];
        let Some(end) = body.find(quote) else { break };
        attributes.push((name, &body[..end]));
        rest = body[end + 1..].trim_start();
    }
    attributes
}

fn unescape_predefined(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Returns the `href` of the first top-level `xml-stylesheet` processing
/// instruction whose `type` is an XSLT media type.
///
/// # Errors
///
/// Returns `TransformError::SourceParse` if `xml` is not well-formed.
pub fn find_stylesheet_href(xml: &[u8]) -> Result<Option<String>, TransformError> {
    let mut reader = Reader::from_reader(xml);
    let mut depth = 0usize;
    let mut found = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            TransformError::SourceParse(format!("{} at byte {}", e, reader.error_position()))
        })?;
        match event {
            Event::Eof => break,
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::PI(pi) if depth == 0 && found.is_none() && pi.target() == b"xml-stylesheet" => {
                let Ok(content) = std::str::from_utf8(pi.content()) else {
                    continue;
                };
                let attributes = pseudo_attributes(content);
                let value_of = |name: &str| {
                    attributes
                        .iter()
                        .find(|(n, _)| *n == name)
                        .map(|(_, v)| *v)
                };
                let is_xslt = value_of("type").is_some_and(|t| {
                    XSLT_TYPES.iter().any(|x| t.eq_ignore_ascii_case(x))
                });
                if let (true, Some(href)) = (is_xslt, value_of("href"))
                    && !href.is_empty()
                {
                    found = Some(unescape_predefined(href));
                }
            }
            _ => {}
        }
    }
    Ok(found)
}

/// Transforms `xml` with the stylesheet its `xml-stylesheet` processing
/// instruction points at.
///
/// The href is resolved against `xml_url` and fetched through the driver's
/// fetcher; the stylesheet's own imports then resolve against its URL.
pub async fn load_with_stylesheet<E, F>(
    driver: &TransformDriver<E, F>,
    xml: &[u8],
    xml_url: &str,
) -> Result<TransformOutput, TransformError>
where
    E: Engine + Send + 'static,
    F: Fetcher + 'static,
{
    let xml_url = Url::parse(xml_url)?;
    let href = find_stylesheet_href(xml)?.ok_or(TransformError::NoStylesheet)?;
    let stylesheet_url = xml_url.join(&href)?;
    info!("Applying stylesheet {} to {}", stylesheet_url, xml_url);

    let stylesheet = fetch_checked(driver, stylesheet_url.as_str()).await?;
    debug!("Stylesheet {} is {} bytes", stylesheet_url, stylesheet.len());

    driver
        .transform_async(xml.to_vec(), stylesheet, stylesheet_url.into(), Vec::new())
        .await
}

/// Fetches the XML document at `url`, then applies its stylesheet.
pub async fn load_url_with_stylesheet<E, F>(
    driver: &TransformDriver<E, F>,
    url: &str,
) -> Result<TransformOutput, TransformError>
where
    E: Engine + Send + 'static,
    F: Fetcher + 'static,
{
    let url = Url::parse(url)?;
    let xml = fetch_checked(driver, url.as_str()).await?;
    load_with_stylesheet(driver, &xml, url.as_str()).await
}

async fn fetch_checked<E, F>(driver: &TransformDriver<E, F>, uri: &str) -> Result<Vec<u8>, TransformError>
where
    E: Engine + Send + 'static,
    F: Fetcher + 'static,
{
    let capability = SecurityPolicy::read_capability_for(uri);
    if !driver.config().security.allows(capability) {
        return Err(FetchError::Forbidden(uri.to_string()).into());
    }
    Ok(driver.fetcher().fetch(uri).await?)
}
