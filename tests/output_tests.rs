mod common;

use common::{RecordEngine, TestResult, init_logger, records};
use xslbridge::fetch::InMemoryFetcher;
use xslbridge::{MediaType, TransformDriver, TransformOutput};

fn transform(sheet: &str) -> Result<TransformOutput, Box<dyn std::error::Error>> {
    init_logger();
    let driver = TransformDriver::new(RecordEngine::new(), InMemoryFetcher::new());
    let source = records(&[&[("name", "a")]]);
    Ok(driver.transform(&source, sheet.as_bytes(), "about:blank", &[])?)
}

#[test]
fn test_media_types() -> TestResult {
    assert_eq!(transform(r#"<sheet method="html"/>"#)?.media_type, MediaType::Html);
    assert_eq!(transform(r#"<sheet method="text"/>"#)?.media_type, MediaType::Text);
    assert_eq!(transform(r#"<sheet method="xml"/>"#)?.media_type, MediaType::Xml);
    assert_eq!(transform("<sheet/>")?.media_type, MediaType::Xml);
    assert_eq!(
        transform(r#"<sheet html-document="true"/>"#)?.media_type,
        MediaType::Html
    );
    Ok(())
}

#[test]
fn test_html_head_gets_content_type_meta() -> TestResult {
    let output = transform(r#"<sheet method="html"><head/><emit field="name"/></sheet>"#)?;
    assert_eq!(
        output.into_string()?,
        r#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=UTF-8"></head><body>a</body></html>"#
    );
    Ok(())
}

#[test]
fn test_declared_encoding_is_used() -> TestResult {
    let output = transform(r#"<sheet html-document="true" encoding="windows-1252"><head/></sheet>"#)?;
    assert!(output.into_string()?.contains("charset=windows-1252"));
    Ok(())
}

#[test]
fn test_existing_charset_meta_is_left_alone() -> TestResult {
    let output = transform(r#"<sheet method="html"><head><meta charset="UTF-8"/></head></sheet>"#)?;
    assert_eq!(
        output.into_string()?,
        r#"<html><head><meta charset="UTF-8"></head><body></body></html>"#
    );
    Ok(())
}

#[test]
fn test_existing_http_equiv_is_matched_case_insensitively() -> TestResult {
    let output = transform(r#"<sheet method="html"><head><meta http-equiv="CONTENT-TYPE"/></head></sheet>"#)?;
    assert!(!output.into_string()?.contains("charset="));
    Ok(())
}

#[test]
fn test_xml_output_with_head_is_untouched() -> TestResult {
    let output = transform(r#"<sheet method="xml"><head/></sheet>"#)?;
    assert_eq!(output.into_string()?, "<html><head></head><body></body></html>");
    Ok(())
}

#[test]
fn test_empty_result_is_success() -> TestResult {
    let output = transform(r#"<sheet method="text"/>"#)?;
    assert!(output.is_empty());
    assert_eq!(output.into_string()?, "");
    Ok(())
}
