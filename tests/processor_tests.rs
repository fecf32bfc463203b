mod common;

use common::{RecordEngine, TestResult, init_logger, records};
use xslbridge::fetch::InMemoryFetcher;
use xslbridge::{Processor, TransformDriver, TransformError};

const SHEET: &str = r#"<sheet method="text"><sort select="name"/><emit field="name"/></sheet>"#;

fn processor() -> Processor<RecordEngine, InMemoryFetcher> {
    init_logger();
    Processor::new(TransformDriver::new(RecordEngine::new(), InMemoryFetcher::new()))
}

fn source() -> Vec<u8> {
    records(&[&[("name", "b")], &[("name", "a")]])
}

#[test]
fn test_transform_without_stylesheet_fails() {
    let processor = processor();
    let result = processor.transform_to_text(&source());
    assert!(matches!(result, Err(TransformError::StylesheetNotImported)));
}

#[test]
fn test_transform_to_text() -> TestResult {
    let mut processor = processor();
    processor.import_stylesheet(SHEET.as_bytes())?;
    assert_eq!(processor.transform_to_text(&source())?, "a\nb");
    // A processor can be reused.
    assert_eq!(processor.transform_to_text(&records(&[&[("name", "z")]]))?, "z");
    Ok(())
}

#[test]
fn test_parameters_are_passed_as_string_literals() -> TestResult {
    let mut processor = processor();
    processor.import_stylesheet(SHEET.as_bytes())?;
    processor.set_parameter(None, "title", "Report");
    processor.set_parameter(Some("urn:ignored"), "owner", "O'Brien");
    processor.set_parameter(None, "quote", r#"say "it's""#);

    assert_eq!(
        processor.transform_to_text(&source())?,
        "a\nb\ntitle='Report'\nowner=\"O'Brien\"\nquote=concat('say \"it', \"'\", 's\"')"
    );
    Ok(())
}

#[test]
fn test_parameter_bookkeeping() -> TestResult {
    let mut processor = processor();
    processor.set_parameter(None, "a", "1");
    processor.set_parameter(None, "b", "2");
    processor.set_parameter(None, "a", "3");
    assert_eq!(processor.get_parameter(None, "a"), Some("3"));
    assert_eq!(processor.get_parameter(Some("urn:x"), "b"), Some("2"));

    processor.import_stylesheet(SHEET.as_bytes())?;
    // Replacing a value keeps its original position.
    assert_eq!(processor.transform_to_text(&records(&[]))?, "a='3'\nb='2'");

    processor.remove_parameter(None, "a");
    assert_eq!(processor.get_parameter(None, "a"), None);
    processor.clear_parameters();
    assert_eq!(processor.get_parameter(None, "b"), None);
    Ok(())
}

#[test]
fn test_reset_forgets_everything() -> TestResult {
    let mut processor = processor();
    processor.import_stylesheet(SHEET.as_bytes())?;
    processor.set_parameter(None, "a", "1");
    processor.reset();
    assert!(!processor.has_stylesheet());
    assert_eq!(processor.get_parameter(None, "a"), None);
    assert!(matches!(
        processor.transform_to_output(&source()),
        Err(TransformError::StylesheetNotImported)
    ));
    Ok(())
}

#[test]
fn test_malformed_inputs_are_rejected() -> TestResult {
    let mut processor = processor();
    assert!(matches!(
        processor.import_stylesheet(b"<sheet><emit></sheet>"),
        Err(TransformError::StylesheetParse(_))
    ));
    assert!(!processor.has_stylesheet());

    processor.import_stylesheet(SHEET.as_bytes())?;
    assert!(matches!(
        processor.transform_to_text(b"<records><r></records>"),
        Err(TransformError::SourceParse(_))
    ));
    Ok(())
}

#[test]
fn test_incomplete_documents_are_rejected() -> TestResult {
    let mut processor = processor();
    for stylesheet in [&b"<sheet><emit/>"[..], b"", b"text only", b"<sheet/><sheet/>"] {
        assert!(matches!(
            processor.import_stylesheet(stylesheet),
            Err(TransformError::StylesheetParse(_))
        ));
    }
    assert!(!processor.has_stylesheet());

    processor.import_stylesheet(SHEET.as_bytes())?;
    for source in [&b"<records><r/>"[..], b"", b"<records/><records/>"] {
        assert!(matches!(
            processor.transform_to_text(source),
            Err(TransformError::SourceParse(_))
        ));
    }
    Ok(())
}

#[test]
fn test_imports_resolve_against_stylesheet_base() -> TestResult {
    init_logger();
    let fetcher = InMemoryFetcher::new();
    fetcher.add("https://example.com/common.xsl", r#"<sheet><sort select="name"/></sheet>"#)?;
    let mut processor = Processor::new(TransformDriver::new(RecordEngine::new(), fetcher));

    processor.import_stylesheet_with_base(
        br#"<sheet method="text"><import href="common.xsl"/><emit field="name"/></sheet>"#,
        "https://example.com/main.xsl",
    )?;
    assert_eq!(processor.transform_to_text(&source())?, "a\nb");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_async_transform() -> TestResult {
    let mut processor = processor();
    processor.import_stylesheet(SHEET.as_bytes())?;
    processor.set_parameter(None, "n", "1");
    let output = processor.transform_to_output_async(&source()).await?;
    assert_eq!(output.into_string()?, "a\nb\nn='1'");
    Ok(())
}
