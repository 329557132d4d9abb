//! End-to-end tests against a real pandoc binary.
//!
//! Each test probes `pandoc --version` first and prints a SKIP line when it
//! is not installed, so the suite stays green on machines without pandoc.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture
//!
//! Point at a specific binary with `PANDOC_GATEWAY_PANDOC=/path/to/pandoc`.

use pandoc_gateway::{
    ConvertedDocument, Engine, FormFields, Gateway, GatewayConfig, PandocEngine, UploadedFile,
};
use std::time::Duration;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn pandoc_path() -> String {
    std::env::var("PANDOC_GATEWAY_PANDOC").unwrap_or_else(|_| "pandoc".to_string())
}

/// Skip this test if pandoc cannot be run.
macro_rules! e2e_skip_unless_pandoc {
    () => {{
        let engine = PandocEngine::new(pandoc_path(), Duration::from_secs(10), true);
        if !engine.is_available().await {
            println!("SKIP: pandoc not found at '{}'", pandoc_path());
            return;
        }
    }};
}

fn gateway(scratch: &TempDir) -> Gateway {
    let config = GatewayConfig::builder()
        .pandoc_path(pandoc_path())
        .scratch_dir(scratch.path())
        .engine_timeout_secs(60)
        .build()
        .unwrap();
    Gateway::new(config).unwrap()
}

fn upload(markdown: &str, output: &str) -> FormFields {
    let mut fields = FormFields::new();
    fields.insert_file(
        "in_file",
        UploadedFile::new(Some("sample.md".into()), markdown.to_string()),
    );
    fields.insert_text("output", output);
    fields
}

fn read_and_release(doc: ConvertedDocument) -> Vec<u8> {
    let bytes = std::fs::read(doc.artifact.path()).unwrap();
    doc.artifact.release();
    bytes
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_markdown_to_html() {
    e2e_skip_unless_pandoc!();
    let scratch = TempDir::new().unwrap();
    let gw = gateway(&scratch);

    let doc = gw
        .convert(upload("# Title\n\nBody text.\n", "html"))
        .await
        .unwrap();
    assert_eq!(doc.download_name, "sample.html");
    let html = String::from_utf8(read_and_release(doc)).unwrap();
    assert!(html.contains("<h1"), "got: {html}");
    assert!(html.contains("Title"), "got: {html}");
    assert!(std::fs::read_dir(scratch.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_standalone_html_has_document_shell() {
    e2e_skip_unless_pandoc!();
    let scratch = TempDir::new().unwrap();
    let gw = gateway(&scratch);

    let mut fields = upload("% Doc\n\nHello.\n", "html");
    fields.insert_text("standalone", "True");
    let html = String::from_utf8(read_and_release(gw.convert(fields).await.unwrap())).unwrap();
    assert!(html.contains("<html"), "got: {html}");
    assert!(html.contains("</html>"), "got: {html}");
}

#[tokio::test]
async fn test_markdown_to_tex_and_docx() {
    e2e_skip_unless_pandoc!();
    let scratch = TempDir::new().unwrap();
    let gw = gateway(&scratch);

    let tex = read_and_release(gw.convert(upload("*emph*\n", "tex")).await.unwrap());
    assert!(String::from_utf8(tex).unwrap().contains("\\emph{emph}"));

    let docx = read_and_release(gw.convert(upload("# Word\n", "docx")).await.unwrap());
    // A .docx is a zip archive.
    assert_eq!(&docx[..2], b"PK");
}

#[tokio::test]
async fn test_uploaded_bibliography_with_citeproc() {
    e2e_skip_unless_pandoc!();
    let scratch = TempDir::new().unwrap();
    let gw = gateway(&scratch);

    let mut fields = upload("As shown by @knuth84.\n", "html");
    fields.insert_text("citeproc", "on");
    fields.insert_file(
        "bib_file",
        UploadedFile::new(
            Some("refs.bib".into()),
            "@book{knuth84, author={Donald Knuth}, title={The TeXbook}, year={1984}}",
        ),
    );
    let html = String::from_utf8(read_and_release(gw.convert(fields).await.unwrap())).unwrap();
    assert!(html.contains("Knuth"), "got: {html}");
    assert!(std::fs::read_dir(scratch.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_missing_server_bibliography_fails_cleanly() {
    e2e_skip_unless_pandoc!();
    let scratch = TempDir::new().unwrap();
    let gw = gateway(&scratch);

    let mut fields = upload("Text [@x].\n", "html");
    fields.insert_text("citeproc", "on");
    fields.insert_text("bib_path", "/definitely/not/here.bib");
    let err = gw.convert(fields).await.unwrap_err();
    assert_eq!(err.kind(), pandoc_gateway::ErrorKind::ConversionFailed);
    assert!(std::fs::read_dir(scratch.path()).unwrap().next().is_none());
}
