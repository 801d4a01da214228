use crate::config::Config;
use crate::dom;
use crate::models::Notebook;
use crate::parser::{self, ParseError};
use crate::render::{RenderError, Template};
use std::fs::File;
use std::io::{BufWriter, Write};

/// A failure in one stage of the notebook → document pipeline. Every variant
/// is fatal; the binary exits with status 2.
#[derive(Debug)]
pub enum AppError {
    OpenNotebook(std::io::Error),
    ParseHtml(std::io::Error),
    ParseNotebook(ParseError),
    ParseTemplate(RenderError),
    CreateOutput(std::io::Error),
    Render(RenderError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::OpenNotebook(e) => write!(f, "open notebook: {}", e),
            AppError::ParseHtml(e) => write!(f, "parse HTML file: {}", e),
            AppError::ParseNotebook(e) => write!(f, "parse notebook: {}", e),
            AppError::ParseTemplate(e) => write!(f, "parse output template: {}", e),
            AppError::CreateOutput(e) => write!(f, "create output file: {}", e),
            AppError::Render(e) => write!(f, "render template: {}", e),
        }
    }
}

impl std::error::Error for AppError {}

pub fn run(config: &Config) -> Result<(), AppError> {
    let mut file = File::open(&config.notebook_path).map_err(AppError::OpenNotebook)?;

    log::info!("Parsing notebook '{}'", config.notebook_path.display());
    let html = dom::parse_html(&mut file).map_err(AppError::ParseHtml)?;

    log::info!("Extracting highlights and notes");
    let notebook = parser::parse_document(&html.document).map_err(AppError::ParseNotebook)?;
    log::info!(
        "Found {} sections, {} highlights, {} notes",
        notebook.sections.len(),
        notebook.highlight_count(),
        notebook.note_count()
    );
    log_outline(&notebook);

    // The output file is only created once the template is known to be valid
    let template = Template::from_file(&config.template_path).map_err(AppError::ParseTemplate)?;
    let out = File::create(&config.output_path).map_err(AppError::CreateOutput)?;

    log::info!("Writing formatted notebook to '{}'", config.output_path.display());
    let mut out = BufWriter::new(out);
    template
        .render_to(&notebook, &mut out)
        .map_err(AppError::Render)?;
    out.flush()
        .map_err(|e| AppError::Render(RenderError::Execute(e.to_string())))?;

    Ok(())
}

/// One record per outline line, so each line carries the log prefix.
fn log_outline(notebook: &Notebook) {
    for line in notebook.to_string().lines() {
        log::debug!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    const NOTEBOOK_HTML: &str = r#"<html><body><div class="bodyContainer">
<div class="bookTitle">My Book</div>
<div class="authors">J. Doe</div>
<div class="sectionHeading">Ch 1</div>
<div class="noteHeading">Highlight(<span class="highlight_yellow">yellow</span>) - Page 115 · Location 954</div>
<div class="noteText">First passage.</div>
<div class="noteHeading">Note - Page 115 · Location 954</div>
<div class="noteText">A thought.</div>
<div class="noteHeading">Highlight(<span class="highlight_blue">blue</span>) - Location 2364</div>
<div class="noteText">Second passage.</div>
</div></body></html>"#;

    const SIMPLE_TEMPLATE: &str =
        "{{ title }}|{{ author }}{% for s in sections %}|{{ s.title }}{% for h in s.highlights %}|{{ h.location }}:{{ h.text }}:{{ h.note }}{% endfor %}{% endfor %}";

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn make_config(dir: &TempDir, notebook: &str, template: &str) -> Config {
        Config {
            notebook_path: write_file(dir.path(), "notebook.html", notebook),
            output_path: dir.path().join("notes.html"),
            template_path: write_file(dir.path(), "output.tpl", template),
            verbose: false,
        }
    }

    #[test]
    fn test_run_writes_rendered_notebook() {
        let dir = TempDir::new().unwrap();
        let config = make_config(&dir, NOTEBOOK_HTML, SIMPLE_TEMPLATE);

        run(&config).unwrap();

        let out = std::fs::read_to_string(&config.output_path).unwrap();
        assert_eq!(
            out,
            "My Book|J. Doe|Ch 1|954:First passage.:A thought.|2364:Second passage.:"
        );
    }

    #[test]
    fn test_missing_notebook() {
        let dir = TempDir::new().unwrap();
        let mut config = make_config(&dir, NOTEBOOK_HTML, SIMPLE_TEMPLATE);
        config.notebook_path = dir.path().join("missing.html");

        let err = run(&config).unwrap_err();

        assert!(matches!(err, AppError::OpenNotebook(_)));
        assert!(err.to_string().starts_with("open notebook: "));
        assert!(!config.output_path.exists());
    }

    #[test]
    fn test_missing_body_container() {
        let dir = TempDir::new().unwrap();
        let config = make_config(&dir, "<html><body><p>nothing</p></body></html>", SIMPLE_TEMPLATE);

        let err = run(&config).unwrap_err();

        assert!(matches!(
            err,
            AppError::ParseNotebook(ParseError::NoBodyContainer)
        ));
        assert!(err.to_string().starts_with("parse notebook: "));
        assert!(!config.output_path.exists());
    }

    #[test]
    fn test_bad_template_creates_no_output() {
        let dir = TempDir::new().unwrap();
        let config = make_config(&dir, NOTEBOOK_HTML, "{% for s in sections %}");

        let err = run(&config).unwrap_err();

        assert!(matches!(err, AppError::ParseTemplate(_)));
        assert!(err.to_string().starts_with("parse output template: "));
        assert!(!config.output_path.exists());
    }

    #[test]
    fn test_missing_template_creates_no_output() {
        let dir = TempDir::new().unwrap();
        let mut config = make_config(&dir, NOTEBOOK_HTML, SIMPLE_TEMPLATE);
        config.template_path = dir.path().join("missing.tpl");

        let err = run(&config).unwrap_err();

        assert!(err.to_string().starts_with("parse output template: "));
        assert!(!config.output_path.exists());
    }

    #[test]
    fn test_output_in_missing_directory() {
        let dir = TempDir::new().unwrap();
        let mut config = make_config(&dir, NOTEBOOK_HTML, SIMPLE_TEMPLATE);
        config.output_path = dir.path().join("no/such/dir/notes.html");

        let err = run(&config).unwrap_err();

        assert!(matches!(err, AppError::CreateOutput(_)));
        assert!(err.to_string().starts_with("create output file: "));
    }

    #[test]
    fn test_template_failing_at_render() {
        let dir = TempDir::new().unwrap();
        let config = make_config(&dir, NOTEBOOK_HTML, "{{ no_such_function() }}");

        let err = run(&config).unwrap_err();

        assert!(matches!(err, AppError::Render(_)));
        assert!(err.to_string().starts_with("render template: "));
    }

    struct CaptureLogger {
        records: Mutex<Vec<String>>,
    }

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            self.records.lock().unwrap().push(record.args().to_string());
        }

        fn flush(&self) {}
    }

    static CAPTURE: CaptureLogger = CaptureLogger {
        records: Mutex::new(Vec::new()),
    };

    #[test]
    fn test_outline_logged_line_by_line() {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(log::LevelFilter::Debug);
        let notebook = parser::parse_notebook(NOTEBOOK_HTML).unwrap();

        log_outline(&notebook);

        let records = CAPTURE.records.lock().unwrap();
        assert!(records.iter().all(|r| !r.contains('\n')));
        assert!(records.iter().any(|r| r == "'My Book' by J. Doe"));
        assert!(records.iter().any(|r| r == "Section 01: Ch 1"));
        assert!(records.iter().any(|r| r == "\tNote: A thought."));
    }
}
