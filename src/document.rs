use crate::error::{RAGError, Result};
use sha2::Digest;
use std::{
    io,
    path::{Path, PathBuf},
    process::Command,
};

pub type DocumentID = [u8; 32];

/// Extensions whose files already are the text representation.
pub const PASSTHROUGH_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

const INPUT_PLACEHOLDER: &str = "{input}";

/// Page break emitted by PDF text extractors.
const FORM_FEED: char = '\x0c';

fn compute_document_id(path: &str, content: &str) -> DocumentID {
    let mut hash = sha2::Sha256::new();
    hash.update(path.as_bytes());
    hash.update(content.as_bytes());
    hash.finalize().into()
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentID,
    pub path: String,
    pub text: String, // markdown-like export of the source file
    pub ext: String,
}

/// Turns a source file into markdown-like text.
pub trait Converter {
    fn convert(&self, path: &Path) -> Result<String>;

    fn supports(&self, _ext: &str) -> bool {
        true
    }
}

/// Reads markdown and plain text files as they are.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughConverter;

impl Converter for PassthroughConverter {
    fn convert(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| RAGError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn supports(&self, ext: &str) -> bool {
        PASSTHROUGH_EXTENSIONS.contains(&ext)
    }
}

/// Runs an external program and takes its stdout as the converted text.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
    extensions: Vec<String>,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            extensions: vec!["pdf".to_string()],
        }
    }

    /// Parses a whitespace separated command line such as
    /// `pdftotext -layout {input} -`.
    pub fn from_command_line(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| RAGError::Config("converter command is empty".to_string()))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn build_args(&self, path: &Path) -> Vec<String> {
        let input = path.display().to_string();
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(INPUT_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(INPUT_PLACEHOLDER, &input)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(input);
        }
        args
    }
}

impl Converter for CommandConverter {
    fn convert(&self, path: &Path) -> Result<String> {
        let args = self.build_args(path);
        log::debug!("running converter: {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| RAGError::ConverterNotFound {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(RAGError::ConversionFailed {
                path: path.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = simdutf8::basic::from_utf8(&output.stdout).map_err(|e| {
            RAGError::InvalidUtf8 {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        Ok(text.to_string())
    }

    fn supports(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Loads one document and converts it to its text representation.
///
/// Markdown and plain text files bypass `converter`. Anything else must be
/// accepted by `converter`, otherwise the load fails with `UnsupportedFormat`.
pub fn load_document(path: &Path, converter: &impl Converter) -> Result<Document> {
    if !path.exists() {
        return Err(RAGError::FileRead {
            path: path.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::NotFound,
                format!("Document does not exist: {}", path.display()),
            ),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let passthrough = PassthroughConverter;
    let text = if passthrough.supports(&ext) {
        passthrough.convert(path)?
    } else if converter.supports(&ext) {
        outline_pages(converter.convert(path)?)
    } else {
        return Err(RAGError::UnsupportedFormat(PathBuf::from(path)));
    };

    if text.trim().is_empty() {
        return Err(RAGError::EmptyDocument(path.to_path_buf()));
    }

    let display = path.display().to_string();
    log::info!("loaded {} ({} bytes of text)", display, text.len());

    Ok(Document {
        id: compute_document_id(&display, &text),
        path: display,
        text,
        ext,
    })
}

/// Gives converter output without any markdown header one `# Page N` header
/// per form-feed separated page. Output that already has headers, or has no
/// page breaks, is returned unchanged.
pub fn outline_pages(text: String) -> String {
    if !text.contains(FORM_FEED) || text.lines().any(is_atx_header) {
        return text;
    }

    let mut out = String::with_capacity(text.len() + 64);
    for (i, page) in text.split(FORM_FEED).enumerate() {
        if page.trim().is_empty() {
            continue;
        }
        out.push_str(&format!("# Page {}\n", i + 1));
        out.push_str(page);
        if !page.ends_with('\n') {
            out.push('\n');
        }
    }
    log::debug!("converter output had no headers, outlined it by page");
    out
}

fn is_atx_header(line: &str) -> bool {
    let line = line.trim_start();
    let hashes = line.chars().take_while(|c| *c == '#').count();
    let rest = &line[hashes..];
    (1..=6).contains(&hashes) && (rest.is_empty() || rest.starts_with([' ', '\t']))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_replaced_by_path() {
        let conv = CommandConverter::from_command_line("pdftotext -layout {input} -").unwrap();
        let args = conv.build_args(Path::new("a/b.pdf"));
        assert_eq!(args, vec!["-layout", "a/b.pdf", "-"]);
    }

    #[test]
    fn path_is_appended_without_placeholder() {
        let conv = CommandConverter::from_command_line("cat").unwrap();
        let args = conv.build_args(Path::new("doc.pdf"));
        assert_eq!(args, vec!["doc.pdf"]);
    }

    #[test]
    fn empty_command_line_is_rejected() {
        assert!(matches!(
            CommandConverter::from_command_line("   "),
            Err(RAGError::Config(_))
        ));
    }

    #[test]
    fn extension_matching_ignores_case() {
        let conv = CommandConverter::new("x", vec![]).with_extensions(["pdf", "docx"]);
        assert!(conv.supports("PDF"));
        assert!(conv.supports("docx"));
        assert!(!conv.supports("png"));
    }

    #[test]
    fn pages_become_headers_when_none_exist() {
        let text = "first page\nmore\n\x0csecond page\n\x0c".to_string();
        assert_eq!(
            outline_pages(text),
            "# Page 1\nfirst page\nmore\n# Page 2\nsecond page\n"
        );
    }

    #[test]
    fn markdown_output_is_left_alone() {
        let text = "# Title\nbody\x0c## Next\nmore\n".to_string();
        assert_eq!(outline_pages(text.clone()), text);

        let single_page = "no breaks here\n".to_string();
        assert_eq!(outline_pages(single_page.clone()), single_page);
    }

    #[test]
    fn hashtags_do_not_count_as_headers() {
        assert!(!is_atx_header("#tag"));
        assert!(!is_atx_header("####### seven"));
        assert!(is_atx_header("  ## Two"));
        assert!(is_atx_header("#"));
    }
}
