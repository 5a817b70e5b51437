use sha2::Digest;

use crate::document::{Document, DocumentID};

pub type SegmentID = [u8; 32];

fn compute_segment_id(doc_id: &DocumentID, index: usize, text: &str) -> SegmentID {
    let mut hash = sha2::Sha256::new();
    hash.update(doc_id);
    hash.update((index as u64).to_le_bytes());
    hash.update(text.as_bytes());
    hash.finalize().into()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub level: usize,  // number of marker characters, `##` is 2
    pub name: String,  // metadata label, e.g. "Header 2"
    pub title: String, // heading text without the marker
}

#[derive(Debug, Clone)]
pub struct Segment {
    pub id: SegmentID,
    pub doc_id: DocumentID,
    pub index: usize,
    pub text: String,         // exact slice of the document text, headers kept inline
    pub headers: Vec<Header>, // enclosing headers, outermost first
    pub start: usize,
    pub end: usize,
}

impl Segment {
    /// Text handed to the embedder and to the prompt.
    pub fn content(&self) -> &str {
        self.text.trim()
    }

    /// Title of the innermost enclosing header.
    pub fn title(&self) -> Option<&str> {
        self.headers.last().map(|h| h.title.as_str())
    }

    /// Looks up a header title by its metadata label.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.title.as_str())
    }
}

/// Header markers to split on, paired with their metadata labels.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub headers: Vec<(String, String)>,
}

impl SplitConfig {
    /// `#` through `n` hashes, labelled "Header 1" .. "Header n".
    pub fn levels(n: usize) -> Self {
        Self {
            headers: (1..=n)
                .map(|level| ("#".repeat(level), format!("Header {level}")))
                .collect(),
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self::levels(3)
    }
}

/// Splits markdown text at header lines. Segments are never split further.
pub struct MarkdownHeaderSplitter {
    markers: Vec<(String, String)>, // longest marker first
}

impl MarkdownHeaderSplitter {
    pub fn new(config: SplitConfig) -> Self {
        let mut markers = config.headers;
        markers.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { markers }
    }

    pub fn split_document(&self, doc: &Document) -> Vec<Segment> {
        let segments = self.split_with_id(doc.id, &doc.text);
        log::info!("split {} into {} segments", doc.path, segments.len());
        segments
    }

    pub fn split_text(&self, text: &str) -> Vec<Segment> {
        self.split_with_id([0u8; 32], text)
    }

    fn split_with_id(&self, doc_id: DocumentID, text: &str) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut stack: Vec<Header> = Vec::new();
        let mut seg_start = 0;
        let mut seg_headers: Vec<Header> = Vec::new();
        let mut fence: Option<&'static str> = None;
        let mut offset = 0;
        // current segment holds nothing but header lines and blank lines
        let mut header_only = false;

        for line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();
            let trimmed = line.trim();

            if let Some(f) = fence {
                if trimmed.starts_with(f) {
                    fence = None;
                }
                continue;
            }
            if trimmed.starts_with("```") {
                fence = Some("```");
                header_only = false;
                continue;
            }
            if trimmed.starts_with("~~~") {
                fence = Some("~~~");
                header_only = false;
                continue;
            }

            let Some(header) = self.match_header(trimmed) else {
                if !trimmed.is_empty() {
                    header_only = false;
                }
                continue;
            };

            // a bodiless parent header folds into its first deeper child
            let folds_into_parent =
                header_only && seg_headers.last().is_some_and(|h| h.level < header.level);
            let pending = &text[seg_start..line_start];
            let absorb_preamble =
                segments.is_empty() && seg_headers.is_empty() && pending.trim().is_empty();
            if !folds_into_parent && !absorb_preamble {
                push_segment(&mut segments, doc_id, text, seg_start, line_start, seg_headers);
                seg_start = line_start;
            }

            stack.retain(|h| h.level < header.level);
            stack.push(header);
            seg_headers = stack.clone();
            header_only = true;
        }

        if seg_start < text.len() {
            let rest = &text[seg_start..];
            if !segments.is_empty() || !seg_headers.is_empty() || !rest.trim().is_empty() {
                push_segment(&mut segments, doc_id, text, seg_start, text.len(), seg_headers);
            }
        }

        segments
    }

    fn match_header(&self, line: &str) -> Option<Header> {
        for (marker, name) in &self.markers {
            let Some(rest) = line.strip_prefix(marker.as_str()) else {
                continue;
            };
            if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t') {
                return Some(Header {
                    level: marker.chars().count(),
                    name: name.clone(),
                    title: rest.trim().to_string(),
                });
            }
        }
        None
    }
}

impl Default for MarkdownHeaderSplitter {
    fn default() -> Self {
        Self::new(SplitConfig::default())
    }
}

fn push_segment(
    segments: &mut Vec<Segment>,
    doc_id: DocumentID,
    text: &str,
    start: usize,
    end: usize,
    headers: Vec<Header>,
) {
    let slice = &text[start..end];
    let index = segments.len();
    segments.push(Segment {
        id: compute_segment_id(&doc_id, index, slice),
        doc_id,
        index,
        text: slice.to_string(),
        headers,
        start,
        end,
    });
}
