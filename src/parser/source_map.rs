//! Source documents and offset → line/column mapping
//!
//! The parser and the evaluator only deal in byte offsets ([`Loc`]); anything
//! shown to a user goes through [`SourceMap::line_col`].

use super::ast::{DocId, Loc};

/// A named source text with a precomputed line table
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub text: String,
    line_starts: Vec<usize>,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Document {
            name: name.into(),
            text,
            line_starts,
        }
    }

    /// Zero-based line index containing `offset`
    pub fn line_index(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    /// One-based (line, column) of `offset`
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let line = self.line_index(offset);
        let start = self.line_starts[line];
        let column = self
            .text
            .get(start..offset)
            .map_or(offset - start, |prefix| prefix.chars().count());
        (line + 1, column + 1)
    }

    /// Byte offset where a zero-based line starts
    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts
            .get(line)
            .copied()
            .unwrap_or(self.text.len())
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of a zero-based line, without its terminator
    pub fn line_text(&self, line: usize) -> &str {
        let Some(&start) = self.line_starts.get(line) else {
            return "";
        };
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(self.text.len(), |&next| next - 1);
        self.text
            .get(start..end)
            .unwrap_or("")
            .trim_end_matches('\r')
    }
}

/// All documents known to a session
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    documents: Vec<Document>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> DocId {
        let id = DocId(self.documents.len() as u32);
        self.documents.push(Document::new(name, text));
        id
    }

    pub fn get(&self, doc: DocId) -> Option<&Document> {
        self.documents.get(doc.0 as usize)
    }

    pub fn text(&self, doc: DocId) -> &str {
        self.get(doc).map_or("", |d| d.text.as_str())
    }

    /// One-based (line, column) of the start of `loc`
    pub fn line_col(&self, loc: Loc) -> (usize, usize) {
        self.get(loc.doc).map_or((1, 1), |d| d.line_col(loc.start))
    }

    /// Zero-based line of the start of `loc`
    pub fn line_index(&self, loc: Loc) -> usize {
        self.get(loc.doc).map_or(0, |d| d.line_index(loc.start))
    }

    /// Source text covered by `loc`
    pub fn snippet(&self, loc: Loc) -> &str {
        self.text(loc.doc).get(loc.start..loc.end).unwrap_or("")
    }

    /// Human readable position, e.g. `script.java:3:5`
    pub fn describe(&self, loc: Loc) -> String {
        let (line, column) = self.line_col(loc);
        match self.get(loc.doc) {
            Some(doc) => format!("{}:{}:{}", doc.name, line, column),
            None => format!("{}:{}", line, column),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let mut map = SourceMap::new();
        let doc = map.add("a.java", "int x = 1;\n  x = 2;\n");
        assert_eq!(map.line_col(Loc::new(doc, 0, 1)), (1, 1));
        assert_eq!(map.line_col(Loc::new(doc, 13, 14)), (2, 3));
        assert_eq!(map.describe(Loc::new(doc, 11, 12)), "a.java:2:1");
    }

    #[test]
    fn test_line_text() {
        let doc = Document::new("b", "first\r\nsecond");
        assert_eq!(doc.line_count(), 2);
        assert_eq!(doc.line_text(0), "first");
        assert_eq!(doc.line_text(1), "second");
        assert_eq!(doc.line_text(5), "");
    }
}
