//! Marked source ranges that are quoted in blog posts.
//!
//! A snippet starts at a line beginning with the start marker followed by its
//! name and runs to the matching end marker, the next start marker, or the end
//! of the input, whichever comes first.

use std::{
    fs, io,
    ops::Range,
    path::{Path, PathBuf},
};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetMarkers {
    pub start: String,
    pub end: String,
}

impl Default for SnippetMarkers {
    fn default() -> Self {
        Self {
            start: "# snippet ".to_string(),
            end: "# end snippet".to_string(),
        }
    }
}

impl SnippetMarkers {
    pub fn is_start(&self, line: &str) -> bool {
        line.starts_with(&self.start)
    }

    pub fn is_end(&self, line: &str) -> bool {
        line.starts_with(&self.end)
    }

    /// The snippet name carried by a start line.
    pub fn name<'a>(&self, line: &'a str) -> Option<&'a str> {
        line.strip_prefix(self.start.as_str()).map(str::trim)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    pub name: String,
    pub lines: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SnippetError {
    #[error("snippet ends without start on line {line}")]
    UnmatchedEnd { line: usize },
    #[error("found {ranges} snippets but {replacements} replacements")]
    CountMismatch { ranges: usize, replacements: usize },
    #[error("snippet name '{name}' is not a valid file name")]
    BadName { name: String },
    #[error("write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Half-open line ranges covered by each snippet, marker lines included.
pub fn snippet_ranges<S: AsRef<str>>(
    lines: &[S],
    markers: &SnippetMarkers,
) -> Result<Vec<Range<usize>>, SnippetError> {
    let mut ranges = Vec::new();
    let mut open: Option<usize> = None;
    for (idx, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        if markers.is_start(line) {
            if let Some(start) = open {
                ranges.push(start..idx);
            }
            open = Some(idx);
        } else if markers.is_end(line) {
            let Some(start) = open.take() else {
                return Err(SnippetError::UnmatchedEnd { line: idx + 1 });
            };
            ranges.push(start..idx + 1);
        }
    }
    if let Some(start) = open {
        ranges.push(start..lines.len());
    }
    Ok(ranges)
}

/// The snippets in `lines`, with their marker lines removed.
pub fn extract<S: AsRef<str>>(
    lines: &[S],
    markers: &SnippetMarkers,
) -> Result<Vec<Snippet>, SnippetError> {
    let ranges = snippet_ranges(lines, markers)?;
    Ok(ranges
        .into_iter()
        .map(|range| {
            let name = markers
                .name(lines[range.start].as_ref())
                .unwrap_or_default()
                .to_string();
            let lines = body(&lines[range], markers)
                .iter()
                .map(|line| line.as_ref().to_string())
                .collect();
            Snippet { name, lines }
        })
        .collect())
}

/// Write each snippet in `lines` to `<dir>/<name>.<ext>`, returning the paths
/// written.
pub fn extract_to_dir<S: AsRef<str>>(
    lines: &[S],
    markers: &SnippetMarkers,
    dir: &Path,
    ext: &str,
) -> Result<Vec<PathBuf>, SnippetError> {
    write_snippets(&extract(lines, markers)?, dir, ext)
}

/// Write already-parsed snippets to `<dir>/<name>.<ext>`. Lines are written
/// as they are, marker-like text included.
pub fn write_snippets(
    snippets: &[Snippet],
    dir: &Path,
    ext: &str,
) -> Result<Vec<PathBuf>, SnippetError> {
    if let Some(bad) = snippets.iter().find(|s| !is_file_name(&s.name)) {
        return Err(SnippetError::BadName {
            name: bad.name.clone(),
        });
    }
    fs::create_dir_all(dir).map_err(|source| SnippetError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::with_capacity(snippets.len());
    for snippet in snippets {
        let path = dir.join(format!("{}.{ext}", snippet.name));
        let mut text = snippet.lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        fs::write(&path, text).map_err(|source| SnippetError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = ?path, lines = snippet.lines.len(), "snippet written");
        written.push(path);
    }
    Ok(written)
}

/// Replace the body of every snippet in `source` with the matching entry of
/// `replacements`. Marker lines and text outside snippets are kept.
pub fn reconcile<S: AsRef<str>, R: AsRef<str>>(
    source: &[S],
    replacements: &[Vec<R>],
    markers: &SnippetMarkers,
) -> Result<Vec<String>, SnippetError> {
    let ranges = snippet_ranges(source, markers)?;
    if ranges.len() != replacements.len() {
        return Err(SnippetError::CountMismatch {
            ranges: ranges.len(),
            replacements: replacements.len(),
        });
    }
    let owned = |line: &S| line.as_ref().to_string();
    let mut out = Vec::with_capacity(source.len());
    let mut pos = 0;
    for (range, replacement) in ranges.into_iter().zip(replacements) {
        out.extend(source[pos..range.start].iter().map(owned));
        out.push(owned(&source[range.start]));
        out.extend(replacement.iter().map(|line| line.as_ref().to_string()));
        let last = &source[range.end - 1];
        if range.len() > 1 && markers.is_end(last.as_ref()) {
            out.push(owned(last));
        }
        pos = range.end;
    }
    out.extend(source[pos..].iter().map(owned));
    Ok(out)
}

fn body<'a, S: AsRef<str>>(range: &'a [S], markers: &SnippetMarkers) -> &'a [S] {
    let inner = &range[1..];
    match inner.split_last() {
        Some((last, rest)) if markers.is_end(last.as_ref()) => rest,
        _ => inner,
    }
}

fn is_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SOURCE: &str = "\
import os
# snippet demo-1
def one():
    return 1
# end snippet

# snippet demo-2
def two():
    return 2
# snippet demo-3
def three():
    return 3
";

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn empty_snippets() {
        let lines = lines(
            "Line 1 is not part of a snippet\n# snippet prefix-1\n# snippet prefix-2\n# end snippet\n",
        );
        let markers = SnippetMarkers::default();
        assert_eq!(snippet_ranges(&lines, &markers).unwrap(), vec![1..2, 2..4]);
        let snippets = extract(&lines, &markers).unwrap();
        assert_eq!(snippets.len(), 2);
        assert!(snippets.iter().all(|s| s.lines.is_empty()));
    }

    #[test]
    fn ranges_close_on_end_next_start_and_eof() {
        let markers = SnippetMarkers::default();
        let ranges = snippet_ranges(&lines(SOURCE), &markers).unwrap();
        assert_eq!(ranges, vec![1..5, 6..9, 9..12]);
    }

    #[test]
    fn snippet_on_first_line_is_found() {
        let markers = SnippetMarkers::default();
        let ranges = snippet_ranges(&["# snippet a-1", "x = 1"], &markers).unwrap();
        assert_eq!(ranges, vec![0..2]);
    }

    #[test]
    fn end_without_start_names_the_line() {
        let markers = SnippetMarkers::default();
        let err = snippet_ranges(&["a", "b", "# end snippet"], &markers).unwrap_err();
        assert!(matches!(err, SnippetError::UnmatchedEnd { line: 3 }));
        assert_eq!(err.to_string(), "snippet ends without start on line 3");
    }

    #[test]
    fn extract_drops_markers() {
        let snippets = extract(&lines(SOURCE), &SnippetMarkers::default()).unwrap();
        let names: Vec<_> = snippets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["demo-1", "demo-2", "demo-3"]);
        assert_eq!(snippets[0].lines, ["def one():", "    return 1"]);
        assert_eq!(snippets[2].lines, ["def three():", "    return 3"]);
    }

    #[test]
    fn extract_to_dir_writes_one_file_per_snippet() {
        let dir = TempDir::new().unwrap();
        let written =
            extract_to_dir(&lines(SOURCE), &SnippetMarkers::default(), dir.path(), "py").unwrap();
        assert_eq!(written.len(), 3);
        let text = fs::read_to_string(dir.path().join("demo-2.py")).unwrap();
        assert_eq!(text, "def two():\n    return 2\n");
    }

    #[test]
    fn extract_to_dir_rejects_path_names() {
        let dir = TempDir::new().unwrap();
        let err = extract_to_dir(
            &["# snippet ../escape", "x"],
            &SnippetMarkers::default(),
            dir.path(),
            "py",
        )
        .unwrap_err();
        assert!(matches!(err, SnippetError::BadName { .. }));
    }

    #[test]
    fn write_snippets_keeps_marker_like_lines() {
        let dir = TempDir::new().unwrap();
        let snippet = Snippet {
            name: "demo-1".into(),
            lines: vec![
                "print('# snippet')".into(),
                "# snippet inner".into(),
                "# end snippet".into(),
                "x = 1".into(),
            ],
        };
        let written = write_snippets(&[snippet], dir.path(), "py").unwrap();
        assert_eq!(written, [dir.path().join("demo-1.py")]);
        assert_eq!(
            fs::read_to_string(&written[0]).unwrap(),
            "print('# snippet')\n# snippet inner\n# end snippet\nx = 1\n"
        );
    }

    #[test]
    fn write_snippets_checks_names_before_writing() {
        let dir = TempDir::new().unwrap();
        let good = Snippet {
            name: "ok-1".into(),
            lines: vec!["a".into()],
        };
        let bad = Snippet {
            name: "../evil".into(),
            lines: vec!["b".into()],
        };
        let err = write_snippets(&[good, bad], dir.path(), "py").unwrap_err();
        assert!(matches!(err, SnippetError::BadName { name } if name == "../evil"));
        assert!(!dir.path().join("ok-1.py").exists());
    }

    #[test]
    fn reconcile_replaces_bodies_and_keeps_markers() {
        let markers = SnippetMarkers::default();
        let replacements = vec![
            vec!["def one():", "    return 'one'"],
            vec!["def two(): ..."],
            vec![],
        ];
        let out = reconcile(&lines(SOURCE), &replacements, &markers).unwrap();
        assert_eq!(
            out,
            [
                "import os",
                "# snippet demo-1",
                "def one():",
                "    return 'one'",
                "# end snippet",
                "",
                "# snippet demo-2",
                "def two(): ...",
                "# snippet demo-3",
            ]
        );
    }

    #[test]
    fn reconcile_with_unchanged_bodies_is_identity() {
        let markers = SnippetMarkers::default();
        let source = lines("head\n# snippet s-1\nbody\n# end snippet\ntail\n");
        let bodies: Vec<Vec<String>> = extract(&source, &markers)
            .unwrap()
            .into_iter()
            .map(|s| s.lines)
            .collect();
        assert_eq!(reconcile(&source, &bodies, &markers).unwrap(), source);
    }

    #[test]
    fn reconcile_requires_matching_counts() {
        let markers = SnippetMarkers::default();
        let err = reconcile(&lines(SOURCE), &[vec!["x"]], &markers).unwrap_err();
        assert!(matches!(
            err,
            SnippetError::CountMismatch {
                ranges: 3,
                replacements: 1
            }
        ));
    }
}
