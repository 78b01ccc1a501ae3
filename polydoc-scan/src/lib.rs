//! Tree scanning and content fingerprinting for polydoc.
//!
//! [`scan_tree`] walks one language directory and produces a
//! [`LanguageTree`]: one [`DocumentNode`] per recognized document file,
//! keyed by path relative to the language root. Scanning is read-only and
//! deterministic — directories are visited in sorted order and the
//! resulting tree is path-sorted.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

use polydoc_core::{DocumentNode, FingerprintPolicy, LanguageTag, LanguageTree};

/// File extensions recognized as documents. Everything else is ignored.
pub const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "mdx"];

/// Errors from scanning a language tree.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The language root does not exist or is not a directory. Fatal for
    /// the primary tree; target trees with this error are treated as
    /// entirely absent.
    #[error("language root not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ScanError {
    ScanError::Io {
        path: path.into(),
        source,
    }
}

/// Hash document content under the configured policy.
///
/// `NormalizeEol` collapses CRLF to LF before hashing so checkouts with
/// different line-ending conventions fingerprint identically.
pub fn fingerprint(content: &str, policy: FingerprintPolicy) -> String {
    let mut hasher = Sha256::new();
    match policy {
        FingerprintPolicy::NormalizeEol => {
            hasher.update(content.replace("\r\n", "\n").as_bytes());
        }
        FingerprintPolicy::Exact => hasher.update(content.as_bytes()),
    }
    hex::encode(hasher.finalize())
}

/// True when `name` is a recognized document file name.
fn is_document(name: &str) -> bool {
    if name.starts_with('.') {
        return false;
    }
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| DOC_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d)))
        .unwrap_or(false)
}

/// Walk `root` and produce the [`LanguageTree`] for `language`.
///
/// Hidden directories (leading `.`) are skipped, which keeps `.polydoc/`
/// state out of the index. Subdirectories are traversed with an explicit
/// work-list; relative paths are preserved as the identity key.
pub fn scan_tree(
    root: &Path,
    language: LanguageTag,
    policy: FingerprintPolicy,
) -> Result<LanguageTree, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut docs = Vec::new();
    let mut dirs = vec![root.to_path_buf()];
    let mut cursor = 0;
    while cursor < dirs.len() {
        let current = dirs[cursor].clone();
        cursor += 1;

        let entries = match std::fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => return Err(io_err(&current, err)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&current, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            let ty = entry.file_type().map_err(|e| io_err(&path, e))?;

            if ty.is_dir() {
                if !name.starts_with('.') {
                    dirs.push(path);
                }
                continue;
            }
            if !ty.is_file() || !is_document(&name) {
                continue;
            }

            let rel_path = path
                .strip_prefix(root)
                .unwrap_or(path.as_path())
                .to_path_buf();
            docs.push(read_node(&path, rel_path, &language, policy)?);
        }
    }

    Ok(LanguageTree::new(language, root.to_path_buf(), docs))
}

fn read_node(
    path: &Path,
    rel_path: PathBuf,
    language: &LanguageTag,
    policy: FingerprintPolicy,
) -> Result<DocumentNode, ScanError> {
    let content = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let meta = std::fs::metadata(path).map_err(|e| io_err(path, e))?;
    let modified_at: DateTime<Utc> = meta
        .modified()
        .map_err(|e| io_err(path, e))?
        .into();

    Ok(DocumentNode {
        rel_path,
        language: language.clone(),
        fingerprint: fingerprint(&content, policy),
        size: meta.len(),
        modified_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn scan(root: &Path) -> LanguageTree {
        scan_tree(root, LanguageTag::from("en"), FingerprintPolicy::default()).expect("scan")
    }

    #[test]
    fn missing_root_is_root_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = scan_tree(
            &tmp.path().join("absent"),
            LanguageTag::from("zh"),
            FingerprintPolicy::default(),
        )
        .expect_err("missing root");
        assert!(matches!(err, ScanError::RootNotFound { .. }));
    }

    #[test]
    fn nested_documents_keep_relative_paths_sorted() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "guide/advanced/tuning.md", "tuning");
        write(tmp.path(), "README.md", "readme");
        write(tmp.path(), "guide/setup.md", "setup");

        let tree = scan(tmp.path());
        let rels: Vec<_> = tree
            .docs()
            .iter()
            .map(|d| d.rel_path.display().to_string())
            .collect();
        assert_eq!(
            rels,
            vec!["README.md", "guide/advanced/tuning.md", "guide/setup.md"]
        );
    }

    #[rstest]
    #[case("notes.md", true)]
    #[case("notes.markdown", true)]
    #[case("notes.MDX", true)]
    #[case("notes.txt", false)]
    #[case("image.png", false)]
    #[case("Makefile", false)]
    #[case(".hidden.md", false)]
    fn extension_filter(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_document(name), expected, "{name}");
    }

    #[test]
    fn hidden_directories_are_skipped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "visible.md", "yes");
        write(tmp.path(), ".polydoc/ledger.md", "state, not a document");
        write(tmp.path(), ".git/info.md", "no");

        let tree = scan(tmp.path());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.docs()[0].rel_path, PathBuf::from("visible.md"));
    }

    #[test]
    fn fingerprint_normalizes_crlf_by_default() {
        assert_eq!(
            fingerprint("a\r\nb\r\n", FingerprintPolicy::NormalizeEol),
            fingerprint("a\nb\n", FingerprintPolicy::NormalizeEol),
        );
        assert_ne!(
            fingerprint("a\r\nb\r\n", FingerprintPolicy::Exact),
            fingerprint("a\nb\n", FingerprintPolicy::Exact),
        );
    }

    #[test]
    fn node_records_size_and_mtime() {
        use filetime::FileTime;

        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "doc.md", "twelve bytes");
        let path = tmp.path().join("doc.md");
        let past = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&path, past).unwrap();

        let tree = scan(tmp.path());
        let node = tree.get(Path::new("doc.md")).expect("node");
        assert_eq!(node.size, 12);
        assert_eq!(node.modified_at.timestamp(), 1_600_000_000);
    }

    #[test]
    fn same_content_same_fingerprint_across_trees() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        write(a.path(), "doc.md", "# identical\n");
        write(b.path(), "doc.md", "# identical\n");

        let fp_a = scan(a.path()).docs()[0].fingerprint.clone();
        let tree_b = scan_tree(
            b.path(),
            LanguageTag::from("zh"),
            FingerprintPolicy::default(),
        )
        .unwrap();
        assert_eq!(fp_a, tree_b.docs()[0].fingerprint);
    }
}
