use crate::pages::PAGE_EXT;
use crate::render::{BookFile, SRC_DIR};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Remove a file, ignoring "not found" errors.
fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
    }
}

/// Whether a file name looks like a generated page (`turn_*.md`).
fn is_page_file(name: &str) -> bool {
    name.starts_with("turn_")
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext == PAGE_EXT)
}

/// Delete pages left over from an earlier conversion that the new book
/// does not contain. Hand-written files in the source dir are untouched.
fn remove_stale_pages(src_dir: &Path, keep: &HashSet<PathBuf>) -> Result<usize> {
    let entries = match fs::read_dir(src_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e).with_context(|| format!("listing {}", src_dir.display())),
    };
    let mut removed = 0;
    for entry in entries {
        let entry = entry.with_context(|| format!("listing {}", src_dir.display()))?;
        let path = entry.path();
        let is_stale = entry
            .file_name()
            .to_str()
            .is_some_and(is_page_file)
            && !keep.contains(&path);
        if is_stale {
            remove_if_exists(&path)?;
            tracing::debug!(path = %path.display(), "removed stale page");
            removed += 1;
        }
    }
    Ok(removed)
}

/// Write a rendered book under `out_dir`, creating directories as needed.
pub fn write_book(out_dir: &Path, files: &[BookFile]) -> Result<()> {
    let keep: HashSet<PathBuf> = files.iter().map(|f| out_dir.join(&f.path)).collect();
    let removed = remove_stale_pages(&out_dir.join(SRC_DIR), &keep)?;

    for file in files {
        let path = out_dir.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&path, &file.contents)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    tracing::info!(
        dir = %out_dir.display(),
        files = files.len(),
        removed,
        "wrote book"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(name: &str, contents: &str) -> BookFile {
        BookFile {
            path: Path::new(SRC_DIR).join(name),
            contents: contents.into(),
        }
    }

    #[test]
    fn writes_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("book");
        let files = vec![
            BookFile {
                path: PathBuf::from("book.toml"),
                contents: "[book]\n".into(),
            },
            page("turn_1_user.md", "# Turn 1\n"),
        ];
        write_book(&out, &files).unwrap();
        assert_eq!(fs::read_to_string(out.join("book.toml")).unwrap(), "[book]\n");
        assert_eq!(
            fs::read_to_string(out.join("src/turn_1_user.md")).unwrap(),
            "# Turn 1\n"
        );
    }

    #[test]
    fn rewriting_drops_stale_pages_only() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path();
        write_book(
            out,
            &[page("turn_1_user.md", "a"), page("turn_2_user.md", "b")],
        )
        .unwrap();
        fs::write(out.join("src/notes.md"), "mine").unwrap();

        write_book(out, &[page("turn_1_user.md", "c")]).unwrap();
        assert_eq!(fs::read_to_string(out.join("src/turn_1_user.md")).unwrap(), "c");
        assert!(!out.join("src/turn_2_user.md").exists());
        assert!(out.join("src/notes.md").exists());
    }

    #[test]
    fn page_files_are_recognised_by_name() {
        assert!(is_page_file("turn_3_tool_4.md"));
        assert!(!is_page_file("SUMMARY.md"));
        assert!(!is_page_file("turn_notes.txt"));
    }
}
