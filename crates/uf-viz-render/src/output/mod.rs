//! Encoders and the on-disk layout of rendered figures.

pub mod pdf;
pub mod png;

use std::fs;
use std::path::{Path, PathBuf};

use crate::RenderError;

/// Per-format output tree rooted at a directory:
/// `<root>/png/<name>.png`, `<root>/pdf/<name>.pdf`, `<root>/json/<name>.json`.
#[derive(Debug, Clone)]
pub struct OutputTree {
    root: PathBuf,
}

impl OutputTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Subtree for a figure family, e.g. `<root>/response`.
    pub fn nested(&self, name: &str) -> Self {
        Self { root: self.root.join(name) }
    }

    /// `<root>/<format>/<stem>.<format>`.
    pub fn path_for(&self, stem: &str, format: &str) -> crate::Result<PathBuf> {
        check_stem(stem)?;
        Ok(self.root.join(format).join(format!("{stem}.{format}")))
    }
}

/// A distribution name is used as a file stem and must stay inside its folder.
fn check_stem(stem: &str) -> crate::Result<()> {
    let bad = stem.is_empty()
        || stem == "."
        || stem == ".."
        || stem.contains(['/', '\\'])
        || stem.chars().any(char::is_control);
    if bad {
        return Err(RenderError::Core(uf_core::Error::Validation(format!(
            "'{stem}' is not usable as a file name"
        ))));
    }
    Ok(())
}

/// Files of one distribution, encoded in memory and written together.
///
/// [`FileBatch::commit`] either places every file or leaves the previous
/// contents of every target in place.
#[derive(Debug, Default)]
pub struct FileBatch {
    files: Vec<(PathBuf, Vec<u8>)>,
}

impl FileBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: PathBuf, bytes: Vec<u8>) {
        self.files.push((path, bytes));
    }

    /// Write every file through a sibling temp file, then move them into
    /// place. Existing targets are set aside first and restored if any
    /// step fails; temp files never outlive the call.
    pub fn commit(self) -> crate::Result<Vec<PathBuf>> {
        let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(self.files.len());
        for (path, bytes) in &self.files {
            match stage(path, bytes) {
                Ok(tmp) => staged.push((tmp, path.as_path())),
                Err(e) => {
                    discard(&staged);
                    return Err(e);
                }
            }
        }

        let mut backups: Vec<(PathBuf, &Path)> = Vec::new();
        for &(_, path) in &staged {
            if path.exists() {
                let bak = sibling(path, ".bak");
                if let Err(e) = fs::rename(path, &bak) {
                    restore(&backups);
                    discard(&staged);
                    return Err(e.into());
                }
                backups.push((bak, path));
            }
        }

        let mut placed: Vec<PathBuf> = Vec::with_capacity(staged.len());
        for (tmp, path) in &staged {
            if let Err(e) = fs::rename(tmp, path) {
                for p in &placed {
                    let _ = fs::remove_file(p);
                }
                discard(&staged);
                restore(&backups);
                return Err(e.into());
            }
            placed.push(path.to_path_buf());
        }

        for (bak, _) in &backups {
            let _ = fs::remove_file(bak);
        }
        Ok(placed)
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn stage(path: &Path, bytes: &[u8]) -> crate::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = sibling(path, ".tmp");
    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(tmp)
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}

fn restore(backups: &[(PathBuf, &Path)]) {
    for (bak, path) in backups {
        if let Err(e) = fs::rename(bak, path) {
            tracing::warn!(path = %path.display(), error = %e, "could not restore previous file");
        }
    }
}

/// Encoded figure, ready to persist.
pub struct EncodedFigure {
    pub png: Vec<u8>,
    pub pdf: Vec<u8>,
}

impl EncodedFigure {
    /// Encode both formats in memory; nothing touches the disk.
    pub fn from_svg(svg: &str, dpi: u32) -> crate::Result<Self> {
        Ok(Self { png: png::svg_to_png(svg, dpi)?, pdf: pdf::svg_to_pdf(svg)? })
    }

    /// Queue `png/<stem>.png` and `pdf/<stem>.pdf` in `batch`; returns both paths.
    pub fn stage(
        self,
        tree: &OutputTree,
        stem: &str,
        batch: &mut FileBatch,
    ) -> crate::Result<SavedFigure> {
        let png = tree.path_for(stem, "png")?;
        let pdf = tree.path_for(stem, "pdf")?;
        batch.push(png.clone(), self.png);
        batch.push(pdf.clone(), self.pdf);
        Ok(SavedFigure { png, pdf, json: None })
    }
}

/// Files written for one figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFigure {
    pub png: PathBuf,
    pub pdf: PathBuf,
    pub json: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("uf-viz-render-output-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn paths_follow_format_folders() {
        let tree = OutputTree::new("/out");
        assert_eq!(tree.path_for("normal", "png").unwrap(), PathBuf::from("/out/png/normal.png"));
        assert_eq!(
            tree.nested("response").path_for("gamma", "pdf").unwrap(),
            PathBuf::from("/out/response/pdf/gamma.pdf")
        );
    }

    #[test]
    fn unsafe_stems_are_rejected() {
        let tree = OutputTree::new("/out");
        for stem in ["", "..", "a/b", "a\\b", "x\ny"] {
            assert!(tree.path_for(stem, "png").is_err(), "{stem:?}");
        }
    }

    #[test]
    fn commit_creates_parents_and_overwrites() {
        let dir = scratch("commit");
        let path = dir.join("png").join("normal.png");
        for bytes in [b"first".to_vec(), b"second".to_vec()] {
            let mut batch = FileBatch::new();
            batch.push(path.clone(), bytes);
            assert_eq!(batch.commit().unwrap(), vec![path.clone()]);
        }
        assert_eq!(fs::read(&path).unwrap(), b"second");
        let leftovers: Vec<_> = fs::read_dir(dir.join("png")).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_commit_keeps_previous_files() {
        let dir = scratch("rollback");
        let png = dir.join("png").join("normal.png");
        let mut first = FileBatch::new();
        first.push(png.clone(), b"old".to_vec());
        first.commit().unwrap();

        // A plain file where the pdf folder should be makes staging fail.
        fs::write(dir.join("pdf"), b"not a folder").unwrap();
        let mut second = FileBatch::new();
        second.push(png.clone(), b"new".to_vec());
        second.push(dir.join("pdf").join("normal.pdf"), b"new".to_vec());
        assert!(second.commit().is_err());

        assert_eq!(fs::read(&png).unwrap(), b"old");
        let names: Vec<_> =
            fs::read_dir(dir.join("png")).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names, vec![std::ffi::OsString::from("normal.png")]);
        fs::remove_dir_all(&dir).unwrap();
    }
}
