//! Validation and materialization of code buffers into the output tree.
//!
//! The full set of files is computed in memory first, written into a sibling
//! staging directory, and swapped into place with renames. A failed run leaves
//! the previous tree untouched.

use crate::error::{Result, ScanError};
use crate::types::CodeBuffer;
use crate::validate::{SourceValidator, Validation};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Name of each materialized file, without extension.
pub const ARTIFACT_STEM: &str = "code";

/// One file in the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Document path the file belongs to.
    pub document_path: String,
    /// Session number.
    pub session_id: u32,
    /// Path relative to the output root, `/`-separated.
    pub relative_path: String,
    /// Authors whose buffers were written to this file.
    pub authors: Vec<String>,
    /// Command ids in file order.
    pub command_ids: Vec<String>,
    /// File size in bytes.
    pub bytes: usize,
}

/// Why a buffer was left out of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The buffer does not parse in the target dialect.
    ParseFailure {
        /// Parser diagnostic.
        reason: String,
    },
    /// The document path cannot be placed below the output root.
    UnsafePath,
}

/// A buffer that produced no file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBuffer {
    /// Document path of the buffer.
    pub document_path: String,
    /// Session number.
    pub session_id: u32,
    /// Author of the buffer.
    pub author: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Files to write, computed before touching the filesystem.
#[derive(Debug, Default, Clone)]
pub struct MaterializePlan {
    files: BTreeMap<String, PlannedFile>,
    skipped: Vec<SkippedBuffer>,
}

#[derive(Debug, Clone)]
struct PlannedFile {
    artifact: Artifact,
    contents: String,
}

impl MaterializePlan {
    /// Digest of the tree the plan describes.
    pub fn digest(&self) -> String {
        let mut digest = TreeDigest::new();
        for (path, file) in &self.files {
            digest.add(path, file.contents.as_bytes());
        }
        digest.finish()
    }
}

/// Result of a materialization.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Files written, ordered by relative path.
    pub artifacts: Vec<Artifact>,
    /// Buffers that produced no file.
    pub skipped: Vec<SkippedBuffer>,
    /// BLAKE3 digest (hex) over relative paths and contents of the tree.
    pub tree_digest: String,
}

impl MaterializeReport {
    /// Number of buffers skipped because they do not parse.
    pub fn parse_failures(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::ParseFailure { .. }))
            .count()
    }
}

/// Writes validated buffers to `<root>/<document path>/<session id>/code.<ext>`.
#[derive(Debug, Clone)]
pub struct Materializer {
    root: PathBuf,
    extension: String,
}

impl Materializer {
    /// Creates a materializer for the given output root and file extension.
    pub fn new(root: impl AsRef<Path>, extension: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: extension.to_string(),
        }
    }

    /// Validates buffers and computes the files to write.
    ///
    /// Buffers that share a destination (several authors or documents with the
    /// same path and session) are written to one file in buffer order. Each
    /// buffer is validated on its own; the concatenated file is not revalidated.
    pub fn plan(
        &self,
        buffers: &[CodeBuffer],
        validator: &dyn SourceValidator,
    ) -> Result<MaterializePlan> {
        let mut plan = MaterializePlan::default();

        for buffer in buffers {
            let skip = |reason| SkippedBuffer {
                document_path: buffer.document_path.clone(),
                session_id: buffer.session_id,
                author: buffer.author.clone(),
                reason,
            };

            let Some(relative_path) =
                artifact_path(&buffer.document_path, buffer.session_id, &self.extension)
            else {
                warn!(
                    document_path = %buffer.document_path,
                    session_id = buffer.session_id,
                    "skipping buffer with unsafe document path"
                );
                plan.skipped.push(skip(SkipReason::UnsafePath));
                continue;
            };

            let text = buffer.render();
            if let Validation::Invalid { reason } = validator.validate(&text)? {
                warn!(
                    document_path = %buffer.document_path,
                    session_id = buffer.session_id,
                    author = %buffer.author,
                    %reason,
                    "skipping buffer that does not parse"
                );
                plan.skipped.push(skip(SkipReason::ParseFailure { reason }));
                continue;
            }

            let file = plan
                .files
                .entry(relative_path.clone())
                .or_insert_with(|| PlannedFile {
                    artifact: Artifact {
                        document_path: buffer.document_path.clone(),
                        session_id: buffer.session_id,
                        relative_path,
                        authors: Vec::new(),
                        command_ids: Vec::new(),
                        bytes: 0,
                    },
                    contents: String::new(),
                });
            file.contents.push_str(&text);
            file.artifact.authors.push(buffer.author.clone());
            file.artifact
                .command_ids
                .extend(buffer.command_ids().into_iter().map(str::to_string));
            file.artifact.bytes = file.contents.len();
        }

        Ok(plan)
    }

    /// Replaces the output root with the planned tree.
    ///
    /// The root is rebuilt from scratch even when the plan is empty.
    pub fn commit(&self, plan: MaterializePlan) -> Result<MaterializeReport> {
        let tree_digest = plan.digest();
        let (parent, name) = self.split_root()?;
        fs::create_dir_all(&parent).map_err(|e| ScanError::fs(&parent, e))?;

        let token = uuid::Uuid::new_v4().simple().to_string();
        let staging = parent.join(format!(".{}.staging-{}", name, token));

        if let Err(e) = write_tree(&staging, &plan) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        if let Err(e) = self.swap_into_place(&staging, &parent, &name, &token) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        let artifacts: Vec<Artifact> = plan.files.into_values().map(|f| f.artifact).collect();
        info!(
            root = %self.root.display(),
            written = artifacts.len(),
            skipped = plan.skipped.len(),
            digest = %tree_digest,
            "materialized code tree"
        );

        Ok(MaterializeReport {
            artifacts,
            skipped: plan.skipped,
            tree_digest,
        })
    }

    /// Validates, plans and commits in one step.
    pub fn materialize(
        &self,
        buffers: &[CodeBuffer],
        validator: &dyn SourceValidator,
    ) -> Result<MaterializeReport> {
        let plan = self.plan(buffers, validator)?;
        self.commit(plan)
    }

    fn split_root(&self) -> Result<(PathBuf, String)> {
        let name = self
            .root
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ScanError::ConfigError(format!(
                    "output root has no usable directory name: {}",
                    self.root.display()
                ))
            })?
            .to_string();
        let parent = match self.root.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok((parent, name))
    }

    fn swap_into_place(&self, staging: &Path, parent: &Path, name: &str, token: &str) -> Result<()> {
        if !self.root.exists() {
            return fs::rename(staging, &self.root).map_err(|e| ScanError::fs(&self.root, e));
        }

        let retired = parent.join(format!(".{}.old-{}", name, token));
        fs::rename(&self.root, &retired).map_err(|e| ScanError::fs(&self.root, e))?;

        if let Err(e) = fs::rename(staging, &self.root) {
            restore_previous(&retired, &self.root);
            return Err(ScanError::fs(&self.root, e));
        }

        if let Err(e) = fs::remove_dir_all(&retired) {
            warn!(path = %retired.display(), error = %e, "failed to remove previous code tree");
        }
        Ok(())
    }
}

/// Moves a retired tree back to the output root after a failed swap.
///
/// Returns false, and logs where the tree was left, if the rename fails.
fn restore_previous(retired: &Path, root: &Path) -> bool {
    match fs::rename(retired, root) {
        Ok(()) => true,
        Err(e) => {
            error!(
                retired = %retired.display(),
                root = %root.display(),
                error = %e,
                "failed to restore previous code tree, it was left at the retired path"
            );
            false
        }
    }
}

/// Relative destination of a buffer, or `None` if the path is unsafe or empty.
///
/// Leading separators are dropped so absolute document paths land below the
/// output root; `.` components are ignored and `..` is rejected.
pub fn artifact_path(document_path: &str, session_id: u32, extension: &str) -> Option<String> {
    let mut parts = Vec::new();
    for part in document_path.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            p if p.contains('\0') => return None,
            p => parts.push(p),
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(format!(
        "{}/{}/{}.{}",
        parts.join("/"),
        session_id,
        ARTIFACT_STEM,
        extension
    ))
}

fn write_tree(staging: &Path, plan: &MaterializePlan) -> Result<()> {
    fs::create_dir_all(staging).map_err(|e| ScanError::fs(staging, e))?;
    for (relative, file) in &plan.files {
        let path = staging.join(relative);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| ScanError::fs(dir, e))?;
        }
        fs::write(&path, file.contents.as_bytes()).map_err(|e| ScanError::fs(&path, e))?;
        debug!(path = %relative, bytes = file.contents.len(), "wrote artifact");
    }
    Ok(())
}

/// Computes the digest of an existing tree on disk.
///
/// Matches [`MaterializeReport::tree_digest`] for a tree written by
/// [`Materializer`]. A missing root digests as an empty tree.
pub fn digest_tree(root: &Path) -> Result<String> {
    let mut files = BTreeMap::new();
    if root.exists() {
        collect_files(root, String::new(), &mut files)?;
    }
    let mut digest = TreeDigest::new();
    for (path, contents) in &files {
        digest.add(path, contents);
    }
    Ok(digest.finish())
}

fn collect_files(dir: &Path, prefix: String, out: &mut BTreeMap<String, Vec<u8>>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };
        if entry.file_type()?.is_dir() {
            collect_files(&entry.path(), relative, out)?;
        } else {
            out.insert(relative, fs::read(entry.path())?);
        }
    }
    Ok(())
}

struct TreeDigest {
    hasher: blake3::Hasher,
}

impl TreeDigest {
    fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
        }
    }

    fn add(&mut self, relative_path: &str, contents: &[u8]) {
        self.hasher.update(relative_path.as_bytes());
        self.hasher.update(&[0]);
        self.hasher.update(&(contents.len() as u64).to_le_bytes());
        self.hasher.update(contents);
    }

    fn finish(self) -> String {
        hex::encode(self.hasher.finalize().as_bytes())
    }
}
