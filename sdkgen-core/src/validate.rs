//! Request validation, run before any process is spawned.
//!
//! Proto paths end up interpolated into compiler arguments, so every entry must
//! be UTF-8, stay inside the repository root and name a `.proto` file.

use crate::discovery::is_proto_file;
use crate::error::ValidationError;
use crate::input::GeneratorInput;
use std::path::{Component, Path, PathBuf};

/// Lexically normalises a path: drops `.` segments and folds `dir/..` pairs.
/// A `..` that cannot be folded is kept, so an escaping path stays visible.
/// The empty path cleans to `.`.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Validates a single relative proto path.
pub fn validate_proto_path(file: &Path) -> Result<(), ValidationError> {
    if file.to_str().is_none() {
        return Err(ValidationError::NonUtf8Path(file.to_path_buf()));
    }
    if file.is_absolute() || file.has_root() {
        return Err(ValidationError::AbsolutePath(file.to_path_buf()));
    }
    let cleaned = clean_path(file);
    if cleaned
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(ValidationError::PathTraversal(file.to_path_buf()));
    }
    if !is_proto_file(&cleaned) {
        return Err(ValidationError::InvalidExtension(file.to_path_buf()));
    }
    Ok(())
}

/// Policy for compiler-plugin generators: a non-empty list of safe proto paths.
/// The output path does not need to exist.
pub fn validate_plugin_input(input: &GeneratorInput) -> Result<(), ValidationError> {
    if input.proto_files.is_empty() {
        return Err(ValidationError::NoProtoFiles);
    }
    input
        .proto_files
        .iter()
        .try_for_each(|file| validate_proto_path(file))
}

/// Policy for manifest-driven generators: the manifest must sit directly under
/// the repository root. The proto file list is ignored.
pub fn validate_manifest_input(
    input: &GeneratorInput,
    manifest: &str,
) -> Result<(), ValidationError> {
    let manifest_path = input.repo_path.join(manifest);
    if manifest_path.is_file() {
        Ok(())
    } else {
        Err(ValidationError::MissingManifest(manifest_path))
    }
}
