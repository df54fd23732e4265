//! Compiler-plugin generators.
//!
//! Each target is a unit struct implementing [`PluginArgs`], a pure function
//! from [`GeneratorInput`] to the `protoc` argument vector. [`PluginGenerator`]
//! supplies everything else: validation, output directory creation, process
//! invocation and the resulting [`GeneratorOutput`].
//!
//! Argument layout, shared by all variants:
//!
//! ```text
//! --proto_path=<repo>  --<plugin>_out=<out>  --<plugin>_opt=...  --<prefix>=M<file>=./<dir> ...  <files...>
//! ```
//!
//! The file list always comes last and in the caller's order.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::{ensure_output_dir, slash_path, Generator};
use crate::command::{CancelSignal, CommandRunner};
use crate::discovery::find_proto_files;
use crate::error::{GeneratorError, ValidationError};
use crate::input::{GeneratorInput, GeneratorOutput};
use crate::sdk::SdkTag;
use crate::validate::{clean_path, validate_plugin_input};

/// Default schema compiler executable.
pub const PROTOC: &str = "protoc";

/// Builds the `protoc` argument vector for one target.
pub trait PluginArgs: Send + Sync {
    fn tag(&self) -> SdkTag;

    fn build_args(&self, input: &GeneratorInput) -> Vec<String>;
}

/// `--proto_path=<repo>`
pub fn proto_path_flag(repo: &Path) -> String {
    format!("--proto_path={}", clean_path(repo).display())
}

/// `--<plugin>_out=<out>`
pub fn out_flag(plugin: &str, out: &Path) -> String {
    format!("--{plugin}_out={}", clean_path(out).display())
}

/// `--<plugin>_opt=paths=source_relative`, so output mirrors the schema layout
/// instead of being flattened by package.
pub fn source_relative_flag(plugin: &str) -> String {
    format!("--{plugin}_opt=paths=source_relative")
}

/// Package remapping for one (file, plugin) pair: `--<prefix>=M<file>=./<dir>`,
/// where `<dir>` is the file's directory, or `./` for files at the root.
pub fn package_mapping_flag(file: &Path, option_prefix: &str) -> String {
    let file = clean_path(file);
    let target = match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => format!("./{}", slash_path(dir)),
        _ => "./".to_string(),
    };
    format!("--{option_prefix}=M{}={target}", slash_path(&file))
}

/// Appends one mapping per (file, prefix), all prefixes for a file before the
/// next file.
fn push_package_mappings(args: &mut Vec<String>, files: &[std::path::PathBuf], prefixes: &[&str]) {
    for file in files {
        for prefix in prefixes {
            args.push(package_mapping_flag(file, prefix));
        }
    }
}

fn push_files(args: &mut Vec<String>, input: &GeneratorInput) {
    args.extend(
        input
            .proto_files
            .iter()
            .map(|file| file.to_string_lossy().into_owned()),
    );
}

/// Go messages, optionally with extra Go service plugins (`go-grpc`,
/// `connect-go`) that take the same output and remapping treatment.
fn go_args(input: &GeneratorInput, service_plugins: &[&str]) -> Vec<String> {
    let mut args = vec![proto_path_flag(&input.repo_path)];
    let mut prefixes = Vec::with_capacity(service_plugins.len() + 1);
    for plugin in std::iter::once(&"go").chain(service_plugins) {
        args.push(out_flag(plugin, &input.output_path));
        args.push(source_relative_flag(plugin));
        prefixes.push(format!("{plugin}_opt"));
    }
    let prefixes: Vec<&str> = prefixes.iter().map(String::as_str).collect();
    push_package_mappings(&mut args, &input.proto_files, &prefixes);
    push_files(&mut args, input);
    args
}

/// Go message types only.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoProtobuf;

impl PluginArgs for GoProtobuf {
    fn tag(&self) -> SdkTag {
        SdkTag::Go
    }

    fn build_args(&self, input: &GeneratorInput) -> Vec<String> {
        go_args(input, &[])
    }
}

/// Go messages plus gRPC stubs.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoGrpc;

impl PluginArgs for GoGrpc {
    fn tag(&self) -> SdkTag {
        SdkTag::GoGrpc
    }

    fn build_args(&self, input: &GeneratorInput) -> Vec<String> {
        go_args(input, &["go-grpc"])
    }
}

/// Go messages plus ConnectRPC stubs.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoConnectRpc;

impl PluginArgs for GoConnectRpc {
    fn tag(&self) -> SdkTag {
        SdkTag::GoConnectRpc
    }

    fn build_args(&self, input: &GeneratorInput) -> Vec<String> {
        go_args(input, &["connect-go"])
    }
}

// The JavaScript/TypeScript plugins lay files out by source path already and
// take no package remapping.

#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptEs;

impl PluginArgs for TypeScriptEs {
    fn tag(&self) -> SdkTag {
        SdkTag::TypeScriptEs
    }

    fn build_args(&self, input: &GeneratorInput) -> Vec<String> {
        let mut args = vec![
            proto_path_flag(&input.repo_path),
            out_flag("es", &input.output_path),
            "--es_opt=target=ts".to_string(),
        ];
        push_files(&mut args, input);
        args
    }
}

/// Legacy `protoc-gen-js` output: CommonJS imports, binary serialisation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptCommonJs;

impl PluginArgs for TypeScriptCommonJs {
    fn tag(&self) -> SdkTag {
        SdkTag::TypeScriptCommonJs
    }

    fn build_args(&self, input: &GeneratorInput) -> Vec<String> {
        let mut args = vec![
            proto_path_flag(&input.repo_path),
            format!(
                "--js_out=import_style=commonjs,binary:{}",
                clean_path(&input.output_path).display()
            ),
        ];
        push_files(&mut args, input);
        args
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptConnect;

impl PluginArgs for TypeScriptConnect {
    fn tag(&self) -> SdkTag {
        SdkTag::TypeScriptConnect
    }

    fn build_args(&self, input: &GeneratorInput) -> Vec<String> {
        let mut args = vec![
            proto_path_flag(&input.repo_path),
            out_flag("es", &input.output_path),
            "--es_opt=target=ts".to_string(),
            out_flag("connect-es", &input.output_path),
            "--connect-es_opt=target=ts".to_string(),
        ];
        push_files(&mut args, input);
        args
    }
}

/// Shared skeleton for every compiler-plugin target.
pub struct PluginGenerator<A> {
    args: A,
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl<A: PluginArgs> PluginGenerator<A> {
    pub fn new(args: A, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            args,
            runner,
            program: PROTOC.to_string(),
        }
    }

    /// Overrides the compiler executable (default `protoc`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn build_args(&self, input: &GeneratorInput) -> Vec<String> {
        self.args.build_args(input)
    }
}

#[async_trait]
impl<A: PluginArgs> Generator for PluginGenerator<A> {
    fn sdk_tag(&self) -> SdkTag {
        self.args.tag()
    }

    fn is_applicable(&self, repo: &Path) -> bool {
        find_proto_files(repo).is_ok_and(|files| !files.is_empty())
    }

    fn validate(&self, input: &GeneratorInput) -> Result<(), ValidationError> {
        validate_plugin_input(input)
    }

    async fn generate(
        &self,
        input: &GeneratorInput,
        cancel: &CancelSignal,
    ) -> Result<GeneratorOutput, GeneratorError> {
        let sdk = self.sdk_tag();
        self.validate(input)?;
        ensure_output_dir(&input.output_path)?;

        let args = self.build_args(input);
        info!(
            %sdk,
            program = %self.program,
            repo = %input.repo_path.display(),
            files = input.proto_files.len(),
            "Running compiler"
        );
        debug!(%sdk, ?args, "Compiler arguments");

        self.runner
            .run(&self.program, &args, &input.repo_path, cancel)
            .await?;

        let output = GeneratorOutput {
            output_path: clean_path(&input.output_path),
            files_count: input.proto_files.len(),
        };
        info!(%sdk, output = %output.output_path.display(), files = output.files_count, "Generation complete");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_for_nested_file_points_at_its_directory() {
        assert_eq!(
            package_mapping_flag(Path::new("user/v1/user.proto"), "go_opt"),
            "--go_opt=Muser/v1/user.proto=./user/v1"
        );
    }

    #[test]
    fn mapping_for_root_file_points_at_root() {
        assert_eq!(
            package_mapping_flag(Path::new("test.proto"), "go_opt"),
            "--go_opt=Mtest.proto=./"
        );
    }

    #[test]
    fn grpc_variant_emits_both_mappings_per_file_before_the_next() {
        let input = GeneratorInput::new("/repo", "/out").with_proto_files(["a.proto", "b/c.proto"]);
        let args = GoGrpc.build_args(&input);
        let mappings: Vec<&str> = args
            .iter()
            .filter(|a| a.contains("=M"))
            .map(String::as_str)
            .collect();
        assert_eq!(
            mappings,
            vec![
                "--go_opt=Ma.proto=./",
                "--go-grpc_opt=Ma.proto=./",
                "--go_opt=Mb/c.proto=./b",
                "--go-grpc_opt=Mb/c.proto=./b",
            ]
        );
    }
}
