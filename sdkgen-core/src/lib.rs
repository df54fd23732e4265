#![doc = "sdkgen-core: turns a directory of Protocol Buffer schemas into client SDKs and API docs."]

//! All generation logic lives here; the `sdkgen` binary crate is CLI glue only.
//!
//! # Flow
//! 1. Build a [`GeneratorInput`] (repository root, output root, and for
//!    compiler-plugin targets the list from [`discovery::find_proto_files`]).
//! 2. Pick a [`Generator`] from the [`GeneratorRegistry`], by tag or via
//!    [`GeneratorRegistry::find_applicable_generator`].
//! 3. `generate` validates, runs the external toolchain through a
//!    [`CommandRunner`] and returns a [`GeneratorOutput`].
//!
//! External tools (`protoc` and its plugins, `buf`) are assumed to be on `PATH`.

pub mod command;
pub mod discovery;
pub mod error;
pub mod generator;
pub mod input;
pub mod registry;
pub mod sdk;
pub mod validate;

pub use command::{CancelHandle, CancelSignal, CommandRunner, SystemCommandRunner};
pub use error::{CancelReason, CommandError, GeneratorError, ValidationError};
pub use generator::Generator;
pub use input::{GeneratorInput, GeneratorOutput};
pub use registry::{GeneratorRegistry, RegistryBuilder};
pub use sdk::SdkTag;

#[cfg(any(test, feature = "test-export-mocks"))]
pub use command::MockCommandRunner;
