//! Generator registry: one [`Generator`] per [`SdkTag`].
//!
//! Built once at startup through [`RegistryBuilder`], then read concurrently by
//! request handlers. Reads take a shared lock and never wait on each other;
//! [`GeneratorRegistry::register`] is the only writer.
//!
//! ```ignore
//! let runner = Arc::new(SystemCommandRunner::new());
//! let registry = RegistryBuilder::new(runner).with_defaults().build();
//! let generator = registry.find_applicable_generator(repo)?;
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::command::CommandRunner;
use crate::error::GeneratorError;
use crate::generator::plugin::PROTOC;
use crate::generator::{
    manifest::BUF, DocsGenerator, Generator, GoConnectRpc, GoGrpc, GoProtobuf, ManifestGenerator,
    PluginGenerator, TypeScriptCommonJs, TypeScriptConnect, TypeScriptEs,
};
use crate::sdk::SdkTag;

type GeneratorMap = BTreeMap<SdkTag, Arc<dyn Generator>>;

/// Accumulates generators before producing a [`GeneratorRegistry`].
pub struct RegistryBuilder {
    runner: Arc<dyn CommandRunner>,
    protoc: String,
    buf: String,
    harvest_excludes: Vec<PathBuf>,
    generators: GeneratorMap,
}

impl RegistryBuilder {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            protoc: PROTOC.to_string(),
            buf: BUF.to_string(),
            harvest_excludes: Vec::new(),
            generators: GeneratorMap::new(),
        }
    }

    /// Executable used by the compiler-plugin and documentation generators.
    /// Applies to generators added after this call.
    pub fn protoc(mut self, program: impl Into<String>) -> Self {
        self.protoc = program.into();
        self
    }

    /// Executable used by the manifest-driven generator. Applies to generators
    /// added after this call.
    pub fn buf(mut self, program: impl Into<String>) -> Self {
        self.buf = program.into();
        self
    }

    /// Directory the manifest-driven generator must never harvest from, such as
    /// a shared output directory other generators write into concurrently.
    /// Applies to generators added after this call.
    pub fn exclude_from_harvest(mut self, dir: impl Into<PathBuf>) -> Self {
        self.harvest_excludes.push(dir.into());
        self
    }

    /// Adds the manifest-driven generator, every compiler-plugin variant and
    /// the documentation generator, all sharing the builder's runner.
    pub fn with_defaults(self) -> Self {
        let runner = Arc::clone(&self.runner);
        let protoc = self.protoc.clone();
        let manifest = self.harvest_excludes.iter().fold(
            ManifestGenerator::new(Arc::clone(&runner)).with_program(&self.buf),
            |generator, dir| generator.with_excluded(dir),
        );
        self.with_generator(manifest)
            .with_generator(PluginGenerator::new(GoProtobuf, Arc::clone(&runner)).with_program(&protoc))
            .with_generator(PluginGenerator::new(GoConnectRpc, Arc::clone(&runner)).with_program(&protoc))
            .with_generator(PluginGenerator::new(GoGrpc, Arc::clone(&runner)).with_program(&protoc))
            .with_generator(PluginGenerator::new(TypeScriptEs, Arc::clone(&runner)).with_program(&protoc))
            .with_generator(
                PluginGenerator::new(TypeScriptCommonJs, Arc::clone(&runner)).with_program(&protoc),
            )
            .with_generator(
                PluginGenerator::new(TypeScriptConnect, Arc::clone(&runner)).with_program(&protoc),
            )
            .with_generator(DocsGenerator::new(runner).with_program(protoc))
    }

    /// Adds (or replaces) the generator for its tag.
    pub fn with_generator<G: Generator + 'static>(mut self, generator: G) -> Self {
        self.generators.insert(generator.sdk_tag(), Arc::new(generator));
        self
    }

    pub fn build(self) -> GeneratorRegistry {
        info!(generators = self.generators.len(), "Generator registry built");
        GeneratorRegistry {
            generators: RwLock::new(self.generators),
        }
    }
}

pub struct GeneratorRegistry {
    generators: RwLock<GeneratorMap>,
}

impl GeneratorRegistry {
    /// An empty registry. Most callers want [`RegistryBuilder`].
    pub fn new() -> Self {
        Self {
            generators: RwLock::new(GeneratorMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, GeneratorMap> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.generators.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, GeneratorMap> {
        self.generators.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers `generator` under its own tag, replacing any existing entry.
    pub fn register(&self, generator: Arc<dyn Generator>) {
        let tag = generator.sdk_tag();
        debug!(sdk = %tag, "Registering generator");
        self.write().insert(tag, generator);
    }

    pub fn get(&self, tag: &SdkTag) -> Option<Arc<dyn Generator>> {
        self.read().get(tag).cloned()
    }

    /// Registered tags, in probing order.
    pub fn list(&self) -> Vec<SdkTag> {
        self.read().keys().cloned().collect()
    }

    /// Output directory name for `tag`; `"unknown"` if nothing is registered
    /// under it.
    pub fn directory_name(&self, tag: &SdkTag) -> &'static str {
        self.get(tag)
            .map(|generator| generator.directory_name())
            .unwrap_or(crate::sdk::UNKNOWN_DIRECTORY)
    }

    /// Picks the generator to use for `repo`.
    ///
    /// A present `buf.gen.yaml` always wins when the manifest-driven generator
    /// is registered. Otherwise the first applicable generator in tag order is
    /// returned.
    pub fn find_applicable_generator(
        &self,
        repo: &Path,
    ) -> Result<Arc<dyn Generator>, GeneratorError> {
        // Applicability checks walk the filesystem; do them without the lock.
        let candidates: Vec<Arc<dyn Generator>> = self.read().values().cloned().collect();

        if let Some(manifest) = candidates.iter().find(|g| g.sdk_tag() == SdkTag::Buf) {
            if manifest.is_applicable(repo) {
                debug!(repo = %repo.display(), "Manifest present, using buf");
                return Ok(Arc::clone(manifest));
            }
        }

        match candidates
            .into_iter()
            .filter(|g| g.sdk_tag() != SdkTag::Buf)
            .find(|g| g.is_applicable(repo))
        {
            Some(generator) => {
                debug!(repo = %repo.display(), sdk = %generator.sdk_tag(), "Found applicable generator");
                Ok(generator)
            }
            None => Err(GeneratorError::NoApplicableGenerator(repo.to_path_buf())),
        }
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
