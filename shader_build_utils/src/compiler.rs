use std::{
    collections::HashMap,
    ffi::OsStr,
    path::{Path, PathBuf},
    process::ExitStatus,
};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    library::package_library,
    target_directory::{prepare_target_directory, ClearPolicy},
    toolchain::{append_extension, INTERMEDIATE_EXTENSION},
    BuildError, BuildResult, ExtensionTable, ShaderFamily, ShaderKind, Toolchain,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    clear_policy: ClearPolicy,
    strict: bool,
}

impl BuildOptions {
    pub fn clear_policy(mut self, clear_policy: ClearPolicy) -> Self {
        self.clear_policy = clear_policy;
        self
    }

    /// In strict mode output name collisions and failing tools abort the build
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledShader {
    pub source: PathBuf,
    pub output: PathBuf,
    /// `None` when the compiler could not be started at all
    pub status: Option<ExitStatus>,
}

impl CompiledShader {
    pub fn succeeded(&self) -> bool {
        self.status.is_some_and(|status| status.success())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompileReport {
    pub compiled: Vec<CompiledShader>,
    /// Portable sources that were found but not translated
    pub pending_portable: Vec<PathBuf>,
    /// Outputs that were written by more than one source
    pub collisions: Vec<PathBuf>,
}

impl CompileReport {
    pub fn failures(&self) -> impl Iterator<Item = &CompiledShader> {
        self.compiled.iter().filter(|shader| !shader.succeeded())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub compile: CompileReport,
    pub library: Option<PathBuf>,
}

/// Flattens a directory relative to the source root and a file name into an output base name,
/// e.g. `fx/post` and `glow.frag.metal` become `fx_post_glow`.
///
/// Returns `None` when the directory or the file name is not valid UTF-8.
pub fn output_base_name(relative_dir: &Path, file_name: &OsStr) -> Option<String> {
    let prefix = relative_dir
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?
        .join("_");
    let file_name = file_name.to_str()?;
    let stem = file_name.split('.').next().unwrap_or(file_name);

    if prefix.is_empty() {
        Some(stem.to_owned())
    } else {
        Some(format!("{}_{}", prefix, stem))
    }
}

pub struct ShaderCompiler<T: Toolchain> {
    toolchain: T,
    extensions: ExtensionTable,
    options: BuildOptions,
}

impl<T: Toolchain> ShaderCompiler<T> {
    pub fn new(toolchain: T) -> Self {
        Self {
            toolchain,
            extensions: ExtensionTable::default(),
            options: BuildOptions::default(),
        }
    }

    pub fn extensions(mut self, extensions: ExtensionTable) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Runs the whole pipeline: validates the source directory, prepares the target directory,
    /// compiles every shader found and links the results into one library
    pub fn build<F>(
        &mut self,
        source_directory: &Path,
        target_directory: &Path,
        library_target: &Path,
        confirm_clear: F,
    ) -> BuildResult<BuildReport>
    where
        F: FnOnce(&Path, &[PathBuf]) -> bool,
    {
        if !source_directory.is_dir() {
            return Err(BuildError::SourceNotADirectory(
                source_directory.to_path_buf(),
            ));
        }

        prepare_target_directory(target_directory, self.options.clear_policy, confirm_clear)?;
        let compile = self.compile(source_directory, target_directory)?;
        let library = self.package(target_directory, library_target)?;

        Ok(BuildReport { compile, library })
    }

    pub fn compile(
        &mut self,
        source_directory: &Path,
        target_directory: &Path,
    ) -> BuildResult<CompileReport> {
        let mut report = CompileReport::default();
        let mut written_by: HashMap<PathBuf, PathBuf> = HashMap::new();
        debug!(
            "Native extensions: {:?}, portable extensions: {:?}",
            self.extensions
                .extensions_of(ShaderFamily::Native)
                .collect::<Vec<_>>(),
            self.extensions
                .extensions_of(ShaderFamily::Portable)
                .collect::<Vec<_>>()
        );

        for entry in WalkDir::new(source_directory).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read an entry of {:?}: {}", source_directory, e);
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }

            let Some(kind) = self
                .extensions
                .classify(&entry.file_name().to_string_lossy())
            else {
                debug!("Ignoring {:?}", entry.path());
                continue;
            };

            let source = entry.path();
            let relative_dir = source
                .parent()
                .and_then(|parent| parent.strip_prefix(source_directory).ok())
                .unwrap_or(Path::new(""));
            let Some(base_name) = output_base_name(relative_dir, entry.file_name()) else {
                warn!("Skipping {:?}, its path is not valid UTF-8", source);
                continue;
            };
            let output_base = target_directory.join(base_name);

            match kind.family() {
                ShaderFamily::Native => {
                    let output = append_extension(&output_base, INTERMEDIATE_EXTENSION);
                    let previous = written_by.insert(output.clone(), source.to_path_buf());
                    if let Some(previous) = previous {
                        if self.options.strict {
                            return Err(BuildError::OutputCollision {
                                first: previous,
                                second: source.to_path_buf(),
                                output,
                            });
                        }
                        warn!(
                            "{:?} overwrites the output of {:?} at {:?}",
                            source, previous, output
                        );
                        report.collisions.push(output.clone());
                    }

                    let status = self.compile_native(source, &output)?;
                    report.compiled.push(CompiledShader {
                        source: source.to_path_buf(),
                        output,
                        status,
                    });
                }
                ShaderFamily::Portable => {
                    Self::compile_portable(kind, source, &output_base);
                    report.pending_portable.push(source.to_path_buf());
                }
            }
        }

        Ok(report)
    }

    pub fn package(
        &mut self,
        target_directory: &Path,
        library_target: &Path,
    ) -> BuildResult<Option<PathBuf>> {
        package_library(
            &mut self.toolchain,
            target_directory,
            library_target,
            self.options.strict,
        )
    }

    fn compile_native(&mut self, source: &Path, output: &Path) -> BuildResult<Option<ExitStatus>> {
        info!("Compiling metal shader from {:?} to {:?}", source, output);

        match self.toolchain.compile_native(source, output) {
            Ok(status) if status.success() => Ok(Some(status)),
            Ok(status) if self.options.strict => Err(BuildError::ToolFailed {
                tool: "metal".to_owned(),
                status,
                output: output.to_path_buf(),
            }),
            Ok(status) => {
                warn!("Compiling {:?} failed with {}", source, status);
                Ok(Some(status))
            }
            Err(e) if self.options.strict => Err(e),
            Err(e) => {
                warn!("{}", e);
                Ok(None)
            }
        }
    }

    // TODO: translate portable sources to SPIR-V once a runtime consumes them
    fn compile_portable(kind: ShaderKind, source: &Path, output_base: &Path) {
        info!(
            "{:?} compilation of {:?} to {:?} is not supported yet, skipping",
            kind, source, output_base
        );
    }
}
