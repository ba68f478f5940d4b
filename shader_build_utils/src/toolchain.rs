use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

use log::debug;

use crate::{BuildError, BuildResult};

/// Extension of a single compiled, unlinked shader module
pub const INTERMEDIATE_EXTENSION: &str = "ir";
/// Extension appended to the library target path
pub const LIBRARY_EXTENSION: &str = "metallib";

/// The external programs that do the actual compilation work.
/// Both calls block until the tool exits and hand back its exit status untouched.
pub trait Toolchain {
    /// Compiles a single native shader `source` into the intermediate file `output`
    fn compile_native(&mut self, source: &Path, output: &Path) -> BuildResult<ExitStatus>;

    /// Links every file in `inputs` into the library `output`
    fn link_library(&mut self, output: &Path, inputs: &[PathBuf]) -> BuildResult<ExitStatus>;
}

/// Invokes the Metal compiler and linker through `xcrun`
#[derive(Debug, Clone)]
pub struct XcrunToolchain {
    xcrun: PathBuf,
    sdk: String,
}

impl XcrunToolchain {
    pub fn new() -> Self {
        Self {
            xcrun: PathBuf::from("xcrun"),
            sdk: "macosx".to_owned(),
        }
    }

    pub fn xcrun(mut self, xcrun: impl Into<PathBuf>) -> Self {
        self.xcrun = xcrun.into();
        self
    }

    pub fn sdk(mut self, sdk: impl Into<String>) -> Self {
        self.sdk = sdk.into();
        self
    }

    pub fn compile_command(&self, source: &Path, output: &Path) -> Command {
        let mut command = self.command("metal");
        command.arg("-o").arg(output).arg("-c").arg(source);
        command
    }

    pub fn link_command(&self, output: &Path, inputs: &[PathBuf]) -> Command {
        let mut command = self.command("metallib");
        command.arg("-o").arg(output).args(inputs);
        command
    }

    fn command(&self, tool: &str) -> Command {
        let mut command = Command::new(&self.xcrun);
        command.arg("-sdk").arg(&self.sdk).arg(tool);
        command
    }
}

impl Default for XcrunToolchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolchain for XcrunToolchain {
    fn compile_native(&mut self, source: &Path, output: &Path) -> BuildResult<ExitStatus> {
        run(self.compile_command(source, output))
    }

    fn link_library(&mut self, output: &Path, inputs: &[PathBuf]) -> BuildResult<ExitStatus> {
        run(self.link_command(output, inputs))
    }
}

fn run(mut command: Command) -> BuildResult<ExitStatus> {
    debug!("Running {:?}", command);
    command.status().map_err(|source| BuildError::ToolSpawn {
        tool: command.get_program().to_string_lossy().into_owned(),
        source,
    })
}

/// Appends `.extension` to `path` without replacing whatever extension it already has
pub fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut path: OsString = path.as_os_str().to_owned();
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}
