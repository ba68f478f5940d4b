use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    process::ExitStatus,
};

use crate::{BuildResult, Toolchain};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Compile { source: PathBuf, output: PathBuf },
    Link { output: PathBuf, inputs: Vec<PathBuf> },
}

/// Writes placeholder files instead of running the real tools, remembering every call
#[derive(Default)]
pub struct RecordingToolchain {
    pub calls: Vec<ToolCall>,
    pub failing_sources: HashSet<PathBuf>,
    pub failing_link: bool,
}

impl RecordingToolchain {
    pub fn failing_on(mut self, source: impl Into<PathBuf>) -> Self {
        self.failing_sources.insert(source.into());
        self
    }

    pub fn compiled_outputs(&self) -> Vec<PathBuf> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                ToolCall::Compile { output, .. } => Some(output.clone()),
                ToolCall::Link { .. } => None,
            })
            .collect()
    }

    pub fn links(&self) -> Vec<(PathBuf, Vec<PathBuf>)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                ToolCall::Link { output, inputs } => Some((output.clone(), inputs.clone())),
                ToolCall::Compile { .. } => None,
            })
            .collect()
    }
}

impl Toolchain for RecordingToolchain {
    fn compile_native(&mut self, source: &Path, output: &Path) -> BuildResult<ExitStatus> {
        self.calls.push(ToolCall::Compile {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
        });
        if self.failing_sources.contains(source) {
            return Ok(exit_status(1));
        }
        fs::write(output, source.to_string_lossy().as_bytes()).unwrap();
        Ok(exit_status(0))
    }

    fn link_library(&mut self, output: &Path, inputs: &[PathBuf]) -> BuildResult<ExitStatus> {
        self.calls.push(ToolCall::Link {
            output: output.to_path_buf(),
            inputs: inputs.to_vec(),
        });
        if self.failing_link {
            return Ok(exit_status(1));
        }
        fs::write(output, format!("{} modules", inputs.len())).unwrap();
        Ok(exit_status(0))
    }
}

#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}

pub fn touch(path: impl AsRef<Path>) {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "").unwrap();
}
