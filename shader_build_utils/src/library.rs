use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};

use crate::{
    toolchain::{append_extension, INTERMEDIATE_EXTENSION, LIBRARY_EXTENSION},
    BuildError, BuildResult, Toolchain,
};

/// Lists the intermediate files sitting directly inside `directory`, sorted by path
pub fn collect_intermediate_files(directory: &Path) -> BuildResult<Vec<PathBuf>> {
    let entries = fs::read_dir(directory)
        .map_err(BuildError::io(format!("Could not open directory {:?}", directory)))?;

    let mut files = vec![];
    for entry in entries {
        let entry =
            entry.map_err(BuildError::io(format!("While listing directory {:?}", directory)))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path
            .extension()
            .is_some_and(|extension| extension == INTERMEDIATE_EXTENSION)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Links every intermediate file found in `directory` into `<library_target>.metallib`.
///
/// Returns `None` without calling the linker when there is nothing to link.
/// A failing linker is only fatal when `strict` is set.
pub fn package_library<T: Toolchain + ?Sized>(
    toolchain: &mut T,
    directory: &Path,
    library_target: &Path,
    strict: bool,
) -> BuildResult<Option<PathBuf>> {
    let inputs = collect_intermediate_files(directory)?;
    if inputs.is_empty() {
        info!(
            "No .{} files found in {:?}, no library was created",
            INTERMEDIATE_EXTENSION, directory
        );
        return Ok(None);
    }

    let library = append_extension(library_target, LIBRARY_EXTENSION);
    info!("Linking {:?} from {} files:", library, inputs.len());
    for input in &inputs {
        info!("    {:?}", input);
    }

    match toolchain.link_library(&library, &inputs) {
        Ok(status) if status.success() => {}
        Ok(status) if strict => {
            return Err(BuildError::ToolFailed {
                tool: "metallib".to_owned(),
                status,
                output: library,
            });
        }
        Ok(status) => warn!("Linking {:?} failed with {}", library, status),
        Err(e) if strict => return Err(e),
        Err(e) => warn!("{}", e),
    }

    Ok(Some(library))
}
