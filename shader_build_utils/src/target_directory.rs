use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::info;

use crate::{BuildError, BuildResult};

/// What to do when the target directory already contains files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearPolicy {
    /// Ask the caller for confirmation before deleting anything
    #[default]
    Ask,
    /// Delete the contents without asking
    Force,
    /// Refuse to touch a non-empty directory
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetDirectoryState {
    Missing,
    NotADirectory,
    Empty,
    NonEmpty(Vec<PathBuf>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetDirectoryAction {
    Create,
    UseAsIs,
    Clear,
    ConfirmClear,
    FailNotADirectory,
    FailNotEmpty,
}

impl TargetDirectoryState {
    pub fn inspect(path: &Path) -> BuildResult<Self> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::Missing),
            Err(e) => {
                return Err(BuildError::io(format!("Could not inspect {:?}", path))(e));
            }
        };

        if !metadata.is_dir() {
            return Ok(Self::NotADirectory);
        }

        let mut entries = fs::read_dir(path)
            .map_err(BuildError::io(format!("Could not open directory {:?}", path)))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<io::Result<Vec<_>>>()
            .map_err(BuildError::io(format!("While listing directory {:?}", path)))?;
        entries.sort();

        if entries.is_empty() {
            Ok(Self::Empty)
        } else {
            Ok(Self::NonEmpty(entries))
        }
    }

    pub fn action(&self, policy: ClearPolicy) -> TargetDirectoryAction {
        match (self, policy) {
            (Self::Missing, _) => TargetDirectoryAction::Create,
            (Self::NotADirectory, _) => TargetDirectoryAction::FailNotADirectory,
            (Self::Empty, _) => TargetDirectoryAction::UseAsIs,
            (Self::NonEmpty(_), ClearPolicy::Force) => TargetDirectoryAction::Clear,
            (Self::NonEmpty(_), ClearPolicy::Ask) => TargetDirectoryAction::ConfirmClear,
            (Self::NonEmpty(_), ClearPolicy::Never) => TargetDirectoryAction::FailNotEmpty,
        }
    }

    pub fn entries(&self) -> &[PathBuf] {
        match self {
            Self::NonEmpty(entries) => entries,
            _ => &[],
        }
    }
}

/// Makes sure `path` exists and is an empty directory.
///
/// `confirm` is only called for a non-empty directory under [`ClearPolicy::Ask`]; it receives the
/// directory and its current entries and returns whether they may be deleted.
pub fn prepare_target_directory<F>(path: &Path, policy: ClearPolicy, confirm: F) -> BuildResult<()>
where
    F: FnOnce(&Path, &[PathBuf]) -> bool,
{
    let state = TargetDirectoryState::inspect(path)?;
    match state.action(policy) {
        TargetDirectoryAction::Create => create(path),
        TargetDirectoryAction::UseAsIs => Ok(()),
        TargetDirectoryAction::Clear => clear(path),
        TargetDirectoryAction::ConfirmClear => {
            if confirm(path, state.entries()) {
                clear(path)
            } else {
                Err(BuildError::ClearDeclined(path.to_path_buf()))
            }
        }
        TargetDirectoryAction::FailNotADirectory => {
            Err(BuildError::TargetNotADirectory(path.to_path_buf()))
        }
        TargetDirectoryAction::FailNotEmpty => Err(BuildError::TargetNotEmpty(path.to_path_buf())),
    }
}

fn create(path: &Path) -> BuildResult<()> {
    info!("Creating target directory {:?}", path);
    fs::create_dir_all(path).map_err(BuildError::io(format!("Could not create {:?}", path)))
}

fn clear(path: &Path) -> BuildResult<()> {
    info!("Clearing target directory {:?}", path);
    fs::remove_dir_all(path).map_err(BuildError::io(format!("Could not remove {:?}", path)))?;
    create(path)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{
        prepare_target_directory, ClearPolicy, TargetDirectoryAction, TargetDirectoryState,
    };
    use crate::BuildError;

    #[test]
    fn decision_table() {
        let non_empty = TargetDirectoryState::NonEmpty(vec!["a.ir".into()]);

        for policy in [ClearPolicy::Ask, ClearPolicy::Force, ClearPolicy::Never] {
            assert_eq!(
                TargetDirectoryState::Missing.action(policy),
                TargetDirectoryAction::Create
            );
            assert_eq!(
                TargetDirectoryState::Empty.action(policy),
                TargetDirectoryAction::UseAsIs
            );
            assert_eq!(
                TargetDirectoryState::NotADirectory.action(policy),
                TargetDirectoryAction::FailNotADirectory
            );
        }

        assert_eq!(
            non_empty.action(ClearPolicy::Ask),
            TargetDirectoryAction::ConfirmClear
        );
        assert_eq!(
            non_empty.action(ClearPolicy::Force),
            TargetDirectoryAction::Clear
        );
        assert_eq!(
            non_empty.action(ClearPolicy::Never),
            TargetDirectoryAction::FailNotEmpty
        );
    }

    #[test]
    fn creates_missing_directory_with_parents() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("build").join("shaders");

        prepare_target_directory(&target, ClearPolicy::Ask, |_, _| {
            panic!("nothing to confirm")
        })
        .unwrap();

        assert!(target.is_dir());
        assert_eq!(
            TargetDirectoryState::inspect(&target).unwrap(),
            TargetDirectoryState::Empty
        );
    }

    #[test]
    fn empty_directory_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("out");

        for _ in 0..2 {
            prepare_target_directory(&target, ClearPolicy::Ask, |_, _| {
                panic!("an empty directory never asks")
            })
            .unwrap();
            assert!(target.is_dir());
        }
    }

    #[test]
    fn file_in_the_way() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("out");
        fs::write(&target, "not a directory").unwrap();

        let result = prepare_target_directory(&target, ClearPolicy::Force, |_, _| true);

        assert!(matches!(result, Err(BuildError::TargetNotADirectory(p)) if p == target));
        assert_eq!(fs::read_to_string(&target).unwrap(), "not a directory");
    }

    #[test]
    fn confirmed_clear_empties_directory() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("out");
        fs::create_dir_all(target.join("nested")).unwrap();
        fs::write(target.join("old.ir"), "old").unwrap();

        let mut seen = vec![];
        prepare_target_directory(&target, ClearPolicy::Ask, |_, entries| {
            seen = entries.to_vec();
            true
        })
        .unwrap();

        assert_eq!(seen, vec![target.join("nested"), target.join("old.ir")]);
        assert_eq!(
            TargetDirectoryState::inspect(&target).unwrap(),
            TargetDirectoryState::Empty
        );
    }

    #[test]
    fn declined_clear_leaves_directory_untouched() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("out");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("old.ir"), "old").unwrap();

        let result = prepare_target_directory(&target, ClearPolicy::Ask, |_, _| false);

        assert!(matches!(result, Err(BuildError::ClearDeclined(_))));
        assert_eq!(fs::read_to_string(target.join("old.ir")).unwrap(), "old");
    }

    #[test]
    fn forced_and_refused_clears() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("out");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("old.ir"), "old").unwrap();

        let result = prepare_target_directory(&target, ClearPolicy::Never, |_, _| true);
        assert!(matches!(result, Err(BuildError::TargetNotEmpty(_))));
        assert!(target.join("old.ir").exists());

        prepare_target_directory(&target, ClearPolicy::Force, |_, _| {
            panic!("force never asks")
        })
        .unwrap();
        assert!(!target.join("old.ir").exists());
        assert!(target.is_dir());
    }
}
