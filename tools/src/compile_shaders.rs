use std::{
    io::{self, BufRead, Write},
    path::{Component, Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::{error::ErrorKind, Parser};
use shader_build_utils::{BuildOptions, ClearPolicy, ShaderCompiler, XcrunToolchain};

const USAGE: &str = "compile_shaders <source directory> <target directory> <library target path>";

/// Compiles every shader below a source directory and links the results into one library
#[derive(Parser, Debug)]
#[command(version, about)]
struct CompileShadersArgs {
    /// Directory that is searched recursively for shader sources
    source_directory: PathBuf,

    /// Directory receiving the intermediate files, created or emptied before compiling
    target_directory: PathBuf,

    /// Path of the library to produce, `.metallib` is appended
    library_target_path: PathBuf,

    /// Empty a non-empty target directory without asking
    #[arg(short, long)]
    force: bool,

    /// Fail on output name collisions and on failing compiler or linker invocations
    #[arg(long)]
    strict: bool,

    /// SDK passed to xcrun
    #[arg(long, default_value = "macosx")]
    sdk: String,

    /// xcrun executable used to locate the Metal tools
    #[arg(long, default_value = "xcrun")]
    xcrun: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = CompileShadersArgs::try_parse()
        .map_err(usage_error)
        .and_then(run);
    ExitCode::from(finish(result, &mut io::stdout()))
}

/// Help and version requests exit right away, every other parse error becomes a usage error
fn usage_error(e: clap::Error) -> anyhow::Error {
    if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        e.exit()
    }
    log::debug!("{}", e);
    anyhow::anyhow!("invalid arguments ({:?}), usage: {}", e.kind(), USAGE)
}

/// Prints a fatal error as a single `[ERROR]` line and returns the process exit status
fn finish(result: anyhow::Result<()>, out: &mut impl Write) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            let message = format!("{:#}", e).replace('\n', " ");
            let _ = writeln!(out, "[ERROR] {}", message);
            1
        }
    }
}

fn run(args: CompileShadersArgs) -> anyhow::Result<()> {
    let source_directory = absolute(&args.source_directory)?;
    println!("source: {}", source_directory.display());
    let target_directory = absolute(&args.target_directory)?;
    println!("target: {}", target_directory.display());
    let library_target = absolute(&args.library_target_path)?;

    let clear_policy = if args.force {
        ClearPolicy::Force
    } else {
        ClearPolicy::Ask
    };
    let options = BuildOptions::default()
        .clear_policy(clear_policy)
        .strict(args.strict);
    let toolchain = XcrunToolchain::new().xcrun(args.xcrun).sdk(args.sdk);

    let report = ShaderCompiler::new(toolchain).options(options).build(
        &source_directory,
        &target_directory,
        &library_target,
        |directory, entries| {
            confirm_clear(
                io::stdin().lock(),
                &mut io::stdout(),
                directory,
                entries,
            )
        },
    )?;

    let failures = report.compile.failures().count();
    if failures > 0 {
        log::warn!(
            "{} of {} shaders failed to compile",
            failures,
            report.compile.compiled.len()
        );
    }
    match report.library {
        Some(library) => println!("library: {}", library.display()),
        None => println!("no intermediate files found, no library was created"),
    }

    Ok(())
}

/// Makes `path` absolute and folds away `.` and `..` without touching the filesystem
fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    let path = std::path::absolute(path).context(format!("Could not resolve {:?}", path))?;
    Ok(normalize(&path))
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Lists the entries of `directory` and reads one answer from `input`.
/// End of input or a read error declines.
fn confirm_clear(
    mut input: impl BufRead,
    out: &mut impl Write,
    directory: &Path,
    entries: &[PathBuf],
) -> bool {
    let _ = writeln!(out, "{} is not empty, it contains:", directory.display());
    for entry in entries {
        let _ = writeln!(out, "    {}", entry.display());
    }
    let _ = write!(out, "Delete its contents? [Y/n] ");
    if out.flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) => {
            let _ = writeln!(out);
            log::warn!("No answer was given, keeping {:?}", directory);
            false
        }
        Ok(_) => parse_confirmation(&answer),
        Err(e) => {
            log::error!("While reading the answer: {e:?}");
            false
        }
    }
}

/// An empty answer accepts the default, which is to clear the directory
fn parse_confirmation(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    matches!(answer.as_str(), "" | "y" | "yes")
}
