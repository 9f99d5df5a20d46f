//! Test runner that compares compiler output against .expected.php and .expected.err files
//!
//! Run with: cargo test --test expected_tests
//! Regenerate with: cargo run --bin accept_expected

use libtest_mimic::{Arguments, Failed, Trial};
use phpx_compiler::Compiler;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let arguments = Arguments::from_args();
    let trials = collect_test_files().into_iter().map(trial).collect();
    libtest_mimic::run(&arguments, trials).exit_code()
}

/// Collect all fixture inputs under tests/fixtures
fn collect_test_files() -> Vec<PathBuf> {
    let pattern = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/**/*.php");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .expect("valid glob pattern")
        .filter_map(Result::ok)
        .filter(|path| !path.to_string_lossy().ends_with(".expected.php"))
        .collect();
    files.sort();
    files
}

fn trial(path: PathBuf) -> Trial {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let name = path
        .strip_prefix(&fixtures)
        .unwrap_or(&path)
        .with_extension("")
        .to_string_lossy()
        .replace('\\', "/");

    if name.starts_with("errors/") {
        Trial::test(name, move || check_error(&path))
    } else {
        Trial::test(name, move || check_output(&path))
    }
}

fn check_output(path: &Path) -> Result<(), Failed> {
    let expected_php = path.with_extension("expected.php");
    let expected = fs::read_to_string(&expected_php)
        .map_err(|e| format!("Missing expected file {}: {}", expected_php.display(), e))?;
    let source = fs::read_to_string(path).map_err(|e| e.to_string())?;

    let result = Compiler::default()
        .compile(&source)
        .map_err(|e| format!("Compile error for {}: {}", path.display(), e))?;

    if result.code != expected {
        return Err(format!(
            "Output mismatch: {}\n--- expected ---\n{}\n--- actual ---\n{}",
            path.display(),
            expected,
            result.code
        )
        .into());
    }
    Ok(())
}

fn check_error(path: &Path) -> Result<(), Failed> {
    let expected_err = path.with_extension("expected.err");
    let expected = fs::read_to_string(&expected_err)
        .map_err(|e| format!("Missing expected.err file {}: {}", expected_err.display(), e))?;
    let source = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let filename = path.file_name().and_then(|s| s.to_str()).unwrap_or("unknown");

    match Compiler::default().compile(&source) {
        Ok(_) => Err(format!("Expected error but got success: {}", path.display()).into()),
        Err(e) => {
            let actual = e.render(&source, filename);
            if actual.trim() != expected.trim() {
                return Err(format!(
                    "Error mismatch: {}\n--- expected ---\n{}\n--- actual ---\n{}",
                    path.display(),
                    expected.trim(),
                    actual.trim()
                )
                .into());
            }
            Ok(())
        }
    }
}
