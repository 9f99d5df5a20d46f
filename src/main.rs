use clap::{Parser, Subcommand};
use log::debug;
use phpx_compiler::{CompileError, Compiler, Options};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use walkdir::WalkDir;

const COMPILED_SUFFIX: &str = ".compiled.php";

#[derive(Parser)]
#[command(name = "phpx")]
#[command(about = "PHPX - compile builder-call templates into plain PHP string expressions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile .php files containing PHPX builder calls
    Compile {
        /// Path to .php file or directory
        #[arg(required_unless_present = "stdin")]
        path: Option<PathBuf>,

        /// Builder variable name, without `$`
        #[arg(long)]
        variable: Option<String>,

        /// JSON file with compiler options
        #[arg(long)]
        config: Option<PathBuf>,

        /// Read from stdin, write to stdout
        #[arg(long)]
        stdin: bool,

        /// Output the compile result with metadata as JSON
        #[arg(long)]
        json: bool,

        /// Output file (single input only)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { path, variable, config, stdin, json, out } => {
            let options = match load_options(config.as_deref(), variable) {
                Ok(options) => options,
                Err(message) => {
                    eprintln!("Error: {}", message);
                    return ExitCode::FAILURE;
                }
            };
            let compiler = Compiler::new(options);

            let ok = if stdin {
                compile_stdin(&compiler, json)
            } else if let Some(path) = path {
                compile_path(&compiler, &path, out.as_deref(), json)
            } else {
                eprintln!("Error: provide a file/directory or use --stdin");
                false
            };

            if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
        }
    }
}

fn load_options(config: Option<&Path>, variable: Option<String>) -> Result<Options, String> {
    let mut options = match config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            serde_json::from_str(&text).map_err(|e| format!("Invalid config {}: {}", path.display(), e))?
        }
        None => Options::default(),
    };
    if let Some(variable) = variable {
        options.variable = variable.trim_start_matches('$').to_string();
    }
    debug!("options: {:?}", options);
    Ok(options)
}

fn compile_stdin(compiler: &Compiler, json_output: bool) -> bool {
    let mut source = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut source) {
        eprintln!("Error: failed to read stdin: {}", e);
        return false;
    }

    match compiler.compile(&source) {
        Ok(result) if json_output => match serde_json::to_string(&result) {
            Ok(json) => {
                println!("{}", json);
                true
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                false
            }
        },
        Ok(result) => {
            print!("{}", result.code);
            true
        }
        Err(err) => {
            print_error(&err, &source, "<stdin>");
            false
        }
    }
}

fn compile_path(compiler: &Compiler, path: &Path, out: Option<&Path>, json_output: bool) -> bool {
    if path.is_file() {
        if path.extension().is_none_or(|ext| ext != "php") {
            eprintln!("Error: {} is not a .php file", path.display());
            return false;
        }
        let start = Instant::now();
        let output = out.map(Path::to_path_buf).unwrap_or_else(|| output_path(path, json_output));
        let ok = compile_file(compiler, path, &output, json_output);
        if ok {
            print_summary(1, start.elapsed());
        }
        ok
    } else if path.is_dir() {
        if out.is_some() {
            eprintln!("Error: --out needs a single input file");
            return false;
        }
        compile_directory(compiler, path, json_output)
    } else {
        eprintln!("Error: {} does not exist", path.display());
        false
    }
}

fn compile_directory(compiler: &Compiler, dir: &Path, json_output: bool) -> bool {
    let start = Instant::now();
    let mut file_count = 0;
    let mut failed = 0;

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| is_source(e.path()))
    {
        let path = entry.path();
        if compile_file(compiler, path, &output_path(path, json_output), json_output) {
            file_count += 1;
        } else {
            failed += 1;
        }
    }

    if file_count + failed == 0 {
        eprintln!("No .php files found in {}", dir.display());
        return false;
    }

    print_summary(file_count, start.elapsed());
    failed == 0
}

/// `*.php` inputs, skipping previously compiled output
fn is_source(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    name.ends_with(".php") && !name.ends_with(COMPILED_SUFFIX)
}

/// `page.php` -> `page.compiled.php` (or `page.compiled.json`)
fn output_path(path: &Path, json_output: bool) -> PathBuf {
    let extension = if json_output { "compiled.json" } else { "compiled.php" };
    path.with_extension(extension)
}

fn compile_file(compiler: &Compiler, path: &Path, output: &Path, json_output: bool) -> bool {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: failed to read {}: {}", path.display(), e);
            return false;
        }
    };

    let filename = path.display().to_string();
    let result = match compiler.compile(&source) {
        Ok(result) => result,
        Err(err) => {
            print_error(&err, &source, &filename);
            return false;
        }
    };

    let contents = if json_output {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Error: {}", e);
                return false;
            }
        }
    } else {
        result.code
    };

    if let Err(e) = fs::write(output, contents) {
        eprintln!("Error: failed to write {}: {}", output.display(), e);
        return false;
    }
    print_generated(&output.display().to_string());
    true
}

fn print_error(err: &CompileError, source: &str, filename: &str) {
    if io::stderr().is_terminal() {
        eprint!("{}", err.render_color(source, filename));
    } else {
        eprint!("{}", err.render(source, filename));
    }
}

fn print_generated(path: &str) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("  \x1b[32m✓\x1b[0m {}", path);
    } else {
        eprintln!("  ✓ {}", path);
    }
}

fn print_summary(count: usize, elapsed: std::time::Duration) {
    let is_tty = io::stderr().is_terminal();
    let time_str = format_duration(elapsed);
    let files_word = if count == 1 { "file" } else { "files" };

    if is_tty {
        eprintln!("\n\x1b[1m✨ Compiled {} {} in {}\x1b[0m", count, files_word, time_str);
    } else {
        eprintln!("\n✨ Compiled {} {} in {}", count, files_word, time_str);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
