//! Minify Python source files.
//!
//! ```text
//! parsek-minify app.py              # writes app_min.py
//! parsek-minify app.py -o out.py -r # writes a read-only out.py
//! cat app.py | parsek-minify -      # writes to stdout
//! ```

use clap::Parser;
use parsek::minify::{derive_output_path, minify_with_stats};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "parsek-minify", version, about = "Strip comments, debug blocks and assertions from Python source")]
struct Args {
    /// Input file, or `-` for stdin
    input: String,

    /// Output file [default: <stem>_min.py, or <name>_min for other suffixes, in the current directory]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Make the output file read-only
    #[arg(short, long)]
    readonly: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let from_stdin = args.input == "-";
    let src = if from_stdin {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("reading stdin: {}", e))?;
        buf
    } else {
        fs::read_to_string(&args.input).map_err(|e| format!("reading {}: {}", args.input, e))?
    };

    let (out, stats) = minify_with_stats(&src).map_err(|e| e.to_string())?;

    let target = match &args.output {
        Some(path) => Some(path.clone()),
        None if from_stdin => None,
        None => Some(derive_output_path(Path::new(&args.input))),
    };
    match target {
        None => io::stdout()
            .write_all(out.as_bytes())
            .map_err(|e| format!("writing stdout: {}", e))?,
        Some(path) => {
            let existed = fs::symlink_metadata(&path).is_ok();
            if let Err(e) = fs::write(&path, &out) {
                // only clean up a partial file this run created
                if !existed {
                    let _ = fs::remove_file(&path);
                }
                return Err(format!("writing {}: {}", path.display(), e));
            }
            if args.readonly {
                if let Err(e) = make_readonly(&path) {
                    eprintln!("Warning: could not make {} read-only: {}", path.display(), e);
                }
            }
            eprintln!(
                "{} -> {} ({} debug blocks, {} assertions removed)",
                args.input,
                path.display(),
                stats.debug_blocks,
                stats.assertions
            );
        }
    }
    Ok(())
}

fn make_readonly(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(true);
    fs::set_permissions(path, perms)
}
