use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use csvparse::{Table, Writer};

/// Exit code for a flag that isn't recognized.
const EXIT_UNKNOWN_FLAG: i32 = 254;
/// Exit code for every other command line problem.
const EXIT_USAGE: i32 = 255;

/// Parse CSV files into tables and write them back out.
#[derive(Debug, Parser)]
#[command(name = "csvparse", version)]
struct Args {
    /// CSV files to parse.
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
    /// Write each parsed table to stdout. This is the default when no
    /// other action is selected.
    #[arg(short, long)]
    print: bool,
    /// Print the header, row count and field count of each table.
    #[arg(short, long)]
    stats: bool,
    /// Write every parsed table, in order, to this file.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

impl Args {
    fn print(&self) -> bool {
        self.print || (!self.stats && self.output.is_none())
    }
}

fn main() {
    init_logging();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = match err.kind() {
                ClapErrorKind::DisplayHelp
                | ClapErrorKind::DisplayVersion => 0,
                ClapErrorKind::UnknownArgument => EXIT_UNKNOWN_FLAG,
                _ => EXIT_USAGE,
            };
            let _ = err.print();
            process::exit(code);
        }
    };
    process::exit(run(&args));
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("CSVPARSE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Parse and handle every file in order, stopping at the first failure.
///
/// The return value is the process exit code.
fn run(args: &Args) -> i32 {
    let mut out = match args.output {
        None => None,
        Some(ref path) => match Writer::from_path(path) {
            Ok(wtr) => Some(wtr),
            Err(err) => return fail(path, &err),
        },
    };
    for path in &args.files {
        let table = match csvparse::parse_path(path) {
            Ok(table) => table,
            Err(err) => return fail(path, &err),
        };
        debug!(
            path = %path.display(),
            rows = table.row_count(),
            fields = table.field_count(),
            "parsed"
        );
        if let Err(err) = handle(args, path, &table, out.as_mut()) {
            return fail(path, &err);
        }
        table.release();
    }
    if let (Some(wtr), Some(path)) = (out.as_mut(), args.output.as_ref()) {
        if let Err(err) = wtr.flush() {
            return fail(path, &csvparse::Error::from(err));
        }
    }
    0
}

fn handle(
    args: &Args,
    path: &Path,
    table: &Table,
    out: Option<&mut Writer<File>>,
) -> csvparse::Result<()> {
    if args.print() {
        csvparse::write(table, io::stdout().lock())?;
    }
    if args.stats {
        print_stats(io::stdout().lock(), path, table)?;
    }
    if let Some(wtr) = out {
        wtr.write_table(table)?;
    }
    Ok(())
}

fn print_stats<W: Write>(
    mut wtr: W,
    path: &Path,
    table: &Table,
) -> io::Result<()> {
    let mut buf = itoa::Buffer::new();
    writeln!(wtr, "file: {}", path.display())?;
    writeln!(wtr, "header: {}", table.header().join(", "))?;
    writeln!(wtr, "rows: {}", buf.format(table.row_count()))?;
    writeln!(wtr, "fields: {}", buf.format(table.field_count()))?;
    wtr.flush()
}

fn fail(path: &Path, err: &csvparse::Error) -> i32 {
    eprintln!("{}: {}", path.display(), err);
    err.code()
}
