//! vmodgen — compile a VMOD interface description (.vcc) into the C glue,
//! header, and RST documentation a module needs to plug into the runtime.

mod driver;
mod emit;
mod error;
mod lexer;
mod model;
mod parser;
mod spec;
mod types;

use std::path::PathBuf;
use std::process;

use clap::Parser;

use error::VccError;

#[derive(Parser)]
#[command(
    name = "vmodgen",
    version,
    about = "Generate C glue and documentation from a VMOD interface description"
)]
struct Cli {
    /// Input description file. Defaults to ./vmod.vcc when present.
    file: Option<PathBuf>,

    /// Be strict when parsing the input file (warnings become errors)
    #[arg(short = 'N', long)]
    strict: bool,

    /// Output file prefix
    #[arg(short, long, value_name = "PREFIX", default_value = "vcc_if")]
    output: String,

    /// Where to save the generated RST files
    #[arg(short = 'w', long, value_name = "DIR", default_value = ".")]
    rstdir: PathBuf,

    /// Also write automake_boilerplate.am
    #[arg(short, long)]
    boilerplate: bool,
}

fn main() {
    let cli = Cli::parse();

    let input = match cli.file {
        Some(f) => f,
        None => PathBuf::from("vmod.vcc"),
    };
    if !input.is_file() {
        eprintln!("error: input file {} not found", input.display());
        process::exit(2);
    }

    let opts = driver::Options {
        input,
        output_prefix: cli.output,
        rstdir: cli.rstdir,
        strict: cli.strict,
        boilerplate: cli.boilerplate,
    };

    if let Err(err) = driver::compile(&opts) {
        eprintln!("error: {:#}", err);
        let code = err.downcast_ref::<VccError>().map_or(1, VccError::exit_code);
        process::exit(code);
    }
}
