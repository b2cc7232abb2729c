use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cmds;

#[derive(Parser)]
#[command(name = "layout-gen")]
#[command(about = "Heap object layout compiler for the managed runtime", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /* Generate the D and JS accessor libraries from a layout schema */
    Codegen {
        /* Input YAML schema (defaults to the built-in runtime schema) */
        #[arg(short = 'f', long = "file", value_name = "FILE")]
        file: Option<PathBuf>,

        /* Output directory for generated code */
        #[arg(short = 'o', long = "output", value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,

        /* Override the path of the D artifact */
        #[arg(long = "d-out", value_name = "PATH")]
        d_out: Option<PathBuf>,

        /* Override the path of the JS artifact */
        #[arg(long = "js-out", value_name = "PATH")]
        js_out: Option<PathBuf>,

        /* Platform pointer width in bytes (4 or 8) */
        #[arg(long = "ptr-width", value_name = "BYTES", default_value_t = 8)]
        ptr_width: u64,

        /* Enable verbose output */
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },

    /* Resolve a layout schema and print per-field offsets and bindings */
    Analyze {
        /* Input YAML schema (defaults to the built-in runtime schema) */
        #[arg(short = 'f', long = "file", value_name = "FILE")]
        file: Option<PathBuf>,

        /* Platform pointer width in bytes (4 or 8) */
        #[arg(long = "ptr-width", value_name = "BYTES", default_value_t = 8)]
        ptr_width: u64,

        /* Print the synthesized layout IR (JSON) after analysis */
        #[arg(long = "print-ir")]
        print_ir: bool,

        /* Restrict the report to a single layout */
        #[arg(long = "layout", value_name = "NAME")]
        layout: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Codegen {
            file,
            output_dir,
            d_out,
            js_out,
            ptr_width,
            verbose,
        } => {
            let outputs = cmds::codegen::OutputPaths::new(&output_dir, d_out, js_out);
            cmds::codegen::run(file, outputs, ptr_width, verbose)?;
        }

        Commands::Analyze {
            file,
            ptr_width,
            print_ir,
            layout,
        } => {
            cmds::analyze::run(file, ptr_width, print_ir, layout)?;
        }
    }

    Ok(())
}
