use std::path::{Path, PathBuf};
use anyhow::Context;
use structopt::StructOpt;
use tracing::info;
use templar_compiler::codegen::CodeGenerator;
use templar_compiler::{analyze_ir, build_ir, print_ir, CompileOptions, Ir, Target};

#[derive(StructOpt, Debug)]
struct OptionFlags {
    /// JSON file with `CompileOptions` (camelCase keys); flags below override it.
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// Everything `compile` turns on: minify, inline cache, static optimization.
    #[structopt(long)]
    optimized: bool,
    #[structopt(long)]
    minify: bool,
    #[structopt(long)]
    inline_cache: bool,
    #[structopt(long)]
    static_optimization: bool,
    /// js or wasm
    #[structopt(long)]
    target: Option<Target>,
}

impl OptionFlags {
    fn resolve(&self) -> anyhow::Result<CompileOptions> {
        let mut options = match &self.config {
            Some(path) => {
                let config = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&config)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => CompileOptions::default(),
        };
        if self.optimized {
            options.minify = true;
            options.inline_cache = true;
            options.static_optimization = true;
        }
        options.minify |= self.minify;
        options.inline_cache |= self.inline_cache;
        options.static_optimization |= self.static_optimization;
        if let Some(target) = self.target {
            options.target = target;
        }
        Ok(options)
    }
}

#[derive(StructOpt, Debug)]
#[structopt(
    name="templar",
    about = "compile markup templates into UI-tree construction code",
)]
enum Cli {
    /// Compile a template to a JavaScript factory.
    Compile {
        #[structopt(short, long, parse(from_os_str))]
        source: PathBuf,
        #[structopt(short, long, parse(from_os_str))]
        output: Option<PathBuf>,
        #[structopt(flatten)]
        flags: OptionFlags,
    },
    /// Print the optimized IR of a template.
    Ir {
        #[structopt(short, long, parse(from_os_str))]
        source: PathBuf,
        /// Serialized IR instead of the listing.
        #[structopt(long)]
        json: bool,
    },
    /// Print IR statistics as JSON.
    Analyze {
        #[structopt(short, long, parse(from_os_str))]
        source: PathBuf,
    },
    /// Generate code from a serialized IR file.
    Emit {
        #[structopt(long, parse(from_os_str))]
        ir: PathBuf,
        #[structopt(short, long, parse(from_os_str))]
        output: Option<PathBuf>,
        #[structopt(flatten)]
        flags: OptionFlags,
    },
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_ir(path: &Path) -> anyhow::Result<Ir> {
    let source = read_source(path)?;
    let ir = build_ir(&source).with_context(|| format!("compiling {}", path.display()))?;
    Ok(ir)
}

fn write_output(output: Option<PathBuf>, default: impl FnOnce() -> Option<PathBuf>, code: &str) -> anyhow::Result<()> {
    match output.or_else(default) {
        Some(output_path) => {
            if let Some(parent) = output_path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            std::fs::write(&output_path, code)
                .with_context(|| format!("writing {}", output_path.display()))?;
            info!(path = %output_path.display(), "wrote output");
        }
        None => println!("{}", code),
    }
    Ok(())
}

pub fn run_cli() -> anyhow::Result<()> {
    match Cli::from_args() {
        Cli::Compile{source: source_path, output, flags} => {
            let options = flags.resolve()?;
            let ir = load_ir(&source_path)?;
            let generated = CodeGenerator::new(&options).generate(&ir);
            write_output(output, || {
                let mut path = source_path.clone();
                path.set_extension("js");
                Some(path)
            }, &generated.code)
        }
        Cli::Ir{source, json} => {
            let ir = load_ir(&source)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&ir)?);
            } else {
                print!("{}", print_ir(&ir));
            }
            Ok(())
        }
        Cli::Analyze{source} => {
            let ir = load_ir(&source)?;
            println!("{}", serde_json::to_string_pretty(&analyze_ir(&ir))?);
            Ok(())
        }
        Cli::Emit{ir: ir_path, output, flags} => {
            let options = flags.resolve()?;
            let ir: Ir = serde_json::from_str(&read_source(&ir_path)?)
                .with_context(|| format!("parsing ir {}", ir_path.display()))?;
            let generated = CodeGenerator::new(&options).generate(&ir);
            for anomaly in &generated.anomalies {
                eprintln!("warning: {}", anomaly);
            }
            write_output(output, || None, &generated.code)
        }
    }
}
