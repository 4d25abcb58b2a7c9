use std::path::PathBuf;

use structopt::StructOpt;

use hmmc::error::SourceMetadata;
use hmmc::eval::Interpreter;
use hmmc::grammar::lexer::tokenize;
use hmmc::grammar::Warning;
use hmmc::ir::module::TargetConfig;

use tracing_subscriber::fmt;

fn main() {
    if let Err(ref e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), anyhow::Error> {
    use std::fs;

    let opt = Opt::from_args();

    if let Some((_, filter)) = std::env::vars().find(|x| x.0 == "HMMC_TRACE") {
        fmt::Subscriber::builder()
            .with_ansi(true)
            .pretty()
            .with_env_filter(filter)
            .init();
    }

    let filename = opt.file;
    let file = fs::read_to_string(&filename)?;
    let meta = SourceMetadata::new(&file).with_file(filename.clone());

    if opt.tokens {
        for token in tokenize(&meta)? {
            println!(
                "{:?} {:?} {:?}",
                token.kind, token.source.source, token.value
            );
        }
        return Ok(());
    }

    if opt.ast || opt.eval {
        let parsed = hmmc::parse_source(&meta)?;
        report_warnings(&parsed.warnings);
        log::debug!("parsed {} top level statements", parsed.program.body.len());
        if opt.ast {
            println!("{:#?}", parsed.program);
        } else {
            let mut interpreter = Interpreter::new();
            parsed.program.accept(&mut interpreter)?;
            for line in interpreter.output() {
                println!("{}", line);
            }
        }
        return Ok(());
    }

    let mut target = TargetConfig::default();
    if let Some(triple) = opt.target_triple {
        target = target.with_triple(triple);
    }
    let module_name = filename
        .file_name()
        .map_or_else(|| "main".into(), |name| name.to_string_lossy());
    let compiled = hmmc::compile(&meta, &module_name, &target)?;
    report_warnings(&compiled.warnings);

    let out_file = opt.output.unwrap_or_else(|| filename.with_extension("ll"));
    log::debug!(
        "writing {} bytes to {}",
        compiled.ir.len(),
        out_file.display()
    );
    fs::write(out_file, compiled.ir)?;

    Ok(())
}

fn report_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
}

#[derive(Debug, StructOpt)]
struct Opt {
    /// The file to compile
    #[structopt(parse(from_os_str))]
    file: PathBuf,
    /// The (optional) output file; defaults to the input with an `.ll` extension
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<PathBuf>,
    /// Target triple written into the module header
    #[structopt(long = "target-triple")]
    target_triple: Option<String>,
    /// Evaluate the program and print its output instead of compiling it
    #[structopt(long)]
    eval: bool,
    /// Dump the token stream and exit
    #[structopt(long)]
    tokens: bool,
    /// Dump the syntax tree and exit
    #[structopt(long)]
    ast: bool,
}
