//! Entrypoint for CLI
use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
};

use jackc::{JackError, JackResult, IMPL_VERSION};
use log::{error, info};

static USAGE: &str = r#"
usage: jackc --in DIR [--xml] [DIR]

Compiles every .jack file found under DIR into a .vm file written
next to its source.

options:
    --in DIR    input directory to scan for .jack sources; a bare
                trailing DIR works as well
    --xml       also write the golden-output XML artifacts next to
                each source (xT.out.xml token stream, x.out.xml
                parse tree)

examples:
    jackc --in projects/Square
    jackc --xml projects/Square
"#;

// Exit codes
const ARG_FAIL: i32 = 1;
const FS_FAIL: i32 = 2;
const COMPILE_FAIL: i32 = 3;

struct Args {
    in_dir: PathBuf,
    xml: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut in_dir: Option<PathBuf> = None;
    let mut xml = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--in" => match args.next() {
                Some(dir) => in_dir = Some(PathBuf::from(dir)),
                None => return Err("--in requires a directory argument".to_string()),
            },
            "--xml" => xml = true,
            _ if arg.starts_with('-') => {
                return Err(format!("unknown option '{}'", arg));
            }
            // A bare directory argument stands in for --in.
            _ if in_dir.is_none() => in_dir = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument '{}'", arg)),
        }
    }

    match in_dir {
        Some(in_dir) => Ok(Args { in_dir, xml }),
        None => Err("the input path is not set".to_string()),
    }
}

/// Recursively collect all .jack files under the given directory.
fn collect_jack_files(dir: &Path, matched: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_jack_files(&path, matched)?;
        } else if path.extension().is_some_and(|ext| ext == "jack") {
            matched.push(path);
        }
    }
    Ok(())
}

fn token_xml_path(source_path: &Path) -> PathBuf {
    let stem = source_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    source_path.with_file_name(format!("{stem}T.out.xml"))
}

/// Compile one source file. Output files are written only after
/// their producing phase finished without error, so a failed
/// compilation leaves no partial artifacts behind.
fn compile_file(path: &Path, xml: bool) -> JackResult<()> {
    info!("compiling {}", path.display());
    let source = fs::read_to_string(path)?;

    if xml {
        let tokens = jackc::tokenize(&source)?;
        let out_path = token_xml_path(path);
        info!("writing {}", out_path.display());
        fs::write(out_path, jackc::tokens_xml(&tokens))?;
    }

    let class = jackc::parse_str(&source)?;

    if xml {
        let out_path = path.with_extension("out.xml");
        info!("writing {}", out_path.display());
        fs::write(out_path, jackc::tree_xml(&class))?;
    }

    let vm_text = jackc::codegen::CodeGen::new().compile(&class)?;
    let out_path = path.with_extension("vm");
    info!("writing {}", out_path.display());
    fs::write(out_path, vm_text)?;

    Ok(())
}

fn print_usage() {
    println!("jackc v{IMPL_VERSION}");
    println!("{USAGE}");
}

fn main() {
    simple_logger::SimpleLogger::new().env().init().unwrap();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            error!("argument error: {message}");
            print_usage();
            std::process::exit(ARG_FAIL);
        }
    };

    if !args.in_dir.is_dir() {
        error!(
            "file system error: input path \"{}\" is not a directory",
            args.in_dir.display()
        );
        std::process::exit(FS_FAIL);
    }

    let mut files = Vec::new();
    if let Err(err) = collect_jack_files(&args.in_dir, &mut files) {
        error!("file system error: {err}");
        std::process::exit(FS_FAIL);
    }

    // Every file compiles against its own pipeline state, so the
    // workers share nothing but the error channel.
    let xml = args.xml;
    let (tx, rx) = mpsc::channel::<(PathBuf, JackError)>();
    thread::scope(|scope| {
        for path in &files {
            let tx = tx.clone();
            scope.spawn(move || {
                if let Err(err) = compile_file(path, xml) {
                    let _ = tx.send((path.clone(), err));
                }
            });
        }
    });
    drop(tx);

    let failures: Vec<(PathBuf, JackError)> = rx.into_iter().collect();
    if !failures.is_empty() {
        error!("errors during compilation:");
        for (path, err) in &failures {
            error!("{}: {}", path.display(), err);
        }
        std::process::exit(COMPILE_FAIL);
    }
}
