use std::io::{self, Read};
use std::process;
use std::sync::Once;

use astrum::{Config, Session};

static TRACING_INIT: Once = Once::new();

// Exit codes follow sysexits.h
const EX_USAGE: i32 = 64;
const EX_DATAERR: i32 = 65;
const EX_NOINPUT: i32 = 66;
const EX_SOFTWARE: i32 = 70;

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if ASTRUM_LOG or RUST_LOG is set
        let filter = match std::env::var("ASTRUM_LOG") {
            Ok(directives) => EnvFilter::new(directives),
            Err(_) if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
            Err(_) => return,
        };

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true).with_writer(io::stderr))
            .with(filter)
            .init();
    });
}

fn print_usage() {
    eprintln!("Usage: astrum [file.astr]");
    eprintln!();
    eprintln!("Runs the given file, or the program read from stdin when no file is given.");
    eprintln!("Set ASTRUM_LOG (e.g. ASTRUM_LOG=astrum=debug) to trace the interpreter.");
}

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 2 || args.iter().skip(1).any(|arg| arg == "-h" || arg == "--help") {
        print_usage();
        process::exit(EX_USAGE);
    }

    let (name, src) = match args.get(1) {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(src) => (path.as_str(), src),
            Err(err) => {
                eprintln!("error: could not read '{}': {}", path, err);
                process::exit(EX_NOINPUT);
            }
        },
        None => {
            let mut src = String::new();
            if let Err(err) = io::stdin().read_to_string(&mut src) {
                eprintln!("error: could not read stdin: {}", err);
                process::exit(EX_NOINPUT);
            }
            ("<stdin>", src)
        }
    };

    // the program text came from stdin, so `readLine` only sees what is left of it
    let mut session = Session::new(Config::new());
    if let Err(err) = session.run_named(name, &src) {
        eprintln!("{}", session.report(&err));
        process::exit(if err.is_static() { EX_DATAERR } else { EX_SOFTWARE });
    }
}
