use std::env;
use std::fs;

use safulate::{repl, Interpreter};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        repl::run_repl();
        return;
    }

    let path = &args[1];
    let source = fs::read_to_string(path).unwrap_or_else(|err| {
        eprintln!("Failed to read {}: {}", path, err);
        std::process::exit(1);
    });

    let mut interpreter = Interpreter::new();
    interpreter.set_program_path(path);
    match interpreter.run_source(&source) {
        Ok(_) => {
            print!("{}", interpreter.output());
        }
        Err(err) => {
            print!("{}", interpreter.output());
            eprintln!("{}", err.render_report(&source, path));
            std::process::exit(1);
        }
    }
}
