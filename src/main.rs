use std::env;
use std::io::Write;

use crate::error::ErrorCode;
use crate::interpreter::{Config, Interpreter};
use crate::lexer::Lexer;
use crate::parser::Parser;

mod callable;
mod environment;
mod error;
mod expr;
mod interpreter;
mod lexer;
mod parser;
mod stmt;
mod token;
mod token_type;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() > 2 {
        println!("Uso: cazuela [archivo]");
        error::raise_with_code(ErrorCode::TooManyArguments);
        error::exit_with_code(ErrorCode::TooManyArguments);
    }

    if args.len() == 2 {
        run_file(&args[1]);
    } else {
        run_prompt();
    }
}

fn run_file(path: &str) {
    let source = std::fs::read_to_string(path).unwrap_or_else(|_| {
        eprintln!("No se pudo leer el archivo '{}'.", path);
        error::exit_with_code(ErrorCode::SyntaxError);
    });

    let mut interpreter = Interpreter::new(Config::default());
    run(&source, &mut interpreter);

    // Fatal errors have already halted the process with their own code.
    if error::had_error() {
        error::exit_with_code(ErrorCode::SyntaxError);
    }
}

fn run_prompt() {
    error::set_ignore_fatals(true);

    let mut interpreter = Interpreter::new(Config::default());

    loop {
        print!("<Cazuela># ");
        std::io::stdout().flush().expect("Failed to flush stdout");

        let mut input = String::new();
        let bytes_read = std::io::stdin()
            .read_line(&mut input)
            .expect("Failed to read line");

        if bytes_read == 0 {
            break;
        }

        run(&input, &mut interpreter);

        error::set_had_error(false);
    }
}

fn run(source: &str, interpreter: &mut Interpreter) {
    let tokens = Lexer::new(source).scan_tokens();
    if error::had_error() {
        return;
    }

    let statements = match Parser::new(tokens).parse() {
        Some(statements) => statements,
        None => return,
    };
    if error::had_error() {
        return;
    }

    interpreter.interpret(statements);
}
