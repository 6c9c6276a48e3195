mod cli;
mod error_handling;
mod grammar;
mod parser;
mod serializer;

use clap::Parser;

fn main() {
    let args = cli::Cli::parse();

    let grammar = match parser::parse_file(&args.file) {
        Ok(grammar) => grammar,
        Err(errors) => {
            for error in &errors {
                eprintln!("{}", error);
            }
            std::process::exit(1);
        }
    };

    if args.check {
        return;
    }
    let text = if args.grouped {
        serializer::serialize_grouped(&grammar)
    } else {
        serializer::serialize(&grammar)
    };
    print!("{}", text);
}
