//! Thistle CLI
//!
//! Compiles a stylesheet to CSS on stdout.

use anyhow::{Context, Result};
use std::env;
use std::fs;
use thistle_css::OutputStyle;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut style = OutputStyle::Nested;
    let mut path: Option<String> = None;

    let mut index = 1;
    while index < args.len() {
        match args[index].as_str() {
            "--style" => {
                index += 1;
                let Some(name) = args.get(index) else {
                    eprintln!("Error: --style requires an argument");
                    std::process::exit(1);
                };
                let Some(parsed) = OutputStyle::from_name(name) else {
                    eprintln!("Error: unknown style '{name}' (expected nested, expanded or echo)");
                    std::process::exit(1);
                };
                style = parsed;
            }
            arg => path = Some(arg.to_string()),
        }
        index += 1;
    }

    let Some(path) = path else {
        eprintln!("Usage: thistle [--style nested|expanded|echo] <input-path>");
        std::process::exit(1);
    };

    let source = fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;

    match thistle_css::compile(&source, style) {
        Ok(css) => {
            print!("{css}");
            Ok(())
        }
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}
