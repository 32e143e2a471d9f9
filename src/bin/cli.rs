// src/bin/cli.rs
use parakh_scrape::cli;

fn main() {
    if let Err(e) = color_eyre::install() {
        eprintln!("Error: {e}");
    }
    if let Err(e) = cli::run() {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
