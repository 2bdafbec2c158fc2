//! allocscope CLI entry point.

fn main() {
    if let Err(e) = allocscope_cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
