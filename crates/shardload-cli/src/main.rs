use clap::Parser;

mod cli;
mod run;

fn main() {
    let args = cli::ShardLoadCli::parse();
    if let Err(e) = run::run(args) {
        eprintln!("Stopping with error: {e}");
        std::process::exit(1);
    }
    std::process::exit(0);
}
