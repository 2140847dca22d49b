mod args;
mod checksum;
mod compose;
mod echo;
mod frame;
mod hex;
mod list;
mod listen;
mod message;
mod probe;
mod run;
mod send;
mod serial;
mod transport;
mod verify;

use tracing::Level;

fn main() -> Result<(), String> {
    let args: args::TopLevel = argh::from_env();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .with_writer(std::io::stderr)
        .init();
    run::run(args.invocation)
}
