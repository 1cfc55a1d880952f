use std::process::ExitCode;
use unix_cli::{CliArgs, Config, Interpreter, logger};

fn main() -> ExitCode {
    let config = Config::from(argh::from_env::<CliArgs>());

    if let Err(e) = logger::init(config.log_level) {
        eprintln!("Error: cannot install logger: {e}");
    }

    if config.show_banner {
        println!("{}\n", config.banner());
    }

    match Interpreter::with_config(config).repl() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
