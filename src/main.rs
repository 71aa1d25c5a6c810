use std::process;

use clap::Parser;
use console::style;

use git_restack::config::{self, Args, Settings};

fn main() {
    let args = Args::parse();
    if args.license {
        println!("{}", config::LICENSE);
        return;
    }
    if args.version {
        println!("{}", config::version_line());
        return;
    }

    let settings = Settings::from_args_env(&args);
    if let Err(e) = git_restack::logging::initialize(&settings) {
        eprintln!("{} {:#}", style("error:").red(), e);
        process::exit(git_restack::error::EXIT_FAILURE);
    }

    match git_restack::restack(&settings, args.branch.as_deref()) {
        Ok(status) => process::exit(status),
        Err(e) => {
            let code = e.exit_code();
            eprintln!("{} {:#}", style("error:").red(), anyhow::Error::from(e));
            process::exit(code);
        }
    }
}
