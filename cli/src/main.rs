mod cli;

use clap::Parser;

use cli::Args;

fn init_logging(directives: &[&str]) {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in directives {
        match directive.parse() {
            Ok(d) => filter = filter.add_directive(d),
            Err(e) => eprintln!("Ignoring log directive '{}': {}", directive, e),
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.verbose {
        init_logging(&["sectionrank=debug", "sectionrank_core=debug"]);
    } else {
        init_logging(&["sectionrank=info", "sectionrank_core=info"]);
    }

    match cli::run(args).await {
        Ok(summary) if summary.failed == 0 => {}
        Ok(summary) => {
            tracing::warn!("{} collection(s) failed", summary.failed);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
