use clap::Parser;
use kosh::cli::{commands, output, Cli, Commands};
use kosh::errors::ErrorKind;

/// Environment variable holding the tracing filter (e.g. `kosh=debug`).
const LOG_ENV: &str = "KOSH_LOG";

fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::Add {
            ref label,
            ref user,
            force,
        } => commands::add::execute(&cli, label, user, force),
        Commands::Get {
            ref label,
            ref user,
            print,
        } => commands::get::execute(&cli, label, user, print),
        Commands::Search {
            ref label,
            ref user,
            print,
            show,
        } => commands::search::execute(&cli, label, user.as_deref(), print, show),
        Commands::List {
            ref label,
            ref user,
            json,
        } => commands::list::execute(&cli, label.as_deref(), user.as_deref(), json),
        Commands::Delete {
            ref label,
            ref user,
            force,
        } => commands::delete::execute(&cli, label, user, force),
        Commands::Audit {
            last,
            ref since,
            ref op,
        } => commands::audit_cmd::execute(&cli, last, since.as_deref(), op.as_deref()),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        if e.kind() == ErrorKind::AlreadyExists {
            output::warning(&e.to_string());
        } else {
            output::error(&e.to_string());
        }
        std::process::exit(e.exit_code());
    }
}

/// Diagnostics go to stderr, filtered by `KOSH_LOG` (default: warn).
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
