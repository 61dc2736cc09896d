use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use employer_network::access::Role;
use employer_network::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Employer Network",
    about = "Run the employer partner directory or explore it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the capability matrix for every staff role
    Roles,
    /// Run an end-to-end CLI demo covering setup, invites, submissions and listings
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Roles => {
            print_role_matrix();
            Ok(())
        }
        Command::Demo(args) => run_demo(args),
    }
}

fn print_role_matrix() {
    let mark = |allowed: bool| if allowed { "yes" } else { "-" };
    println!(
        "{:<32} {:<9} {:<12} {:<5} {:<7} {:<6}",
        "Role", "View all", "Active only", "Edit", "Delete", "Users"
    );
    for role in Role::ordered() {
        let caps = role.capabilities();
        println!(
            "{:<32} {:<9} {:<12} {:<5} {:<7} {:<6}",
            role.label(),
            mark(caps.view_all_employers),
            mark(caps.view_active_only),
            mark(caps.edit_employers),
            mark(caps.delete_employers),
            mark(caps.manage_users),
        );
    }
}
