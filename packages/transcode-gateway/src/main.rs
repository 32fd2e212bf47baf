use clap::{Parser, Subcommand};
use transcode_gateway::plan::DeploymentPlan;
use transcode_gateway::{init_tracing, start_server, GatewayConfig};

#[derive(Parser, Debug)]
#[command(name = "transcode-gateway", about = "On-demand image transcoding gateway", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP gateway (default).
    Serve,

    /// Print the domain names, DNS records and edge routing table for a deployment.
    Plan {
        /// Fully qualified domain name the site is served from.
        #[arg(long)]
        fqdn: String,

        /// Edge host name the DNS records point at.
        #[arg(long)]
        target: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let config = GatewayConfig::load()?;
            init_tracing(&config.server.log_level);
            start_server(config).await
        }
        Command::Plan { fqdn, target } => {
            let plan = DeploymentPlan::build(&fqdn, target.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(())
        }
    }
}
