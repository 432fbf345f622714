use clap::Args;

#[derive(Args)]
pub struct CredentialsArgs {
    #[arg(long)]
    pub login: String,
    #[arg(long, env = "COFFER_PASSWORD", hide_env_values = true)]
    pub password: String,
}
