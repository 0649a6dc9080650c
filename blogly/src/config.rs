use clap::Parser;

pub const DEFAULT_DATABASE_URL: &str = "blogly.db";

/// Command line and environment configuration for the server.
#[derive(Parser, Debug, Clone)]
#[command(name = "blogly", version, about = "Small user directory web app")]
pub struct Config {
    /// libsql path/URL, or a postgres:// URL when built with `postgres-backend`
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Address to bind
    #[arg(long, env = "BLOGLY_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "BLOGLY_PORT", default_value_t = 5000)]
    pub port: u16,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
