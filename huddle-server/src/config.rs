use clap::Parser;
use std::net::SocketAddr;

const DEFAULT_GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-pro:generateContent";

#[derive(Debug, Parser)]
#[command(name = "huddle-server", about = "Signaling relay for huddle rooms")]
pub struct ServerConfig {
    /// Address to bind the signaling and quiz HTTP server to.
    #[arg(long, default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// STUN/TURN urls advertised to clients (informational; clients carry
    /// their own ICE config).
    #[arg(long = "stun", default_value = "stun:stun.l.google.com:19302")]
    pub stun_servers: Vec<String>,

    /// API key for the question generator. Quiz routes are disabled when
    /// absent.
    #[arg(long, env = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_ENDPOINT", default_value = DEFAULT_GEMINI_ENDPOINT)]
    pub gemini_endpoint: String,
}
