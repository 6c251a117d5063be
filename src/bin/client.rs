//! Manual test client for the vocount server.
//!
//! Sends one message per connection and prints the server's reply. Run
//! with no message to replay the scripted case list against a server in
//! last-char mode.

use clap::Parser;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[command(name = "vocount-client")]
#[command(about = "Manual test client for the vocount server", long_about = None)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:5050")]
    address: String,

    /// Message to send; omit to run the scripted cases
    message: Option<String>,
}

/// Scripted cases: message and what last-char mode should answer.
const CASES: &[(&str, &str)] = &[
    ("hola", "1"),
    ("banana", "3"),
    ("reconocer", "3"),
    ("abcdefg", "1"),
    ("aaa", "3"),
    ("test123", "ERROR"),
    ("hello world", "ERROR"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.message {
        Some(message) => {
            let reply = send(&args.address, &message).await?;
            println!("{} -> {}", message, reply.trim_end());
        }
        None => {
            for (message, expected) in CASES {
                match send(&args.address, message).await {
                    Ok(reply) => {
                        println!(
                            "{:>14} -> {:<30} (expected {})",
                            message,
                            reply.trim_end(),
                            expected
                        );
                    }
                    Err(e) => {
                        eprintln!("{message:>14} -> connection failed: {e}");
                    }
                }
            }
        }
    }

    Ok(())
}

/// One request-reply exchange on a fresh connection.
async fn send(address: &str, message: &str) -> io::Result<String> {
    let mut stream = TcpStream::connect(address).await?;
    stream.write_all(message.as_bytes()).await?;
    stream.shutdown().await?;

    let mut reply = String::new();
    stream.read_to_string(&mut reply).await?;
    Ok(reply)
}
