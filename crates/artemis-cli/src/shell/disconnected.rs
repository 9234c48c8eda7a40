//! The shell shown before a connection exists.

use artemis_client::{transport, ConnectConfig, Inbound, Sender};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing::debug;

use super::{parse_line, Prompt};

pub const PROMPT: &str = "disconnected: ";

#[derive(Parser, Debug)]
#[command(
    name = "disconnected",
    no_binary_name = true,
    disable_version_flag = true,
    help_template = "commands:\n{subcommands}"
)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Connect to an Artemis server ([host][:port])
    Connect {
        /// Server address; uses the configured host when omitted
        host: Option<String>,
    },

    /// Print the client version
    Version,

    /// Leave the client
    #[command(alias = "exit")]
    Quit,
}

/// Where the disconnected shell hands control next.
pub enum Next {
    Connected {
        host: String,
        sender: Sender,
        inbound: Inbound,
    },
    Quit,
}

/// Settings the disconnected shell needs to open a connection.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub connect: ConnectConfig,
    pub default_host: Option<String>,
}

/// Prompt until a connection succeeds or the operator quits.
pub async fn run(prompt: &mut Prompt, settings: &Settings) -> Next {
    while let Some(line) = prompt.read(PROMPT).await {
        let Some(Line { command }) = parse_line::<Line>(&line) else {
            continue;
        };
        if let Some(next) = execute(command, settings).await {
            return next;
        }
    }

    debug!("end of input in disconnected shell");
    Next::Quit
}

/// Run the command given on the process command line.
///
/// `args` is either a shell command (`connect HOST`, `version`, ...) or a
/// bare host, which means `connect HOST`. Commands that do not connect end
/// the client, except a failed connect which falls back to the shell
/// (`None`). Help and usage errors exit through clap.
pub async fn run_args(args: &[String], settings: &Settings) -> Option<Next> {
    match Line::try_parse_from(args) {
        Ok(Line {
            command: Command::Version,
        }) => {
            execute(Command::Version, settings).await;
            Some(Next::Quit)
        }
        Ok(Line { command }) => execute(command, settings).await,
        Err(e) if args.len() == 1 && e.kind() != ErrorKind::DisplayHelp => {
            let host = Some(args[0].clone());
            execute(Command::Connect { host }, settings).await
        }
        Err(e) => e.exit(),
    }
}

/// Run one command. `Some` when the shell should hand over control.
async fn execute(command: Command, settings: &Settings) -> Option<Next> {
    match command {
        Command::Connect { host } => {
            let Some(host) = host.or_else(|| settings.default_host.clone()) else {
                println!("connect: no host given and no default host configured");
                return None;
            };
            println!("connecting to {host} ...");
            match transport::connect(&host, &settings.connect).await {
                Ok((sender, inbound)) => Some(Next::Connected {
                    host,
                    sender,
                    inbound,
                }),
                Err(e) => {
                    println!("failed to connect: {e}");
                    None
                }
            }
        }
        Command::Version => {
            println!("artemis-cli, v{}", env!("CARGO_PKG_VERSION"));
            None
        }
        Command::Quit => Some(Next::Quit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        let line: Line = parse_line("connect bridge.local:2011").unwrap();
        assert_eq!(
            line.command,
            Command::Connect {
                host: Some("bridge.local:2011".into())
            }
        );
        let line: Line = parse_line("  connect  ").unwrap();
        assert_eq!(line.command, Command::Connect { host: None });
        let line: Line = parse_line("version").unwrap();
        assert_eq!(line.command, Command::Version);
    }

    #[test]
    fn exit_is_an_alias_for_quit() {
        let line: Line = parse_line("exit").unwrap();
        assert_eq!(line.command, Command::Quit);
        let line: Line = parse_line("quit").unwrap();
        assert_eq!(line.command, Command::Quit);
    }

    #[test]
    fn blank_and_bad_lines_are_skipped() {
        assert!(parse_line::<Line>("").is_none());
        assert!(parse_line::<Line>("   ").is_none());
        assert!(parse_line::<Line>("ready").is_none());
        assert!(parse_line::<Line>("connect a b").is_none());
        assert!(parse_line::<Line>("help").is_none());
    }

    #[tokio::test]
    async fn quits_on_command() {
        let mut prompt = Prompt::spawn(&b"version\n\nbogus\nquit\nconnect x\n"[..]).unwrap();
        let next = run(&mut prompt, &Settings::default()).await;
        assert!(matches!(next, Next::Quit));
    }

    #[tokio::test]
    async fn quits_at_end_of_input() {
        let mut prompt = Prompt::spawn(&b"version\n"[..]).unwrap();
        assert!(matches!(
            run(&mut prompt, &Settings::default()).await,
            Next::Quit
        ));
    }

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[tokio::test]
    async fn command_line_version_and_quit_end_the_client() {
        let settings = Settings::default();
        assert!(matches!(
            run_args(&args(&["version"]), &settings).await,
            Some(Next::Quit)
        ));
        assert!(matches!(
            run_args(&args(&["exit"]), &settings).await,
            Some(Next::Quit)
        ));
    }

    #[tokio::test]
    async fn command_line_connect_and_bare_host_both_connect() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let settings = Settings::default();

        for line in [args(&["connect", addr.as_str()]), args(&[addr.as_str()])] {
            match run_args(&line, &settings).await {
                Some(Next::Connected { host, .. }) => assert_eq!(host, addr),
                _ => panic!("expected a connection for {line:?}"),
            }
        }
    }

    #[tokio::test]
    async fn command_line_failed_connect_falls_back_to_shell() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let settings = Settings::default();
        assert!(run_args(&args(&["connect", addr.as_str()]), &settings).await.is_none());
        assert!(run_args(&args(&[addr.as_str()]), &settings).await.is_none());
    }

    #[tokio::test]
    async fn connect_without_any_host_stays_disconnected() {
        assert!(execute(Command::Connect { host: None }, &Settings::default())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn failed_connect_stays_disconnected() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut prompt = Prompt::spawn(std::io::Cursor::new(format!("connect {addr}\n"))).unwrap();
        assert!(matches!(
            run(&mut prompt, &Settings::default()).await,
            Next::Quit
        ));
    }

    #[tokio::test]
    async fn connects_to_configured_host() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let settings = Settings {
            default_host: Some(addr.to_string()),
            ..Default::default()
        };

        let mut prompt = Prompt::spawn(&b"connect\n"[..]).unwrap();
        match run(&mut prompt, &settings).await {
            Next::Connected { host, .. } => assert_eq!(host, addr.to_string()),
            Next::Quit => panic!("expected a connection"),
        }
    }
}
