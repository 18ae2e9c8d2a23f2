use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use teamline_chat::{
    ChatSession, EventOutcome, LoopbackTransport, Message, Participant, Transport,
};
use teamline_config::load as load_config;
use teamline_runtime::{telemetry, ClientServices};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser)]
#[command(name = "teamline-console")]
#[command(about = "Interactive console client for Teamline project chat")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a seeded in-process conversation (default)
    Demo,
    /// Connect to a live messaging backend
    Connect {
        /// Conversation to open on startup
        #[arg(long)]
        conversation: String,
        /// Local participant id
        #[arg(long)]
        as_user: String,
        /// WebSocket URL override
        #[arg(long)]
        url: Option<String>,
        /// Access token override
        #[arg(long)]
        token: Option<String>,
        /// Roster entries as `id=Display Name`, repeatable
        #[arg(long = "participant")]
        participants: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => run_demo().await,
        Commands::Connect {
            conversation,
            as_user,
            url,
            token,
            participants,
        } => run_connect(conversation, as_user, url, token, participants).await,
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  /help              - Show this help");
    println!("  /open <id>         - Switch to another conversation");
    println!("  /messages          - Print the conversation log");
    println!("  /who               - List the roster");
    println!("  /pick <n>          - Accept mention suggestion n");
    println!("  /send              - Submit the current draft");
    println!("  /quit              - Exit");
    println!("Anything else replaces the draft text; suggestions appear");
    println!("while an @-mention is being typed.");
}

fn print_message(message: &Message) {
    let time = message.created_at.format("%H:%M");
    if message.mentions.is_empty() {
        println!("  [{time}] {}: {}", message.author_display_name, message.text);
    } else {
        let mentioned: Vec<String> = message.mentions.iter().cloned().collect();
        println!(
            "  [{time}] {}: {} (mentions: {})",
            message.author_display_name,
            message.text,
            mentioned.join(", ")
        );
    }
}

fn print_suggestions(suggestions: &[Participant]) {
    if suggestions.is_empty() {
        println!("  (no matching participants)");
        return;
    }
    for (index, participant) in suggestions.iter().enumerate() {
        println!("  {}: @{}", index + 1, participant.display_name);
    }
}

fn report_outcome<T: Transport>(session: &ChatSession<T>, outcome: EventOutcome) {
    match outcome {
        EventOutcome::BackfillLoaded { .. } => {
            println!("--- {} ---", session.conversation_id().unwrap_or("?"));
            for message in session.messages() {
                print_message(message);
            }
        }
        EventOutcome::Applied => {
            if let Some(message) = session.messages().last() {
                print_message(message);
            }
        }
        EventOutcome::Notice(text) => println!("  * {text}"),
        EventOutcome::Queued | EventOutcome::Duplicate | EventOutcome::Discarded => {}
    }
}

/// Apply one console line to the session. Returns `true` to quit.
fn apply_input<T: Transport>(
    session: &mut ChatSession<T>,
    roster: &[Participant],
    line: &str,
) -> bool {
    match line.split_once(' ').unwrap_or((line, "")) {
        ("/quit", _) | ("/exit", _) | ("/q", _) => return true,
        ("/help", _) | ("/h", _) => print_help(),
        ("/open", id) => {
            let id = id.trim();
            match session.open(id, roster.to_vec()) {
                Ok(()) => println!("opening {id}..."),
                Err(error) => println!("open failed: {error}"),
            }
        }
        ("/messages", _) => {
            for message in session.messages() {
                print_message(message);
            }
        }
        ("/who", _) => {
            for participant in session.participants() {
                println!("  {} ({})", participant.display_name, participant.id);
            }
        }
        ("/pick", n) => {
            let suggestions: Vec<Participant> = session
                .mention_suggestions()
                .into_iter()
                .cloned()
                .collect();
            match n.trim().parse::<usize>() {
                Ok(index) if (1..=suggestions.len()).contains(&index) => {
                    session.select_mention(&suggestions[index - 1]);
                    println!("draft: {}", session.composer().buffer());
                }
                _ => println!("no such suggestion"),
            }
        }
        ("/send", _) => match session.submit() {
            Ok(draft) => {
                if draft.resolved_mentions.is_empty() {
                    println!("sent");
                } else {
                    let mentioned: Vec<String> = draft.resolved_mentions.into_iter().collect();
                    println!("sent, mentioning {}", mentioned.join(", "));
                }
            }
            Err(error) => println!("send failed: {error}"),
        },
        (command, _) if command.starts_with('/') => {
            println!("Unknown command: {command}");
            println!("Type '/help' for available commands");
        }
        _ => {
            session.on_text_changed(line);
            if session.composer().trigger_active() {
                let suggestions: Vec<Participant> = session
                    .mention_suggestions()
                    .into_iter()
                    .cloned()
                    .collect();
                print_suggestions(&suggestions);
            }
        }
    }
    false
}

fn demo_roster() -> Vec<Participant> {
    vec![
        Participant::new("u-1", "Sarah Johnson"),
        Participant::new("u-2", "Mike Chen"),
        Participant::new("u-3", "Lisa Park"),
        Participant::new("u-4", "James Wilson"),
        Participant::new("u-5", "Emily Davis"),
        Participant::new("u-6", "Alex Martinez"),
    ]
}

fn demo_transport(roster: Vec<Participant>) -> LoopbackTransport {
    let now = Utc::now();
    let mut transport = LoopbackTransport::new(roster);
    transport.seed_history(
        "website-redesign",
        vec![
            Message::new(
                "seed-1",
                "u-1",
                "Sarah Johnson",
                "Great progress on the design today!",
                now - Duration::minutes(35),
            ),
            Message::new(
                "seed-2",
                "u-2",
                "Mike Chen",
                "@Sarah Johnson Let's review it in the afternoon standup",
                now - Duration::minutes(30),
            )
            .with_mentions(["u-1".to_string()].into_iter().collect()),
        ],
    );
    transport.seed_history(
        "mobile-app",
        vec![Message::new(
            "seed-3",
            "u-4",
            "James Wilson",
            "Kickoff notes are up, feedback welcome",
            now - Duration::hours(2),
        )],
    );
    transport
}

fn drain_demo(session: &mut ChatSession<LoopbackTransport>) {
    loop {
        let Some(event) = session.transport_mut().poll_event() else {
            break;
        };
        match session.handle_event(event) {
            Ok(outcome) => report_outcome(session, outcome),
            Err(error) => println!("session error: {error}"),
        }
    }
}

async fn run_demo() -> Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting console demo");

    let config = load_config().context("failed to load configuration")?;
    let roster = demo_roster();

    let mut session = ChatSession::new(demo_transport(roster.clone()), "u-3");
    session.set_message_limit(config.chat.max_message_length);

    println!("Teamline Console (demo, seeded conversations)");
    println!("You are Lisa Park. Conversations: website-redesign, mobile-app");
    println!("Type '/help' for commands, '/quit' to exit");
    println!("---");

    session
        .open("website-redesign", roster.clone())
        .context("failed to open seeded conversation")?;
    drain_demo(&mut session);

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    loop {
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout())?;

        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let input = line.trim_end_matches(['\r', '\n']);
        if input.trim().is_empty() {
            continue;
        }

        if apply_input(&mut session, &roster, input) {
            println!("Goodbye!");
            break;
        }
        drain_demo(&mut session);
    }

    session.close();
    Ok(())
}

fn parse_roster(entries: &[String]) -> Result<Vec<Participant>> {
    entries
        .iter()
        .map(|entry| {
            let (id, display_name) = entry
                .split_once('=')
                .with_context(|| format!("invalid participant entry '{entry}', expected id=name"))?;
            Ok(Participant::new(id.trim(), display_name.trim()))
        })
        .collect()
}

async fn run_connect(
    conversation: String,
    as_user: String,
    url: Option<String>,
    token: Option<String>,
    participants: Vec<String>,
) -> Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let mut config = load_config().context("failed to load configuration")?;
    if let Some(url) = url {
        config.server.ws_url = url;
    }
    if let Some(token) = token {
        config.auth.access_token = Some(token);
    }

    let roster = parse_roster(&participants)?;
    let services =
        ClientServices::initialise(&config).context("failed to initialise client services")?;
    let (handle, mut events) = services.connect_socket().await?;

    let mut session = ChatSession::new(handle, as_user);
    session.set_message_limit(config.chat.max_message_length);
    session
        .open(&conversation, roster.clone())
        .context("failed to open conversation")?;

    println!("Teamline Console (connected to {})", config.server.ws_url);
    println!("Type '/help' for commands, '/quit' to exit");
    println!("---");

    // Lines come through a channel so the select loop stays cancellation
    // safe while events keep flowing.
    let mut lines = spawn_stdin_lines();

    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(line) => {
                    let input = line.trim_end_matches(['\r', '\n']);
                    if input.trim().is_empty() {
                        continue;
                    }
                    if apply_input(&mut session, &roster, input) {
                        println!("Goodbye!");
                        break;
                    }
                }
                None => break, // EOF
            },
            event = events.recv() => match event {
                Some(event) => match session.handle_event(event) {
                    Ok(outcome) => report_outcome(&session, outcome),
                    Err(error) => println!("session error: {error}"),
                },
                None => {
                    println!("connection closed by server");
                    break;
                }
            },
            () = teamline_runtime::shutdown_signal() => {
                println!("Goodbye!");
                break;
            }
        }
    }

    session.close();
    Ok(())
}

fn spawn_stdin_lines() -> tokio::sync::mpsc::UnboundedReceiver<String> {
    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if sender.send(line.clone()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    receiver
}
