mod terminal_ui;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Select;
use loopcall_client::{
    ChannelSignaling, LoopbackCall, MediaConstraints, MediaView, NativePlatform, Platform,
    RouterCommand, RouterExit, RtcConfig, SessionConfig, SignalingOutput, SignalingRouter,
    channel_pair,
};
use loopcall_core::{IceServerConfig, SignalingMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::terminal_ui::TerminalUi;

#[derive(Parser)]
#[command(name = "loopcall", version, about = "WebRTC loopback call and signaling demo")]
struct Cli {
    #[command(flatten)]
    net: NetArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct NetArgs {
    /// STUN server url, may be repeated. Defaults to Google's public server.
    #[arg(long, global = true)]
    stun: Vec<String>,

    #[arg(long, global = true)]
    turn: Option<String>,

    #[arg(long, global = true, requires = "turn")]
    turn_username: Option<String>,

    #[arg(long, global = true, requires = "turn")]
    turn_credential: Option<String>,

    /// Host candidates only.
    #[arg(long, global = true, conflicts_with_all = ["stun", "turn"])]
    no_ice_servers: bool,

    /// Upper bound for a single negotiation step.
    #[arg(long, global = true, default_value_t = 10_000)]
    timeout_ms: u64,

    #[arg(long, global = true)]
    no_audio: bool,

    #[arg(long, global = true)]
    no_video: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Two peer connections in this process, connected to each other.
    Loopback {
        /// How long to keep the call up before hanging up.
        #[arg(long, default_value_t = 5)]
        hold_secs: u64,

        /// Drive Start / Call / Hang up by hand.
        #[arg(short, long)]
        interactive: bool,
    },

    /// Two signaling routers linked by an in-process channel.
    Session {
        #[arg(long, default_value = "1")]
        room: String,

        #[arg(long, default_value = "hello")]
        chat: String,

        #[arg(long, default_value_t = 3)]
        hold_secs: u64,
    },
}

impl NetArgs {
    fn session_config(&self) -> SessionConfig {
        let rtc = if self.no_ice_servers {
            RtcConfig::local_only()
        } else {
            let mut ice_servers: Vec<IceServerConfig> =
                self.stun.iter().cloned().map(IceServerConfig::stun).collect();
            if let Some(turn) = &self.turn {
                ice_servers.push(IceServerConfig {
                    urls: vec![turn.clone()],
                    username: self.turn_username.clone(),
                    credential: self.turn_credential.clone(),
                });
            }
            if ice_servers.is_empty() {
                RtcConfig::default()
            } else {
                RtcConfig { ice_servers }
            }
        };

        SessionConfig {
            rtc,
            media: MediaConstraints {
                audio: !self.no_audio,
                video: !self.no_video,
            },
            negotiation_timeout: Duration::from_millis(self.timeout_ms),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.net.session_config();

    match cli.command {
        Commands::Loopback {
            hold_secs,
            interactive,
        } => {
            println!("{}", "📞 Starting loopback call...".green().bold());
            let platform = Arc::new(NativePlatform::new());
            log_platform(platform.as_ref());
            let ui = Arc::new(TerminalUi::new("loopback"));
            let mut call = LoopbackCall::new(platform.clone(), ui, config);

            if interactive {
                run_interactive(&mut call).await?;
            } else {
                run_loopback(&mut call, Duration::from_secs(hold_secs)).await?;
            }

            if let Some(id) = platform.attached_stream(MediaView::Remote) {
                println!("   📺 Remote view: {}", id);
            }
        }
        Commands::Session {
            room,
            chat,
            hold_secs,
        } => {
            println!("{}", "🔗 Starting signaling session...".green().bold());
            run_session(config, room, chat, Duration::from_secs(hold_secs)).await?;
        }
    }

    println!("{}", "✨ Done".green().bold());
    Ok(())
}

fn log_platform(platform: &dyn Platform) {
    let details = platform.details();
    info!("This appears to be {}, version {}", details.name, details.version);
}

async fn run_loopback(call: &mut LoopbackCall, hold: Duration) -> Result<()> {
    call.start().await.context("Failed to acquire local media")?;
    let outcome = call.call().await.context("Failed to set up the call")?;
    if outcome.answer.is_none() {
        bail!("Negotiation did not produce an answer");
    }

    tokio::time::sleep(hold).await;
    print_setup_time(call).await;

    call.hangup().await?;
    Ok(())
}

async fn print_setup_time(call: &LoopbackCall) {
    match call.setup_time().await {
        Some(elapsed) => println!(
            "   ⏱  Setup time: {:.3}ms",
            elapsed.as_secs_f64() * 1000.0
        ),
        None => println!("{}", "   No remote media received yet".yellow()),
    }
}

#[derive(Clone, Copy)]
enum Button {
    Start,
    Call,
    Hangup,
    Quit,
}

impl Button {
    fn label(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Call => "Call",
            Self::Hangup => "Hang Up",
            Self::Quit => "Quit",
        }
    }
}

async fn run_interactive(call: &mut LoopbackCall) -> Result<()> {
    loop {
        let controls = call.controls();
        let buttons: Vec<Button> = [
            (controls.start, Button::Start),
            (controls.call, Button::Call),
            (controls.hangup, Button::Hangup),
            (true, Button::Quit),
        ]
        .into_iter()
        .filter_map(|(enabled, button)| enabled.then_some(button))
        .collect();
        let labels: Vec<&str> = buttons.iter().map(|b| b.label()).collect();

        // dialoguer blocks the thread.
        let choice = tokio::task::spawn_blocking(move || {
            Select::new()
                .with_prompt("Controls")
                .items(&labels)
                .default(0)
                .interact()
        })
        .await?
        .context("Failed to read selection")?;

        match buttons[choice] {
            Button::Start => {
                if let Err(e) = call.start().await {
                    warn!("Start failed: {}", e);
                }
            }
            Button::Call => match call.call().await {
                Ok(_) => println!("{}", "   Call placed".cyan()),
                Err(e) => warn!("Call failed: {}", e),
            },
            Button::Hangup => {
                print_setup_time(call).await;
                call.hangup().await?;
            }
            Button::Quit => {
                if call.controls().hangup {
                    call.hangup().await?;
                }
                return Ok(());
            }
        }
    }
}

struct Side {
    ui: Arc<TerminalUi>,
    platform: Arc<NativePlatform>,
    commands: mpsc::Sender<RouterCommand>,
    task: JoinHandle<RouterExit>,
}

async fn run_session(
    config: SessionConfig,
    room: String,
    chat: String,
    hold: Duration,
) -> Result<()> {
    let (caller_link, callee_link) = channel_pair();

    let spawn_side = |name: &str,
                      output: ChannelSignaling,
                      inbound: mpsc::UnboundedReceiver<String>| {
        let ui = Arc::new(TerminalUi::new(name));
        let platform = Arc::new(NativePlatform::new());
        let router = SignalingRouter::new(
            platform.clone(),
            Arc::new(output),
            ui.clone(),
            config.clone(),
        );
        let (commands, command_rx) = mpsc::channel(8);
        let task = tokio::spawn(router.run(inbound, command_rx));
        Side {
            ui,
            platform,
            commands,
            task,
        }
    };
    let caller = spawn_side("caller", caller_link.output, caller_link.inbound);
    let callee = spawn_side("callee", callee_link.output, callee_link.inbound);
    log_platform(caller.platform.as_ref());

    // The server assigns the room to both sides.
    let assign = SignalingMessage::GetRoom { value: room };
    caller_link.server.send(assign.clone()).await;
    callee_link.server.send(assign).await;

    callee
        .commands
        .send(RouterCommand::StartSession { initiator: false })
        .await?;
    wait_for_local_media(&callee.platform).await?;
    caller
        .commands
        .send(RouterCommand::StartSession { initiator: true })
        .await?;

    tokio::time::sleep(hold).await;

    caller.commands.send(RouterCommand::Chat(chat.clone())).await?;
    callee
        .commands
        .send(RouterCommand::Chat(format!("re: {}", chat)))
        .await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    for side in [caller, callee] {
        side.commands.send(RouterCommand::Shutdown).await?;
        let exit = side.task.await?;
        println!(
            "   {} exited ({:?}), transcript: {:?}",
            side.ui.name().bold(),
            exit,
            side.ui.transcript()
        );
    }
    Ok(())
}

/// The callee must have its peer connection before the offer reaches it.
async fn wait_for_local_media(platform: &NativePlatform) -> Result<()> {
    tokio::time::timeout(Duration::from_secs(10), async {
        while platform.attached_stream(MediaView::Local).is_none() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .context("Callee did not acquire local media in time")
}
