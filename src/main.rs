use call_provider::simulated::{LoggingAudioSession, LoggingReporter, SimulatedStarter};
use call_provider::{start_provider, utils, CallState, HandleType, ProviderConfiguration, ProviderHandle};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

/// Call Provider CLI Application
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Provider name shown in the system call UI
    #[arg(short, long, default_value = "Hotline", env = "CALL_PROVIDER_NAME")]
    name: String,

    /// Remote handle (e.g., 555-0100)
    #[arg(short = 'H', long, default_value = "555-0100", env = "CALL_HANDLE")]
    handle: String,

    /// Operation mode (incoming/outgoing/hold/reset)
    #[arg(short, long, default_value = "incoming")]
    mode: String,

    /// Report the incoming call as a video call
    #[arg(long)]
    video: bool,

    /// Disable video support in the provider configuration
    #[arg(long)]
    no_video: bool,

    /// Accept email addresses as handles as well as phone numbers
    #[arg(long)]
    allow_email: bool,

    /// Reject handles that match none of the supported handle types
    #[arg(long)]
    enforce_handles: bool,

    /// Simulate a system that rejects incoming calls
    #[arg(long)]
    reject_incoming: bool,

    /// Simulate an outgoing call that cannot be started
    #[arg(long)]
    fail_start: bool,

    /// Delay before an outgoing call starts connecting (ms)
    #[arg(long, default_value_t = 3000)]
    connecting_delay: u64,

    /// Delay before an outgoing call is connected (ms)
    #[arg(long, default_value_t = 1500)]
    connected_delay: u64,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    utils::initialize_logging(args.log_level.as_str());

    let provider = build_provider(&args)?;
    let result = match args.mode.as_str() {
        "incoming" => run_incoming_mode(&provider, &args).await,
        "outgoing" => run_outgoing_mode(&provider, &args).await,
        "hold" => run_hold_mode(&provider, &args).await,
        "reset" => run_reset_mode(&provider, &args).await,
        _ => {
            eprintln!("Invalid mode. Use 'incoming', 'outgoing', 'hold', or 'reset'");
            Ok(())
        }
    };
    provider.shutdown();
    result
}

fn build_provider(args: &Args) -> Result<ProviderHandle, Box<dyn std::error::Error>> {
    let mut handle_types = vec![HandleType::PhoneNumber];
    if args.allow_email {
        handle_types.push(HandleType::EmailAddress);
    }
    let config = ProviderConfiguration::new(args.name.clone())
        .with_video(!args.no_video)
        .with_handle_types(handle_types)
        .with_handle_enforcement(args.enforce_handles);

    let starter = if args.fail_start {
        SimulatedStarter::failing()
    } else {
        SimulatedStarter::new(
            Duration::from_millis(args.connecting_delay),
            Duration::from_millis(args.connected_delay),
        )
    };

    let provider = start_provider(
        config,
        Arc::new(LoggingReporter {
            reject_incoming: args.reject_incoming,
        }),
        Arc::new(LoggingAudioSession),
        Arc::new(starter),
    )?;
    Ok(provider)
}

async fn run_incoming_mode(provider: &ProviderHandle, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let id = utils::new_call_id();
    info!("Reporting incoming call {} from {}", id, args.handle);

    if let Err(e) = provider.report_incoming_call(id, args.handle.as_str(), args.video).await {
        error!("Incoming call failed: {}", e);
        error!("Error code: {}", e.error_code());
        return Err(format!("Incoming call failed: {}", e).into());
    }

    provider.answer(id).await?;
    provider.audio_activated()?;
    print_calls(provider).await?;

    info!("Press Ctrl+C to hang up");
    tokio::signal::ctrl_c().await?;
    provider.end(id).await?;
    info!("Call ended");
    Ok(())
}

async fn run_outgoing_mode(provider: &ProviderHandle, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let id = utils::new_call_id();
    info!("Starting outgoing call {} to {}", id, args.handle);

    if let Err(e) = provider.start_call(id, args.handle.as_str()).await {
        error!("Outgoing call failed: {}", e);
        error!("Error code: {}", e.error_code());
        return Err(format!("Outgoing call failed: {}", e).into());
    }
    provider.audio_activated()?;

    // 等待接通
    loop {
        match provider.find_call(id).await? {
            Some(call) if call.state == CallState::Active => {
                info!("Outgoing call connected");
                break;
            }
            Some(_) => {}
            None => {
                info!("Outgoing call disappeared before connecting");
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    print_calls(provider).await?;

    info!("Press Ctrl+C to hang up");
    tokio::signal::ctrl_c().await?;
    provider.end(id).await?;
    info!("Call ended");
    Ok(())
}

async fn run_hold_mode(provider: &ProviderHandle, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let id = utils::new_call_id();
    provider.report_incoming_call(id, args.handle.as_str(), false).await?;
    provider.answer(id).await?;

    info!("Putting call {} on hold", id);
    provider.set_held(id, true).await?;
    print_calls(provider).await?;

    tokio::time::sleep(Duration::from_secs(2)).await;

    info!("Resuming call {}", id);
    provider.set_held(id, false).await?;
    print_calls(provider).await?;

    provider.end(id).await?;
    info!("Call ended");
    Ok(())
}

async fn run_reset_mode(provider: &ProviderHandle, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    for _ in 0..2 {
        let id = utils::new_call_id();
        provider.report_incoming_call(id, args.handle.as_str(), false).await?;
        provider.answer(id).await?;
    }
    print_calls(provider).await?;

    info!("Resetting provider");
    provider.reset()?;
    print_calls(provider).await?;
    Ok(())
}

async fn print_calls(provider: &ProviderHandle) -> Result<(), Box<dyn std::error::Error>> {
    let calls = provider.calls().await?;
    println!("Active calls: {}", calls.len());
    for call in calls {
        println!(
            "  {} {} {} [{}]",
            call.id,
            if call.is_outgoing { "->" } else { "<-" },
            call.handle,
            call.state.as_str()
        );
    }
    Ok(())
}
