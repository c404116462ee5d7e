mod args;

use android_auto_run::adb::{AdbBackend, AdbClient};
use android_auto_run::automation::{DeviceSession, WaitConfig};
use android_auto_run::match_image::{
    MatchEngine, Template, create_default_config, create_edge_config,
};
use args::{Args, Mode};
use std::error::Error;
use std::time::Duration;

const SCREENSHOT_FILE: &str = "cli-screenshot.png";

fn main() {
    let Some(args) = Args::parse() else {
        return;
    };

    let default_filter = if args.debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("❌ Failed to start runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(run(args)) {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let client = match &args.device {
        Some(name) => AdbBackend::new_with_device(name, args.use_rust_impl).await?,
        None => AdbBackend::connect_first(args.use_rust_impl).await?,
    };
    let (sx, sy) = client.screen_dimensions();
    println!(
        "📱 Device: {} size: {}x{} (backend={})",
        client.device_name(),
        sx,
        sy,
        client.impl_str()
    );

    let config = if args.edge {
        create_edge_config()
    } else {
        create_default_config()
    };
    let threshold = args.threshold.unwrap_or(config.default_threshold);

    match &args.mode {
        Mode::Screenshot => {
            let cap = client.screen_capture().await?;
            tokio::fs::write(SCREENSHOT_FILE, &cap.bytes).await?;
            println!(
                "✅ Screenshot ({} bytes, {}ms) saved to {SCREENSHOT_FILE}",
                cap.bytes.len(),
                cap.duration_ms
            );
        }
        Mode::Find(path) => {
            let template = Template::open(path, threshold)?;
            let mut session =
                DeviceSession::with_config(client, MatchEngine::new(config), WaitConfig::default());
            let found = if args.edge {
                session.find_edge(&template).await
            } else {
                session.find(&template).await
            };
            match found {
                Some(point) => println!("✅ Found {template} at {point}"),
                None => println!("❌ {template} not on screen"),
            }
        }
        Mode::Await(path) => {
            let template = Template::open(path, threshold)?;
            let mut session =
                DeviceSession::with_config(client, MatchEngine::new(config), WaitConfig::default());
            let timeout = args.timeout_secs.map(Duration::from_secs);
            let started = std::time::Instant::now();
            session.wait_for(&[&template], timeout).await?;
            println!(
                "✅ {template} appeared after {}ms",
                started.elapsed().as_millis()
            );
        }
    }
    Ok(())
}
