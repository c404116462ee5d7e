use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Screenshot,
    /// Locate a template once and print its center
    Find(PathBuf),
    /// Poll until a template is on screen
    Await(PathBuf),
}

#[derive(Debug, PartialEq)]
pub struct Args {
    pub mode: Mode,
    pub use_rust_impl: bool,
    pub device: Option<String>,
    pub edge: bool,
    pub threshold: Option<f64>,
    pub timeout_secs: Option<u64>,
    pub debug_mode: bool,
}

impl Args {
    pub fn parse() -> Option<Self> {
        Self::parse_from(env::args().skip(1))
    }

    /// Parse flags (program name already stripped). `None` means the
    /// process should exit: help or version was printed, or a flag was bad.
    pub fn parse_from(args: impl IntoIterator<Item = String>) -> Option<Self> {
        let mut mode: Option<Mode> = None;
        let mut use_rust_impl = true;
        let mut device = None;
        let mut edge = false;
        let mut threshold = None;
        let mut timeout_secs = None;
        let mut debug_mode = false;

        for arg in args {
            if arg == "--help" || arg == "-h" {
                print_help();
                return None;
            } else if arg == "--version" || arg == "-v" {
                println!(
                    "Android Auto Run v{} ({})",
                    env!("APP_VERSION_DISPLAY"),
                    env!("APP_BUILD_YEAR")
                );
                return None;
            } else if arg == "--debug" {
                debug_mode = true;
            } else if arg == "--edge" {
                edge = true;
            } else if arg == "--screenshot" || arg == "-s" {
                mode = Some(Mode::Screenshot);
            } else if let Some(path) = arg.strip_prefix("--find=") {
                mode = Some(Mode::Find(PathBuf::from(path)));
            } else if let Some(path) = arg.strip_prefix("--await=") {
                mode = Some(Mode::Await(PathBuf::from(path)));
            } else if let Some(name) = arg.strip_prefix("--device=") {
                device = Some(name.to_string());
            } else if let Some(rest) = arg.strip_prefix("--impl=") {
                use_rust_impl = match rest {
                    "rust" => true,
                    "shell" => false,
                    other => {
                        eprintln!("❌ Unknown impl '{}', expected 'rust' or 'shell'", other);
                        return None;
                    }
                };
            } else if let Some(val) = arg.strip_prefix("--threshold=") {
                match val.parse::<f64>() {
                    Ok(t) => threshold = Some(t),
                    Err(_) => {
                        eprintln!("❌ Invalid threshold value: {}", val);
                        return None;
                    }
                }
            } else if let Some(val) = arg.strip_prefix("--timeout=") {
                match val.parse::<u64>() {
                    Ok(secs) => timeout_secs = Some(secs),
                    Err(_) => {
                        eprintln!("❌ Invalid timeout value: {}", val);
                        return None;
                    }
                }
            } else {
                eprintln!("❌ Unknown argument: {}", arg);
                print_help();
                return None;
            }
        }

        Some(Args {
            mode: mode.unwrap_or(Mode::Screenshot),
            use_rust_impl,
            device,
            edge,
            threshold,
            timeout_secs,
            debug_mode,
        })
    }

    pub fn impl_str(&self) -> &'static str {
        if self.use_rust_impl { "rust" } else { "shell" }
    }
}

fn print_help() {
    println!("🤖 Android Auto Run");
    println!();
    println!("USAGE:");
    println!("    android-auto-run [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    --screenshot, -s    Take a screenshot and save to file (cli-screenshot.png)");
    println!("    --find=<png>        Locate a template on screen and print its center");
    println!("    --await=<png>       Wait until a template is on screen");
    println!("    --edge              Compare edge maps instead of pixels (with --find)");
    println!("    --threshold=<f>     Maximum difference that counts as a match (default 0.05)");
    println!("    --timeout=<secs>    Timeout for --await (default 60)");
    println!("    --device=<name>     Device to use (default: first connected)");
    println!("    --impl=<shell|rust> Select ADB implementation (default: rust)");
    println!("                        The shell implementation requires the ADB tool to be installed.");
    println!("    --debug             Enable debug logging");
    println!("    --help, -h          Show this help message");
    println!("    --version, -v       Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    android-auto-run --screenshot --impl=shell");
    println!("    android-auto-run --find=assets/ok_button.png --threshold=0.1");
    println!("    android-auto-run --await=assets/lobby.png --timeout=120 --debug");
}
