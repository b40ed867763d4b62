use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_EXPORT_PATH: &str = "euro24_leaderboard.xlsx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub export_path: PathBuf,
    pub demo: bool,
}

impl AppConfig {
    /// Loads `.env.local` / `.env`, then lets the process arguments win.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        let args = std::env::args().skip(1).collect::<Vec<_>>();
        Self::from_env_and_args(&args)
    }

    pub fn from_env_and_args(args: &[String]) -> Self {
        let data_dir = parse_path_arg(args, "--data")
            .or_else(|| env_path("EURO24_DATA_DIR"))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let export_path = parse_path_arg(args, "--export")
            .or_else(|| env_path("EURO24_EXPORT_PATH"))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_PATH));
        let demo = has_flag(args, "--demo") || env_flag("EURO24_DEMO");
        Self {
            data_dir,
            export_path,
            demo,
        }
    }
}

/// Accepts both `--name value` and `--name=value`.
pub fn parse_path_arg(args: &[String], name: &str) -> Option<PathBuf> {
    parse_value_arg(args, name).map(PathBuf::from)
}

pub fn parse_value_arg(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

pub fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
