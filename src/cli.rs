use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    #[default]
    Terminal,
    Html,
    Json,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub mode: OutputMode,
    pub file: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CliCommand {
    Run(CliArgs),
    Help,
    Version,
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliCommand, String> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "-V" | "--version" => return Ok(CliCommand::Version),
            "--html" => parsed.mode = OutputMode::Html,
            "--json" => parsed.mode = OutputMode::Json,
            "--file" | "-f" => parsed.file = Some(path_value(&arg, args.next())?),
            "--config" | "-c" => parsed.config = Some(path_value(&arg, args.next())?),
            _ => return Err(format!("Unknown argument: {arg}")),
        }
    }
    Ok(CliCommand::Run(parsed))
}

fn path_value(flag: &str, value: Option<String>) -> Result<PathBuf, String> {
    match value {
        Some(v) if !v.starts_with('-') => Ok(PathBuf::from(v)),
        _ => Err(format!("{flag} needs a path")),
    }
}

pub fn usage_text() -> &'static str {
    "wa-timetable - World Athletics Championships timetable in your timezone

Usage:
  wa-timetable [--file <path>] [--config <path>]
  wa-timetable --html [--file <path>] [--config <path>]
  wa-timetable --json [--file <path>] [--config <path>]
  wa-timetable --help
  wa-timetable --version

Options:
  --html              Print the timetable as Bootstrap HTML and exit
  --json              Print the view model as JSON and exit
  -f, --file <path>   Read a saved HTML page or JSON document instead of fetching
  -c, --config <path> TOML config file ([ui] and [timetable] tables)

Environment:
  WA_TIMETABLE_CONFIG   Config file path (when --config is not given)
  WA_TIMETABLE_URL      Timetable page URL
  WA_TIMETABLE_SOURCE   Local HTML/JSON file to read instead of the URL
  WA_TIMETABLE_TIMEOUT  Fetch timeout in seconds
  WA_TIMETABLE_FROM_TZ  Timezone of the published times (default Asia/Tokyo)
  WA_TIMETABLE_TO_TZ    Timezone to display (default America/Jamaica)"
}
