use clap::{
	ArgAction,
	Parser
};

use std::{
	path::PathBuf,
	process::ExitCode
};

use tracing::warn;
use tracing_subscriber::EnvFilter;

use iconswap_patches_icon::{
	PatchCfg,
	MAIN_ICON,
	writer::PatchError
};

#[derive(Parser, Debug)]
#[command(name = "iconswap")]
#[command(about = "Replaces the icon of a Windows executable")]
#[command(after_help = "valid icon formats are: ICO (recommended), BMP\nvalid program format is: EXE")]
#[command(version, disable_version_flag = true, arg_required_else_help = true)]
struct Args {
	/// Print version
	#[arg(short = 'v', long, action = ArgAction::Version)]
	version: Option<bool>,

	/// Icon to embed (.ico or .bmp)
	icon: PathBuf,

	/// Executable to patch
	exe: PathBuf,

	/// Ignored
	#[arg(hide = true)]
	extra: Vec<String>,

	/// Name of the icon group resource
	#[arg(long, default_value = MAIN_ICON)]
	group_name: String,

	/// Enable debug logging
	#[arg(long)]
	verbose: bool,
}

fn init_logging(verbose: bool) {
	let filter = match verbose {
		true => EnvFilter::new("debug"),
		false => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

#[cfg(windows)]
fn run(args: &Args, cfg: &PatchCfg) -> Result<(), PatchError> {
	use iconswap_patches_icon::win32::Win32ResourceWriter;

	let mut writer = Win32ResourceWriter::new(cfg.language);
	iconswap_patches_icon::change_icon(&args.icon, &args.exe, cfg, &mut writer)
}

#[cfg(not(windows))]
fn run(args: &Args, _cfg: &PatchCfg) -> Result<(), PatchError> {
	// still validate the icon so the command is useful as a checker
	iconswap_patches_icon::group::Icon::build(&args.icon)?;
	Err(PatchError::Unsupported)
}

fn main() -> ExitCode {
	let args = Args::parse();
	init_logging(args.verbose);

	if !args.extra.is_empty() {
		warn!("{} parameter(s) will be ignored...", args.extra.len());
	}

	let cfg = PatchCfg {
		group_name: args.group_name.clone(),
		..PatchCfg::default()
	};

	match run(&args, &cfg) {
		Ok(()) => {
			println!("Icon changed successfully!");
			ExitCode::SUCCESS
		},
		Err(e) => {
			eprintln!("{}", e);
			ExitCode::FAILURE
		},
	}
}
