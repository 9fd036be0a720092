#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = floorplan_cli::run_from_env() {
        tracing::error!(target: "floorplan.cli", %error, "command failed");
        eprintln!("{error}");
        std::process::exit(error.exit_code());
    }
}
