use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;

#[derive(Parser)]
#[command(name = "habitrace-cli", version, about = "Habitrace CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Record entries and attempts
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Streak inspection
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Race leaderboard
    Race {
        #[command(subcommand)]
        action: commands::race::RaceAction,
    },
    /// Attempt stopwatch
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Repository statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Log { action } => commands::log::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Race { action } => commands::race::run(action),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
