//! Command-line surface.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use crate::{
    config::AppConfig,
    models::{SetId, WeightId, WorkoutId},
};

#[derive(Debug, Parser)]
#[command(name = "gains")]
#[command(about = "Track workouts, sets and rest timers against a gains server", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(flatten)]
    pub config: AppConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(short, long, env = "GAINS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the local session and blacklist its refresh token
    Logout,

    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "GAINS_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },

    /// Show the logged-in user
    Whoami,

    /// Update profile fields
    Profile {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// Height in centimetres
        #[arg(long)]
        height: Option<u32>,
        /// Date of birth, YYYY-MM-DD
        #[arg(long)]
        dob: Option<NaiveDate>,
    },

    /// Delete the account on the server and log out
    DeleteAccount {
        /// Required; nothing happens without it
        #[arg(long)]
        yes: bool,
    },

    /// Check whether a username or email is free
    Available {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Password reset by email token
    #[command(subcommand)]
    PasswordReset(PasswordResetCommand),

    /// List workouts
    Workouts {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Show one workout with its sets
    Show { workout: WorkoutId },

    /// Create a workout
    NewWorkout {
        #[arg(short, long)]
        name: String,
        /// Defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
        /// Body weight in kg
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        sleep_score: Option<i32>,
        #[arg(long)]
        sleep_quality: Option<String>,
    },

    /// Change workout fields
    EditWorkout {
        workout: WorkoutId,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        sleep_score: Option<i32>,
        #[arg(long)]
        sleep_quality: Option<String>,
    },

    /// Start the workout clock on the server
    Start { workout: WorkoutId },

    /// Mark complete, or reopen a completed workout
    ToggleComplete { workout: WorkoutId },

    /// Copy a workout with all of its sets
    Duplicate { workout: WorkoutId },

    /// Delete a workout
    Delete { workout: WorkoutId },

    /// Add identical sets to a workout
    AddSets {
        workout: WorkoutId,
        #[arg(short, long)]
        exercise: String,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
        /// kg; omit for bodyweight
        #[arg(short, long)]
        loading: Option<f64>,
        #[arg(short, long)]
        reps: Option<u32>,
        /// Rest after each set, seconds
        #[arg(long)]
        rest: Option<u64>,
        #[arg(long, default_value = "")]
        set_type: String,
        #[arg(long, default_value = "")]
        focus: String,
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Change set fields
    EditSet {
        workout: WorkoutId,
        set: SetId,
        #[arg(short, long)]
        exercise: Option<String>,
        #[arg(short, long)]
        loading: Option<f64>,
        #[arg(short, long)]
        reps: Option<u32>,
        #[arg(long)]
        rest: Option<u64>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a set
    DeleteSet { workout: WorkoutId, set: SetId },

    /// Move a set to a 1-based position
    MoveSet {
        workout: WorkoutId,
        set: SetId,
        position: u32,
    },

    /// Body weight log
    #[command(subcommand)]
    Weight(WeightCommand),

    /// Local preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),

    /// Open the live-tracking view for a workout
    Track { workout: WorkoutId },
}

#[derive(Debug, Subcommand)]
pub enum PasswordResetCommand {
    /// Email a reset token
    Request {
        #[arg(short, long)]
        email: String,
    },
    /// Set a new password with the emailed token
    Confirm {
        #[arg(short, long)]
        token: String,
        #[arg(long)]
        new_password: String,
        #[arg(long)]
        confirm_password: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum WeightCommand {
    /// Record a weight in kg
    Add { kg: f64 },
    /// List recorded weights, newest first
    List,
    /// Correct an entry
    Update { id: WeightId, kg: f64 },
    /// Remove an entry
    Delete { id: WeightId },
}

#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    /// Start the next set automatically after rest
    AutoStart {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Print current preferences
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(toggle: Toggle) -> Self {
        toggle == Toggle::On
    }
}
