//! Handlers behind each CLI command.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use chrono::Local;
use log::info;

use crate::{
    cli::{Command, PasswordResetCommand, PrefsCommand, WeightCommand},
    models::{
        NewWorkout, Patch, Registration, SetId, SetPatch, SetTemplate, UserPatch, WorkoutId,
        WorkoutPatch,
    },
    session::{SessionState, SetStatus},
    tracking::LiveTracking,
    tui,
    utils::format::{format_datetime, format_duration, format_set},
    AppContext,
};

pub async fn dispatch(ctx: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ")?,
            };
            let user = ctx.api.login(&username, &password).await?;
            println!("Logged in as {}", user.username);
        }
        Command::Logout => {
            ctx.api.logout().await?;
            println!("Logged out");
        }
        Command::Register {
            username,
            password,
            email,
            first_name,
            last_name,
        } => {
            let availability = ctx
                .api
                .check_availability(Some(&username), email.as_deref())
                .await?;
            if availability.username_taken {
                bail!("username '{username}' is taken");
            }
            if availability.email_taken {
                bail!("that email is already registered");
            }

            let user = ctx
                .api
                .register(&Registration {
                    username,
                    password,
                    email,
                    first_name,
                    last_name,
                })
                .await?;
            println!("Registered {}; log in to continue", user.username);
        }
        Command::Whoami => {
            let user = match ctx.api.current_user().await? {
                Some(user) => user,
                None if ctx.tokens.is_logged_in() => ctx.api.me().await?,
                None => bail!("not logged in"),
            };
            println!("{} (#{})", user.username, user.id);
            if let Some(email) = &user.email {
                println!("  email:  {email}");
            }
            let name = format!("{} {}", user.first_name, user.last_name);
            if !name.trim().is_empty() {
                println!("  name:   {}", name.trim());
            }
            if let Some(height) = user.height {
                println!("  height: {height} cm");
            }
        }
        Command::Profile {
            email,
            first_name,
            last_name,
            height,
            dob,
        } => {
            let patch = UserPatch {
                email,
                first_name,
                last_name,
                password: None,
                height: Patch::from_option(height),
                dob: Patch::from_option(dob),
            };
            let user = ctx.api.update_me(&patch).await?;
            println!("Updated profile for {}", user.username);
        }
        Command::DeleteAccount { yes } => {
            if !yes {
                bail!("refusing to delete the account without --yes");
            }
            ctx.api.delete_me().await?;
            println!("Account deleted");
        }
        Command::Available { username, email } => {
            let availability = ctx
                .api
                .check_availability(username.as_deref(), email.as_deref())
                .await?;
            if availability.is_available() {
                println!("Available");
            } else {
                if availability.username_taken {
                    println!("Username is taken");
                }
                if availability.email_taken {
                    println!("Email is taken");
                }
            }
        }
        Command::PasswordReset(command) => password_reset(ctx, command).await?,
        Command::Workouts { page } => {
            ctx.store.fetch_all_workouts(page).await?;
            print_workouts(&ctx.store.snapshot());
        }
        Command::Show { workout } => {
            ctx.store.fetch_workout_details(workout).await?;
            print_details(&ctx.store.snapshot());
        }
        Command::NewWorkout {
            name,
            date,
            notes,
            weight,
            sleep_score,
            sleep_quality,
        } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let mut new = NewWorkout::named(name, date);
            new.notes = notes;
            new.user_weight = weight;
            new.sleep_score = sleep_score;
            new.sleep_quality = sleep_quality;
            let id = ctx.store.create_workout(&new).await?;
            println!("Created workout #{id}");
        }
        Command::EditWorkout {
            workout,
            name,
            date,
            notes,
            sleep_score,
            sleep_quality,
        } => {
            let patch = WorkoutPatch {
                workout_name: name,
                date,
                notes,
                sleep_quality,
                sleep_score: Patch::from_option(sleep_score),
                ..WorkoutPatch::default()
            };
            ctx.store.update_workout(workout, &patch).await?;
        }
        Command::Start { workout } => {
            let started = ctx.store.start_workout(workout).await?;
            println!("Started at {}", format_datetime(started.start_time));
        }
        Command::ToggleComplete { workout } => {
            let updated = ctx.store.toggle_complete(workout).await?;
            if updated.complete {
                println!("Complete in {}", format_duration(updated.duration));
            } else {
                println!("Reopened");
            }
        }
        Command::Duplicate { workout } => {
            let id = ctx.store.duplicate_workout(workout).await?;
            println!("Copied to workout #{id}");
        }
        Command::Delete { workout } => ctx.store.delete_workout(workout).await?,
        Command::AddSets {
            workout,
            exercise,
            count,
            loading,
            reps,
            rest,
            set_type,
            focus,
            notes,
        } => {
            let template = SetTemplate {
                exercise_name: exercise,
                set_type,
                focus,
                loading,
                reps,
                rest,
                notes,
            };
            let outcome = ctx.store.create_sets(workout, &template, count).await?;
            info!(
                "Batch for workout {workout}: {} created, {} failed",
                outcome.created, outcome.failed
            );
            print_details(&ctx.store.snapshot());
        }
        Command::EditSet {
            workout,
            set,
            exercise,
            loading,
            reps,
            rest,
            notes,
        } => {
            ensure_set_loaded(ctx, workout, set).await?;
            let patch = SetPatch {
                exercise_name: exercise,
                notes,
                loading: Patch::from_option(loading),
                reps: Patch::from_option(reps),
                rest: Patch::from_option(rest),
                ..SetPatch::default()
            };
            ctx.store.update_set(set, &patch).await?;
        }
        Command::DeleteSet { workout, set } => {
            ensure_set_loaded(ctx, workout, set).await?;
            ctx.store.delete_set(set).await?;
        }
        Command::MoveSet {
            workout,
            set,
            position,
        } => {
            ensure_set_loaded(ctx, workout, set).await?;
            ctx.store.move_set(set, position).await?;
            print_details(&ctx.store.snapshot());
        }
        Command::Weight(command) => weight(ctx, command).await?,
        Command::Prefs(command) => match command {
            PrefsCommand::AutoStart { state } => {
                ctx.settings.set_auto_start_next_set(state.into())?;
                println!("auto-start next set: {:?}", state);
            }
            PrefsCommand::Show => {
                let preferences = ctx.settings.preferences();
                println!("auto-start next set: {}", preferences.auto_start_next_set);
            }
        },
        Command::Track { workout } => {
            if !ctx.tokens.is_logged_in() {
                bail!("not logged in");
            }
            let tracking = LiveTracking::mount(
                ctx.store.clone(),
                ctx.timer.clone(),
                ctx.settings.clone(),
                workout,
            )
            .await?;
            tui::run(tracking).await?;
        }
    }
    Ok(())
}

async fn password_reset(ctx: &AppContext, command: PasswordResetCommand) -> Result<()> {
    let message = match command {
        PasswordResetCommand::Request { email } => ctx.api.request_password_reset(&email).await?,
        PasswordResetCommand::Confirm {
            token,
            new_password,
            confirm_password,
        } => {
            ctx.api
                .confirm_password_reset(&token, &new_password, &confirm_password)
                .await?
        }
    };
    if !message.is_empty() {
        println!("{message}");
    }
    Ok(())
}

async fn weight(ctx: &AppContext, command: WeightCommand) -> Result<()> {
    match command {
        WeightCommand::Add { kg } => {
            let entry = ctx.api.add_weight(kg).await?;
            println!("Recorded {} kg (#{})", entry.weight, entry.id);
        }
        WeightCommand::List => {
            let entries = ctx.api.list_weights().await?;
            if entries.is_empty() {
                println!("No weights recorded");
            }
            for entry in entries {
                println!(
                    "#{:<5} {:>7.2} kg  {}",
                    entry.id,
                    entry.weight,
                    format_datetime(Some(entry.date_recorded))
                );
            }
        }
        WeightCommand::Update { id, kg } => {
            let entry = ctx.api.update_weight(id, kg).await?;
            println!("Updated #{} to {} kg", entry.id, entry.weight);
        }
        WeightCommand::Delete { id } => {
            ctx.api.delete_weight(id).await?;
            println!("Deleted #{id}");
        }
    }
    Ok(())
}

/// Set mutations that need the surrounding workout (position bounds, refresh
/// target) load it first.
async fn ensure_set_loaded(ctx: &AppContext, workout: WorkoutId, set: SetId) -> Result<()> {
    ctx.store.fetch_workout_details(workout).await?;
    if ctx.store.snapshot().find_set(set).is_none() {
        bail!("set {set} is not part of workout {workout}");
    }
    Ok(())
}

fn print_workouts(state: &SessionState) {
    if state.workouts.is_empty() {
        println!("No workouts");
        return;
    }
    for workout in &state.workouts {
        println!(
            "#{:<5} {}  {:<28} {:?}",
            workout.id,
            workout.date,
            workout.workout_name,
            workout.status()
        );
    }

    let pagination = &state.pagination;
    let mut footer = format!("page {} ({} workouts)", state.page, pagination.count);
    if pagination.previous.is_some() {
        footer.push_str(&format!("  previous: --page {}", state.page.saturating_sub(1).max(1)));
    }
    if pagination.next.is_some() {
        footer.push_str(&format!("  next: --page {}", state.page + 1));
    }
    println!("{footer}");
}

fn print_details(state: &SessionState) {
    let Some(workout) = &state.workout else {
        return;
    };

    println!("{} ({})", workout.workout_name, workout.date);
    println!(
        "  started {}  duration {}  {:?}",
        format_datetime(workout.start_time),
        format_duration(workout.duration),
        workout.status()
    );
    for (position, set) in state.sets.iter().enumerate() {
        let mark = match state.set_status(set) {
            SetStatus::Complete => "x",
            SetStatus::Skipped => "-",
            SetStatus::Pending => " ",
        };
        println!("  {:>2}. [{mark}] #{:<5} {}", position + 1, set.id, format_set(set));
    }
    println!(
        "  {}/{} sets complete",
        state.complete_sets.len(),
        state.sets.len()
    );
}

fn prompt(label: &str) -> Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{label}")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
