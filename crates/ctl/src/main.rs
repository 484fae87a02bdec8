#![forbid(unsafe_code)]

//! Terminal front-end for the schedule services.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use schedule_core::api::ProfileDraft;
use schedule_core::route::Route;
use schedule_core::validation::{CourseRef, CustomEventDraft, EventKey};
use schedule_sync::{
    AvatarUpload, Catalog, ClientConfig, HttpTransport, ProfileClient, ScheduleStore, Session,
};

mod render;

#[derive(Parser, Debug)]
#[command(name = "schedulectl", version, about = "Build and share weekly course schedules")]
struct Args {
    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Schedule service base URL (overrides the config file).
    #[arg(long)]
    primary: Option<String>,

    /// Sharing service base URL (overrides the config file).
    #[arg(long)]
    sharing: Option<String>,

    /// Public tunnel URL used as the base of share links.
    #[arg(long)]
    public_share_url: Option<String>,

    /// Log level (env-filter syntax).
    #[arg(long, default_value = "info")]
    log: String,

    #[arg(long, short)]
    username: Option<String>,

    #[arg(long, short)]
    password: Option<String>,

    /// Print JSON instead of text where the command supports it.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Create an account and sign in.
    Register,
    /// Search the course catalog.
    Search { query: String },
    /// Ask the course assistant.
    Ask { question: String },
    /// Show the active schedule.
    Show,
    /// Names of the saved schedules.
    List,
    /// Add a catalog section to the active schedule.
    Add {
        subject: String,
        course_code: u32,
        section: char,
    },
    /// Remove a course from the active schedule.
    Remove {
        subject: String,
        course_code: u32,
        section: char,
    },
    /// Add a custom event, e.g. `add-event Work --days MWF --start 09:00 --end 12:00`.
    AddEvent {
        name: String,
        #[arg(long)]
        days: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Remove an event by its index in `show`.
    RemoveEvent { index: usize },
    Undo,
    Redo,
    /// Persist the active schedule.
    Save,
    /// Make a saved schedule active.
    Load { name: String },
    /// Create an empty schedule and make it active.
    Create { name: String },
    /// Delete a saved schedule.
    Delete { name: String },
    /// Mint a share link for a saved schedule.
    Share { name: String },
    /// Where a client path lands for the signed-in user.
    Route { path: String },
    Profile {
        #[command(subcommand)]
        cmd: ProfileCmd,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileCmd {
    Show,
    Set {
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        picture_url: Option<String>,
        #[arg(long)]
        favorite_spot: Option<String>,
    },
    /// Upload an avatar image.
    Avatar { file: PathBuf },
}

fn load_config(args: &Args) -> anyhow::Result<ClientConfig> {
    let mut cfg = match &args.config {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &args.primary {
        cfg.endpoints.primary = url.clone();
    }
    if let Some(url) = &args.sharing {
        cfg.endpoints.sharing = url.clone();
    }
    if let Some(url) = &args.public_share_url {
        cfg.share.public_base_url = Some(url.clone());
    }
    Ok(cfg)
}

fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = load_config(&args)?;
    let transport = Arc::new(HttpTransport::new(&cfg.endpoints).context("build transport")?);

    // read-only commands that need no sign-in
    match &args.cmd {
        Cmd::Search { query } => {
            let hits = Catalog::new(Arc::clone(&transport))
                .search(query)
                .await
                .context("search")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                print!("{}", render::search_results(&hits));
            }
            return Ok(());
        }
        Cmd::Ask { question } => {
            let answer = Catalog::new(Arc::clone(&transport))
                .ask(question)
                .await
                .context("ask")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                print!("{}", render::answer(&answer));
            }
            return Ok(());
        }
        _ => {}
    }

    let (Some(username), Some(password)) = (args.username.as_deref(), args.password.as_deref())
    else {
        bail!("--username and --password are required for this command");
    };

    let store = ScheduleStore::new(Arc::clone(&transport))
        .with_save_flash(cfg.save_flash())
        .with_user_hook(|u| tracing::info!(user = %u.name, schedules = ?u.schedule_names(), "user updated"));
    let session = Session::new(store);

    let user = match args.cmd {
        Cmd::Register => session.sign_up(username, password).await.context("register")?,
        _ => session.sign_in(username, password).await.context("login")?,
    };
    let store = session.store();

    match args.cmd {
        Cmd::Search { .. } | Cmd::Ask { .. } | Cmd::Register | Cmd::Show => {}
        Cmd::List => {
            for name in user.schedule_names() {
                println!("{name}");
            }
            return Ok(());
        }
        Cmd::Add {
            subject,
            course_code,
            section,
        } => {
            store
                .add_course(&CourseRef {
                    subject,
                    course_code,
                    section,
                })
                .await
                .context("add course")?;
        }
        Cmd::Remove {
            subject,
            course_code,
            section,
        } => {
            store
                .remove_course(&CourseRef {
                    subject,
                    course_code,
                    section,
                })
                .await
                .context("remove course")?;
        }
        Cmd::AddEvent {
            name,
            days,
            start,
            end,
        } => {
            store
                .add_custom_event(&CustomEventDraft {
                    name,
                    days,
                    start,
                    end,
                })
                .await
                .context("add event")?;
        }
        Cmd::RemoveEvent { index } => {
            let key = store
                .snapshot()
                .schedule
                .and_then(|s| s.events.get(index).map(EventKey::of))
                .with_context(|| format!("no event at index {index}"))?;
            store.remove_event(&key).await.context("remove event")?;
        }
        Cmd::Undo => {
            store.undo().await.context("undo")?;
        }
        Cmd::Redo => {
            store.redo().await.context("redo")?;
        }
        Cmd::Save => {
            let message = store.save().await.context("save")?;
            println!("{}", message.as_deref().unwrap_or("Schedule saved."));
            return Ok(());
        }
        Cmd::Load { name } => {
            store.load(&name).await.context("load")?;
        }
        Cmd::Create { name } => {
            store.create(&name).await.context("create")?;
        }
        Cmd::Delete { name } => {
            let message = store.delete(&name).await.context("delete")?;
            println!("{}", message.as_deref().unwrap_or("Schedule deleted."));
        }
        Cmd::Share { name } => {
            store.share(&name).await.context("share")?;
            if let Some(link) = store.share_link(&cfg.share) {
                println!("{link}");
            }
            return Ok(());
        }
        Cmd::Route { path } => {
            let landed = Route::parse(&path).resolve(true);
            println!("{}", landed.path());
            return Ok(());
        }
        Cmd::Profile { cmd } => {
            let profiles = ProfileClient::new(Arc::clone(&transport));
            let existing = profiles.fetch(&user.name).await.context("fetch profile")?;
            let profile = match cmd {
                ProfileCmd::Show => match existing {
                    Some(p) => p,
                    None => {
                        println!("No profile yet.");
                        return Ok(());
                    }
                },
                ProfileCmd::Set {
                    bio,
                    picture_url,
                    favorite_spot,
                } => {
                    let mut draft = existing.as_ref().map(ProfileDraft::from).unwrap_or_default();
                    if let Some(v) = bio {
                        draft.bio = v;
                    }
                    if let Some(v) = picture_url {
                        draft.profile_pic_url = v;
                    }
                    if let Some(v) = favorite_spot {
                        draft.favorite_spot = v;
                    }
                    profiles
                        .save(&user.name, &draft, existing.is_some())
                        .await
                        .context("save profile")?
                }
                ProfileCmd::Avatar { file } => {
                    if existing.is_none() {
                        bail!("create a profile with `profile set` before uploading an avatar");
                    }
                    let bytes = tokio::fs::read(&file)
                        .await
                        .with_context(|| format!("read {}", file.display()))?;
                    let file_name = file
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("avatar")
                        .to_string();
                    profiles
                        .upload_avatar(
                            &user.name,
                            AvatarUpload {
                                file_name,
                                content_type: content_type(&file).to_string(),
                                bytes,
                            },
                        )
                        .await
                        .context("upload avatar")?
                }
            };
            if args.json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                print!("{}", render::profile(&profile));
            }
            return Ok(());
        }
    }

    let state = store.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&state.schedule)?);
    } else {
        print!("{}", render::calendar(&render::view(&state)));
    }
    Ok(())
}
