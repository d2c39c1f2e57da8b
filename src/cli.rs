// Wardrobe CLI binary

use std::path::PathBuf;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use anyhow::{Context, Result};

use wardrobe_lib::config::{self, AppConfig, BackendConfig};
use wardrobe_lib::gallery::{render_text, GalleryLayout};
use wardrobe_lib::items::ItemId;
use wardrobe_lib::session::keychain;
use wardrobe_lib::session::validation::CredentialsForm;
use wardrobe_lib::upload::{FilePicker, UploadObserver, UploadOutcome, UploadProgress};
use wardrobe_lib::{AppContext, WardrobeError};

#[derive(Parser)]
#[command(name = "closet")]
#[command(about = "Wardrobe - catalog your clothes and get styling advice", long_about = None)]
#[command(version)]
struct Cli {
    /// Use a local library at this path (overrides the configured backend)
    #[arg(short, long, global = true)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Password confirmation (defaults to the password)
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Sign out and forget the session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Send a password reset email
    ResetPassword {
        #[arg(short, long)]
        email: String,
    },

    /// Show your wardrobe (recent strip, or every item with --all)
    List {
        #[arg(long)]
        all: bool,
    },

    /// Upload an image or video as a new item
    Add {
        /// Media file to upload
        path: PathBuf,
    },

    /// Delete an item
    Delete {
        /// Item ID
        id: ItemId,
    },

    /// Select an item and show the gallery
    Select {
        /// Item ID
        id: ItemId,
    },

    /// Ask the styling service for advice
    Advice {
        /// Season, e.g. "Fall"
        #[arg(short, long)]
        season: String,
        /// Style tag (repeatable)
        #[arg(long = "style", required = true)]
        styles: Vec<String>,
        /// Build the look around this item
        #[arg(long)]
        item: Option<ItemId>,
        /// Write the first generated image here
        #[arg(long)]
        save_image: Option<PathBuf>,
    },

    /// Add the sample wardrobe items
    Seed,

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = load_config(cli.library)?;
    let ctx = AppContext::new(config)?;
    ctx.auth.restore(keychain::load_session());

    let result = match cli.command {
        Commands::Signup { email, password, confirm } => cmd_signup(&ctx, email, password, confirm).await,
        Commands::Login { email, password } => cmd_login(&ctx, email, password).await,
        Commands::Logout => cmd_logout(&ctx).await,
        Commands::Whoami => cmd_whoami(&ctx),
        Commands::ResetPassword { email } => cmd_reset_password(&ctx, email).await,
        Commands::List { all } => cmd_list(&ctx, all).await,
        Commands::Add { path } => cmd_add(&ctx, path).await,
        Commands::Delete { id } => cmd_delete(&ctx, id).await,
        Commands::Select { id } => cmd_select(&ctx, id).await,
        Commands::Advice { season, styles, item, save_image } => {
            cmd_advice(&ctx, season, styles, item, save_image).await
        }
        Commands::Seed => cmd_seed(&ctx).await,
        Commands::Config => cmd_config(&ctx.config),
    };

    // Show the same alert the app would
    result.map_err(|e| {
        let alert = e.alert();
        anyhow::anyhow!("{}: {}", alert.title, alert.message)
    })
}

fn load_config(library: Option<PathBuf>) -> Result<AppConfig> {
    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if let Some(root) = library {
        let library_root = root.canonicalize().unwrap_or(root);
        config.backend = BackendConfig::Local { library_root };
    }
    Ok(config)
}

fn cmd_config(config: &AppConfig) -> CmdResult {
    println!("Config file: {}", config::config_path().display());
    match &config.backend {
        BackendConfig::Local { library_root } => {
            println!("Backend:     local ({})", library_root.display());
        }
        BackendConfig::Supabase { url, bucket, table, .. } => {
            println!("Backend:     supabase ({})", url);
            println!("Bucket:      {}", bucket);
            println!("Table:       {}", table);
        }
    }
    match config.styling_endpoints() {
        Some(endpoints) => {
            println!("Advice URL:  {}", endpoints.advice_url);
            println!("Image URL:   {}", endpoints.image_url);
        }
        None => println!("Styling:     not configured"),
    }
    println!("Strip limit: {}", config.gallery.strip_limit);
    Ok(())
}

type CmdResult = std::result::Result<(), WardrobeError>;

async fn cmd_signup(ctx: &AppContext, email: String, password: String, confirm: Option<String>) -> CmdResult {
    let confirm = confirm.unwrap_or_else(|| password.clone());
    let user = ctx
        .auth
        .sign_up(&CredentialsForm::sign_up(&email, &password, &confirm))
        .await?;
    println!("Account created for {} ({})", user.email.unwrap_or(email), user.id);
    println!("Sign in with: closet login --email <email> --password <password>");
    Ok(())
}

async fn cmd_login(ctx: &AppContext, email: String, password: String) -> CmdResult {
    let session = ctx
        .auth
        .sign_in(&CredentialsForm::sign_in(&email, &password))
        .await?;
    if let Err(e) = keychain::save_session(&session) {
        log::warn!("Session not saved to the keychain: {}", e);
    }
    println!("Signed in as {}", session.user.email.as_deref().unwrap_or(&session.user.id));
    Ok(())
}

async fn cmd_logout(ctx: &AppContext) -> CmdResult {
    ctx.auth.sign_out().await?;
    keychain::clear_session()?;
    println!("Signed out");
    Ok(())
}

fn cmd_whoami(ctx: &AppContext) -> CmdResult {
    match ctx.session().current() {
        Some(session) => {
            println!("User ID: {}", session.user.id);
            println!("Email:   {}", session.user.email.as_deref().unwrap_or("-"));
            if let Some(expires) = session.expires_at {
                println!("Expires: {}", expires.to_rfc3339());
            }
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

async fn cmd_reset_password(ctx: &AppContext, email: String) -> CmdResult {
    ctx.auth.reset_password(&email).await?;
    println!("Password reset email sent to {}", email.trim());
    Ok(())
}

async fn cmd_list(ctx: &AppContext, all: bool) -> CmdResult {
    ctx.view.on_focus().await?;
    let layout = if all { GalleryLayout::Grid } else { GalleryLayout::Strip };
    print!("{}", render_text(&ctx.view.gallery(layout)));
    Ok(())
}

async fn cmd_add(ctx: &AppContext, path: PathBuf) -> CmdResult {
    if !path.exists() {
        return Err(WardrobeError::Validation(format!("File not found: {}", path.display())));
    }
    ctx.view.on_focus().await?;

    let observer: Arc<dyn UploadObserver> = Arc::new(|p: &UploadProgress| {
        if !p.is_error && !p.is_cancelled {
            eprintln!("[{}/{}] {}", p.current, p.total, p.message);
        }
    });

    match ctx.view.add_item(&FilePicker::new(Some(path)), Some(observer)).await? {
        UploadOutcome::Uploaded(item) => {
            println!("Saved item #{} {}  {}", item.id, item.name, item.image_url);
        }
        UploadOutcome::Cancelled => println!("Upload cancelled"),
    }
    print!("{}", render_text(&ctx.view.gallery(GalleryLayout::Strip)));
    Ok(())
}

async fn cmd_delete(ctx: &AppContext, id: ItemId) -> CmdResult {
    ctx.view.on_focus().await?;
    if !ctx.view.snapshot().items().iter().any(|i| i.id == id) {
        return Err(WardrobeError::Validation(format!("No item with ID {}", id)));
    }
    ctx.view.delete_item(id).await?;
    println!("Deleted item #{}", id);
    print!("{}", render_text(&ctx.view.gallery(GalleryLayout::Grid)));
    Ok(())
}

/// Refetch, then select the item with `id`.
async fn focus_and_select(ctx: &AppContext, id: ItemId) -> CmdResult {
    ctx.view.on_focus().await?;
    let key = ctx
        .view
        .snapshot()
        .items()
        .iter()
        .find(|i| i.id == id)
        .map(|i| i.key())
        .ok_or_else(|| WardrobeError::Validation(format!("No item with ID {}", id)))?;
    ctx.view.select(&key);
    Ok(())
}

async fn cmd_select(ctx: &AppContext, id: ItemId) -> CmdResult {
    focus_and_select(ctx, id).await?;
    print!("{}", render_text(&ctx.view.gallery(GalleryLayout::Grid)));
    Ok(())
}

async fn cmd_advice(
    ctx: &AppContext,
    season: String,
    styles: Vec<String>,
    item: Option<ItemId>,
    save_image: Option<PathBuf>,
) -> CmdResult {
    if let Some(id) = item {
        focus_and_select(ctx, id).await?;
    }

    let result = ctx.view.request_styling(&season, &styles).await?;
    println!("{}", result.advice_text);
    if let Some(ms) = result.response_time_ms {
        println!();
        println!("(answered in {:.1}s)", ms as f64 / 1000.0);
    }

    match (save_image, result.first_image_bytes()?) {
        (Some(path), Some(bytes)) => {
            std::fs::write(&path, bytes)?;
            println!("Saved generated image to {}", path.display());
        }
        (Some(_), None) => println!("No image was generated"),
        (None, Some(_)) => println!("{} image(s) generated; use --save-image to keep one", result.generated_images.len()),
        (None, None) => {}
    }
    Ok(())
}

async fn cmd_seed(ctx: &AppContext) -> CmdResult {
    let added = ctx.view.seed().await?;
    println!("Added {} mock items!", added);
    print!("{}", render_text(&ctx.view.gallery(GalleryLayout::Grid)));
    Ok(())
}
