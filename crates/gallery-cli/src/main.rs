use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::{Parser, Subcommand};

use gallery_auth::AuthGateway;
use gallery_hash::Argon2Hasher;
use gallery_store::Database;
use gallery_types::{ArtworkPatch, NewArtwork};

#[derive(Parser)]
#[command(name = "gallery", about = "Local gallery store: artworks and accounts")]
struct Cli {
    /// Database file (falls back to GALLERY_DB_PATH, then gallery.db)
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all artworks
    List {
        /// Emit the full records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one artwork
    Show { id: i64 },
    /// Add an artwork from an image file
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Image file; encoded into the record as a base64 data URI
        #[arg(long)]
        image: PathBuf,
    },
    /// Edit fields of an existing artwork
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Remove an artwork
    Remove { id: i64 },
    /// Register a new member account
    Register { username: String, password: String },
    /// Check credentials and print the session user
    Login { username: String, password: String },
}

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gallery=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let db_path = cli
        .db
        .or_else(|| std::env::var("GALLERY_DB_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("gallery.db"));

    let db = Arc::new(Database::open(&db_path, Arc::new(Argon2Hasher))?);

    match cli.command {
        Command::List { json } => {
            let artworks = db.list_artworks()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&artworks)?);
            } else if artworks.is_empty() {
                println!("(no artworks)");
            } else {
                for art in artworks {
                    println!(
                        "#{:<4} {:<30} uploaded {}",
                        art.id,
                        art.title,
                        art.upload_date.to_rfc3339()
                    );
                }
            }
        }
        Command::Show { id } => {
            let Some(art) = db.get_artwork(id)? else {
                bail!("artwork #{id} not found");
            };
            println!("#{} {}", art.id, art.title);
            println!("uploaded:    {}", art.upload_date.to_rfc3339());
            println!("description: {}", art.description);
            println!("image:       {} bytes (data URI)", art.image_data.len());
        }
        Command::Add {
            title,
            description,
            image,
        } => {
            let image_data = data_uri_from_file(&image)?;
            let id = db.create_artwork(&NewArtwork {
                title,
                description,
                image_data,
            })?;
            println!("created artwork #{id}");
        }
        Command::Edit {
            id,
            title,
            description,
            image,
        } => {
            let image_data = match image {
                Some(path) => Some(data_uri_from_file(&path)?),
                None => None,
            };
            let patch = ArtworkPatch {
                title,
                description,
                image_data,
            };
            db.update_artwork(id, &patch)?;
            println!("updated artwork #{id}");
        }
        Command::Remove { id } => {
            db.delete_artwork(id)?;
            println!("removed artwork #{id}");
        }
        Command::Register { username, password } => {
            let auth = AuthGateway::new(db.clone());
            let user = auth.register(&username, &password)?;
            println!("registered {} (#{}, role {})", user.username, user.id, user.role);
        }
        Command::Login { username, password } => {
            let auth = AuthGateway::new(db.clone());
            match auth.verify_credentials(&username, &password)? {
                Some(user) => {
                    println!("ok: {} (#{}, role {})", user.username, user.id, user.role)
                }
                None => bail!("invalid username or password"),
            }
        }
    }

    Ok(())
}

/// Encodes an image file the way the original upload path did: inline, as a
/// base64 data URI. MIME is guessed from the extension only.
fn data_uri_from_file(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read image {}", path.display()))?;

    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };

    Ok(format!("data:{};base64,{}", mime, BASE64.encode(bytes)))
}
