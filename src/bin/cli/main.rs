use anyhow::{Context, Result};
use archive_file_store::{
    app::AppBuilder, config::StoreArgs, ports::services::ArchiveService, ArchiveError, ObjectName,
};
use clap::{Parser, Subcommand};
use futures::{StreamExt, TryStreamExt};
use std::path::PathBuf;
use tokio_util::{io::ReaderStream, sync::CancellationToken};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "archive-file-store-cli")]
#[command(about = "Administer archive buckets directly against the configured store", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the bucket for an archive
    CreateBucket {
        /// Archive identifier (normalized into a bucket name)
        archive: String,
    },

    /// Delete every file of an archive, then its bucket
    DeleteBucket { archive: String },

    /// List the files of an archive
    List { archive: String },

    /// Upload a local file, replacing any file of the same name
    Upload {
        archive: String,
        /// Local file to upload
        path: PathBuf,
        /// Name in the archive (defaults to the local file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Content type (guessed from the extension when omitted)
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Download a file
    Download {
        archive: String,
        file: String,
        /// Output file path (defaults to the file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a file
    Delete { archive: String, file: String },

    /// Copy a file into another archive
    Copy {
        archive: String,
        file: String,
        target_archive: String,
        /// Name in the target archive (defaults to the source name)
        #[arg(long)]
        target_file: Option<String>,
    },

    /// Move all files of an archive into another and delete the old bucket
    Migrate {
        archive: String,
        target_archive: String,
    },
}

fn guess_content_type(name: &str) -> Option<&'static str> {
    let name = ObjectName::new(name.to_string()).ok()?;
    let content_type = match name.extension()?.as_str() {
        "pdf" => "application/pdf",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "mid" | "midi" => "audio/midi",
        "xml" | "musicxml" => "application/xml",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => return None,
    };
    Some(content_type)
}

async fn run(service: &dyn ArchiveService, command: Commands) -> Result<()> {
    match command {
        Commands::CreateBucket { archive } => {
            let bucket = service.create_bucket(&archive).await?;
            println!("Created bucket {}", bucket);
        }
        Commands::DeleteBucket { archive } => {
            let report = service.delete_bucket(&archive).await?;
            println!(
                "Deleted bucket {} ({} files removed)",
                report.bucket,
                report.removed.len()
            );
        }
        Commands::List { archive } => {
            for name in service.list_files(&archive).await? {
                println!("{}", name);
            }
        }
        Commands::Upload {
            archive,
            path,
            name,
            content_type,
        } => {
            let name = match name {
                Some(name) => name,
                None => path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .context("Cannot derive a file name from the path; pass --name")?,
            };
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let body = ReaderStream::new(file)
                .map_err(|e| ArchiveError::service(format!("Failed to read upload: {}", e)))
                .boxed();
            let content_type = content_type.as_deref().or_else(|| guess_content_type(&name));

            let size = service
                .upload_stream(&archive, &name, body, content_type)
                .await?;
            println!("Uploaded {} ({} bytes)", name, size);
        }
        Commands::Download {
            archive,
            file,
            output,
        } => {
            let downloaded = service.download_file(&archive, &file).await?;
            let output = output.unwrap_or_else(|| {
                PathBuf::from(file.rsplit('/').next().unwrap_or(file.as_str()))
            });
            tokio::fs::write(&output, &downloaded.data)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Downloaded {} ({} bytes, {})",
                output.display(),
                downloaded.data.len(),
                downloaded.content_type_or_default()
            );
        }
        Commands::Delete { archive, file } => {
            service.delete_file(&archive, &file).await?;
            println!("Deleted {}", file);
        }
        Commands::Copy {
            archive,
            file,
            target_archive,
            target_file,
        } => {
            let target_file = target_file.unwrap_or_else(|| file.clone());
            service
                .copy_file(&archive, &file, &target_archive, &target_file)
                .await?;
            println!("Copied {} to {}/{}", file, target_archive, target_file);
        }
        Commands::Migrate {
            archive,
            target_archive,
        } => {
            let report = service.migrate_bucket(&archive, &target_archive).await?;
            println!(
                "Migrated {} files from {} to {}",
                report.copied.len(),
                report.source,
                report.target
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.store.init_logging()?;

    if cli.store.storage_backend == "memory" {
        warn!("In-memory backend selected; nothing persists after this command");
    }

    let config = cli.store.to_app_config()?;
    let app_services = AppBuilder::new()
        .with_config(config)
        .build()
        .await
        .context("Failed to build application")?;

    // Ctrl-C aborts the running operation instead of killing the process mid-call
    let token = CancellationToken::new();
    let service = app_services.archive_service.with_cancellation(token.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    run(&service, cli.command).await
}
