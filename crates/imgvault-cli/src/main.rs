use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use imgvault_core::{Config, ImageIdentifier, OwnerKey, StorageBuilder};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// シャード化したディレクトリに画像を保存・取得する運用ツール
#[derive(Debug, Parser)]
#[command(name = "imgvault", version, about)]
struct Cli {
    /// 設定ファイル（TOML）。存在しなければ既定値と環境変数のみを使う
    #[arg(short, long, default_value = "imgvault.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct ImageArgs {
    #[arg(long)]
    owner: OwnerKey,

    #[arg(long)]
    image: ImageIdentifier,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// ファイルの内容を保存（既に存在すれば更新時刻のみ更新）
    Store {
        #[command(flatten)]
        key: ImageArgs,

        #[arg(long)]
        file: PathBuf,
    },
    /// 画像を読み出す（--out がなければ標準出力へ）
    Get {
        #[command(flatten)]
        key: ImageArgs,

        #[arg(long)]
        out: Option<PathBuf>,
    },
    Delete(ImageArgs),
    Exists(ImageArgs),
    LastModified(ImageArgs),
    /// ストレージが書き込み可能か
    Status,
}

/// 既定値 → 設定ファイル → 環境変数（IMGVAULT_STORAGE__ROOT_DIRECTORY など）の順にマージ
fn load_config(path: &Path) -> Result<Config> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("IMGVAULT_").split("__"))
        .extract()
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn init_tracing() {
    // 標準出力は画像データ用に空けておく
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    let store = StorageBuilder::new(config.storage).build()?;

    match cli.command {
        Command::Store { key, file } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            if !store.store(&key.owner, &key.image, &data).await? {
                bail!("failed to store {}/{}", key.owner, key.image);
            }
            info!(owner = %key.owner, image = %key.image, size = data.len(), "stored image");
        }
        Command::Get { key, out } => {
            let data = store.retrieve(&key.owner, &key.image).await?;
            match out {
                Some(path) => tokio::fs::write(&path, &data)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => std::io::stdout().lock().write_all(&data)?,
            }
        }
        Command::Delete(key) => {
            if !store.delete(&key.owner, &key.image).await? {
                bail!("failed to delete {}/{}", key.owner, key.image);
            }
            info!(owner = %key.owner, image = %key.image, "deleted image");
        }
        Command::Exists(key) => {
            let exists = store.exists(&key.owner, &key.image).await;
            println!("{exists}");
            if !exists {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::LastModified(key) => {
            let modified = store.last_modified(&key.owner, &key.image).await?;
            println!("{}", modified.to_rfc2822());
        }
        Command::Status => {
            let storage = store.status().await;
            println!("{}", serde_json::json!({ "storage": storage }));
            if !storage {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
