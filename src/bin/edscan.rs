// チャンネル毎のエネルギー検出(ED)値を調べる。
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use anyhow::Context;
use chrono::{DateTime, Local};
use clap::Parser;
use dqradio::dq::DeviceSession;
use dqradio::{EdReading, ScanSettings, ed_scan, open_port};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// チャンネル毎のエネルギー検出(ED)値を調べる
#[derive(Parser, Debug)]
#[command(name = "dq-edscan")]
#[command(version, about, long_about = None)]
struct Cli {
    /// 設定ファイル名
    #[arg(short = 'S', long, default_value = "dqradio.toml")]
    config_file: String,

    /// シリアルデバイス名
    #[arg(short = 'D', long, env = "SERIAL_DEVICE", default_value = "/dev/ttyUSB0")]
    device: String,

    /// 最初のチャンネル
    #[arg(long)]
    first: Option<u8>,

    /// 最後のチャンネル
    #[arg(long)]
    last: Option<u8>,

    /// JSONで出力する
    #[arg(long)]
    json: bool,
}

#[derive(Serialize, Debug)]
struct Report<'a> {
    device: &'a str,
    scanned_at: DateTime<Local>,
    readings: Vec<EdReading>,
}

/// 設定ファイルがあれば読み込む
fn read_settings(file_name: &str) -> anyhow::Result<ScanSettings> {
    if !Path::new(file_name).exists() {
        tracing::debug!("\"{file_name}\" not found, using defaults");
        return Ok(ScanSettings::default());
    }
    let file = fs::read_to_string(file_name).context("setting file read error.")?;
    toml::from_str::<ScanSettings>(&file).context("setting file parse error.")
}

fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    // デバッグレベルは RUST_LOG 環境変数で設定できる
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "{} / {}{}",
        built_info::PKG_NAME,
        built_info::PKG_VERSION,
        built_info::GIT_COMMIT_HASH_SHORT
            .map(|s| format!(" ({s})"))
            .unwrap_or_default()
    );

    // コマンドライン引数
    let cli = Cli::parse();

    let mut settings = read_settings(&cli.config_file)?;
    if let Some(first) = cli.first {
        settings.FirstChannel = first;
    }
    if let Some(last) = cli.last {
        settings.LastChannel = last;
    }

    // シリアルポートを開く
    let port = open_port(&cli.device, settings.read_timeout())?;
    let mut session = DeviceSession::new(port);

    println!("Result of close {}", session.close()?);
    println!("Result of open {}", session.open()?);

    let scanned_at = Local::now();
    let result = ed_scan(&mut session, &settings);

    // 失敗しても装置は閉じる
    match session.close() {
        Ok(status) => println!("Result of close {status}"),
        Err(e) => tracing::error!("close failed: {e}"),
    }
    let readings = result?;

    if cli.json {
        let report = Report {
            device: &cli.device,
            scanned_at,
            readings,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("channel, status, level");
        for r in readings.iter() {
            println!(
                "{}, {}, 0x{:02x}",
                r.channel,
                r.status_name.unwrap_or("?"),
                r.level
            );
        }
    }
    Ok(())
}
