// 送信モードでブロック送信を繰り返す。
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use anyhow::{Context, bail};
use clap::Parser;
use dqradio::dq::{DeviceMode, DeviceSession, MAX_BLOCK_LEN};
use dqradio::open_port;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// 送信モードでブロック送信を繰り返す
#[derive(Parser, Debug)]
#[command(name = "dq-txtest")]
#[command(version, about, long_about = None)]
struct Cli {
    /// シリアルデバイス名
    #[arg(short = 'D', long, env = "SERIAL_DEVICE", default_value = "/dev/ttyUSB0")]
    device: String,

    /// 繰り返し回数
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,

    /// 送信間隔(ミリ秒)
    #[arg(long, default_value_t = 0)]
    interval: u64,

    /// 読み込みタイムアウト(秒)
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// 送信するデータ
    #[arg(long, default_value = "zzz")]
    payload: String,

    /// 論理チャンネル番号
    #[arg(default_value_t = 4)]
    channel: u8,
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
    if cli.payload.len() > MAX_BLOCK_LEN {
        bail!("payload too long. {} bytes (max {MAX_BLOCK_LEN})", cli.payload.len());
    }

    // シリアルポートを開く
    let port = open_port(&cli.device, Duration::from_secs(cli.timeout))?;
    let mut session = DeviceSession::new(port);

    println!("Result of close {}", session.close()?);
    println!("Result of open {}", session.open()?);

    let result = (1..=cli.count).try_for_each(|n| -> anyhow::Result<()> {
        let status = session
            .set_channel(cli.channel)
            .context("set_channel failed!")?;
        println!("#{n} Result of set_channel {status}");
        let status = session
            .set_state(DeviceMode::Tx)
            .context("set_state failed!")?;
        println!("#{n} Result of set_state {status}");
        let status = session
            .send_block(cli.payload.as_bytes())
            .context("send_block failed!")?;
        println!("#{n} Result of send_block {status}");
        thread::sleep(Duration::from_millis(cli.interval));
        Ok(())
    });

    // 失敗しても装置は閉じる
    match session.close() {
        Ok(status) => println!("Result of close {status}"),
        Err(e) => tracing::error!("close failed: {e}"),
    }
    result
}
