// シリアルポートを開く
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use anyhow::Context;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::time::Duration;

/// シリアルポートを開く
///
/// 115200bps 8N1、フロー制御なし。読み残しは捨てる。
pub fn open_port(
    port_name: &str,
    read_timeout: Duration,
) -> anyhow::Result<Box<dyn SerialPort>> {
    tracing::info!("Opening {port_name}");
    let port = serialport::new(port_name, 115200)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(read_timeout)
        .open()
        .with_context(move || format!("Failed to open \"{}\".", port_name))?;

    port.clear(ClearBuffer::Input)
        .context("Failed to flush input buffer")?;
    Ok(port)
}
