// シリアル通信 送受信
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use crate::dq::{ResponseFrame, parser::FrameDecoder};
use std::io;

fn dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|n| format!("{:02X}", n))
        .collect::<Vec<String>>()
        .join(" ")
}

/// コマンドを送信する
pub fn send(w: &mut dyn io::Write, command: &[u8]) -> io::Result<()> {
    tracing::trace!(target:"Tx->","{}", dump(command));
    w.write_all(command)?;
    w.flush()
}

/// 応答フレームを1つ受信する
///
/// フレームが揃うまで1バイトずつ読み込んでブロックする。
pub fn receive(r: &mut dyn io::Read) -> io::Result<ResponseFrame> {
    let mut decoder = FrameDecoder::new();
    let mut val = [0u8; 1];
    loop {
        r.read_exact(&mut val)?;
        tracing::trace!(target:"<-Rx","{:02X}", val[0]);
        if let Some(frame) = decoder.push(val[0]) {
            tracing::debug!("{}", frame);
            return Ok(frame);
        }
    }
}

#[test]
fn test1() {
    let mut rx = io::Cursor::new(b"\x00\x00zb\x84\x00zb\x85\x05\x2a".to_vec());
    let frame = receive(&mut rx).unwrap();
    assert_eq!(frame.frame_type, 0x84);
    assert_eq!(frame.data, None);
    // 次のフレームの先頭は読んでいない
    assert_eq!(rx.position(), 6);

    let frame = receive(&mut rx).unwrap();
    assert_eq!(frame.frame_type, 0x85);
    assert_eq!(frame.energy_level(), Some(0x2a));
}

#[test]
fn test2() {
    // 途中で切れたらI/Oエラー
    let mut rx = io::Cursor::new(b"zb\x8b\x00\x04\x01".to_vec());
    let e = receive(&mut rx).unwrap_err();
    assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);

    let mut tx = Vec::<u8>::new();
    send(&mut tx, b"zb\x01").unwrap();
    assert_eq!(tx, b"zb\x01");
}
