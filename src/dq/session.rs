// トランシーバーとのセッション
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use crate::dq::{
    self, BLOCK_RESPONSE, Command, DeviceMode, EncodingError, ResponseFrame, StatusCode,
};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o")]
    Io(#[from] io::Error),
    #[error("encoding")]
    Encoding(#[from] EncodingError),
    #[error("応答IDが一致しません。 expected {expected:02X}(hex), got {got:02X}(hex)")]
    Protocol { expected: u8, got: u8 },
}

/// 最後に受け取った状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub status: Option<StatusCode>,
    pub data: Option<Vec<u8>>,
}

/// シリアル回線の向こうにいるトランシーバー
///
/// 1つのコマンドに1つの応答。応答IDが期待と違えば状態は更新しない。
pub struct DeviceSession<C> {
    channel: C,
    state: SessionState,
}

impl<C: io::Read + io::Write> DeviceSession<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.state.status
    }

    /// 状態コードの記号名
    pub fn status_name(&self) -> Option<&'static str> {
        self.state.status.and_then(|s| s.name())
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.state.data.as_deref()
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_inner(self) -> C {
        self.channel
    }

    // 期待する応答IDのフレームを受け取る
    fn expect(&mut self, expected: u8) -> Result<ResponseFrame, Error> {
        let frame = dq::receive(&mut self.channel)?;
        if frame.frame_type != expected {
            tracing::error!(
                "Returned invalid id value {:02X}(hex), expected {:02X}(hex), status {}",
                frame.frame_type,
                expected,
                frame.status
            );
            return Err(Error::Protocol {
                expected,
                got: frame.frame_type,
            });
        }
        self.state = SessionState {
            status: Some(frame.status),
            data: frame.data.clone(),
        };
        Ok(frame)
    }

    // コマンド発行
    fn execute(&mut self, command: Command) -> Result<ResponseFrame, Error> {
        let bytes = command.encode()?;
        dq::send(&mut self.channel, &bytes)?;
        self.expect(command.ack_id())
    }

    pub fn open(&mut self) -> Result<StatusCode, Error> {
        self.execute(Command::Open).map(|frame| frame.status)
    }

    pub fn close(&mut self) -> Result<StatusCode, Error> {
        self.execute(Command::Close).map(|frame| frame.status)
    }

    /// 論理チャンネル番号を設定する(通常1～26)
    pub fn set_channel(&mut self, channel: u8) -> Result<StatusCode, Error> {
        self.execute(Command::SetChannel(channel))
            .map(|frame| frame.status)
    }

    pub fn set_state(&mut self, mode: DeviceMode) -> Result<StatusCode, Error> {
        self.execute(Command::SetState(mode)).map(|frame| frame.status)
    }

    /// エネルギー検出(ED)
    pub fn ed(&mut self) -> Result<(StatusCode, u8), Error> {
        let frame = self.execute(Command::Ed)?;
        Ok((frame.status, frame.energy_level().unwrap_or_default()))
    }

    /// クリアチャンネル判定(CCA)
    pub fn cca(&mut self) -> Result<StatusCode, Error> {
        self.execute(Command::Cca).map(|frame| frame.status)
    }

    /// 255バイトまでのブロックを送信する
    pub fn send_block(&mut self, payload: &[u8]) -> Result<StatusCode, Error> {
        self.execute(Command::SendBlock(payload))
            .map(|frame| frame.status)
    }

    /// 受信ブロックを待つ(コマンドは送らない)
    pub fn recv_block(&mut self) -> Result<(StatusCode, Vec<u8>), Error> {
        let frame = self.expect(BLOCK_RESPONSE)?;
        Ok((frame.status, frame.data.unwrap_or_default()))
    }
}

/// 書き込みを記録して、用意した応答を返すテスト用の回線
#[cfg(test)]
pub(crate) struct Loopback {
    pub rx: io::Cursor<Vec<u8>>,
    pub tx: Vec<u8>,
}

#[cfg(test)]
impl Loopback {
    pub fn new(responses: &[u8]) -> Self {
        Self {
            rx: io::Cursor::new(responses.to_vec()),
            tx: Vec::new(),
        }
    }
}

#[cfg(test)]
impl io::Read for Loopback {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.rx.read(buf)
    }
}

#[cfg(test)]
impl io::Write for Loopback {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx.write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test1() {
    let mut session = DeviceSession::new(Loopback::new(b"zb\x84\x00"));
    assert_eq!(session.set_channel(4).unwrap(), StatusCode::Success);
    assert_eq!(session.status_name(), Some("SUCCESS"));
    assert_eq!(session.data(), None);
    assert_eq!(session.into_inner().tx, vec![0x7a, 0x62, 0x04, 0x04]);
}

#[test]
fn test2() {
    let mut session = DeviceSession::new(Loopback::new(&[0x7a, 0x62, 0x85, 0x05, 0x2a]));
    assert_eq!(session.ed().unwrap(), (StatusCode::Busy, 0x2a));
    assert_eq!(session.status(), Some(StatusCode::Busy));
    assert_eq!(session.data(), Some(&[0x2a][..]));
    assert_eq!(session.into_inner().tx, vec![0x7a, 0x62, 0x05]);
}

#[test]
fn test3() {
    // open に Close 応答が返ってきた
    let mut session = DeviceSession::new(Loopback::new(b"zb\x82\x00zb\x81\x03"));
    match session.open() {
        Err(Error::Protocol { expected, got }) => {
            assert_eq!(expected, 0x81);
            assert_eq!(got, 0x82);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(session.state(), &SessionState::default());

    // 以前の状態は残る
    assert_eq!(session.open().unwrap(), StatusCode::TrxOff);
    let mut session = DeviceSession::new(Loopback::new(b"zb\x85\x08\x01"));
    assert!(matches!(session.close(), Err(Error::Protocol { .. })));
    assert_eq!(session.status(), None);
}

#[test]
fn test4() {
    let mut session = DeviceSession::new(Loopback::new(b""));
    let payload = [0u8; 256];
    assert!(matches!(
        session.send_block(&payload),
        Err(Error::Encoding(EncodingError::PayloadTooLong(256)))
    ));
    // 何も書き込まない
    assert!(session.into_inner().tx.is_empty());
}

#[test]
fn test5() {
    // 閉じている装置に close を繰り返しても応答を取り出せる
    let mut session = DeviceSession::new(Loopback::new(b"zb\x82\x08\x00zb\x82\x08"));
    assert_eq!(session.close().unwrap(), StatusCode::Err);
    assert_eq!(session.close().unwrap(), StatusCode::Err);
    assert_eq!(session.status_name(), Some("ERR"));
    // 応答がなければI/Oエラー(ハングしない)
    assert!(matches!(session.close(), Err(Error::Io(_))));
    assert_eq!(session.into_inner().tx, b"zb\x02zb\x02zb\x02");
}

#[test]
fn test6() {
    let mut session = DeviceSession::new(Loopback::new(b"zb\x89\x00zb\x87\x05zb\x86\x03"));
    assert_eq!(session.send_block(b"zzz").unwrap(), StatusCode::Success);
    assert_eq!(
        session.set_state(DeviceMode::Tx).unwrap(),
        StatusCode::Busy
    );
    assert_eq!(session.cca().unwrap(), StatusCode::TrxOff);
    assert_eq!(
        session.into_inner().tx,
        b"zb\x09\x03zzzzb\x07\x03zb\x06"
    );
}

#[test]
fn test7() {
    let mut session = DeviceSession::new(Loopback::new(b"\xffzb\x8b\x00\x03abc"));
    assert_eq!(
        session.recv_block().unwrap(),
        (StatusCode::Success, b"abc".to_vec())
    );
    assert_eq!(session.data(), Some(&b"abc"[..]));
    assert!(session.into_inner().tx.is_empty());
}
