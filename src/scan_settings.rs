// EDスキャン設定
// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: 2025 Akihiro Yamamoto <github.com/ak1211>
//
use crate::dq::wait_state::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// EDスキャン設定
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[allow(non_snake_case)]
#[serde(default)]
pub struct ScanSettings {
    pub FirstChannel: u8,
    pub LastChannel: u8,
    pub SettleMillis: u64,
    pub RetryLimit: usize,
    pub RetryIntervalMillis: u64,
    pub ReadTimeoutSecs: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            FirstChannel: 1,
            LastChannel: 11,
            SettleMillis: 1000,
            RetryLimit: 60,
            RetryIntervalMillis: 1000,
            ReadTimeoutSecs: 10,
        }
    }
}

impl ScanSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.RetryLimit,
            interval: Duration::from_millis(self.RetryIntervalMillis),
        }
    }

    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(self.SettleMillis)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.ReadTimeoutSecs)
    }
}

#[test]
fn test1() {
    let settings = toml::from_str::<ScanSettings>("").unwrap();
    assert_eq!(settings, ScanSettings::default());

    let settings = toml::from_str::<ScanSettings>(
        r#"
FirstChannel = 11
LastChannel = 26
RetryLimit = 5
"#,
    )
    .unwrap();
    assert_eq!(settings.FirstChannel, 11);
    assert_eq!(settings.LastChannel, 26);
    assert_eq!(settings.SettleMillis, 1000);
    assert_eq!(
        settings.retry_policy(),
        RetryPolicy {
            attempts: 5,
            interval: Duration::from_secs(1)
        }
    );
}
