use serde::{Deserialize, Serialize};

use crate::error::LocationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    English,
    /// zh-TW
    TraditionalChinese,
}

impl Locale {
    /// Picks a locale from a BCP 47 tag such as `navigator.language`.
    pub fn from_language_tag(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        if tag.starts_with("zh-tw") || tag.starts_with("zh-hant") || tag.starts_with("zh-hk") {
            Self::TraditionalChinese
        } else {
            Self::English
        }
    }
}

/// The single line of status text shown under the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMessage {
    KeepAwakeEnabled,
    KeepAwakeUnavailable,
    AcquiringSignal,
    Recording,
    Stopped,
    Reset,
    Location(LocationError),
}

impl StatusMessage {
    pub fn text(self, locale: Locale) -> &'static str {
        use LocationError::*;
        use StatusMessage::*;

        match locale {
            Locale::English => match self {
                KeepAwakeEnabled => "Screen wake lock enabled.",
                KeepAwakeUnavailable => "Could not enable the screen wake lock.",
                AcquiringSignal => "Acquiring GPS signal...",
                Recording => "Recording...",
                Stopped => "Recording stopped.",
                Reset => "Distance reset. Press \"Start\" to record.",
                Location(PermissionDenied) => "You denied the GPS location request.",
                Location(PositionUnavailable) => "Current position is unavailable.",
                Location(Timeout) => "Timed out getting the position.",
                Location(Unknown) => "An unknown error occurred.",
            },
            Locale::TraditionalChinese => match self {
                KeepAwakeEnabled => "螢幕喚醒鎖已啟用。",
                KeepAwakeUnavailable => "無法啟用螢幕喚醒鎖。",
                AcquiringSignal => "正在取得 GPS 訊號...",
                Recording => "正在紀錄中...",
                Stopped => "紀錄已停止。",
                Reset => "距離已重設。請按下「開始」來紀錄。",
                Location(PermissionDenied) => "您拒絕了 GPS 定位請求。",
                Location(PositionUnavailable) => "無法取得目前位置資訊。",
                Location(Timeout) => "取得位置資訊超時。",
                Location(Unknown) => "發生未知錯誤。",
            },
        }
    }
}

/// Fixed interface texts outside the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiText {
    StartButton,
    StopButton,
    ResetButton,
    ConfirmReset,
    GeolocationUnsupported,
    DistanceLabel,
    SpeedLabel,
}

impl UiText {
    pub fn text(self, locale: Locale) -> &'static str {
        use UiText::*;

        match locale {
            Locale::English => match self {
                StartButton => "Start recording",
                StopButton => "Stop recording",
                ResetButton => "Reset",
                ConfirmReset => "Reset the distance to zero?",
                GeolocationUnsupported => "Your browser does not support GPS location.",
                DistanceLabel => "Distance (km)",
                SpeedLabel => "Speed (km/h)",
            },
            Locale::TraditionalChinese => match self {
                StartButton => "開始紀錄",
                StopButton => "停止紀錄",
                ResetButton => "歸零",
                ConfirmReset => "確定要將距離歸零嗎？",
                GeolocationUnsupported => "您的瀏覽器不支援 GPS 定位功能。",
                DistanceLabel => "距離 (公里)",
                SpeedLabel => "速度 (公里/小時)",
            },
        }
    }
}
