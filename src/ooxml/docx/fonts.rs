//! Display names for fonts commonly found in Chinese documents.
//!
//! Runs carry the Latin family name (`SimSun`) while editors show the
//! localized name (`宋体`). The table is exported to consumers as the
//! `fontMapper` content key so they can present either form.

use phf::phf_map;
use serde_json::{Map, Value};

/// Font used for runs that declare no font at all.
pub const DEFAULT_DISPLAY_FONT: &str = "微软雅黑";

/// Latin family name to localized display name.
pub static FONT_DISPLAY_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "LiSu" => "隶书",
    "SimSun" => "宋体",
    "Microsoft Yahei" => "微软雅黑",
    "SimHei" => "黑体",
    "KaiTi" => "楷体",
    "NSimSun" => "新宋体",
    "STXingkai" => "华文行楷",
    "STFangsong" => "华文仿宋",
    "FangSong" => "仿宋",
    "YouYuan" => "幼圆",
    "STSong" => "华文宋体",
    "STZhongsong" => "华文中宋",
    "DengXian" => "等线",
    "DengXian Light" => "等线 Light",
    "STHupo" => "华文琥珀",
    "STLiti" => "华文隶书",
    "STXinwei" => "华文新魏",
    "STCaiyun" => "华文彩云",
    "FZYaoti" => "方正姚体",
    "FZShuTi" => "方正舒体",
    "STXihei" => "华文细黑",
    "simsun-extB" => "宋体扩展",
    "FangSong_GB2312" => "仿宋_GB2312",
    "PMingLiU" => "新細明體",
};

/// Localized display name for a Latin family name.
pub fn display_name(font: &str) -> Option<&'static str> {
    FONT_DISPLAY_NAMES.get(font).copied()
}

/// The whole table as a JSON object with keys in sorted order.
pub fn font_mapper() -> Map<String, Value> {
    let mut entries: Vec<_> = FONT_DISPLAY_NAMES.entries().collect();
    entries.sort_unstable_by_key(|(latin, _)| *latin);
    entries
        .into_iter()
        .map(|(latin, display)| (latin.to_string(), Value::String(display.to_string())))
        .collect()
}
