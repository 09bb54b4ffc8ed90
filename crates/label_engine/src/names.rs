use crate::config::Language;

pub fn no_effects_placeholder(language: Language) -> &'static str {
    match language {
        Language::Ja => "（効果なし）",
        Language::En => "(no effects)",
    }
}

/// Localized display name for a raw condition identifier, if the table knows it.
pub fn condition_display_name(language: Language, raw: &str) -> Option<&'static str> {
    match language {
        Language::Ja => japanese_name(raw),
        Language::En => english_name(raw),
    }
}

fn japanese_name(raw: &str) -> Option<&'static str> {
    let name = match raw {
        "SPEED" => "移動速度",
        "SLOW" => "移動低下",
        "FAST_DIGGING" => "採掘速度",
        "SLOW_DIGGING" => "採掘低下",
        "INCREASE_DAMAGE" => "攻撃力上昇",
        "HEAL" => "即時回復",
        "HARM" => "即時ダメージ",
        "JUMP" => "跳躍力上昇",
        "REGENERATION" => "再生",
        "DAMAGE_RESISTANCE" => "耐性",
        "FIRE_RESISTANCE" => "耐火",
        "WATER_BREATHING" => "水中呼吸",
        "INVISIBILITY" => "透明化",
        "NIGHT_VISION" => "暗視",
        "HUNGER" => "空腹",
        "WEAKNESS" => "弱体化",
        "POISON" => "毒",
        "WITHER" => "衰弱",
        "HEALTH_BOOST" => "体力増強",
        "ABSORPTION" => "衝撃吸収",
        "SATURATION" => "満腹度回復",
        "GLOWING" => "発光",
        "LEVITATION" => "浮遊",
        "LUCK" => "幸運",
        "UNLUCK" => "不運",
        "CONDUIT_POWER" => "コンジットパワー",
        "DOLPHINS_GRACE" => "イルカの好意",
        "BAD_OMEN" => "不吉な予感",
        "HERO_OF_THE_VILLAGE" => "村の英雄",
        _ => return None,
    };
    Some(name)
}

fn english_name(raw: &str) -> Option<&'static str> {
    let name = match raw {
        "SPEED" => "Speed",
        "SLOW" => "Slowness",
        "FAST_DIGGING" => "Haste",
        "SLOW_DIGGING" => "Mining Fatigue",
        "INCREASE_DAMAGE" => "Strength",
        "HEAL" => "Instant Health",
        "HARM" => "Instant Damage",
        "JUMP" => "Jump Boost",
        "REGENERATION" => "Regeneration",
        "DAMAGE_RESISTANCE" => "Resistance",
        "FIRE_RESISTANCE" => "Fire Resistance",
        "WATER_BREATHING" => "Water Breathing",
        "INVISIBILITY" => "Invisibility",
        "NIGHT_VISION" => "Night Vision",
        "HUNGER" => "Hunger",
        "WEAKNESS" => "Weakness",
        "POISON" => "Poison",
        "WITHER" => "Wither",
        "HEALTH_BOOST" => "Health Boost",
        "ABSORPTION" => "Absorption",
        "SATURATION" => "Saturation",
        "GLOWING" => "Glowing",
        "LEVITATION" => "Levitation",
        "LUCK" => "Luck",
        "UNLUCK" => "Bad Luck",
        "CONDUIT_POWER" => "Conduit Power",
        "DOLPHINS_GRACE" => "Dolphin's Grace",
        "BAD_OMEN" => "Bad Omen",
        "HERO_OF_THE_VILLAGE" => "Hero of the Village",
        _ => return None,
    };
    Some(name)
}
