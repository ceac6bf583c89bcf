use std::collections::HashMap;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collation {
    pub id: u16,
    pub name: &'static str,
    pub charset: &'static str,
}

const fn collation(id: u16, name: &'static str, charset: &'static str) -> Collation {
    Collation { id, name, charset }
}

/// Collations of MySQL 8, ordered by id. Only ids <= 255 fit in the handshake response,
/// larger ones are applied with `SET NAMES` after authentication.
///
/// `utf8` is the 3 byte charset, MySQL 8.0.30 and later also call it `utf8mb3`.
pub static COLLATIONS: &[Collation] = &[
    collation(1, "big5_chinese_ci", "big5"),
    collation(2, "latin2_czech_cs", "latin2"),
    collation(3, "dec8_swedish_ci", "dec8"),
    collation(4, "cp850_general_ci", "cp850"),
    collation(5, "latin1_german1_ci", "latin1"),
    collation(6, "hp8_english_ci", "hp8"),
    collation(7, "koi8r_general_ci", "koi8r"),
    collation(8, "latin1_swedish_ci", "latin1"),
    collation(9, "latin2_general_ci", "latin2"),
    collation(10, "swe7_swedish_ci", "swe7"),
    collation(11, "ascii_general_ci", "ascii"),
    collation(12, "ujis_japanese_ci", "ujis"),
    collation(13, "sjis_japanese_ci", "sjis"),
    collation(14, "cp1251_bulgarian_ci", "cp1251"),
    collation(15, "latin1_danish_ci", "latin1"),
    collation(16, "hebrew_general_ci", "hebrew"),
    collation(18, "tis620_thai_ci", "tis620"),
    collation(19, "euckr_korean_ci", "euckr"),
    collation(20, "latin7_estonian_cs", "latin7"),
    collation(21, "latin2_hungarian_ci", "latin2"),
    collation(22, "koi8u_general_ci", "koi8u"),
    collation(23, "cp1251_ukrainian_ci", "cp1251"),
    collation(24, "gb2312_chinese_ci", "gb2312"),
    collation(25, "greek_general_ci", "greek"),
    collation(26, "cp1250_general_ci", "cp1250"),
    collation(27, "latin2_croatian_ci", "latin2"),
    collation(28, "gbk_chinese_ci", "gbk"),
    collation(29, "cp1257_lithuanian_ci", "cp1257"),
    collation(30, "latin5_turkish_ci", "latin5"),
    collation(31, "latin1_german2_ci", "latin1"),
    collation(32, "armscii8_general_ci", "armscii8"),
    collation(33, "utf8_general_ci", "utf8"),
    collation(34, "cp1250_czech_cs", "cp1250"),
    collation(35, "ucs2_general_ci", "ucs2"),
    collation(36, "cp866_general_ci", "cp866"),
    collation(37, "keybcs2_general_ci", "keybcs2"),
    collation(38, "macce_general_ci", "macce"),
    collation(39, "macroman_general_ci", "macroman"),
    collation(40, "cp852_general_ci", "cp852"),
    collation(41, "latin7_general_ci", "latin7"),
    collation(42, "latin7_general_cs", "latin7"),
    collation(43, "macce_bin", "macce"),
    collation(44, "cp1250_croatian_ci", "cp1250"),
    collation(45, "utf8mb4_general_ci", "utf8mb4"),
    collation(46, "utf8mb4_bin", "utf8mb4"),
    collation(47, "latin1_bin", "latin1"),
    collation(48, "latin1_general_ci", "latin1"),
    collation(49, "latin1_general_cs", "latin1"),
    collation(50, "cp1251_bin", "cp1251"),
    collation(51, "cp1251_general_ci", "cp1251"),
    collation(52, "cp1251_general_cs", "cp1251"),
    collation(53, "macroman_bin", "macroman"),
    collation(54, "utf16_general_ci", "utf16"),
    collation(55, "utf16_bin", "utf16"),
    collation(56, "utf16le_general_ci", "utf16le"),
    collation(57, "cp1256_general_ci", "cp1256"),
    collation(58, "cp1257_bin", "cp1257"),
    collation(59, "cp1257_general_ci", "cp1257"),
    collation(60, "utf32_general_ci", "utf32"),
    collation(61, "utf32_bin", "utf32"),
    collation(62, "utf16le_bin", "utf16le"),
    collation(63, "binary", "binary"),
    collation(64, "armscii8_bin", "armscii8"),
    collation(65, "ascii_bin", "ascii"),
    collation(66, "cp1250_bin", "cp1250"),
    collation(67, "cp1256_bin", "cp1256"),
    collation(68, "cp866_bin", "cp866"),
    collation(69, "dec8_bin", "dec8"),
    collation(70, "greek_bin", "greek"),
    collation(71, "hebrew_bin", "hebrew"),
    collation(72, "hp8_bin", "hp8"),
    collation(73, "keybcs2_bin", "keybcs2"),
    collation(74, "koi8r_bin", "koi8r"),
    collation(75, "koi8u_bin", "koi8u"),
    collation(76, "utf8_tolower_ci", "utf8"),
    collation(77, "latin2_bin", "latin2"),
    collation(78, "latin5_bin", "latin5"),
    collation(79, "latin7_bin", "latin7"),
    collation(80, "cp850_bin", "cp850"),
    collation(81, "cp852_bin", "cp852"),
    collation(82, "swe7_bin", "swe7"),
    collation(83, "utf8_bin", "utf8"),
    collation(84, "big5_bin", "big5"),
    collation(85, "euckr_bin", "euckr"),
    collation(86, "gb2312_bin", "gb2312"),
    collation(87, "gbk_bin", "gbk"),
    collation(88, "sjis_bin", "sjis"),
    collation(89, "tis620_bin", "tis620"),
    collation(90, "ucs2_bin", "ucs2"),
    collation(91, "ujis_bin", "ujis"),
    collation(92, "geostd8_general_ci", "geostd8"),
    collation(93, "geostd8_bin", "geostd8"),
    collation(94, "latin1_spanish_ci", "latin1"),
    collation(95, "cp932_japanese_ci", "cp932"),
    collation(96, "cp932_bin", "cp932"),
    collation(97, "eucjpms_japanese_ci", "eucjpms"),
    collation(98, "eucjpms_bin", "eucjpms"),
    collation(99, "cp1250_polish_ci", "cp1250"),
    collation(101, "utf16_unicode_ci", "utf16"),
    collation(102, "utf16_icelandic_ci", "utf16"),
    collation(103, "utf16_latvian_ci", "utf16"),
    collation(104, "utf16_romanian_ci", "utf16"),
    collation(105, "utf16_slovenian_ci", "utf16"),
    collation(106, "utf16_polish_ci", "utf16"),
    collation(107, "utf16_estonian_ci", "utf16"),
    collation(108, "utf16_spanish_ci", "utf16"),
    collation(109, "utf16_swedish_ci", "utf16"),
    collation(110, "utf16_turkish_ci", "utf16"),
    collation(111, "utf16_czech_ci", "utf16"),
    collation(112, "utf16_danish_ci", "utf16"),
    collation(113, "utf16_lithuanian_ci", "utf16"),
    collation(114, "utf16_slovak_ci", "utf16"),
    collation(115, "utf16_spanish2_ci", "utf16"),
    collation(116, "utf16_roman_ci", "utf16"),
    collation(117, "utf16_persian_ci", "utf16"),
    collation(118, "utf16_esperanto_ci", "utf16"),
    collation(119, "utf16_hungarian_ci", "utf16"),
    collation(120, "utf16_sinhala_ci", "utf16"),
    collation(121, "utf16_german2_ci", "utf16"),
    collation(122, "utf16_croatian_ci", "utf16"),
    collation(123, "utf16_unicode_520_ci", "utf16"),
    collation(124, "utf16_vietnamese_ci", "utf16"),
    collation(128, "ucs2_unicode_ci", "ucs2"),
    collation(129, "ucs2_icelandic_ci", "ucs2"),
    collation(130, "ucs2_latvian_ci", "ucs2"),
    collation(131, "ucs2_romanian_ci", "ucs2"),
    collation(132, "ucs2_slovenian_ci", "ucs2"),
    collation(133, "ucs2_polish_ci", "ucs2"),
    collation(134, "ucs2_estonian_ci", "ucs2"),
    collation(135, "ucs2_spanish_ci", "ucs2"),
    collation(136, "ucs2_swedish_ci", "ucs2"),
    collation(137, "ucs2_turkish_ci", "ucs2"),
    collation(138, "ucs2_czech_ci", "ucs2"),
    collation(139, "ucs2_danish_ci", "ucs2"),
    collation(140, "ucs2_lithuanian_ci", "ucs2"),
    collation(141, "ucs2_slovak_ci", "ucs2"),
    collation(142, "ucs2_spanish2_ci", "ucs2"),
    collation(143, "ucs2_roman_ci", "ucs2"),
    collation(144, "ucs2_persian_ci", "ucs2"),
    collation(145, "ucs2_esperanto_ci", "ucs2"),
    collation(146, "ucs2_hungarian_ci", "ucs2"),
    collation(147, "ucs2_sinhala_ci", "ucs2"),
    collation(148, "ucs2_german2_ci", "ucs2"),
    collation(149, "ucs2_croatian_ci", "ucs2"),
    collation(150, "ucs2_unicode_520_ci", "ucs2"),
    collation(151, "ucs2_vietnamese_ci", "ucs2"),
    collation(159, "ucs2_general_mysql500_ci", "ucs2"),
    collation(160, "utf32_unicode_ci", "utf32"),
    collation(161, "utf32_icelandic_ci", "utf32"),
    collation(162, "utf32_latvian_ci", "utf32"),
    collation(163, "utf32_romanian_ci", "utf32"),
    collation(164, "utf32_slovenian_ci", "utf32"),
    collation(165, "utf32_polish_ci", "utf32"),
    collation(166, "utf32_estonian_ci", "utf32"),
    collation(167, "utf32_spanish_ci", "utf32"),
    collation(168, "utf32_swedish_ci", "utf32"),
    collation(169, "utf32_turkish_ci", "utf32"),
    collation(170, "utf32_czech_ci", "utf32"),
    collation(171, "utf32_danish_ci", "utf32"),
    collation(172, "utf32_lithuanian_ci", "utf32"),
    collation(173, "utf32_slovak_ci", "utf32"),
    collation(174, "utf32_spanish2_ci", "utf32"),
    collation(175, "utf32_roman_ci", "utf32"),
    collation(176, "utf32_persian_ci", "utf32"),
    collation(177, "utf32_esperanto_ci", "utf32"),
    collation(178, "utf32_hungarian_ci", "utf32"),
    collation(179, "utf32_sinhala_ci", "utf32"),
    collation(180, "utf32_german2_ci", "utf32"),
    collation(181, "utf32_croatian_ci", "utf32"),
    collation(182, "utf32_unicode_520_ci", "utf32"),
    collation(183, "utf32_vietnamese_ci", "utf32"),
    collation(192, "utf8_unicode_ci", "utf8"),
    collation(193, "utf8_icelandic_ci", "utf8"),
    collation(194, "utf8_latvian_ci", "utf8"),
    collation(195, "utf8_romanian_ci", "utf8"),
    collation(196, "utf8_slovenian_ci", "utf8"),
    collation(197, "utf8_polish_ci", "utf8"),
    collation(198, "utf8_estonian_ci", "utf8"),
    collation(199, "utf8_spanish_ci", "utf8"),
    collation(200, "utf8_swedish_ci", "utf8"),
    collation(201, "utf8_turkish_ci", "utf8"),
    collation(202, "utf8_czech_ci", "utf8"),
    collation(203, "utf8_danish_ci", "utf8"),
    collation(204, "utf8_lithuanian_ci", "utf8"),
    collation(205, "utf8_slovak_ci", "utf8"),
    collation(206, "utf8_spanish2_ci", "utf8"),
    collation(207, "utf8_roman_ci", "utf8"),
    collation(208, "utf8_persian_ci", "utf8"),
    collation(209, "utf8_esperanto_ci", "utf8"),
    collation(210, "utf8_hungarian_ci", "utf8"),
    collation(211, "utf8_sinhala_ci", "utf8"),
    collation(212, "utf8_german2_ci", "utf8"),
    collation(213, "utf8_croatian_ci", "utf8"),
    collation(214, "utf8_unicode_520_ci", "utf8"),
    collation(215, "utf8_vietnamese_ci", "utf8"),
    collation(223, "utf8_general_mysql500_ci", "utf8"),
    collation(224, "utf8mb4_unicode_ci", "utf8mb4"),
    collation(225, "utf8mb4_icelandic_ci", "utf8mb4"),
    collation(226, "utf8mb4_latvian_ci", "utf8mb4"),
    collation(227, "utf8mb4_romanian_ci", "utf8mb4"),
    collation(228, "utf8mb4_slovenian_ci", "utf8mb4"),
    collation(229, "utf8mb4_polish_ci", "utf8mb4"),
    collation(230, "utf8mb4_estonian_ci", "utf8mb4"),
    collation(231, "utf8mb4_spanish_ci", "utf8mb4"),
    collation(232, "utf8mb4_swedish_ci", "utf8mb4"),
    collation(233, "utf8mb4_turkish_ci", "utf8mb4"),
    collation(234, "utf8mb4_czech_ci", "utf8mb4"),
    collation(235, "utf8mb4_danish_ci", "utf8mb4"),
    collation(236, "utf8mb4_lithuanian_ci", "utf8mb4"),
    collation(237, "utf8mb4_slovak_ci", "utf8mb4"),
    collation(238, "utf8mb4_spanish2_ci", "utf8mb4"),
    collation(239, "utf8mb4_roman_ci", "utf8mb4"),
    collation(240, "utf8mb4_persian_ci", "utf8mb4"),
    collation(241, "utf8mb4_esperanto_ci", "utf8mb4"),
    collation(242, "utf8mb4_hungarian_ci", "utf8mb4"),
    collation(243, "utf8mb4_sinhala_ci", "utf8mb4"),
    collation(244, "utf8mb4_german2_ci", "utf8mb4"),
    collation(245, "utf8mb4_croatian_ci", "utf8mb4"),
    collation(246, "utf8mb4_unicode_520_ci", "utf8mb4"),
    collation(247, "utf8mb4_vietnamese_ci", "utf8mb4"),
    collation(248, "gb18030_chinese_ci", "gb18030"),
    collation(249, "gb18030_bin", "gb18030"),
    collation(250, "gb18030_unicode_520_ci", "gb18030"),
    collation(255, "utf8mb4_0900_ai_ci", "utf8mb4"),
    collation(256, "utf8mb4_de_pb_0900_ai_ci", "utf8mb4"),
    collation(257, "utf8mb4_is_0900_ai_ci", "utf8mb4"),
    collation(258, "utf8mb4_lv_0900_ai_ci", "utf8mb4"),
    collation(259, "utf8mb4_ro_0900_ai_ci", "utf8mb4"),
    collation(260, "utf8mb4_sl_0900_ai_ci", "utf8mb4"),
    collation(261, "utf8mb4_pl_0900_ai_ci", "utf8mb4"),
    collation(262, "utf8mb4_et_0900_ai_ci", "utf8mb4"),
    collation(263, "utf8mb4_es_0900_ai_ci", "utf8mb4"),
    collation(264, "utf8mb4_sv_0900_ai_ci", "utf8mb4"),
    collation(265, "utf8mb4_tr_0900_ai_ci", "utf8mb4"),
    collation(266, "utf8mb4_cs_0900_ai_ci", "utf8mb4"),
    collation(267, "utf8mb4_da_0900_ai_ci", "utf8mb4"),
    collation(268, "utf8mb4_lt_0900_ai_ci", "utf8mb4"),
    collation(269, "utf8mb4_sk_0900_ai_ci", "utf8mb4"),
    collation(270, "utf8mb4_es_trad_0900_ai_ci", "utf8mb4"),
    collation(271, "utf8mb4_la_0900_ai_ci", "utf8mb4"),
    collation(273, "utf8mb4_eo_0900_ai_ci", "utf8mb4"),
    collation(274, "utf8mb4_hu_0900_ai_ci", "utf8mb4"),
    collation(275, "utf8mb4_hr_0900_ai_ci", "utf8mb4"),
    collation(277, "utf8mb4_vi_0900_ai_ci", "utf8mb4"),
    collation(278, "utf8mb4_0900_as_cs", "utf8mb4"),
    collation(279, "utf8mb4_de_pb_0900_as_cs", "utf8mb4"),
    collation(280, "utf8mb4_is_0900_as_cs", "utf8mb4"),
    collation(281, "utf8mb4_lv_0900_as_cs", "utf8mb4"),
    collation(282, "utf8mb4_ro_0900_as_cs", "utf8mb4"),
    collation(283, "utf8mb4_sl_0900_as_cs", "utf8mb4"),
    collation(284, "utf8mb4_pl_0900_as_cs", "utf8mb4"),
    collation(285, "utf8mb4_et_0900_as_cs", "utf8mb4"),
    collation(286, "utf8mb4_es_0900_as_cs", "utf8mb4"),
    collation(287, "utf8mb4_sv_0900_as_cs", "utf8mb4"),
    collation(288, "utf8mb4_tr_0900_as_cs", "utf8mb4"),
    collation(289, "utf8mb4_cs_0900_as_cs", "utf8mb4"),
    collation(290, "utf8mb4_da_0900_as_cs", "utf8mb4"),
    collation(291, "utf8mb4_lt_0900_as_cs", "utf8mb4"),
    collation(292, "utf8mb4_sk_0900_as_cs", "utf8mb4"),
    collation(293, "utf8mb4_es_trad_0900_as_cs", "utf8mb4"),
    collation(294, "utf8mb4_la_0900_as_cs", "utf8mb4"),
    collation(296, "utf8mb4_eo_0900_as_cs", "utf8mb4"),
    collation(297, "utf8mb4_hu_0900_as_cs", "utf8mb4"),
    collation(298, "utf8mb4_hr_0900_as_cs", "utf8mb4"),
    collation(300, "utf8mb4_vi_0900_as_cs", "utf8mb4"),
    collation(303, "utf8mb4_ja_0900_as_cs", "utf8mb4"),
    collation(304, "utf8mb4_ja_0900_as_cs_ks", "utf8mb4"),
    collation(305, "utf8mb4_0900_as_ci", "utf8mb4"),
    collation(306, "utf8mb4_ru_0900_ai_ci", "utf8mb4"),
    collation(307, "utf8mb4_ru_0900_as_cs", "utf8mb4"),
    collation(308, "utf8mb4_zh_0900_as_cs", "utf8mb4"),
    collation(309, "utf8mb4_0900_bin", "utf8mb4"),
];

/// Default collation id of each charset, as listed by `SHOW CHARACTER SET`.
/// utf8mb4 keeps utf8mb4_general_ci so that pre 8.0 servers know the id.
static CHARSET_DEFAULTS: &[(&str, u16)] = &[
    ("big5", 1),
    ("dec8", 3),
    ("cp850", 4),
    ("hp8", 6),
    ("koi8r", 7),
    ("latin1", 8),
    ("latin2", 9),
    ("swe7", 10),
    ("ascii", 11),
    ("ujis", 12),
    ("sjis", 13),
    ("hebrew", 16),
    ("tis620", 18),
    ("euckr", 19),
    ("koi8u", 22),
    ("gb2312", 24),
    ("greek", 25),
    ("cp1250", 26),
    ("gbk", 28),
    ("latin5", 30),
    ("armscii8", 32),
    ("utf8", 33),
    ("ucs2", 35),
    ("cp866", 36),
    ("keybcs2", 37),
    ("macce", 38),
    ("macroman", 39),
    ("cp852", 40),
    ("latin7", 41),
    ("utf8mb4", 45),
    ("cp1251", 51),
    ("utf16", 54),
    ("utf16le", 56),
    ("cp1256", 57),
    ("cp1257", 59),
    ("utf32", 60),
    ("binary", 63),
    ("geostd8", 92),
    ("cp932", 95),
    ("eucjpms", 97),
    ("gb18030", 248),
];

/// Old name of the 3 byte utf8 charset.
const UTF8MB3: &str = "utf8mb3";

static COLLATIONS_BY_NAME: Lazy<HashMap<&'static str, &'static Collation>> =
    Lazy::new(|| COLLATIONS.iter().map(|c| (c.name, c)).collect());

/// Looks up a collation, `utf8mb3_*` names resolve to the matching `utf8_*` entry.
pub fn collation_by_name(name: &str) -> Option<&'static Collation> {
    if let Some(collation) = COLLATIONS_BY_NAME.get(name) {
        return Some(*collation);
    }
    let suffix = name.strip_prefix(UTF8MB3)?;
    COLLATIONS_BY_NAME.get(format!("utf8{}", suffix).as_str()).copied()
}

pub fn collation_by_id(id: u16) -> Option<&'static Collation> {
    COLLATIONS
        .binary_search_by_key(&id, |c| c.id)
        .ok()
        .map(|i| &COLLATIONS[i])
}

/// Default collation of a charset. Every default fits in the 1 byte handshake field.
pub fn default_collation_for_charset(charset: &str) -> Option<&'static Collation> {
    let charset = if charset == UTF8MB3 { "utf8" } else { charset };
    CHARSET_DEFAULTS
        .iter()
        .find(|(name, _)| *name == charset)
        .and_then(|(_, id)| collation_by_id(*id))
}
